use crate::ledger::models::{BetStatus, WalletTransaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameter selecting the `/bet-settlement` action.
#[derive(Debug, Deserialize)]
pub struct SettlementAction {
    pub action: String,
}

/// POST /bet-settlement?action=settle
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub bet_id: Uuid,
    pub status: BetStatus,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub payout: Option<Decimal>,
}

/// POST /bet-settlement?action=auto-settle-casino
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasinoSettleRequest {
    pub bet_id: Uuid,
    pub result: Option<String>,
    pub winning_selection: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub success: bool,
    pub bet_id: Uuid,
    pub status: BetStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub payout: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub transaction: Option<WalletTransaction>,
}

impl From<crate::settlement::SettlementOutcome> for SettleResponse {
    fn from(outcome: crate::settlement::SettlementOutcome) -> Self {
        Self {
            success: true,
            bet_id: outcome.bet.id,
            status: outcome.bet.status,
            payout: outcome.bet.payout,
            balance: outcome.balance,
            transaction: outcome.transaction,
        }
    }
}

/// POST /auto-settle-bets
#[derive(Debug, Deserialize)]
pub struct AutoSettleRequest {
    pub bet_id: Option<Uuid>,
    pub auto: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub success: bool,
    pub settled: u64,
    pub won: u64,
    pub lost: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_payout: Decimal,
}

impl From<crate::settlement::sweeper::SweepSummary> for SweepResponse {
    fn from(summary: crate::settlement::sweeper::SweepSummary) -> Self {
        Self {
            success: true,
            settled: summary.settled,
            won: summary.won,
            lost: summary.lost,
            total_payout: summary.total_payout,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}
