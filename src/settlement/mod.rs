// Settlement: pure outcome reconciliation plus durable, exactly-once
// application of decisions to the ledger.
pub mod reconciler;
pub mod sweeper;

use crate::error::{AppResult, SettlementError};
use crate::ledger::models::{Bet, BetStatus, WalletTransaction};
use crate::ledger::LedgerStore;
use reconciler::SettlementDecision;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Result of durably settling one bet.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SettlementOutcome {
    pub bet: Bet,
    pub transaction: Option<WalletTransaction>,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

/// Applies settlement decisions to the ledger. The only actor allowed to
/// move a bet out of pending.
pub struct BetSettler {
    ledger: Arc<dyn LedgerStore>,
}

impl BetSettler {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Durably apply a reconciler decision and return the refreshed
    /// derived balance.
    pub async fn apply(
        &self,
        bet_id: Uuid,
        decision: &SettlementDecision,
    ) -> AppResult<SettlementOutcome> {
        let (bet, transaction) = self
            .ledger
            .settle_bet(bet_id, decision.status, decision.payout)
            .await?;
        let balance = self.ledger.balance(bet.user_id).await?;

        Ok(SettlementOutcome {
            bet,
            transaction,
            balance,
        })
    }

    /// Caller-driven settlement with an explicit status. A void always
    /// refunds the stake; a won bet takes the caller's payout when given,
    /// otherwise the standard formula.
    pub async fn settle_manual(
        &self,
        bet_id: Uuid,
        status: BetStatus,
        payout_override: Option<Decimal>,
    ) -> AppResult<SettlementOutcome> {
        let bet = self
            .ledger
            .get_bet(bet_id)
            .await?
            .ok_or(SettlementError::BetNotFound(bet_id))?;

        let decision = match status {
            BetStatus::Pending => {
                return Err(SettlementError::InvalidStatus("pending".to_string()).into())
            }
            BetStatus::Void => SettlementDecision::void(&bet),
            BetStatus::Lost => SettlementDecision::lost(),
            BetStatus::Won => SettlementDecision {
                status: BetStatus::Won,
                payout: payout_override.unwrap_or_else(|| reconciler::winning_payout(&bet)),
            },
        };

        self.apply(bet_id, &decision).await
    }

    /// Casino settlement by direct comparison of the bet's selection
    /// against a declared winning selection.
    pub async fn settle_casino(
        &self,
        bet_id: Uuid,
        winning_selection: &str,
    ) -> AppResult<SettlementOutcome> {
        let bet = self
            .ledger
            .get_bet(bet_id)
            .await?
            .ok_or(SettlementError::BetNotFound(bet_id))?;

        let decision = reconciler::decide_winner_market(&bet, winning_selection);
        self.apply(bet_id, &decision).await
    }
}
