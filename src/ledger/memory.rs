//! In-memory `LedgerStore` for settlement tests. Enforces the same
//! exactly-once contract as the Postgres repository: only a pending bet
//! can be settled, and the wallet entry is written iff the status flip
//! succeeds.

use super::models::*;
use super::LedgerStore;
use crate::error::{AppResult, SettlementError};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    bets: Vec<Bet>,
    transactions: Vec<WalletTransaction>,
    /// When set, served to `list_pending_bets` instead of the live
    /// filter. Models a sweep working from a snapshot that a concurrent
    /// writer has since invalidated.
    pending_view: Option<Vec<Bet>>,
}

#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    pub fn with_bets(bets: Vec<Bet>) -> Self {
        let ledger = Self::default();
        ledger.inner.lock().unwrap().bets = bets;
        ledger
    }

    /// Capture the current pending set and keep serving it from
    /// `list_pending_bets`, even after some of those bets settle.
    pub fn freeze_pending_view(&self) {
        let mut inner = self.inner.lock().unwrap();
        let pending: Vec<Bet> = inner
            .bets
            .iter()
            .filter(|b| b.status == BetStatus::Pending)
            .cloned()
            .collect();
        inner.pending_view = Some(pending);
    }

    pub fn transactions(&self) -> Vec<WalletTransaction> {
        self.inner.lock().unwrap().transactions.clone()
    }

    pub fn bet_status(&self, bet_id: Uuid) -> Option<BetStatus> {
        self.inner
            .lock()
            .unwrap()
            .bets
            .iter()
            .find(|b| b.id == bet_id)
            .map(|b| b.status)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get_bet(&self, bet_id: Uuid) -> AppResult<Option<Bet>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.bets.iter().find(|b| b.id == bet_id).cloned())
    }

    async fn list_pending_bets(&self) -> AppResult<Vec<Bet>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.pending_view.clone().unwrap_or_else(|| {
            inner
                .bets
                .iter()
                .filter(|b| b.status == BetStatus::Pending)
                .cloned()
                .collect()
        }))
    }

    async fn settle_bet(
        &self,
        bet_id: Uuid,
        status: BetStatus,
        payout: Decimal,
    ) -> AppResult<(Bet, Option<WalletTransaction>)> {
        let mut inner = self.inner.lock().unwrap();

        let bet = {
            let Some(bet) = inner.bets.iter_mut().find(|b| b.id == bet_id) else {
                return Err(SettlementError::BetNotFound(bet_id).into());
            };
            if bet.status != BetStatus::Pending {
                return Err(SettlementError::AlreadySettled {
                    bet_id,
                    status: bet.status,
                }
                .into());
            }

            bet.status = status;
            bet.payout = payout;
            bet.settled_at = Some(Utc::now());
            bet.clone()
        };

        let transaction = if payout > Decimal::ZERO {
            let txn_type = match status {
                BetStatus::Void => TxnType::Bonus,
                _ => TxnType::Win,
            };
            let transaction = WalletTransaction {
                id: Uuid::new_v4(),
                user_id: bet.user_id,
                txn_type,
                amount: payout,
                status: "completed".to_string(),
                reference: bet.provider_bet_id.clone(),
                description: None,
                created_at: Utc::now(),
            };
            inner.transactions.push(transaction.clone());
            Some(transaction)
        } else {
            None
        };

        Ok((bet, transaction))
    }

    async fn balance(&self, user_id: Uuid) -> AppResult<Decimal> {
        let inner = self.inner.lock().unwrap();
        Ok(derive_balance(
            inner.transactions.iter().filter(|t| t.user_id == user_id),
        ))
    }
}
