pub mod models;
pub mod repository;

#[cfg(test)]
pub mod memory;

use crate::error::AppResult;
use async_trait::async_trait;
use models::{Bet, BetStatus, WalletTransaction};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Storage operations the settlement layer depends on. Production code
/// runs on the Postgres-backed `LedgerRepository`; tests substitute an
/// in-memory store with the same exactly-once contract.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_bet(&self, bet_id: Uuid) -> AppResult<Option<Bet>>;

    async fn list_pending_bets(&self) -> AppResult<Vec<Bet>>;

    /// Move a pending bet to a terminal status and credit any payout,
    /// exactly once. Fails with `AlreadySettled` when the bet has left
    /// pending and `BetNotFound` when it does not exist; either way no
    /// wallet entry is written.
    async fn settle_bet(
        &self,
        bet_id: Uuid,
        status: BetStatus,
        payout: Decimal,
    ) -> AppResult<(Bet, Option<WalletTransaction>)>;

    async fn balance(&self, user_id: Uuid) -> AppResult<Decimal>;
}
