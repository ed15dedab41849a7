use super::models::*;
use super::LedgerStore;
use crate::error::{AppResult, SettlementError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

const BET_COLUMNS: &str = "id, user_id, sport, market_id, market_name, event_id, event_name, \
     selection, selection_name, bet_type, stake, odds, potential_payout, \
     status, payout, provider_bet_id, created_at, settled_at";

/// Ledger repository - the source of truth for bets and the wallet ledger
pub struct LedgerRepository {
    pub pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ========== BET OPERATIONS ==========

    pub async fn get_bet(&self, bet_id: Uuid) -> AppResult<Option<Bet>> {
        let bet = sqlx::query_as::<_, Bet>(&format!(
            "SELECT {BET_COLUMNS} FROM bets WHERE id = $1"
        ))
        .bind(bet_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bet)
    }

    pub async fn list_pending_bets(&self) -> AppResult<Vec<Bet>> {
        let bets = sqlx::query_as::<_, Bet>(&format!(
            "SELECT {BET_COLUMNS} FROM bets WHERE status = 'pending' ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(bets)
    }

    /// Apply a settlement decision exactly once.
    ///
    /// The status transition is a single conditional write scoped to
    /// `status = 'pending'`: of two concurrent settlers the second sees
    /// zero rows affected and fails with `AlreadySettled` instead of
    /// double-crediting. The wallet credit (when payout > 0) is inserted
    /// in the same database transaction as the status flip, so a settled
    /// bet can never be left uncredited.
    pub async fn settle_bet(
        &self,
        bet_id: Uuid,
        status: BetStatus,
        payout: Decimal,
    ) -> AppResult<(Bet, Option<WalletTransaction>)> {
        debug_assert!(status.is_terminal());

        let mut tx = self.pool.begin().await?;

        let bet = sqlx::query_as::<_, Bet>(&format!(
            "UPDATE bets
             SET status = $2, payout = $3, settled_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {BET_COLUMNS}"
        ))
        .bind(bet_id)
        .bind(status)
        .bind(payout)
        .fetch_optional(&mut *tx)
        .await?;

        let bet = match bet {
            Some(bet) => bet,
            // No pending row: distinguish a missing bet from a lost race.
            None => {
                let current = sqlx::query_scalar::<_, BetStatus>(
                    "SELECT status FROM bets WHERE id = $1",
                )
                .bind(bet_id)
                .fetch_optional(&mut *tx)
                .await?;

                return Err(match current {
                    Some(current) => SettlementError::AlreadySettled {
                        bet_id,
                        status: current,
                    }
                    .into(),
                    None => SettlementError::BetNotFound(bet_id).into(),
                });
            }
        };

        let transaction = if payout > Decimal::ZERO {
            let txn_type = match status {
                BetStatus::Void => TxnType::Bonus,
                _ => TxnType::Win,
            };
            let description = match status {
                BetStatus::Void => format!("Void refund: {}", bet.market_name),
                _ => format!("Bet win: {}", bet.market_name),
            };

            let transaction = sqlx::query_as::<_, WalletTransaction>(
                "INSERT INTO wallet_transactions
                     (user_id, txn_type, amount, status, reference, description)
                 VALUES ($1, $2, $3, 'completed', $4, $5)
                 RETURNING id, user_id, txn_type, amount, status, reference, description, created_at",
            )
            .bind(bet.user_id)
            .bind(txn_type)
            .bind(payout)
            .bind(bet.provider_bet_id.as_deref().unwrap_or(""))
            .bind(description)
            .fetch_one(&mut *tx)
            .await?;

            Some(transaction)
        } else {
            None
        };

        tx.commit().await?;

        info!(
            bet_id = %bet.id,
            status = %status,
            payout = %payout,
            "bet settled"
        );

        Ok((bet, transaction))
    }

    // ========== WALLET OPERATIONS ==========

    pub async fn list_transactions(&self, user_id: Uuid) -> AppResult<Vec<WalletTransaction>> {
        let transactions = sqlx::query_as::<_, WalletTransaction>(
            "SELECT id, user_id, txn_type, amount, status, reference, description, created_at
             FROM wallet_transactions
             WHERE user_id = $1
             ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Re-derive the wallet balance from the full transaction history.
    /// Signing happens in one place (`WalletTransaction::signed_amount`)
    /// so the SQL and in-process views can never disagree.
    pub async fn balance(&self, user_id: Uuid) -> AppResult<Decimal> {
        let transactions = self.list_transactions(user_id).await?;
        Ok(derive_balance(&transactions))
    }
}

#[async_trait]
impl LedgerStore for LedgerRepository {
    async fn get_bet(&self, bet_id: Uuid) -> AppResult<Option<Bet>> {
        LedgerRepository::get_bet(self, bet_id).await
    }

    async fn list_pending_bets(&self) -> AppResult<Vec<Bet>> {
        LedgerRepository::list_pending_bets(self).await
    }

    async fn settle_bet(
        &self,
        bet_id: Uuid,
        status: BetStatus,
        payout: Decimal,
    ) -> AppResult<(Bet, Option<WalletTransaction>)> {
        LedgerRepository::settle_bet(self, bet_id, status, payout).await
    }

    async fn balance(&self, user_id: Uuid) -> AppResult<Decimal> {
        LedgerRepository::balance(self, user_id).await
    }
}
