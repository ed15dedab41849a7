// External odds provider ("Diamond API") integration
pub mod diamond;

pub use diamond::DiamondClient;

use crate::error::AppResult;
use crate::ledger::models::Bet;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Declared result for a match market or a casino round, as returned by
/// the provider. Fields are sparse: winner markets carry `result` or
/// `winner`, session markets a numeric `result`/`runs`/`score`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalResult {
    pub result: Option<String>,
    pub winner: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub runs: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub score: Option<Decimal>,
}

impl ExternalResult {
    pub fn from_winner(winner: impl Into<String>) -> Self {
        Self {
            winner: Some(winner.into()),
            ..Default::default()
        }
    }
}

/// Source of declared results. `None` means "no result yet": the bet is
/// not settleable on this attempt and must stay pending. A provider
/// failure is never allowed to surface as a loss.
#[async_trait]
pub trait ResultProvider: Send + Sync {
    /// Round-specific casino lookup, falling back to the latest result
    /// for the bet's game type.
    async fn fetch_casino_result(&self, bet: &Bet) -> AppResult<Option<ExternalResult>>;

    /// Sports market lookup keyed by event id + market id.
    async fn fetch_sports_result(&self, bet: &Bet) -> AppResult<Option<ExternalResult>>;
}
