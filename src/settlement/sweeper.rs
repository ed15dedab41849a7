//! Batch auto-settlement sweep.
//!
//! Iterates pending bets sequentially, fetches each one's declared
//! result, and applies the reconciler decision. A bet with no result yet
//! (or a failing provider call) is skipped and stays pending for the
//! next run; one bad bet never aborts the batch.

use super::reconciler::{self, SettlementDecision};
use super::BetSettler;
use crate::error::{AppError, AppResult, SettlementError};
use crate::ledger::models::{Bet, BetStatus};
use crate::ledger::LedgerStore;
use crate::provider::ResultProvider;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Counters for one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepSummary {
    pub settled: u64,
    pub won: u64,
    pub lost: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_payout: Decimal,
}

impl SweepSummary {
    pub fn record(&mut self, decision: &SettlementDecision) {
        self.settled += 1;
        match decision.status {
            BetStatus::Won => self.won += 1,
            BetStatus::Lost => self.lost += 1,
            _ => {}
        }
        self.total_payout += decision.payout;
    }
}

pub struct Sweeper {
    ledger: Arc<dyn LedgerStore>,
    settler: Arc<BetSettler>,
    provider: Arc<dyn ResultProvider>,
}

impl Sweeper {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        settler: Arc<BetSettler>,
        provider: Arc<dyn ResultProvider>,
    ) -> Self {
        Self {
            ledger,
            settler,
            provider,
        }
    }

    /// Fetch the declared result for one bet and reconcile it. `None`
    /// means the bet is not settleable on this attempt.
    pub async fn decide(
        provider: &dyn ResultProvider,
        bet: &Bet,
    ) -> AppResult<Option<SettlementDecision>> {
        let result = if bet.is_casino() {
            provider.fetch_casino_result(bet).await?
        } else {
            provider.fetch_sports_result(bet).await?
        };

        Ok(result.map(|result| reconciler::determine_outcome(bet, &result)))
    }

    /// Settle a single bet by id, if its result is available.
    pub async fn sweep_one(&self, bet_id: Uuid) -> AppResult<SweepSummary> {
        let bet = self
            .ledger
            .get_bet(bet_id)
            .await?
            .ok_or(SettlementError::BetNotFound(bet_id))?;

        let mut summary = SweepSummary::default();
        match Self::decide(self.provider.as_ref(), &bet).await? {
            Some(decision) => {
                self.settler.apply(bet.id, &decision).await?;
                summary.record(&decision);
            }
            None => {
                info!(bet_id = %bet.id, "no result yet, bet stays pending");
            }
        }

        Ok(summary)
    }

    /// Sweep all pending bets. Skip-and-continue on every per-bet
    /// failure mode: missing result, provider error, lost settle race.
    pub async fn sweep_all(&self) -> AppResult<SweepSummary> {
        let pending = self.ledger.list_pending_bets().await?;
        info!(count = pending.len(), "starting settlement sweep");

        let mut summary = SweepSummary::default();
        for bet in pending {
            let decision = match Self::decide(self.provider.as_ref(), &bet).await {
                Ok(Some(decision)) => decision,
                Ok(None) => {
                    debug!(bet_id = %bet.id, "no result yet, skipping");
                    continue;
                }
                Err(err) => {
                    warn!(bet_id = %bet.id, error = %err, "result fetch failed, skipping");
                    continue;
                }
            };

            match self.settler.apply(bet.id, &decision).await {
                Ok(_) => summary.record(&decision),
                Err(AppError::Settlement(SettlementError::AlreadySettled { .. })) => {
                    // A concurrent settle won the conditional update.
                    info!(bet_id = %bet.id, "already settled by another writer, skipping");
                }
                Err(err) => {
                    error!(bet_id = %bet.id, error = %err, "failed to apply settlement");
                }
            }
        }

        info!(
            settled = summary.settled,
            won = summary.won,
            lost = summary.lost,
            total_payout = %summary.total_payout,
            "settlement sweep finished"
        );

        Ok(summary)
    }

    /// Run the sweep on a fixed interval in the background.
    pub fn start(self: Arc<Self>, interval_secs: u64) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(interval_secs));
            // First tick fires immediately; skip it so startup stays quiet.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(err) = self.sweep_all().await {
                    error!(error = %err, "settlement sweep failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::MemoryLedger;
    use crate::ledger::models::BetType;
    use crate::provider::ExternalResult;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    /// Provider canned per game type: answers from a fixed map, `None`
    /// for everything else.
    struct StaticProvider {
        results: Vec<(String, ExternalResult)>,
    }

    #[async_trait]
    impl ResultProvider for StaticProvider {
        async fn fetch_casino_result(&self, bet: &Bet) -> AppResult<Option<ExternalResult>> {
            Ok(self.lookup(bet))
        }

        async fn fetch_sports_result(&self, bet: &Bet) -> AppResult<Option<ExternalResult>> {
            Ok(self.lookup(bet))
        }
    }

    impl StaticProvider {
        fn lookup(&self, bet: &Bet) -> Option<ExternalResult> {
            let key = bet.market_id.as_deref()?;
            self.results
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, r)| r.clone())
        }
    }

    fn pending_bet(market_id: &str, selection: &str) -> Bet {
        Bet {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            sport: "Cricket".to_string(),
            market_id: Some(market_id.to_string()),
            market_name: "Match Odds".to_string(),
            event_id: Some("evt-1".to_string()),
            event_name: Some("Test Event".to_string()),
            selection: selection.to_string(),
            selection_name: None,
            bet_type: BetType::Back,
            stake: dec!(100),
            odds: dec!(1.95),
            potential_payout: None,
            status: BetStatus::Pending,
            payout: Decimal::ZERO,
            provider_bet_id: None,
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    #[tokio::test]
    async fn decide_is_none_when_provider_has_no_result() {
        let provider = StaticProvider { results: vec![] };
        let bet = pending_bet("mkt-1", "Team A");

        let decision = Sweeper::decide(&provider, &bet).await.unwrap();
        assert!(decision.is_none());
    }

    #[tokio::test]
    async fn decide_reconciles_when_result_is_available() {
        let provider = StaticProvider {
            results: vec![("mkt-1".to_string(), ExternalResult::from_winner("Team A"))],
        };
        let bet = pending_bet("mkt-1", "Team A");

        let decision = Sweeper::decide(&provider, &bet).await.unwrap().unwrap();
        assert_eq!(decision.status, BetStatus::Won);
        assert_eq!(decision.payout, dec!(195.00));
    }

    fn sweeper_over(ledger: Arc<MemoryLedger>, provider: StaticProvider) -> Sweeper {
        let settler = Arc::new(BetSettler::new(ledger.clone()));
        Sweeper::new(ledger, settler, Arc::new(provider))
    }

    #[tokio::test]
    async fn sweep_settles_available_results_and_leaves_rest_pending() {
        // Three pending bets, results available for two of them. The
        // third must be skipped, not failed, and must stay pending.
        let provider = StaticProvider {
            results: vec![
                ("mkt-1".to_string(), ExternalResult::from_winner("Team A")),
                ("mkt-2".to_string(), ExternalResult::from_winner("Team B")),
            ],
        };
        let bets = vec![
            pending_bet("mkt-1", "Team A"),
            pending_bet("mkt-2", "Team A"),
            pending_bet("mkt-3", "Team A"),
        ];
        let unresolved_id = bets[2].id;

        let ledger = Arc::new(MemoryLedger::with_bets(bets));
        let sweeper = sweeper_over(ledger.clone(), provider);

        let summary = sweeper.sweep_all().await.unwrap();
        assert_eq!(summary.settled, 2);
        assert_eq!(summary.won, 1);
        assert_eq!(summary.lost, 1);
        assert_eq!(summary.total_payout, dec!(195.00));

        assert_eq!(ledger.bet_status(unresolved_id), Some(BetStatus::Pending));
        // Only the winning bet pays out.
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[tokio::test]
    async fn sweep_skips_bets_settled_by_another_writer() {
        // The sweep works from a pending snapshot that a concurrent
        // settle has since invalidated: the conditional write rejects
        // the second settlement and the sweep moves on without
        // double-crediting.
        let provider = StaticProvider {
            results: vec![("mkt-1".to_string(), ExternalResult::from_winner("Team A"))],
        };
        let bet = pending_bet("mkt-1", "Team A");
        let bet_id = bet.id;

        let ledger = Arc::new(MemoryLedger::with_bets(vec![bet]));
        ledger.freeze_pending_view();
        ledger
            .settle_bet(bet_id, BetStatus::Won, dec!(195))
            .await
            .unwrap();

        let sweeper = sweeper_over(ledger.clone(), provider);
        let summary = sweeper.sweep_all().await.unwrap();

        assert_eq!(summary, SweepSummary::default());
        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(ledger.bet_status(bet_id), Some(BetStatus::Won));
    }

    #[test]
    fn summary_does_not_count_void_as_won_or_lost() {
        let mut summary = SweepSummary::default();
        summary.record(&SettlementDecision {
            status: BetStatus::Void,
            payout: dec!(100),
        });

        assert_eq!(summary.settled, 1);
        assert_eq!(summary.won, 0);
        assert_eq!(summary.lost, 0);
        assert_eq!(summary.total_payout, dec!(100));
    }
}
