//! Pure settlement reconciliation.
//!
//! Given a pending bet and an externally declared result, decide
//! won/lost/void and the payout amount. No store is touched here: the
//! same (bet, result) pair always yields the same decision, which is
//! what lets the ledger layer detect and reject re-settlement.

use crate::ledger::models::{Bet, BetStatus, BetType};
use crate::provider::ExternalResult;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

/// Outcome of reconciling one bet against one declared result.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementDecision {
    pub status: BetStatus,
    pub payout: Decimal,
}

impl SettlementDecision {
    pub fn won(bet: &Bet) -> Self {
        Self {
            status: BetStatus::Won,
            payout: winning_payout(bet),
        }
    }

    pub fn lost() -> Self {
        Self {
            status: BetStatus::Lost,
            payout: Decimal::ZERO,
        }
    }

    /// Cancelled/abandoned market: the stake comes back regardless of odds.
    pub fn void(bet: &Bet) -> Self {
        Self {
            status: BetStatus::Void,
            payout: bet.stake,
        }
    }
}

/// Payout for a winning bet. A precomputed `potential_payout` wins over
/// the formula; otherwise BACK pays stake * odds and LAY pays the
/// backer's liability, stake * (odds - 1).
pub fn winning_payout(bet: &Bet) -> Decimal {
    if let Some(payout) = bet.potential_payout {
        return payout;
    }
    match bet.bet_type {
        BetType::Back => bet.stake * bet.odds,
        BetType::Lay => bet.stake * (bet.odds - Decimal::ONE),
    }
}

/// Market classification, dispatched on the sport tag and on substrings
/// of the market name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarketKind {
    /// Casino rounds; winner taken from `result` before `winner`.
    Casino,
    /// Match odds / match winner; winner taken from `winner` before `result`.
    MatchWinner,
    /// Cricket session ("fancy") markets on a numeric quantity.
    Session,
    Unknown,
}

fn classify(bet: &Bet) -> MarketKind {
    if bet.is_casino() {
        return MarketKind::Casino;
    }

    let name = bet.market_name.to_lowercase();
    if name.contains("match odds") || name.contains("match winner") {
        return MarketKind::MatchWinner;
    }
    if ["runs", "wickets", "over"].iter().any(|k| name.contains(k)) {
        return MarketKind::Session;
    }

    MarketKind::Unknown
}

/// Decide the outcome of one pending bet against one declared result.
pub fn determine_outcome(bet: &Bet, result: &ExternalResult) -> SettlementDecision {
    match classify(bet) {
        MarketKind::Casino => {
            let winner = result.result.as_deref().or(result.winner.as_deref());
            decide_declared_winner(bet, winner)
        }
        MarketKind::MatchWinner => {
            let winner = result.winner.as_deref().or(result.result.as_deref());
            decide_declared_winner(bet, winner)
        }
        MarketKind::Session => decide_session(bet, result),
        MarketKind::Unknown => {
            warn!(
                bet_id = %bet.id,
                market = %bet.market_name,
                "unclassified market, settling as lost"
            );
            SettlementDecision::lost()
        }
    }
}

/// Winner-market decision for a known winner string. Public because the
/// casino settle endpoint compares against a caller-supplied winning
/// selection directly.
pub fn decide_winner_market(bet: &Bet, winner: &str) -> SettlementDecision {
    let winner = winner.trim().to_lowercase();
    if winner.is_empty() {
        warn!(bet_id = %bet.id, "empty winner in declared result, settling as lost");
        return SettlementDecision::lost();
    }

    let matched = bet
        .selection_labels()
        .any(|label| labels_match(&winner, label));
    decide_for_side(bet, matched)
}

fn decide_declared_winner(bet: &Bet, winner: Option<&str>) -> SettlementDecision {
    match winner {
        Some(winner) => decide_winner_market(bet, winner),
        // No declared winner on a winner market. Refusing to guess keeps
        // LAY bets from silently auto-winning on a sparse payload.
        None => {
            warn!(
                bet_id = %bet.id,
                market = %bet.market_name,
                "declared result carries no winner, settling as lost"
            );
            SettlementDecision::lost()
        }
    }
}

/// Intentionally lenient winner comparison: exact match or either label
/// containing the other, both lowercased. Provider winner strings are
/// frequently decorated ("Player A (2nd innings)").
fn labels_match(winner: &str, selection: &str) -> bool {
    let selection = selection.trim().to_lowercase();
    if selection.is_empty() {
        return false;
    }
    winner == selection || winner.contains(&selection) || selection.contains(winner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionOp {
    Over,
    Under,
    Exact,
}

fn decide_session(bet: &Bet, result: &ExternalResult) -> SettlementDecision {
    let Some(value) = numeric_result(result) else {
        warn!(
            bet_id = %bet.id,
            market = %bet.market_name,
            "session result carries no numeric value, settling as lost"
        );
        return SettlementDecision::lost();
    };

    let target = bet.selection_labels().find_map(session_target);
    let Some((op, threshold)) = target else {
        warn!(
            bet_id = %bet.id,
            selection = %bet.selection,
            "session selection carries no numeric target, settling as lost"
        );
        return SettlementDecision::lost();
    };

    let back_wins = match op {
        SessionOp::Over => value > threshold,
        SessionOp::Under => value < threshold,
        SessionOp::Exact => value == threshold,
    };

    decide_for_side(bet, back_wins)
}

/// Numeric result value for session markets: `result` parsed as a
/// number, else `runs`, else `score`.
fn numeric_result(result: &ExternalResult) -> Option<Decimal> {
    if let Some(parsed) = result
        .result
        .as_deref()
        .and_then(|s| Decimal::from_str(s.trim()).ok())
    {
        return Some(parsed);
    }
    result.runs.or(result.score)
}

/// Threshold and comparison extracted from a selection label like
/// "Over 10.5" or "Under 45". A bare number means an exact target.
fn session_target(label: &str) -> Option<(SessionOp, Decimal)> {
    let label = label.to_lowercase();
    let threshold = first_number(&label)?;

    let op = if label.contains("over") {
        SessionOp::Over
    } else if label.contains("under") {
        SessionOp::Under
    } else {
        SessionOp::Exact
    };

    Some((op, threshold))
}

fn first_number(s: &str) -> Option<Decimal> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let len = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'.')
        .count();
    Decimal::from_str(&s[start..start + len]).ok()
}

/// A BACK bet wins when the backed condition holds; a LAY bet wins when
/// it does not.
fn decide_for_side(bet: &Bet, back_wins: bool) -> SettlementDecision {
    let wins = match bet.bet_type {
        BetType::Back => back_wins,
        BetType::Lay => !back_wins,
    };

    if wins {
        SettlementDecision::won(bet)
    } else {
        SettlementDecision::lost()
    }
}
