use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, Type};
use std::fmt;
use uuid::Uuid;

/// Lifecycle of a wager. A bet starts pending and moves to exactly one
/// terminal state; there is no path back out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "bet_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Void,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Pending => "pending",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
            BetStatus::Void => "void",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BetStatus::Pending)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Side of the wager: BACK bets the selection wins, LAY bets it does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "bet_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    Back,
    Lay,
}

/// Wallet ledger entry type. Deposits, wins and bonuses credit the
/// balance; withdrawals and bet stakes debit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "txn_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Deposit,
    Withdraw,
    Bet,
    Win,
    Bonus,
}

impl TxnType {
    /// Whether this entry type credits the derived balance.
    pub fn is_credit(&self) -> bool {
        matches!(self, TxnType::Deposit | TxnType::Win | TxnType::Bonus)
    }
}

/// A single wager as stored in the `bets` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bet {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Sport name, or the literal "CASINO" for casino rounds.
    pub sport: String,
    /// Market identifier; doubles as the casino game type for casino bets.
    pub market_id: Option<String>,
    pub market_name: String,
    /// Provider event identifier; the round id (mid) for casino bets.
    pub event_id: Option<String>,
    pub event_name: Option<String>,

    pub selection: String,
    pub selection_name: Option<String>,
    pub bet_type: BetType,

    #[serde(with = "rust_decimal::serde::float")]
    pub stake: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub odds: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub potential_payout: Option<Decimal>,

    pub status: BetStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub payout: Decimal,

    /// External provider reference, kept for idempotency and audit.
    pub provider_bet_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Bet {
    pub fn is_casino(&self) -> bool {
        self.sport.eq_ignore_ascii_case("casino")
    }

    /// Labels the reconciler compares the declared winner against.
    pub fn selection_labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.selection.as_str()).chain(self.selection_name.as_deref())
    }
}

/// Append-only wallet ledger entry. Rows are inserted at settlement (or
/// by the out-of-scope deposit/placement flows) and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub txn_type: TxnType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: String,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Contribution of this entry to the derived wallet balance.
    /// Amounts are stored positive; the sign comes from the entry type.
    pub fn signed_amount(&self) -> Decimal {
        if self.txn_type.is_credit() {
            self.amount
        } else {
            -self.amount
        }
    }
}

/// Derived wallet balance: the sum of completed ledger entries, signed
/// by type. There is no authoritative stored balance.
pub fn derive_balance<'a, I>(transactions: I) -> Decimal
where
    I: IntoIterator<Item = &'a WalletTransaction>,
{
    transactions
        .into_iter()
        .filter(|t| t.status == "completed")
        .map(WalletTransaction::signed_amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn txn(txn_type: TxnType, amount: Decimal, status: &str) -> WalletTransaction {
        WalletTransaction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            txn_type,
            amount,
            status: status.to_string(),
            reference: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn balance_is_signed_sum_of_completed_entries() {
        let entries = vec![
            txn(TxnType::Deposit, dec!(500), "completed"),
            txn(TxnType::Bet, dec!(100), "completed"),
            txn(TxnType::Win, dec!(195), "completed"),
        ];
        assert_eq!(derive_balance(&entries), dec!(595));
    }

    #[test]
    fn pending_entries_do_not_count() {
        let entries = vec![
            txn(TxnType::Deposit, dec!(500), "completed"),
            txn(TxnType::Withdraw, dec!(200), "pending"),
        ];
        assert_eq!(derive_balance(&entries), dec!(500));
    }

    #[test]
    fn withdrawals_and_stakes_debit() {
        let entries = vec![
            txn(TxnType::Deposit, dec!(100), "completed"),
            txn(TxnType::Withdraw, dec!(30), "completed"),
            txn(TxnType::Bet, dec!(20), "completed"),
            txn(TxnType::Bonus, dec!(5), "completed"),
        ];
        assert_eq!(derive_balance(&entries), dec!(55));
    }
}
