//! Wallet data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::users::UserId;

/// Round ID type
pub type RoundId = i64;

/// Bet ID type
pub type BetId = i64;

/// Wallet model: one row per user, one column per partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: UserId,
    pub wallet_balance: i64,
    pub bank_balance: i64,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Balance of one partition
    pub fn balance(&self, partition: Partition) -> i64 {
        match partition {
            Partition::Wallet => self.wallet_balance,
            Partition::Bank => self.bank_balance,
        }
    }
}

/// Balance partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Wallet,
    Bank,
}

impl Partition {
    /// Column carrying this partition on the wallets row.
    ///
    /// Only ever interpolated into fixed SQL strings, never user input.
    pub(crate) fn column(self) -> &'static str {
        match self {
            Partition::Wallet => "wallet_balance",
            Partition::Bank => "bank_balance",
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Wallet => write!(f, "wallet"),
            Partition::Bank => write!(f, "bank"),
        }
    }
}

impl std::str::FromStr for Partition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wallet" => Ok(Partition::Wallet),
            "bank" => Ok(Partition::Bank),
            other => Err(format!("unknown partition: {other}")),
        }
    }
}

/// Ledger entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    BetPlaced,
    Payout,
    Refund,
    AdminAdjust,
    Transfer,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::BetPlaced => write!(f, "bet_placed"),
            EntryType::Payout => write!(f, "payout"),
            EntryType::Refund => write!(f, "refund"),
            EntryType::AdminAdjust => write!(f, "admin_adjust"),
            EntryType::Transfer => write!(f, "transfer"),
        }
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bet_placed" => Ok(EntryType::BetPlaced),
            "payout" => Ok(EntryType::Payout),
            "refund" => Ok(EntryType::Refund),
            "admin_adjust" => Ok(EntryType::AdminAdjust),
            "transfer" => Ok(EntryType::Transfer),
            other => Err(format!("unknown entry type: {other}")),
        }
    }
}

/// Ledger entry model (append-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: UserId,
    pub entry_type: EntryType,
    pub partition: Partition,
    pub delta: i64,
    pub balance_after: i64,
    pub round_id: Option<RoundId>,
    pub bet_id: Option<BetId>,
    pub idempotency_key: String,
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}
