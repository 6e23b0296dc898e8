//! Wallet module: balance partitions with an append-only double-entry ledger.
//!
//! This module implements:
//! - Two balance partitions per user (wallet, bank), both non-negative
//! - Append-only ledger: exactly one entry per balance mutation, carrying the
//!   signed delta and the resulting balance snapshot, in the same transaction
//! - Conditional-update debits so a balance can never go negative under
//!   concurrent wagers
//! - Idempotency keys to absorb duplicate requests
//! - A reconciliation check: sum of deltas per partition == current balance
//!
//! ## Example
//!
//! ```no_run
//! use parlor::db::Database;
//! use parlor::wallet::{EntryType, Partition, WalletManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let wallet = WalletManager::new(Arc::new(db.pool().clone()));
//!
//!     let balance = wallet
//!         .credit(
//!             1,
//!             Partition::Wallet,
//!             5_000,
//!             EntryType::AdminAdjust,
//!             None,
//!             None,
//!             "promo_credit_1".to_string(),
//!             Some("welcome bonus".to_string()),
//!         )
//!         .await?;
//!     println!("New balance: {balance}");
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{WalletError, WalletResult};
pub use manager::WalletManager;
pub use models::{EntryType, LedgerEntry, Partition, Wallet};
