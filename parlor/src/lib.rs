//! # Parlor
//!
//! A multi-room casino round engine. Each room (baccarat, roulette, sic bo,
//! lotto) cycles through timed phases on a wall-clock cadence:
//!
//! - **Betting**: wagers are accepted against the open round, gated by the
//!   room's table limits and the lock boundary.
//! - **Revealing**: the outcome has been drawn (exactly once) and is public;
//!   no further wagers are accepted.
//! - **Settled**: all bets have been paid out and a fresh round is open.
//!
//! The engine is built around three guarantees:
//!
//! - **Exactly-once settlement**: every phase transition is a conditional
//!   update under a per-room Postgres advisory lock, so concurrent schedulers
//!   (or an overlapping redeploy) race safely: the loser observes the
//!   already-advanced phase and no-ops.
//! - **No lost money**: every balance mutation is a conditional update paired
//!   with exactly one append-only ledger entry inside the same transaction;
//!   a debit that would go negative is rejected whole.
//! - **One source of truth for time**: the live phase of a round is a pure
//!   function of (round, room config, now), consulted by bet intake, the
//!   status API, and the scheduler alike.
//!
//! ## Core Modules
//!
//! - [`wallet`]: balance partitions and the append-only ledger
//! - [`games`]: outcome generation and per-game payout tables
//! - [`round`]: bet intake and the round state machine
//! - [`scheduler`]: the process-wide ticking driver

/// Database connection pooling and schema bootstrap.
pub mod db;
pub use db::{Database, DatabaseConfig};

/// Outcome generation and payout tables per game.
pub mod games;
pub use games::{BetSelection, GameKind, Outcome, PayoutRules};

/// Round lifecycle: models, bet intake, and the state machine.
pub mod round;
pub use round::{BetIntake, RoundEngine, RoundError};

/// Periodic driver advancing every room.
pub mod scheduler;
pub use scheduler::Scheduler;

/// User directory (identity is owned by an external collaborator; only the
/// exists/banned lookup lives here).
pub mod users;
pub use users::UserDirectory;

/// Balance partitions with double-entry ledger.
pub mod wallet;
pub use wallet::{WalletError, WalletManager};
