//! Round lifecycle models and the authoritative phase function.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::games::{BetSelection, GameKind, Outcome, PayoutRules};
use crate::users::{UserError, UserId};
use crate::wallet::WalletError;
use crate::wallet::models::{BetId, RoundId};

/// Room ID type
pub type RoomId = i64;

/// Stored phase of a round. Transitions are monotonic and happen only at the
/// two real events: the outcome draw and the settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Betting,
    Revealing,
    Settled,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Betting => write!(f, "betting"),
            Phase::Revealing => write!(f, "revealing"),
            Phase::Settled => write!(f, "settled"),
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "betting" => Ok(Phase::Betting),
            "revealing" => Ok(Phase::Revealing),
            "settled" => Ok(Phase::Settled),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// The phase as experienced right now: the stored phase refined by the wall
/// clock. `Locked` is a betting round whose lock boundary has passed but
/// whose outcome has not been drawn yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivePhase {
    Open,
    Locked,
    Revealing,
    Settled,
}

/// Room configuration: identity plus the tunable settings. Read fresh from
/// the database at every transition, so admin changes apply on the next
/// round without a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    pub id: RoomId,
    pub name: String,
    pub game: GameKind,
    pub min_bet: i64,
    pub max_bet: i64,
    pub betting_secs: i64,
    pub lock_buffer_secs: i64,
    pub reveal_secs: i64,
    pub enabled: bool,
    pub seed_override: Option<i64>,
    pub payout_rules: PayoutRules,
}

impl RoomConfig {
    /// When betting ends and the outcome may be drawn
    pub fn betting_deadline(&self, started_at: DateTime<Utc>) -> DateTime<Utc> {
        started_at + Duration::seconds(self.betting_secs)
    }

    /// When wagers stop being accepted: `betting_deadline - lock_buffer`
    pub fn lock_deadline(&self, started_at: DateTime<Utc>) -> DateTime<Utc> {
        started_at + Duration::seconds(self.betting_secs - self.lock_buffer_secs)
    }
}

/// Admin-settable portion of a room's configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSettings {
    pub min_bet: i64,
    pub max_bet: i64,
    pub betting_secs: i64,
    pub lock_buffer_secs: i64,
    pub reveal_secs: i64,
    pub enabled: bool,
    pub seed_override: Option<i64>,
    pub payout_rules: PayoutRules,
}

impl RoomSettings {
    /// Validate settings before they reach the rooms table
    pub fn validate(&self) -> Result<(), String> {
        if self.min_bet <= 0 {
            return Err("Minimum bet must be positive".to_string());
        }
        if self.max_bet < self.min_bet {
            return Err("Maximum bet must be at least the minimum bet".to_string());
        }
        if self.betting_secs <= 0 {
            return Err("Betting window must be positive".to_string());
        }
        if self.lock_buffer_secs < 0 || self.lock_buffer_secs >= self.betting_secs {
            return Err("Lock buffer must fit inside the betting window".to_string());
        }
        if self.reveal_secs <= 0 {
            return Err("Reveal window must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            min_bet: 10,
            max_bet: 100_000,
            betting_secs: 60,
            lock_buffer_secs: 3,
            reveal_secs: 5,
            enabled: true,
            seed_override: None,
            payout_rules: PayoutRules::default(),
        }
    }
}

/// One cycle of a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub room_id: RoomId,
    pub day: NaiveDate,
    pub day_seq: i64,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub reveal_started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub outcome: Option<Outcome>,
    pub payout_settled: bool,
}

/// A single wager, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub round_id: RoundId,
    pub user_id: UserId,
    pub selection: BetSelection,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// The single source of truth for "what phase is this round in right now" -
/// a pure function of the round row, the room config, and the clock.
pub fn live_phase(round: &Round, config: &RoomConfig, now: DateTime<Utc>) -> LivePhase {
    match round.phase {
        Phase::Settled => LivePhase::Settled,
        Phase::Revealing => LivePhase::Revealing,
        Phase::Betting => {
            // Strictly before the lock boundary: a wager landing exactly on
            // the boundary is already locked out.
            if now < config.lock_deadline(round.started_at) {
                LivePhase::Open
            } else {
                LivePhase::Locked
            }
        }
    }
}

/// Client-facing snapshot of one round with countdown timers
#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    pub round_id: RoundId,
    pub day: NaiveDate,
    pub day_seq: i64,
    pub phase: LivePhase,
    /// Hidden until the outcome has been drawn
    pub outcome: Option<Outcome>,
    /// Seconds until wagers lock (zero once locked)
    pub lock_in_secs: i64,
    /// Seconds until the round is expected to settle
    pub end_in_secs: i64,
}

/// Build the client snapshot of a round
pub fn round_summary(round: &Round, config: &RoomConfig, now: DateTime<Utc>) -> RoundSummary {
    let phase = live_phase(round, config, now);

    let lock_in_secs = match phase {
        LivePhase::Open => (config.lock_deadline(round.started_at) - now)
            .num_seconds()
            .max(0),
        _ => 0,
    };

    let end_in_secs = match phase {
        LivePhase::Open | LivePhase::Locked => {
            // The reveal window hasn't started; estimate from the schedule.
            (config.betting_deadline(round.started_at) + Duration::seconds(config.reveal_secs)
                - now)
                .num_seconds()
                .max(0)
        }
        LivePhase::Revealing => {
            let reveal_start = round.reveal_started_at.unwrap_or(round.started_at);
            (reveal_start + Duration::seconds(config.reveal_secs) - now)
                .num_seconds()
                .max(0)
        }
        LivePhase::Settled => 0,
    };

    RoundSummary {
        round_id: round.id,
        day: round.day,
        day_seq: round.day_seq,
        phase,
        outcome: match phase {
            LivePhase::Open | LivePhase::Locked => None,
            _ => round.outcome.clone(),
        },
        lock_in_secs,
        end_in_secs,
    }
}

/// Client-facing snapshot of a room
#[derive(Debug, Clone, Serialize)]
pub struct RoomState {
    pub room_id: RoomId,
    pub name: String,
    pub game: GameKind,
    pub enabled: bool,
    pub round: Option<RoundSummary>,
}

/// One settled round in a room's history
#[derive(Debug, Clone, Serialize)]
pub struct HistoryItem {
    pub round_id: RoundId,
    pub day: NaiveDate,
    pub day_seq: i64,
    pub outcome: Option<Outcome>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Round lifecycle errors
#[derive(Debug, Error)]
pub enum RoundError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Wallet error (insufficient funds surfaces through here)
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// User directory error
    #[error(transparent)]
    User(#[from] UserError),

    /// Room does not exist
    #[error("Room {0} not found")]
    RoomNotFound(RoomId),

    /// Room is disabled by an administrator
    #[error("Room is closed")]
    RoomClosed,

    /// No open round for the room
    #[error("No open round for room {0}")]
    NoOpenRound(RoomId),

    /// Round does not exist
    #[error("Round {0} not found")]
    RoundNotFound(RoundId),

    /// Amount outside the room's table limits
    #[error("Bet amount {amount} outside table limits [{min}, {max}]")]
    BetOutOfRange { min: i64, max: i64, amount: i64 },

    /// The round's lock boundary has passed
    #[error("Round is locked")]
    Locked,

    /// Selection does not belong to the room's game
    #[error("Selection is not valid for this room's game")]
    InvalidSelection,

    /// Bet does not exist (or belongs to someone else)
    #[error("Bet {0} not found")]
    BetNotFound(BetId),

    /// The outcome was already drawn; an override can no longer apply
    #[error("Outcome already drawn for round {0}")]
    OutcomeAlreadyDrawn(RoundId),

    /// Stored payload failed to (de)serialize
    #[error("Invalid stored payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// A stored bet row no longer parses as a selection
    #[error("Bet {0} has a corrupt selection")]
    CorruptBet(BetId),

    /// Invalid room settings
    #[error("Invalid room settings: {0}")]
    InvalidSettings(String),
}

impl RoundError {
    /// Machine-readable code surfaced to API clients on bet rejection
    pub fn error_code(&self) -> &'static str {
        match self {
            RoundError::RoomClosed => "ROOM_CLOSED",
            RoundError::BetOutOfRange { .. } => "BET_OUT_OF_RANGE",
            RoundError::Locked | RoundError::NoOpenRound(_) => "LOCKED",
            RoundError::Wallet(WalletError::InsufficientFunds { .. }) => "INSUFFICIENT_FUNDS",
            RoundError::User(UserError::UnknownUser(_)) => "UNKNOWN_USER",
            RoundError::User(UserError::Banned(_)) => "USER_BANNED",
            RoundError::InvalidSelection => "INVALID_SELECTION",
            RoundError::BetNotFound(_) => "BET_NOT_FOUND",
            RoundError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            RoundError::RoundNotFound(_) => "ROUND_NOT_FOUND",
            RoundError::InvalidSettings(_) => "INVALID_SETTINGS",
            _ => "INTERNAL",
        }
    }

    /// Client-safe message that doesn't leak internals
    pub fn client_message(&self) -> String {
        match self {
            RoundError::Database(_) | RoundError::Payload(_) | RoundError::CorruptBet(_) => {
                "Internal server error".to_string()
            }
            RoundError::Wallet(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for round operations
pub type RoundResult<T> = Result<T, RoundError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> RoomConfig {
        RoomConfig {
            id: 1,
            name: "R60".to_string(),
            game: GameKind::Baccarat,
            min_bet: 10,
            max_bet: 1_000,
            betting_secs: 60,
            lock_buffer_secs: 3,
            reveal_secs: 5,
            enabled: true,
            seed_override: None,
            payout_rules: PayoutRules::default(),
        }
    }

    fn round_at(phase: Phase, started_at: DateTime<Utc>) -> Round {
        Round {
            id: 7,
            room_id: 1,
            day: started_at.date_naive(),
            day_seq: 1,
            phase,
            started_at,
            reveal_started_at: None,
            ended_at: None,
            outcome: None,
            payout_settled: false,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_live_phase_open_until_lock_boundary() {
        let cfg = config();
        let round = round_at(Phase::Betting, t0());

        // Lock boundary is t0 + 57s (60s betting - 3s buffer).
        let just_before = t0() + Duration::milliseconds(56_999);
        let at_boundary = t0() + Duration::seconds(57);
        let just_after = t0() + Duration::milliseconds(57_001);

        assert_eq!(live_phase(&round, &cfg, just_before), LivePhase::Open);
        assert_eq!(live_phase(&round, &cfg, at_boundary), LivePhase::Locked);
        assert_eq!(live_phase(&round, &cfg, just_after), LivePhase::Locked);
    }

    #[test]
    fn test_live_phase_tracks_stored_phase() {
        let cfg = config();
        let mut round = round_at(Phase::Revealing, t0());
        assert_eq!(live_phase(&round, &cfg, t0()), LivePhase::Revealing);
        round.phase = Phase::Settled;
        assert_eq!(live_phase(&round, &cfg, t0()), LivePhase::Settled);
    }

    #[test]
    fn test_summary_timers_while_open() {
        let cfg = config();
        let round = round_at(Phase::Betting, t0());
        let now = t0() + Duration::seconds(10);

        let summary = round_summary(&round, &cfg, now);
        assert_eq!(summary.phase, LivePhase::Open);
        assert_eq!(summary.lock_in_secs, 47); // 57 - 10
        assert_eq!(summary.end_in_secs, 55); // 60 + 5 - 10
        assert!(summary.outcome.is_none());
    }

    #[test]
    fn test_summary_timers_while_revealing() {
        let cfg = config();
        let mut round = round_at(Phase::Revealing, t0());
        round.reveal_started_at = Some(t0() + Duration::seconds(60));
        round.outcome = Some(Outcome::Roulette { pocket: 17 });

        let now = t0() + Duration::seconds(62);
        let summary = round_summary(&round, &cfg, now);
        assert_eq!(summary.phase, LivePhase::Revealing);
        assert_eq!(summary.lock_in_secs, 0);
        assert_eq!(summary.end_in_secs, 3); // reveal start + 5 - 62
        assert_eq!(summary.outcome, Some(Outcome::Roulette { pocket: 17 }));
    }

    #[test]
    fn test_outcome_hidden_while_betting() {
        let cfg = config();
        let mut round = round_at(Phase::Betting, t0());
        // An outcome should never exist on a betting round, but the summary
        // must not leak one even if it did.
        round.outcome = Some(Outcome::Roulette { pocket: 3 });
        let summary = round_summary(&round, &cfg, t0());
        assert!(summary.outcome.is_none());
    }

    #[test]
    fn test_settings_validation() {
        let mut s = RoomSettings::default();
        assert!(s.validate().is_ok());

        s.lock_buffer_secs = 60;
        assert!(s.validate().is_err(), "buffer must fit inside betting window");

        s = RoomSettings::default();
        s.max_bet = 5;
        assert!(s.validate().is_err(), "max below min");

        s = RoomSettings::default();
        s.min_bet = 0;
        assert!(s.validate().is_err(), "min must be positive");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(RoundError::RoomClosed.error_code(), "ROOM_CLOSED");
        assert_eq!(RoundError::Locked.error_code(), "LOCKED");
        assert_eq!(
            RoundError::Wallet(WalletError::InsufficientFunds {
                available: 5,
                required: 10
            })
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(
            RoundError::BetOutOfRange {
                min: 1,
                max: 2,
                amount: 3
            }
            .error_code(),
            "BET_OUT_OF_RANGE"
        );
    }
}
