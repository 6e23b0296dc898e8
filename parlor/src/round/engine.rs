//! Round state machine: opens rounds, draws outcomes, settles payouts.
//!
//! Every transition follows the same discipline:
//!
//! 1. open a transaction and take the room's EXCLUSIVE advisory lock,
//! 2. perform a conditional update (`WHERE phase = <expected>`): the thread
//!    that loses a race sees zero affected rows and no-ops,
//! 3. perform the transition's side effects (outcome persist, payout
//!    credits) in that same transaction,
//! 4. commit.
//!
//! A failure anywhere aborts the whole transaction, the stored phase stays
//! put, and the next scheduler tick retries. Settlement is therefore
//! exactly-once even across overlapping scheduler instances.

use chrono::{DateTime, Duration, Local, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use super::models::{
    Bet, HistoryItem, LivePhase, Phase, RoomConfig, RoomId, RoomSettings, RoomState, Round,
    RoundError, RoundResult, live_phase, round_summary,
};
use crate::games::{
    self, BetSelection, GameKind, Outcome, OutcomeRng, PayoutRule, SettlementTable,
};
use crate::users::UserId;
use crate::wallet::models::RoundId;
use crate::wallet::{EntryType, Partition, WalletManager};

/// Take a room's exclusive advisory lock for the rest of the transaction.
/// Serializes this room's transitions against each other and against
/// in-flight bet intake (which holds the shared flavor).
pub(crate) async fn lock_room_exclusive(
    tx: &mut Transaction<'_, Postgres>,
    room_id: RoomId,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(room_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Take a room's shared advisory lock for the rest of the transaction.
/// Concurrent wagers hold this together; a transition's exclusive lock
/// waits them out and excludes new ones.
pub(crate) async fn lock_room_shared(
    tx: &mut Transaction<'_, Postgres>,
    room_id: RoomId,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock_shared($1)")
        .bind(room_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn room_from_row(row: &PgRow) -> RoundResult<RoomConfig> {
    let game: GameKind =
        serde_json::from_value(serde_json::Value::String(row.get::<String, _>("game")))?;
    let payout_rules = serde_json::from_value(row.get::<serde_json::Value, _>("payout_rules"))?;
    Ok(RoomConfig {
        id: row.get("id"),
        name: row.get("name"),
        game,
        min_bet: row.get("min_bet"),
        max_bet: row.get("max_bet"),
        betting_secs: row.get("betting_secs"),
        lock_buffer_secs: row.get("lock_buffer_secs"),
        reveal_secs: row.get("reveal_secs"),
        enabled: row.get("enabled"),
        seed_override: row.get("seed_override"),
        payout_rules,
    })
}

fn round_from_row(row: &PgRow) -> RoundResult<Round> {
    let phase = Phase::from_str(&row.get::<String, _>("phase"))
        .map_err(|_| RoundError::RoundNotFound(row.get("id")))?;
    let outcome = match row.get::<Option<serde_json::Value>, _>("outcome") {
        Some(value) => Some(serde_json::from_value(value)?),
        None => None,
    };
    Ok(Round {
        id: row.get("id"),
        room_id: row.get("room_id"),
        day: row.get("day"),
        day_seq: row.get("day_seq"),
        phase,
        started_at: row.get::<chrono::NaiveDateTime, _>("started_at").and_utc(),
        reveal_started_at: row
            .get::<Option<chrono::NaiveDateTime>, _>("reveal_started_at")
            .map(|t| t.and_utc()),
        ended_at: row
            .get::<Option<chrono::NaiveDateTime>, _>("ended_at")
            .map(|t| t.and_utc()),
        outcome,
        payout_settled: row.get("payout_settled"),
    })
}

fn bet_from_row(row: &PgRow) -> RoundResult<Bet> {
    let id: i64 = row.get("id");
    let selection =
        BetSelection::from_parts(&row.get::<String, _>("kind"), row.get("pick"))
            .ok_or(RoundError::CorruptBet(id))?;
    Ok(Bet {
        id,
        round_id: row.get("round_id"),
        user_id: row.get("user_id"),
        selection,
        amount: row.get("amount"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}

const ROOM_COLUMNS: &str = "id, name, game, min_bet, max_bet, betting_secs, lock_buffer_secs, \
                            reveal_secs, enabled, seed_override, payout_rules";

const ROUND_COLUMNS: &str = "id, room_id, day, day_seq, phase, started_at, reveal_started_at, \
                             ended_at, outcome, payout_settled";

/// Load a room's configuration
pub(crate) async fn fetch_room<'c, E>(executor: E, room_id: RoomId) -> RoundResult<RoomConfig>
where
    E: sqlx::PgExecutor<'c>,
{
    let row = sqlx::query(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
        .bind(room_id)
        .fetch_optional(executor)
        .await?
        .ok_or(RoundError::RoomNotFound(room_id))?;
    room_from_row(&row)
}

/// Load a room's open (non-settled) round, if any. The partial unique index
/// guarantees at most one exists.
pub(crate) async fn fetch_open_round<'c, E>(
    executor: E,
    room_id: RoomId,
) -> RoundResult<Option<Round>>
where
    E: sqlx::PgExecutor<'c>,
{
    let row = sqlx::query(&format!(
        "SELECT {ROUND_COLUMNS} FROM rounds WHERE room_id = $1 AND phase <> 'settled'"
    ))
    .bind(room_id)
    .fetch_optional(executor)
    .await?;
    row.as_ref().map(round_from_row).transpose()
}

/// Load a round by ID
pub(crate) async fn fetch_round<'c, E>(executor: E, round_id: RoundId) -> RoundResult<Round>
where
    E: sqlx::PgExecutor<'c>,
{
    let row = sqlx::query(&format!("SELECT {ROUND_COLUMNS} FROM rounds WHERE id = $1"))
        .bind(round_id)
        .fetch_optional(executor)
        .await?
        .ok_or(RoundError::RoundNotFound(round_id))?;
    round_from_row(&row)
}

/// The per-room state machine and orchestrator
#[derive(Clone)]
pub struct RoundEngine {
    pool: Arc<PgPool>,
    wallet: WalletManager,
}

impl RoundEngine {
    /// Create a new round engine
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `wallet` - Wallet manager (settlement folds credits into its own
    ///   transition transaction)
    pub fn new(pool: Arc<PgPool>, wallet: WalletManager) -> Self {
        Self { pool, wallet }
    }

    /// Check a room's clock and advance its round if a phase boundary has
    /// passed. Idempotent: safe to call any number of times per transition,
    /// from any number of processes.
    pub async fn check_advance(&self, room_id: RoomId, now: DateTime<Utc>) -> RoundResult<()> {
        let config = fetch_room(self.pool.as_ref(), room_id).await?;
        let open = fetch_open_round(self.pool.as_ref(), room_id).await?;

        match open {
            None => {
                if config.enabled {
                    self.open_next(&config).await?;
                }
            }
            Some(round) => match round.phase {
                Phase::Betting => {
                    if now >= config.betting_deadline(round.started_at) {
                        self.draw_and_reveal(&config, round.id, None, now).await?;
                    }
                }
                Phase::Revealing => {
                    let reveal_start = round.reveal_started_at.unwrap_or(round.started_at);
                    if now >= reveal_start + Duration::seconds(config.reveal_secs) {
                        let settled = self.settle(&config, round.id, now).await?;
                        if settled && config.enabled {
                            self.open_next(&config).await?;
                        }
                    }
                }
                // The open-round query excludes settled rounds.
                Phase::Settled => {}
            },
        }

        Ok(())
    }

    /// Open a fresh round for a room (admin entry point).
    ///
    /// Returns `None` when the room already has an open round.
    pub async fn open_round(&self, room_id: RoomId) -> RoundResult<Option<Round>> {
        let config = fetch_room(self.pool.as_ref(), room_id).await?;
        if !config.enabled {
            return Err(RoundError::RoomClosed);
        }
        self.open_next(&config).await
    }

    /// Open the next round: new day-scoped sequence number, phase betting.
    async fn open_next(&self, config: &RoomConfig) -> RoundResult<Option<Round>> {
        let mut tx = self.pool.begin().await?;
        lock_room_exclusive(&mut tx, config.id).await?;

        // Single-open-round invariant; the partial unique index backs this
        // check against anything that slips past the advisory lock.
        if fetch_open_round(&mut *tx, config.id).await?.is_some() {
            return Ok(None);
        }

        let now = Utc::now();
        let today = Local::now().date_naive();
        let day_seq: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(day_seq), 0) + 1 FROM rounds WHERE room_id = $1 AND day = $2",
        )
        .bind(config.id)
        .bind(today)
        .fetch_one(&mut *tx)
        .await?;

        let inserted = sqlx::query(
            "INSERT INTO rounds (room_id, day, day_seq, phase, started_at)
             VALUES ($1, $2, $3, 'betting', $4)
             RETURNING id",
        )
        .bind(config.id)
        .bind(today)
        .bind(day_seq)
        .bind(now.naive_utc())
        .fetch_one(&mut *tx)
        .await;

        let round_id: i64 = match inserted {
            Ok(row) => row.get("id"),
            // Another process opened one between our check and insert.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        log::info!(
            "Room {} opened round {} ({} #{})",
            config.id,
            round_id,
            today,
            day_seq
        );

        Ok(Some(Round {
            id: round_id,
            room_id: config.id,
            day: today,
            day_seq,
            phase: Phase::Betting,
            started_at: now,
            reveal_started_at: None,
            ended_at: None,
            outcome: None,
            payout_settled: false,
        }))
    }

    /// Betting -> Revealing: draw the outcome (exactly once) and persist it
    /// atomically with the phase change.
    ///
    /// Returns false when another process already performed the transition.
    async fn draw_and_reveal(
        &self,
        config: &RoomConfig,
        round_id: RoundId,
        override_outcome: Option<Outcome>,
        now: DateTime<Utc>,
    ) -> RoundResult<bool> {
        let outcome = match override_outcome {
            Some(outcome) => outcome,
            None => {
                let mut rng = OutcomeRng::for_room(config.seed_override);
                games::draw(config.game, &config.payout_rules, &mut rng)
            }
        };
        let payload = serde_json::to_value(&outcome)?;

        let mut tx = self.pool.begin().await?;
        lock_room_exclusive(&mut tx, config.id).await?;

        let result = sqlx::query(
            "UPDATE rounds
             SET phase = 'revealing', outcome = $2, reveal_started_at = $3
             WHERE id = $1 AND phase = 'betting' AND outcome IS NULL",
        )
        .bind(round_id)
        .bind(payload)
        .bind(now.naive_utc())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Lost the race; the winner already drew.
            return Ok(false);
        }

        tx.commit().await?;

        log::info!("Room {} round {} revealed outcome", config.id, round_id);
        Ok(true)
    }

    /// Revealing -> Settled: pay out every bet of the round and flip the
    /// settled flag, all in one transaction.
    ///
    /// Returns false when another process already settled the round.
    async fn settle(
        &self,
        config: &RoomConfig,
        round_id: RoundId,
        now: DateTime<Utc>,
    ) -> RoundResult<bool> {
        let mut tx = self.pool.begin().await?;
        lock_room_exclusive(&mut tx, config.id).await?;

        // Claim the round. Exactly one settler can win this update.
        let claimed = sqlx::query(
            "UPDATE rounds
             SET phase = 'settled', payout_settled = TRUE, ended_at = $2
             WHERE id = $1 AND phase = 'revealing' AND payout_settled = FALSE
             RETURNING outcome",
        )
        .bind(round_id)
        .bind(now.naive_utc())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = claimed else {
            return Ok(false);
        };

        let outcome: Outcome = match row.get::<Option<serde_json::Value>, _>("outcome") {
            Some(value) => serde_json::from_value(value)?,
            // A revealing round always has an outcome; abort rather than
            // settle bets against nothing.
            None => return Err(RoundError::OutcomeAlreadyDrawn(round_id)),
        };

        let rows = sqlx::query(
            "SELECT id, round_id, user_id, kind, pick, amount, created_at
             FROM bets WHERE round_id = $1",
        )
        .bind(round_id)
        .fetch_all(&mut *tx)
        .await?;

        let bets: Vec<Bet> = rows
            .iter()
            .map(bet_from_row)
            .collect::<RoundResult<Vec<_>>>()?;

        // Aggregate per user first: one credit (and one ledger entry) per
        // winning user, not per bet.
        let table = SettlementTable::for_room(config.game, &config.payout_rules);
        let mut credits: BTreeMap<UserId, i64> = BTreeMap::new();
        for bet in &bets {
            let credit = table.evaluate(&bet.selection, bet.amount, &outcome);
            if credit > 0 {
                let entry = credits.entry(bet.user_id).or_insert(0);
                *entry = entry.saturating_add(credit);
            }
        }

        let winner_count = credits.len();
        for (user_id, credit) in credits {
            self.wallet
                .credit_in_tx(
                    &mut tx,
                    user_id,
                    Partition::Wallet,
                    credit,
                    EntryType::Payout,
                    Some(round_id),
                    None,
                    format!("payout_{round_id}_{user_id}"),
                    Some(format!("round {round_id} settlement")),
                )
                .await?;
        }

        tx.commit().await?;

        log::info!(
            "Room {} round {} settled: {} bets, {} users credited",
            config.id,
            round_id,
            bets.len(),
            winner_count
        );
        Ok(true)
    }

    /// Admin escape hatch: settle a round now, through the same guarded
    /// transitions as the scheduler path.
    ///
    /// If the round is still in betting, the outcome is drawn first: or
    /// taken from `override_outcome` when given. An override for a round
    /// whose outcome already exists is rejected (the outcome is immutable).
    pub async fn force_settle(
        &self,
        round_id: RoundId,
        override_outcome: Option<Outcome>,
    ) -> RoundResult<bool> {
        let round = fetch_round(self.pool.as_ref(), round_id).await?;
        let config = fetch_room(self.pool.as_ref(), round.room_id).await?;
        let now = Utc::now();

        match round.phase {
            Phase::Betting => {
                if let Some(ref outcome) = override_outcome
                    && outcome.kind() != config.game
                {
                    return Err(RoundError::InvalidSelection);
                }
                self.draw_and_reveal(&config, round_id, override_outcome, now)
                    .await?;
            }
            Phase::Revealing => {
                if override_outcome.is_some() {
                    return Err(RoundError::OutcomeAlreadyDrawn(round_id));
                }
            }
            Phase::Settled => return Ok(false),
        }

        self.settle(&config, round_id, now).await
    }

    /// Snapshot of a room for clients: current round, phase, and timers
    pub async fn room_state(&self, room_id: RoomId, now: DateTime<Utc>) -> RoundResult<RoomState> {
        let config = fetch_room(self.pool.as_ref(), room_id).await?;
        let round = fetch_open_round(self.pool.as_ref(), room_id).await?;

        Ok(RoomState {
            room_id: config.id,
            name: config.name.clone(),
            game: config.game,
            enabled: config.enabled,
            round: round.map(|r| round_summary(&r, &config, now)),
        })
    }

    /// Whether a room's open round currently accepts wagers
    pub async fn is_open_for_bets(&self, room_id: RoomId, now: DateTime<Utc>) -> RoundResult<bool> {
        let config = fetch_room(self.pool.as_ref(), room_id).await?;
        let round = fetch_open_round(self.pool.as_ref(), room_id).await?;
        Ok(config.enabled
            && round
                .map(|r| live_phase(&r, &config, now) == LivePhase::Open)
                .unwrap_or(false))
    }

    /// Settled rounds of a room, newest first
    pub async fn history(&self, room_id: RoomId, limit: i64) -> RoundResult<Vec<HistoryItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ROUND_COLUMNS} FROM rounds
             WHERE room_id = $1 AND phase = 'settled'
             ORDER BY day DESC, day_seq DESC
             LIMIT $2"
        ))
        .bind(room_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|row| {
                let round = round_from_row(row)?;
                Ok(HistoryItem {
                    round_id: round.id,
                    day: round.day,
                    day_seq: round.day_seq,
                    outcome: round.outcome,
                    settled_at: round.ended_at,
                })
            })
            .collect()
    }

    /// All configured rooms
    pub async fn list_rooms(&self) -> RoundResult<Vec<RoomConfig>> {
        let rows = sqlx::query(&format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY id"))
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(room_from_row).collect()
    }

    /// IDs of every room; the scheduler ticks them all (disabled rooms still
    /// need their open rounds driven to settlement)
    pub async fn room_ids(&self) -> RoundResult<Vec<RoomId>> {
        let rows = sqlx::query("SELECT id FROM rooms ORDER BY id")
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// Create a room
    pub async fn create_room(
        &self,
        name: &str,
        game: GameKind,
        settings: &RoomSettings,
    ) -> RoundResult<RoomId> {
        settings.validate().map_err(RoundError::InvalidSettings)?;

        let row = sqlx::query(
            "INSERT INTO rooms (name, game, min_bet, max_bet, betting_secs, lock_buffer_secs,
                                reveal_secs, enabled, seed_override, payout_rules)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING id",
        )
        .bind(name)
        .bind(game.to_string())
        .bind(settings.min_bet)
        .bind(settings.max_bet)
        .bind(settings.betting_secs)
        .bind(settings.lock_buffer_secs)
        .bind(settings.reveal_secs)
        .bind(settings.enabled)
        .bind(settings.seed_override)
        .bind(serde_json::to_value(&settings.payout_rules)?)
        .fetch_one(self.pool.as_ref())
        .await?;

        let room_id: i64 = row.get("id");
        log::info!("Created room {room_id} '{name}' ({game})");
        Ok(room_id)
    }

    /// Replace a room's settings. Takes effect on the next round: transitions
    /// re-read the config, the room's current round keeps its old timing.
    pub async fn set_room_config(
        &self,
        room_id: RoomId,
        settings: &RoomSettings,
    ) -> RoundResult<()> {
        settings.validate().map_err(RoundError::InvalidSettings)?;

        let result = sqlx::query(
            "UPDATE rooms
             SET min_bet = $2, max_bet = $3, betting_secs = $4, lock_buffer_secs = $5,
                 reveal_secs = $6, enabled = $7, seed_override = $8, payout_rules = $9
             WHERE id = $1",
        )
        .bind(room_id)
        .bind(settings.min_bet)
        .bind(settings.max_bet)
        .bind(settings.betting_secs)
        .bind(settings.lock_buffer_secs)
        .bind(settings.reveal_secs)
        .bind(settings.enabled)
        .bind(settings.seed_override)
        .bind(serde_json::to_value(&settings.payout_rules)?)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RoundError::RoomNotFound(room_id));
        }

        log::info!("Room {room_id} configuration updated");
        Ok(())
    }
}
