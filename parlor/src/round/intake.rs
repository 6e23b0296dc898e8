//! Bet intake: validates and records wagers against the open round.
//!
//! The race that matters here: a wager submitted microseconds before the
//! lock boundary must not land after the outcome is drawn. Intake therefore
//! re-validates phase and clock INSIDE its transaction, while holding the
//! room's SHARED advisory lock: concurrent wagers proceed together, but the
//! draw transition (exclusive lock) can never interleave with an in-flight
//! wager. The wallet debit, the bet row, and the ledger entry commit or roll
//! back as one unit.

use chrono::Utc;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use super::engine::{fetch_open_round, fetch_room, fetch_round, lock_room_shared};
use super::models::{Bet, LivePhase, RoomId, RoundError, RoundResult, live_phase};
use crate::games::{BetSelection, PayoutRule, SettlementTable};
use crate::users::{UserDirectory, UserId};
use crate::wallet::models::BetId;
use crate::wallet::{EntryType, Partition, WalletManager};

/// Wager intake for all rooms
#[derive(Clone)]
pub struct BetIntake {
    pool: Arc<PgPool>,
    wallet: WalletManager,
    users: UserDirectory,
}

impl BetIntake {
    /// Create a new bet intake
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `wallet` - Wallet manager for the stake debit
    /// * `users` - User directory for the exists/banned check
    pub fn new(pool: Arc<PgPool>, wallet: WalletManager, users: UserDirectory) -> Self {
        Self {
            pool,
            wallet,
            users,
        }
    }

    /// Place a wager on a room's open round.
    ///
    /// Atomically: debit the user's wallet partition, insert the bet row,
    /// append the ledger entry. Nothing is written when any check fails.
    ///
    /// # Errors
    ///
    /// * `RoundError::RoomClosed` - room disabled by an administrator
    /// * `RoundError::BetOutOfRange` - amount outside [min, max]
    /// * `RoundError::InvalidSelection` - selection foreign to the room's game
    /// * `RoundError::Locked` - past the lock boundary (or no open round)
    /// * `RoundError::Wallet(InsufficientFunds)` - stake exceeds balance
    pub async fn place_bet(
        &self,
        user_id: UserId,
        room_id: RoomId,
        selection: BetSelection,
        amount: i64,
    ) -> RoundResult<Bet> {
        self.users.ensure_active(user_id).await?;

        let mut tx = self.pool.begin().await?;
        lock_room_shared(&mut tx, room_id).await?;

        let config = fetch_room(&mut *tx, room_id).await?;
        if !config.enabled {
            return Err(RoundError::RoomClosed);
        }
        if amount < config.min_bet || amount > config.max_bet {
            return Err(RoundError::BetOutOfRange {
                min: config.min_bet,
                max: config.max_bet,
                amount,
            });
        }

        let table = SettlementTable::for_room(config.game, &config.payout_rules);
        if !table.allows(&selection) {
            return Err(RoundError::InvalidSelection);
        }

        // Phase and clock re-checked here, at transaction time, not just at
        // request entry.
        let round = fetch_open_round(&mut *tx, room_id)
            .await?
            .ok_or(RoundError::Locked)?;
        let now = Utc::now();
        if live_phase(&round, &config, now) != LivePhase::Open {
            return Err(RoundError::Locked);
        }

        let row = sqlx::query(
            "INSERT INTO bets (round_id, user_id, kind, pick, amount)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, created_at",
        )
        .bind(round.id)
        .bind(user_id)
        .bind(selection.storage_kind())
        .bind(selection.pick())
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        let bet_id: i64 = row.get("id");
        let created_at = row.get::<chrono::NaiveDateTime, _>("created_at").and_utc();

        self.wallet
            .debit_in_tx(
                &mut tx,
                user_id,
                Partition::Wallet,
                amount,
                EntryType::BetPlaced,
                Some(round.id),
                Some(bet_id),
                format!("bet_{bet_id}"),
                Some(format!(
                    "{} bet on {}",
                    config.game,
                    selection.storage_kind()
                )),
            )
            .await?;

        tx.commit().await?;

        log::debug!(
            "User {} bet {} on {} in room {} round {}",
            user_id,
            amount,
            selection.storage_kind(),
            room_id,
            round.id
        );

        Ok(Bet {
            id: bet_id,
            round_id: round.id,
            user_id,
            selection,
            amount,
            created_at,
        })
    }

    /// Cancel one of the caller's bets while its round is still open, and
    /// re-credit the stake. Deleting the row and crediting the wallet are one
    /// transaction; the deleted bet can never be settled.
    ///
    /// # Returns
    ///
    /// * `RoundResult<i64>` - New wallet balance
    pub async fn refund_bet(&self, user_id: UserId, bet_id: BetId) -> RoundResult<i64> {
        let mut tx = self.pool.begin().await?;

        // Learn the room before taking its lock, then re-read under the lock.
        let peek = sqlx::query(
            "SELECT r.room_id
             FROM bets b JOIN rounds r ON r.id = b.round_id
             WHERE b.id = $1 AND b.user_id = $2",
        )
        .bind(bet_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RoundError::BetNotFound(bet_id))?;
        let room_id: i64 = peek.get("room_id");

        lock_room_shared(&mut tx, room_id).await?;

        // Row lock so a duplicate refund request blocks here and then sees
        // the deleted row.
        let bet_row = sqlx::query(
            "SELECT round_id, amount FROM bets WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(bet_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RoundError::BetNotFound(bet_id))?;

        let round_id: i64 = bet_row.get("round_id");
        let amount: i64 = bet_row.get("amount");

        let config = fetch_room(&mut *tx, room_id).await?;
        let round = fetch_round(&mut *tx, round_id).await?;
        if live_phase(&round, &config, Utc::now()) != LivePhase::Open {
            return Err(RoundError::Locked);
        }

        sqlx::query("DELETE FROM bets WHERE id = $1")
            .bind(bet_id)
            .execute(&mut *tx)
            .await?;

        let new_balance = self
            .wallet
            .credit_in_tx(
                &mut tx,
                user_id,
                Partition::Wallet,
                amount,
                EntryType::Refund,
                Some(round_id),
                Some(bet_id),
                format!("refund_{bet_id}"),
                Some(format!("bet {bet_id} refunded before lock")),
            )
            .await?;

        tx.commit().await?;

        log::debug!("User {user_id} refunded bet {bet_id} ({amount})");

        Ok(new_balance)
    }

    /// The caller's bets on one round
    pub async fn bets_for_user(
        &self,
        user_id: UserId,
        round_id: i64,
    ) -> RoundResult<Vec<Bet>> {
        let rows = sqlx::query(
            "SELECT id, round_id, user_id, kind, pick, amount, created_at
             FROM bets
             WHERE round_id = $1 AND user_id = $2
             ORDER BY id",
        )
        .bind(round_id)
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter()
            .map(|row| {
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
            })
            .collect()
    }
}
