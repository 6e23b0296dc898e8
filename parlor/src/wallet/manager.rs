//! Wallet manager implementation with double-entry ledger.

use super::{
    errors::{WalletError, WalletResult},
    models::{BetId, EntryType, LedgerEntry, Partition, RoundId, Wallet},
};
use crate::users::UserId;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::str::FromStr;
use std::sync::Arc;

/// Wallet manager
#[derive(Clone)]
pub struct WalletManager {
    pool: Arc<PgPool>,
}

impl WalletManager {
    /// Create a new wallet manager
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Get wallet balances for a user
    ///
    /// # Arguments
    ///
    /// * `user_id` - User ID
    ///
    /// # Returns
    ///
    /// * `WalletResult<Wallet>` - Wallet information or error
    pub async fn get_wallet(&self, user_id: UserId) -> WalletResult<Wallet> {
        let row = sqlx::query(
            r#"
            SELECT user_id, wallet_balance, bank_balance, updated_at
            FROM wallets
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(WalletError::WalletNotFound(user_id))?;

        Ok(Wallet {
            user_id: row.get("user_id"),
            wallet_balance: row.get("wallet_balance"),
            bank_balance: row.get("bank_balance"),
            updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
        })
    }

    /// Credit a balance partition.
    ///
    /// Opens its own transaction; see [`Self::credit_in_tx`] for the variant
    /// that joins a caller-owned transaction (settlement uses that one).
    ///
    /// # Errors
    ///
    /// * `WalletError::InvalidAmount` - amount is not positive
    /// * `WalletError::DuplicateEntry` - idempotency key already used
    /// * `WalletError::BalanceOverflow` - credit would overflow the balance
    #[allow(clippy::too_many_arguments)]
    pub async fn credit(
        &self,
        user_id: UserId,
        partition: Partition,
        amount: i64,
        entry_type: EntryType,
        round_id: Option<RoundId>,
        bet_id: Option<BetId>,
        idempotency_key: String,
        memo: Option<String>,
    ) -> WalletResult<i64> {
        let mut tx = self.pool.begin().await?;
        let new_balance = self
            .credit_in_tx(
                &mut tx,
                user_id,
                partition,
                amount,
                entry_type,
                round_id,
                bet_id,
                idempotency_key,
                memo,
            )
            .await?;
        tx.commit().await?;
        Ok(new_balance)
    }

    /// Debit a balance partition.
    ///
    /// Fails with `InsufficientFunds` when the resulting balance would be
    /// negative; the check and the mutation are one conditional update, so
    /// concurrent debits on the same user cannot overdraw.
    #[allow(clippy::too_many_arguments)]
    pub async fn debit(
        &self,
        user_id: UserId,
        partition: Partition,
        amount: i64,
        entry_type: EntryType,
        round_id: Option<RoundId>,
        bet_id: Option<BetId>,
        idempotency_key: String,
        memo: Option<String>,
    ) -> WalletResult<i64> {
        let mut tx = self.pool.begin().await?;
        let new_balance = self
            .debit_in_tx(
                &mut tx,
                user_id,
                partition,
                amount,
                entry_type,
                round_id,
                bet_id,
                idempotency_key,
                memo,
            )
            .await?;
        tx.commit().await?;
        Ok(new_balance)
    }

    /// Credit inside a caller-owned transaction.
    ///
    /// The balance mutation and its ledger entry commit or roll back together
    /// with whatever else the caller does in the same transaction.
    #[allow(clippy::too_many_arguments)]
    pub async fn credit_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
        partition: Partition,
        amount: i64,
        entry_type: EntryType,
        round_id: Option<RoundId>,
        bet_id: Option<BetId>,
        idempotency_key: String,
        memo: Option<String>,
    ) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        let column = partition.column();

        // Row lock so the read-check-write below is serialized per user.
        let current = sqlx::query(&format!(
            "SELECT {column} AS balance FROM wallets WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(WalletError::WalletNotFound(user_id))?;

        let current_balance: i64 = current.get("balance");
        let new_balance = current_balance
            .checked_add(amount)
            .ok_or(WalletError::BalanceOverflow)?;

        sqlx::query(&format!(
            "UPDATE wallets SET {column} = $1, updated_at = NOW() WHERE user_id = $2"
        ))
        .bind(new_balance)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        self.append_entry(
            tx,
            user_id,
            entry_type,
            partition,
            amount,
            new_balance,
            round_id,
            bet_id,
            idempotency_key,
            memo,
        )
        .await?;

        Ok(new_balance)
    }

    /// Debit inside a caller-owned transaction.
    ///
    /// The balance check and mutation are a single conditional update
    /// (`WHERE {balance} >= amount`), so losing a race never overdraws.
    #[allow(clippy::too_many_arguments)]
    pub async fn debit_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
        partition: Partition,
        amount: i64,
        entry_type: EntryType,
        round_id: Option<RoundId>,
        bet_id: Option<BetId>,
        idempotency_key: String,
        memo: Option<String>,
    ) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        let column = partition.column();

        let updated = sqlx::query(&format!(
            "UPDATE wallets
             SET {column} = {column} - $1, updated_at = NOW()
             WHERE user_id = $2 AND {column} >= $1
             RETURNING {column} AS balance"
        ))
        .bind(amount)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

        let new_balance: i64 = match updated {
            Some(row) => row.get("balance"),
            None => {
                // Either the wallet is missing or the balance is short.
                let check = sqlx::query(&format!(
                    "SELECT {column} AS balance FROM wallets WHERE user_id = $1"
                ))
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await?;

                match check {
                    Some(row) => {
                        return Err(WalletError::InsufficientFunds {
                            available: row.get("balance"),
                            required: amount,
                        });
                    }
                    None => return Err(WalletError::WalletNotFound(user_id)),
                }
            }
        };

        self.append_entry(
            tx,
            user_id,
            entry_type,
            partition,
            -amount,
            new_balance,
            round_id,
            bet_id,
            idempotency_key,
            memo,
        )
        .await?;

        Ok(new_balance)
    }

    /// Move funds between two partitions of the same user.
    ///
    /// One transaction, two ledger entries (a debit on `from` and a credit on
    /// `to`, keyed `{key}_out` / `{key}_in`).
    pub async fn transfer(
        &self,
        user_id: UserId,
        from: Partition,
        to: Partition,
        amount: i64,
        idempotency_key: String,
    ) -> WalletResult<Wallet> {
        if from == to {
            return Err(WalletError::InvalidAmount(amount));
        }

        let mut tx = self.pool.begin().await?;

        self.debit_in_tx(
            &mut tx,
            user_id,
            from,
            amount,
            EntryType::Transfer,
            None,
            None,
            format!("{idempotency_key}_out"),
            Some(format!("transfer {from} -> {to}")),
        )
        .await?;

        self.credit_in_tx(
            &mut tx,
            user_id,
            to,
            amount,
            EntryType::Transfer,
            None,
            None,
            format!("{idempotency_key}_in"),
            Some(format!("transfer {from} -> {to}")),
        )
        .await?;

        tx.commit().await?;

        self.get_wallet(user_id).await
    }

    /// Signed administrative correction on one partition.
    pub async fn admin_adjust(
        &self,
        user_id: UserId,
        partition: Partition,
        delta: i64,
        idempotency_key: String,
        memo: Option<String>,
    ) -> WalletResult<i64> {
        if delta == 0 {
            return Err(WalletError::InvalidAmount(delta));
        }

        if delta > 0 {
            self.credit(
                user_id,
                partition,
                delta,
                EntryType::AdminAdjust,
                None,
                None,
                idempotency_key,
                memo,
            )
            .await
        } else {
            self.debit(
                user_id,
                partition,
                -delta,
                EntryType::AdminAdjust,
                None,
                None,
                idempotency_key,
                memo,
            )
            .await
        }
    }

    /// Append a ledger entry. Never called without a balance mutation in the
    /// same transaction, or the reconciliation invariant breaks.
    #[allow(clippy::too_many_arguments)]
    async fn append_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
        entry_type: EntryType,
        partition: Partition,
        delta: i64,
        balance_after: i64,
        round_id: Option<RoundId>,
        bet_id: Option<BetId>,
        idempotency_key: String,
        memo: Option<String>,
    ) -> WalletResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO ledger_entries (user_id, entry_type, partition, delta, balance_after, round_id, bet_id, idempotency_key, memo)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(entry_type.to_string())
        .bind(partition.to_string())
        .bind(delta)
        .bind(balance_after)
        .bind(round_id)
        .bind(bet_id)
        .bind(&idempotency_key)
        .bind(memo)
        .fetch_one(&mut **tx)
        .await;

        match result {
            Ok(row) => Ok(row.get("id")),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(WalletError::DuplicateEntry(idempotency_key))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get ledger entries for a user, newest first
    ///
    /// # Arguments
    ///
    /// * `user_id` - User ID
    /// * `limit` - Maximum number of entries to return
    pub async fn get_entries(&self, user_id: UserId, limit: i64) -> WalletResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, entry_type, partition, delta, balance_after, round_id, bet_id, idempotency_key, memo, created_at
            FROM ledger_entries
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| LedgerEntry {
                id: row.get("id"),
                user_id: row.get("user_id"),
                entry_type: EntryType::from_str(&row.get::<String, _>("entry_type"))
                    .unwrap_or(EntryType::Transfer),
                partition: Partition::from_str(&row.get::<String, _>("partition"))
                    .unwrap_or(Partition::Wallet),
                delta: row.get("delta"),
                balance_after: row.get("balance_after"),
                round_id: row.get("round_id"),
                bet_id: row.get("bet_id"),
                idempotency_key: row.get("idempotency_key"),
                memo: row.get("memo"),
                created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            })
            .collect();

        Ok(entries)
    }

    /// Verify the reconciliation invariant for one user: the sum of ledger
    /// deltas per partition must equal the partition's current balance.
    pub async fn verify_reconciliation(&self, user_id: UserId) -> WalletResult<bool> {
        let wallet = self.get_wallet(user_id).await?;

        for partition in [Partition::Wallet, Partition::Bank] {
            let row = sqlx::query(
                "SELECT COALESCE(SUM(delta), 0) AS total
                 FROM ledger_entries
                 WHERE user_id = $1 AND partition = $2",
            )
            .bind(user_id)
            .bind(partition.to_string())
            .fetch_one(self.pool.as_ref())
            .await?;

            let total: i64 = row.get("total");
            if total != wallet.balance(partition) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
