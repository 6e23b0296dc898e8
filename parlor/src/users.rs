//! User directory.
//!
//! Identity (registration, sessions, bans) is owned by an external system;
//! the engine only needs to answer "does this user exist and may they play".
//! `create_user` exists for provisioning and tests, and creates the wallet
//! row in the same transaction so a user can never exist without a wallet.

use sqlx::{PgPool, Row};
use std::sync::Arc;
use thiserror::Error;

/// User ID type
pub type UserId = i64;

/// User directory errors
#[derive(Debug, Error)]
pub enum UserError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// User does not exist
    #[error("Unknown user {0}")]
    UnknownUser(UserId),

    /// User exists but is banned
    #[error("User {0} is banned")]
    Banned(UserId),
}

/// Result type for directory operations
pub type UserResult<T> = Result<T, UserError>;

/// Lookup/provisioning facade over the users table
#[derive(Clone)]
pub struct UserDirectory {
    pool: Arc<PgPool>,
}

impl UserDirectory {
    /// Create a new user directory
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Check that a user exists and is allowed to play.
    ///
    /// # Errors
    ///
    /// * `UserError::UnknownUser` - no such user
    /// * `UserError::Banned` - user exists but is banned
    pub async fn ensure_active(&self, user_id: UserId) -> UserResult<()> {
        let row = sqlx::query("SELECT is_banned FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(UserError::UnknownUser(user_id))?;

        if row.get::<bool, _>("is_banned") {
            return Err(UserError::Banned(user_id));
        }

        Ok(())
    }

    /// Create a user together with their (empty) wallet row.
    ///
    /// # Returns
    ///
    /// * `UserResult<UserId>` - New user's ID
    pub async fn create_user(&self, username: &str) -> UserResult<UserId> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("INSERT INTO users (username) VALUES ($1) RETURNING id")
            .bind(username)
            .fetch_one(&mut *tx)
            .await?;
        let user_id: i64 = row.get("id");

        sqlx::query("INSERT INTO wallets (user_id) VALUES ($1)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user_id)
    }

    /// Set or clear a user's ban flag.
    pub async fn set_banned(&self, user_id: UserId, banned: bool) -> UserResult<()> {
        let result = sqlx::query("UPDATE users SET is_banned = $1 WHERE id = $2")
            .bind(banned)
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UnknownUser(user_id));
        }

        Ok(())
    }
}
