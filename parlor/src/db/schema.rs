//! Schema DDL applied by [`super::Database::ensure_schema`].
//!
//! Every statement is idempotent so the bootstrap can run on every startup.
//! Two constraints here are load-bearing for the engine, not just hygiene:
//!
//! - `idx_rounds_single_open` enforces at most one non-settled round per room,
//!   so "the current round" is always a keyed lookup, never a
//!   latest-timestamp guess.
//! - `rounds (room_id, day, day_seq)` unique key backs the day-scoped
//!   sequence numbers shown to players.

/// Full schema, executed as one multi-statement batch.
pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    is_banned BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS wallets (
    user_id BIGINT PRIMARY KEY REFERENCES users(id),
    wallet_balance BIGINT NOT NULL DEFAULT 0 CHECK (wallet_balance >= 0),
    bank_balance BIGINT NOT NULL DEFAULT 0 CHECK (bank_balance >= 0),
    updated_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS ledger_entries (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users(id),
    entry_type TEXT NOT NULL,
    partition TEXT NOT NULL,
    delta BIGINT NOT NULL,
    balance_after BIGINT NOT NULL,
    round_id BIGINT,
    bet_id BIGINT,
    idempotency_key TEXT NOT NULL UNIQUE,
    memo TEXT,
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_ledger_user_time
    ON ledger_entries (user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS rooms (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    game TEXT NOT NULL,
    min_bet BIGINT NOT NULL,
    max_bet BIGINT NOT NULL,
    betting_secs BIGINT NOT NULL,
    lock_buffer_secs BIGINT NOT NULL,
    reveal_secs BIGINT NOT NULL,
    enabled BOOLEAN NOT NULL DEFAULT TRUE,
    seed_override BIGINT,
    payout_rules JSONB NOT NULL DEFAULT '{}',
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS rounds (
    id BIGSERIAL PRIMARY KEY,
    room_id BIGINT NOT NULL REFERENCES rooms(id),
    day DATE NOT NULL,
    day_seq BIGINT NOT NULL,
    phase TEXT NOT NULL,
    started_at TIMESTAMP NOT NULL,
    reveal_started_at TIMESTAMP,
    ended_at TIMESTAMP,
    outcome JSONB,
    payout_settled BOOLEAN NOT NULL DEFAULT FALSE,
    UNIQUE (room_id, day, day_seq)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_rounds_single_open
    ON rounds (room_id) WHERE phase <> 'settled';

CREATE INDEX IF NOT EXISTS idx_rounds_room_history
    ON rounds (room_id, day DESC, day_seq DESC);

CREATE TABLE IF NOT EXISTS bets (
    id BIGSERIAL PRIMARY KEY,
    round_id BIGINT NOT NULL REFERENCES rounds(id),
    user_id BIGINT NOT NULL REFERENCES users(id),
    kind TEXT NOT NULL,
    pick SMALLINT,
    amount BIGINT NOT NULL CHECK (amount > 0),
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_bets_round ON bets (round_id);
CREATE INDEX IF NOT EXISTS idx_bets_user ON bets (user_id, created_at DESC);
"#;
