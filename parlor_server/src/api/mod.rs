//! HTTP API for the casino round engine.
//!
//! # Architecture
//!
//! - **Axum** router over shared [`AppState`]
//! - **Identity**: players are identified by an `X-User-Id` header checked
//!   against the user directory. Authentication itself (sessions, tokens)
//!   belongs to an upstream gateway and is out of scope here.
//! - **Admin**: privileged endpoints require the `X-Admin-Token` shared
//!   secret.
//!
//! # Endpoints Overview
//!
//! ## Public
//! - `GET /health` - Server health status
//! - `GET /api/v1/rooms` - List rooms with current phase
//! - `GET /api/v1/rooms/{id}` - Room state with countdown timers (polled by clients)
//! - `GET /api/v1/rooms/{id}/history` - Settled round history
//!
//! ## Player (X-User-Id required)
//! - `POST /api/v1/rooms/{id}/bets` - Place a wager on the open round
//! - `GET /api/v1/rooms/{id}/bets` - The caller's wagers on the open round
//! - `DELETE /api/v1/bets/{id}` - Refund a wager before lock
//! - `GET /api/v1/wallet` - Balances
//! - `GET /api/v1/wallet/entries` - Ledger history
//! - `POST /api/v1/wallet/transfer` - Move funds between partitions
//!
//! ## Admin (X-Admin-Token required)
//! - `POST /api/v1/admin/rooms` - Create a room
//! - `PUT /api/v1/admin/rooms/{id}/config` - Replace room settings
//! - `POST /api/v1/admin/rooms/{id}/open` - Open a round now
//! - `POST /api/v1/admin/rounds/{id}/force-settle` - Forced settlement escape hatch
//! - `POST /api/v1/admin/scheduler/start` / `stop` - Pause/resume the driver
//! - `POST /api/v1/admin/users` - Provision a user (with wallet)
//! - `POST /api/v1/admin/users/{id}/adjust` - Balance correction
//! - `GET /api/v1/admin/users/{id}/reconcile` - Ledger-vs-balance audit check

pub mod admin;
pub mod middleware;
pub mod rooms;
pub mod wallet;

use axum::{
    Router,
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
};
use parlor::round::{BetIntake, RoundEngine, RoundError};
use parlor::scheduler::Scheduler;
use parlor::users::UserDirectory;
use parlor::wallet::WalletManager;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RoundEngine>,
    pub intake: Arc<BetIntake>,
    pub wallet: Arc<WalletManager>,
    pub users: Arc<UserDirectory>,
    pub scheduler: Arc<Scheduler>,
    pub admin_token: String,
}

/// Error payload: human text plus the machine-readable code clients switch on
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Map a round error onto an HTTP status and response body
pub(crate) fn round_error_response(e: &RoundError) -> (StatusCode, Json<ErrorResponse>) {
    let code = e.error_code();
    let status = match code {
        "ROOM_NOT_FOUND" | "ROUND_NOT_FOUND" | "BET_NOT_FOUND" => StatusCode::NOT_FOUND,
        "LOCKED" | "ROOM_CLOSED" | "INSUFFICIENT_FUNDS" => StatusCode::CONFLICT,
        "BET_OUT_OF_RANGE" | "INVALID_SELECTION" | "INVALID_SETTINGS" => StatusCode::BAD_REQUEST,
        "UNKNOWN_USER" => StatusCode::UNAUTHORIZED,
        "USER_BANNED" => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.client_message(),
            code: code.to_string(),
        }),
    )
}

/// Create the complete API router with all endpoints and middleware
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/rooms", get(rooms::list_rooms))
        .route("/api/v1/rooms/{room_id}", get(rooms::get_room_state))
        .route("/api/v1/rooms/{room_id}/history", get(rooms::get_history));

    let player_routes = Router::new()
        .route(
            "/api/v1/rooms/{room_id}/bets",
            post(rooms::place_bet).get(rooms::my_bets),
        )
        .route("/api/v1/bets/{bet_id}", delete(rooms::refund_bet))
        .route("/api/v1/wallet", get(wallet::get_wallet))
        .route("/api/v1/wallet/entries", get(wallet::get_entries))
        .route("/api/v1/wallet/transfer", post(wallet::transfer))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::identity_middleware,
        ));

    let admin_routes = Router::new()
        .route("/api/v1/admin/rooms", post(admin::create_room))
        .route(
            "/api/v1/admin/rooms/{room_id}/config",
            put(admin::set_room_config),
        )
        .route("/api/v1/admin/rooms/{room_id}/open", post(admin::open_round))
        .route(
            "/api/v1/admin/rounds/{round_id}/force-settle",
            post(admin::force_settle),
        )
        .route(
            "/api/v1/admin/scheduler/start",
            post(admin::start_scheduler),
        )
        .route("/api/v1/admin/scheduler/stop", post(admin::stop_scheduler))
        .route("/api/v1/admin/users", post(admin::create_user))
        .route(
            "/api/v1/admin/users/{user_id}/adjust",
            post(admin::adjust_balance),
        )
        .route(
            "/api/v1/admin/users/{user_id}/reconcile",
            get(admin::reconcile_user),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::admin_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(player_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
