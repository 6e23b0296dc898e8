//! Admin API handlers.
//!
//! Everything here goes through the engine's guarded transition paths: a
//! forced settlement is the same conditional update the scheduler performs,
//! never a direct field write, so the exactly-once and reconciliation
//! invariants hold for operator actions too.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use parlor::games::{GameKind, Outcome};
use parlor::round::RoomSettings;
use parlor::wallet::Partition;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{AppState, ErrorResponse, round_error_response};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub game: GameKind,
    #[serde(flatten)]
    pub settings: RoomSettings,
}

#[derive(Debug, Deserialize)]
pub struct ForceSettleRequest {
    /// Optional forced outcome; only valid while the round is still betting
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustBalanceRequest {
    pub partition: Partition,
    pub delta: i64,
    pub memo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub room_id: i64,
}

/// Create a room.
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .engine
        .create_room(&request.name, request.game, &request.settings)
        .await
        .map(|room_id| Json(CreateRoomResponse { room_id }))
        .map_err(|e| round_error_response(&e))
}

/// Replace a room's settings. Applies from the next round onward; the round
/// currently running keeps the timing it opened with.
pub async fn set_room_config(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Json(settings): Json<RoomSettings>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    state
        .engine
        .set_room_config(room_id, &settings)
        .await
        .map(|()| Json(json!({ "ok": true })))
        .map_err(|e| round_error_response(&e))
}

/// Open a round for a room immediately (normally the scheduler's job).
pub async fn open_round(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine.open_round(room_id).await {
        Ok(Some(round)) => Ok(Json(json!({
            "round_id": round.id,
            "day": round.day,
            "day_seq": round.day_seq,
        }))),
        // A round was already open; nothing to do.
        Ok(None) => Ok(Json(json!({ "round_id": null }))),
        Err(e) => Err(round_error_response(&e)),
    }
}

/// Operator escape hatch for a stuck round: draw (or take the override) and
/// settle right now, through the same guarded transitions as the scheduler.
pub async fn force_settle(
    State(state): State<AppState>,
    Path(round_id): Path<i64>,
    Json(request): Json<ForceSettleRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine.force_settle(round_id, request.outcome).await {
        Ok(settled) => {
            if settled {
                metrics::forced_settlements_total();
                tracing::warn!("Round {round_id} force-settled by operator");
            }
            Ok(Json(json!({ "settled": settled })))
        }
        Err(e) => Err(round_error_response(&e)),
    }
}

/// Resume the scheduler loop.
pub async fn start_scheduler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let started = state.scheduler.start();
    metrics::scheduler_running(true);
    Json(json!({ "started": started, "running": state.scheduler.is_running() }))
}

/// Pause the scheduler loop. Rounds freeze in place until it resumes; no
/// state is lost.
pub async fn stop_scheduler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stopped = state.scheduler.stop().await;
    metrics::scheduler_running(false);
    Json(json!({ "stopped": stopped, "running": state.scheduler.is_running() }))
}

/// Provision a user together with their wallet row.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    match state.users.create_user(&request.username).await {
        Ok(user_id) => Ok(Json(json!({ "user_id": user_id }))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
                code: "INTERNAL".to_string(),
            }),
        )),
    }
}

/// Check the reconciliation invariant for one user: the sum of ledger deltas
/// per partition must equal the partition's current balance.
pub async fn reconcile_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    match state.wallet.verify_reconciliation(user_id).await {
        Ok(consistent) => {
            if !consistent {
                tracing::error!("Reconciliation mismatch for user {user_id}");
            }
            Ok(Json(json!({ "consistent": consistent })))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.client_message(),
                code: "INTERNAL".to_string(),
            }),
        )),
    }
}

/// Signed balance correction with an audit memo.
pub async fn adjust_balance(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<AdjustBalanceRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let key = format!("admin_adjust_{}", uuid::Uuid::new_v4());
    match state
        .wallet
        .admin_adjust(user_id, request.partition, request.delta, key, request.memo)
        .await
    {
        Ok(balance) => {
            tracing::warn!(
                "Admin adjusted user {} {} partition by {}",
                user_id,
                request.partition,
                request.delta
            );
            Ok(Json(json!({ "balance": balance })))
        }
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.client_message(),
                code: "ADJUST_FAILED".to_string(),
            }),
        )),
    }
}
