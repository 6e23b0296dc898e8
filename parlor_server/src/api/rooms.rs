//! Room and wager API handlers.
//!
//! Clients poll `GET /api/v1/rooms/{id}` for the current round, phase, and
//! countdown timers; wagers go through `POST /api/v1/rooms/{id}/bets` and are
//! rejected with a machine-readable code when the round is locked, the amount
//! is out of range, or the balance is short.
//!
//! # Examples
//!
//! Place a bet:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/rooms/1/bets \
//!   -H "X-User-Id: 42" \
//!   -H "Content-Type: application/json" \
//!   -d '{"selection": {"kind": "player"}, "amount": 100}'
//! ```

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use parlor::games::BetSelection;
use parlor::round::{HistoryItem, RoomState};
use serde::{Deserialize, Serialize};

use super::{AppState, ErrorResponse, round_error_response};
use crate::metrics;

#[derive(Debug, Serialize)]
pub struct RoomListItem {
    pub id: i64,
    pub name: String,
    pub game: String,
    pub enabled: bool,
    pub min_bet: i64,
    pub max_bet: i64,
    pub betting_secs: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlaceBetRequest {
    pub selection: BetSelection,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct PlaceBetResponse {
    pub bet_id: i64,
    pub round_id: i64,
}

#[derive(Debug, Serialize)]
pub struct BetItem {
    pub bet_id: i64,
    pub selection: BetSelection,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// List all configured rooms.
///
/// Public; used by lobby screens. Room state (phase, timers) is fetched per
/// room via `GET /api/v1/rooms/{id}`.
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomListItem>>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine.list_rooms().await {
        Ok(rooms) => {
            metrics::configured_rooms(rooms.len());
            let items = rooms
                .into_iter()
                .map(|r| RoomListItem {
                    id: r.id,
                    name: r.name,
                    game: r.game.to_string(),
                    enabled: r.enabled,
                    min_bet: r.min_bet,
                    max_bet: r.max_bet,
                    betting_secs: r.betting_secs,
                })
                .collect();
            Ok(Json(items))
        }
        Err(e) => Err(round_error_response(&e)),
    }
}

/// Current state of one room: open round, live phase, countdown timers, and
/// the outcome once it has been revealed.
pub async fn get_room_state(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> Result<Json<RoomState>, (StatusCode, Json<ErrorResponse>)> {
    state
        .engine
        .room_state(room_id, Utc::now())
        .await
        .map(Json)
        .map_err(|e| round_error_response(&e))
}

/// Settled round history for a room, newest first (default 20, cap 100).
pub async fn get_history(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryItem>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    state
        .engine
        .history(room_id, limit)
        .await
        .map(Json)
        .map_err(|e| round_error_response(&e))
}

/// Place a wager on a room's open round.
///
/// # Errors
///
/// `409 LOCKED` past the lock boundary, `409 INSUFFICIENT_FUNDS`,
/// `409 ROOM_CLOSED`, `400 BET_OUT_OF_RANGE`, `400 INVALID_SELECTION`.
pub async fn place_bet(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(room_id): Path<i64>,
    Json(request): Json<PlaceBetRequest>,
) -> Result<Json<PlaceBetResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .intake
        .place_bet(user_id, room_id, request.selection, request.amount)
        .await
    {
        Ok(bet) => {
            metrics::bets_placed_total(bet.selection.storage_kind());
            metrics::bet_amount(bet.amount);
            Ok(Json(PlaceBetResponse {
                bet_id: bet.id,
                round_id: bet.round_id,
            }))
        }
        Err(e) => {
            metrics::bet_rejections_total(e.error_code());
            Err(round_error_response(&e))
        }
    }
}

/// The caller's wagers on the room's open round.
pub async fn my_bets(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(room_id): Path<i64>,
) -> Result<Json<Vec<BetItem>>, (StatusCode, Json<ErrorResponse>)> {
    let room = state
        .engine
        .room_state(room_id, Utc::now())
        .await
        .map_err(|e| round_error_response(&e))?;

    let Some(round) = room.round else {
        return Ok(Json(vec![]));
    };

    state
        .intake
        .bets_for_user(user_id, round.round_id)
        .await
        .map(|bets| {
            Json(
                bets.into_iter()
                    .map(|b| BetItem {
                        bet_id: b.id,
                        selection: b.selection,
                        amount: b.amount,
                    })
                    .collect(),
            )
        })
        .map_err(|e| round_error_response(&e))
}

/// Refund one of the caller's wagers while the round is still open.
pub async fn refund_bet(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Path(bet_id): Path<i64>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    match state.intake.refund_bet(user_id, bet_id).await {
        Ok(balance) => {
            metrics::bets_refunded_total();
            Ok(Json(serde_json::json!({ "balance": balance })))
        }
        Err(e) => Err(round_error_response(&e)),
    }
}
