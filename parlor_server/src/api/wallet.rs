//! Wallet API handlers: balances, ledger history, partition transfers.

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::Json,
};
use parlor::wallet::{LedgerEntry, Partition, Wallet, WalletError};
use serde::Deserialize;

use super::{AppState, ErrorResponse};

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from: Partition,
    pub to: Partition,
    pub amount: i64,
    /// Client-supplied key so retries are absorbed instead of re-applied
    pub idempotency_key: String,
}

fn wallet_error_response(e: &WalletError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match e {
        WalletError::InsufficientFunds { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_FUNDS"),
        WalletError::DuplicateEntry(_) => (StatusCode::CONFLICT, "DUPLICATE_REQUEST"),
        WalletError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
        WalletError::WalletNotFound(_) => (StatusCode::NOT_FOUND, "WALLET_NOT_FOUND"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    };
    (
        status,
        Json(ErrorResponse {
            error: e.client_message(),
            code: code.to_string(),
        }),
    )
}

/// The caller's balances.
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
) -> Result<Json<Wallet>, (StatusCode, Json<ErrorResponse>)> {
    state
        .wallet
        .get_wallet(user_id)
        .await
        .map(Json)
        .map_err(|e| wallet_error_response(&e))
}

/// The caller's ledger history, newest first (default 50, cap 200).
pub async fn get_entries(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<LedgerEntry>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    state
        .wallet
        .get_entries(user_id, limit)
        .await
        .map(Json)
        .map_err(|e| wallet_error_response(&e))
}

/// Move funds between the caller's wallet and bank partitions.
pub async fn transfer(
    State(state): State<AppState>,
    Extension(user_id): Extension<i64>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<Wallet>, (StatusCode, Json<ErrorResponse>)> {
    state
        .wallet
        .transfer(
            user_id,
            request.from,
            request.to,
            request.amount,
            request.idempotency_key,
        )
        .await
        .map(Json)
        .map_err(|e| wallet_error_response(&e))
}
