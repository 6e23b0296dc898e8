//! Identity and admin middleware.
//!
//! Player identity arrives as an `X-User-Id` header set by the upstream
//! gateway that owns authentication; this layer only answers "does this user
//! exist and may they play" via the user directory, and injects the user ID
//! into request extensions for downstream handlers.
//!
//! Admin endpoints require the `X-Admin-Token` shared secret.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use parlor::users::UserError;

use super::AppState;

/// Header carrying the player's user ID
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the admin shared secret
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Validate the caller's user ID and inject it into request extensions.
///
/// # Behavior
///
/// - **Success**: user exists and is not banned -> `user_id: i64` injected
/// - **Missing/invalid header**: `401 Unauthorized`
/// - **Unknown user**: `401 Unauthorized`
/// - **Banned user**: `403 Forbidden`
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id: i64 = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match state.users.ensure_active(user_id).await {
        Ok(()) => {
            request.extensions_mut().insert(user_id);
            Ok(next.run(request).await)
        }
        Err(UserError::Banned(_)) => Err(StatusCode::FORBIDDEN),
        Err(UserError::UnknownUser(_)) => Err(StatusCode::UNAUTHORIZED),
        Err(UserError::Database(e)) => {
            tracing::error!("Identity lookup failed: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Require the admin shared secret on privileged endpoints.
pub async fn admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    match presented {
        Some(token) if token == state.admin_token => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}
