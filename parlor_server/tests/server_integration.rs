//! Router-level integration tests.
//!
//! These exercise the middleware and routing without a database: the pool is
//! lazy, so anything that would touch storage either never gets that far
//! (identity/admin rejections) or is not asserted on here.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use parlor::round::{BetIntake, RoundEngine};
use parlor::scheduler::Scheduler;
use parlor::users::UserDirectory;
use parlor::wallet::WalletManager;
use parlor_server::api::{AppState, create_router};

const ADMIN_TOKEN: &str = "test_admin_token_0123456789abcdef";

fn test_state() -> AppState {
    let pool = Arc::new(
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/parlor_router_test")
            .expect("lazy pool"),
    );
    let wallet = WalletManager::new(pool.clone());
    let users = UserDirectory::new(pool.clone());
    let engine = Arc::new(RoundEngine::new(pool.clone(), wallet.clone()));
    let intake = Arc::new(BetIntake::new(pool.clone(), wallet.clone(), users.clone()));
    let scheduler = Arc::new(Scheduler::new(
        engine.clone(),
        std::time::Duration::from_secs(3600),
    ));

    AppState {
        engine,
        intake,
        wallet: Arc::new(wallet),
        users: Arc::new(users),
        scheduler,
        admin_token: ADMIN_TOKEN.to_string(),
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router(test_state());

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_player_routes_require_identity_header() {
    let app = create_router(test_state());

    // No X-User-Id header at all.
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/rooms/1/bets")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"selection": {"kind": "player"}, "amount": 100}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Garbage user ID is rejected before any storage access.
    let response = app
        .oneshot(
            Request::get("/api/v1/wallet")
                .header("x-user-id", "not-a-number")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = create_router(test_state());

    // Missing token.
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/admin/scheduler/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong token.
    let response = app
        .oneshot(
            Request::post("/api/v1/admin/scheduler/start")
                .header("x-admin-token", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_scheduler_lifecycle_via_api() {
    let app = create_router(test_state());

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/admin/scheduler/start")
                .header("x-admin-token", ADMIN_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["started"], true);
    assert_eq!(json["running"], true);

    let response = app
        .oneshot(
            Request::post("/api/v1/admin/scheduler/stop")
                .header("x-admin-token", ADMIN_TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["stopped"], true);
    assert_eq!(json["running"], false);
}
