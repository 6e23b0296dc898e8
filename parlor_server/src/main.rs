//! Multi-room casino server.
//!
//! Boots the database (with schema bootstrap), seeds default rooms on first
//! run, starts the round scheduler, and serves the HTTP API until CTRL+C.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use log::info;
use pico_args::Arguments;

use parlor::db::Database;
use parlor::games::GameKind;
use parlor::round::{BetIntake, RoundEngine};
use parlor::scheduler::Scheduler;
use parlor::users::UserDirectory;
use parlor::wallet::WalletManager;
use parlor_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run a multi-room casino server

USAGE:
  parlor_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  ADMIN_TOKEN              Shared secret for admin endpoints (required)
  METRICS_BIND             Prometheus scrape address (optional)
  SCHEDULER_TICK_MS        Scheduler tick interval    [default: 1000]
  SEED_DEFAULT_ROOMS       Create one room per game on first run [default: true]
  ROOM_BETTING_SECS        Default betting window     [default: 60]
  ROOM_LOCK_BUFFER_SECS    Default lock buffer        [default: 3]
  ROOM_REVEAL_SECS         Default reveal window      [default: 5]
  ROOM_MIN_BET             Default table minimum      [default: 10]
  ROOM_MAX_BET             Default table maximum      [default: 100000]
";

/// Default rooms created on an empty deployment, one per game
const DEFAULT_ROOMS: [(&str, GameKind); 4] = [
    ("Baccarat One", GameKind::Baccarat),
    ("Roulette One", GameKind::Roulette),
    ("Sic Bo One", GameKind::SicBo),
    ("Lucky Numbers", GameKind::Lotto),
];

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let db_url_override: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind_override, db_url_override)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Metrics exporter listening on {addr}");
    }

    info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
    db.ensure_schema()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to apply schema: {e}"))?;
    info!("Database connected, schema applied");

    // Core components
    let pool = Arc::new(db.pool().clone());
    let wallet = WalletManager::new(pool.clone());
    let users = UserDirectory::new(pool.clone());
    let engine = Arc::new(RoundEngine::new(pool.clone(), wallet.clone()));
    let intake = Arc::new(BetIntake::new(pool.clone(), wallet.clone(), users.clone()));
    let scheduler = Arc::new(Scheduler::new(
        engine.clone(),
        std::time::Duration::from_millis(config.tick_millis),
    ));

    // First-run provisioning: one room per game so the deployment is
    // immediately playable. Admins reshape rooms from there.
    if config.seed_default_rooms {
        let rooms = engine.list_rooms().await?;
        if rooms.is_empty() {
            for (name, game) in DEFAULT_ROOMS {
                match engine.create_room(name, game, &config.room_defaults).await {
                    Ok(room_id) => info!("Seeded room {room_id} '{name}' ({game})"),
                    Err(e) => log::error!("Failed to seed room '{name}': {e}"),
                }
            }
        }
    }

    scheduler.start();
    metrics::scheduler_running(true);

    let state = api::AppState {
        engine,
        intake,
        wallet: Arc::new(wallet),
        users: Arc::new(users),
        scheduler: scheduler.clone(),
        admin_token: config.admin_token.clone(),
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {e}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {e}"))?;

    info!("Shutting down, stopping scheduler...");
    scheduler.stop().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
