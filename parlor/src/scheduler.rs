//! Scheduler loop: the process-wide ticking driver.
//!
//! One tokio task ticks at a fixed short interval and asks the round engine
//! to check/advance every room. The scheduler holds no game state: all
//! correctness lives in the engine's guarded transitions, which is also what
//! makes an overlapping scheduler instance (redeploy, operator mistake)
//! harmless.
//!
//! The "only one loop" guarantee is owned by this object rather than a
//! process global: `start` on an already-running scheduler is a no-op, and
//! `stop` is clean and idempotent, so the admin API can pause and resume.

use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::round::RoundEngine;

struct RunningLoop {
    handle: JoinHandle<()>,
    shutdown: Arc<Notify>,
}

/// Ticking driver advancing every room's round state machine
pub struct Scheduler {
    engine: Arc<RoundEngine>,
    tick: Duration,
    running: Mutex<Option<RunningLoop>>,
}

impl Scheduler {
    /// Create a scheduler (not yet running)
    ///
    /// # Arguments
    ///
    /// * `engine` - Round engine to drive
    /// * `tick` - Interval between advancement sweeps (1s in production)
    pub fn new(engine: Arc<RoundEngine>, tick: Duration) -> Self {
        Self {
            engine,
            tick,
            running: Mutex::new(None),
        }
    }

    /// Start the loop. Idempotent: returns false (and changes nothing) when
    /// the loop is already running.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().expect("scheduler lock poisoned");

        if let Some(current) = running.as_ref()
            && !current.handle.is_finished()
        {
            return false;
        }

        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(run_loop(
            self.engine.clone(),
            self.tick,
            shutdown.clone(),
        ));

        *running = Some(RunningLoop { handle, shutdown });
        log::info!("Scheduler started (tick every {:?})", self.tick);
        true
    }

    /// Stop the loop and wait for the in-flight sweep to finish. Returns
    /// false when the loop was not running.
    pub async fn stop(&self) -> bool {
        let current = {
            let mut running = self.running.lock().expect("scheduler lock poisoned");
            running.take()
        };

        let Some(current) = current else {
            return false;
        };

        current.shutdown.notify_one();
        if let Err(e) = current.handle.await {
            log::error!("Scheduler task join failed: {e}");
        }
        log::info!("Scheduler stopped");
        true
    }

    /// Whether the loop is currently running
    pub fn is_running(&self) -> bool {
        let running = self.running.lock().expect("scheduler lock poisoned");
        running
            .as_ref()
            .map(|r| !r.handle.is_finished())
            .unwrap_or(false)
    }
}

async fn run_loop(engine: Arc<RoundEngine>, tick: Duration, shutdown: Arc<Notify>) {
    let mut ticker = interval(tick);
    // A slow sweep should not be followed by a burst of catch-up ticks.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = ticker.tick() => sweep(&engine).await,
        }
    }
}

/// One sweep: advance every room independently. A room's failure is logged
/// and must never stall the other rooms.
async fn sweep(engine: &RoundEngine) {
    let room_ids = match engine.room_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            log::error!("Scheduler could not list rooms: {e}");
            return;
        }
    };

    for room_id in room_ids {
        if let Err(e) = engine.check_advance(room_id, Utc::now()).await {
            // Repeated failures here mean a stuck, unsettled round carrying
            // real financial exposure; keep shouting until an operator acts.
            log::error!("Room {room_id}: advance failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::WalletManager;
    use sqlx::postgres::PgPoolOptions;

    fn test_scheduler() -> Scheduler {
        // Lazy pool: no connection is made until a query runs, which is
        // enough to exercise start/stop lifecycle without a database.
        let pool = Arc::new(
            PgPoolOptions::new()
                .connect_lazy("postgres://localhost/parlor_lifecycle_test")
                .expect("lazy pool"),
        );
        let wallet = WalletManager::new(pool.clone());
        let engine = Arc::new(RoundEngine::new(pool, wallet));
        Scheduler::new(engine, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let scheduler = test_scheduler();
        assert!(scheduler.start());
        assert!(!scheduler.start(), "second start must be a no-op");
        assert!(scheduler.is_running());
        assert!(scheduler.stop().await);
    }

    #[tokio::test]
    async fn test_stop_then_restart() {
        let scheduler = test_scheduler();
        assert!(!scheduler.stop().await, "stop before start is a no-op");
        assert!(scheduler.start());
        assert!(scheduler.stop().await);
        assert!(!scheduler.is_running());
        assert!(scheduler.start(), "scheduler must restart after a stop");
        assert!(scheduler.stop().await);
    }
}
