//! Prometheus metrics for the casino server.
//!
//! Exposed on a dedicated scrape address (env `METRICS_BIND`); everything a
//! dashboard needs to spot a stuck room or a burst of rejected wagers.

#![allow(dead_code)] // Public API surface for operational dashboards

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus exporter on the given scrape address.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))
}

/// Record an accepted wager, labeled by its selection kind.
pub fn bets_placed_total(kind: &str) {
    metrics::counter!("bets_placed_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record a rejected wager with its machine-readable code.
pub fn bet_rejections_total(code: &str) {
    metrics::counter!("bet_rejections_total",
        "code" => code.to_string()
    )
    .increment(1);
}

/// Record a wager refunded before lock.
pub fn bets_refunded_total() {
    metrics::counter!("bets_refunded_total").increment(1);
}

/// Record an admin forced settlement.
pub fn forced_settlements_total() {
    metrics::counter!("forced_settlements_total").increment(1);
}

/// Set whether the scheduler loop is running.
pub fn scheduler_running(running: bool) {
    metrics::gauge!("scheduler_running").set(if running { 1.0 } else { 0.0 });
}

/// Set the number of configured rooms.
pub fn configured_rooms(count: usize) {
    metrics::gauge!("configured_rooms").set(count as f64);
}

/// Record wager amount distribution.
pub fn bet_amount(amount: i64) {
    metrics::histogram!("bet_amount").record(amount as f64);
}
