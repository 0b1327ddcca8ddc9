//! Observability metrics for the reconciliation engine.
//!
//! Metrics are exported via the `metrics` crate facade; wiring a recorder
//! (e.g. a Prometheus exporter) is the embedding process's concern.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `polder_reconcile_passes_total` | Counter | `reconciler` | Reconcile passes per step |
//! | `polder_reconcile_duration_seconds` | Histogram | `reconciler` | Pass duration |
//! | `polder_store_writes_total` | Counter | `reconciler`, `outcome` | Store write outcomes |
//! | `polder_events_logged_total` | Counter | | Change events observed |

use std::time::{Duration, Instant};

/// Metric names as constants for consistency.
pub mod names {
    /// Counter: Reconcile passes per step.
    pub const RECONCILE_PASSES_TOTAL: &str = "polder_reconcile_passes_total";
    /// Histogram: Reconcile pass duration in seconds.
    pub const RECONCILE_DURATION_SECONDS: &str = "polder_reconcile_duration_seconds";
    /// Counter: Store write outcomes (applied, conflict, exists, error).
    pub const STORE_WRITES_TOTAL: &str = "polder_store_writes_total";
    /// Counter: Change events observed by the event logger.
    pub const EVENTS_LOGGED_TOTAL: &str = "polder_events_logged_total";
}

/// Metric label keys.
pub mod labels {
    /// The reconciler a sample belongs to.
    pub const RECONCILER: &str = "reconciler";
    /// Outcome of a store write.
    pub const OUTCOME: &str = "outcome";
}

/// Runs a callback with the elapsed duration when dropped.
///
/// Used to record reconcile durations without threading timing state
/// through every return path.
pub struct TimingGuard<F: FnOnce(Duration)> {
    start: Instant,
    callback: Option<F>,
}

impl<F: FnOnce(Duration)> TimingGuard<F> {
    /// Starts timing; `callback` receives the elapsed time on drop.
    #[must_use]
    pub fn new(callback: F) -> Self {
        Self {
            start: Instant::now(),
            callback: Some(callback),
        }
    }
}

impl<F: FnOnce(Duration)> Drop for TimingGuard<F> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(self.start.elapsed());
        }
    }
}
