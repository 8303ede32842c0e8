//! Scheduled background recomputation of the global snapshot.
//!
//! One tokio task per [`RefreshLoop`]: every period it sweeps expired
//! cache entries, recomputes the global snapshot through
//! [`MetricsService::refresh_global`], and broadcasts the result. A tick
//! that fails logs and waits for the next period; the loop itself never
//! dies. [`RefreshLoop::tick`] exposes one cycle directly so tests can
//! drive the loop body without timers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::publish::{METRICS_EVENT, Publisher};
use crate::service::MetricsService;

/// Default recomputation cadence.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(30);

/// Periodic snapshot recomputation and broadcast.
pub struct RefreshLoop {
    metrics: Arc<MetricsService>,
    publisher: Arc<dyn Publisher>,
    period: Duration,
    stop_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshLoop {
    /// Creates a stopped loop. A zero period falls back to
    /// [`DEFAULT_PERIOD`].
    #[must_use]
    pub fn new(metrics: Arc<MetricsService>, publisher: Arc<dyn Publisher>, period: Duration) -> Self {
        let period = if period.is_zero() {
            DEFAULT_PERIOD
        } else {
            period
        };
        Self {
            metrics,
            publisher,
            period,
            stop_tx: None,
            handle: None,
        }
    }

    /// Whether the background task is currently running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawns the background task. Calling while already running is a
    /// logged no-op; at most one task exists per loop.
    ///
    /// The first recomputation lands one full period after start, not
    /// immediately, so startup cost stays off the request path.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            log::warn!("Refresh loop already running, ignoring start");
            return;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let metrics = Arc::clone(&self.metrics);
        let publisher = Arc::clone(&self.publisher);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The interval yields its first tick immediately; consume it
            // so the loop waits one full period before recomputing.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_tick(metrics.as_ref(), publisher.as_ref()).await;
                    }
                    _ = stop_rx.changed() => {
                        log::debug!("Refresh loop shutting down");
                        break;
                    }
                }
            }
        });

        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);
        log::info!(
            "Metrics refresh loop started, period {}s",
            self.period.as_secs()
        );
    }

    /// Signals the background task and waits for it to finish. A tick in
    /// flight when the signal arrives completes before the task exits.
    /// Stopping a stopped loop is a no-op.
    pub async fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        if let Err(e) = handle.await {
            log::warn!("Refresh task ended abnormally: {e}");
        }
        log::info!("Metrics refresh loop stopped");
    }

    /// Runs one refresh cycle: sweep, recompute, broadcast.
    pub async fn tick(&self) {
        run_tick(self.metrics.as_ref(), self.publisher.as_ref()).await;
    }
}

async fn run_tick(metrics: &MetricsService, publisher: &dyn Publisher) {
    let swept = metrics.sweep_cache();
    if swept > 0 {
        log::debug!("Swept {swept} expired snapshot entries");
    }
    match metrics.refresh_global().await {
        Ok(snapshot) => match serde_json::to_value(snapshot.as_ref()) {
            Ok(payload) => publisher.broadcast(METRICS_EVENT, payload),
            Err(e) => log::error!("Failed to serialize snapshot for broadcast: {e}"),
        },
        Err(e) => log::error!("Scheduled metrics refresh failed: {e}"),
    }
}
