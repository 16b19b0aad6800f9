//! Async tick loop driving a `LiveMonitor`.
//!
//! The loop owns no monitor state: it borrows the monitor mutably, so the tick
//! handler is the only code touching the buffer while it runs.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{LiveMonitor, MonitorStats, TickOutcome};
use crate::types::AnalysisResult;

/// Periodic driver for one monitor.
///
/// Built with [`new()`](MonitorLoop::new), optionally given a publisher and a
/// tick limit, then consumed by [`run()`](MonitorLoop::run).
#[derive(Debug, Clone)]
pub struct MonitorLoop {
    interval: Duration,
    cancel_token: CancellationToken,
    publisher: Option<mpsc::Sender<AnalysisResult>>,
    max_ticks: Option<u64>,
}

impl MonitorLoop {
    pub fn new(interval: Duration, cancel_token: CancellationToken) -> Self {
        Self {
            interval,
            cancel_token,
            publisher: None,
            max_ticks: None,
        }
    }

    /// Send every published result to `tx`.
    ///
    /// Results are dropped (with a warning) when the receiver lags far enough
    /// to fill the channel, so a slow consumer never stalls the ticks.
    #[must_use]
    pub fn with_publisher(mut self, tx: mpsc::Sender<AnalysisResult>) -> Self {
        self.publisher = Some(tx);
        self
    }

    /// Stop after this many ticks.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Run until cancellation, the tick limit, or source exhaustion.
    ///
    /// Starts the monitor if it is idle and leaves it stopped (buffer kept)
    /// on return. Returns the monitor's final statistics.
    pub async fn run(self, monitor: &mut LiveMonitor) -> MonitorStats {
        monitor.start();

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = 0u64;

        info!(
            sensor_id = %monitor.sensor_id(),
            source = %monitor.source_name(),
            interval_ms = self.interval.as_millis() as u64,
            "Live monitor started"
        );

        loop {
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!(sensor_id = %monitor.sensor_id(), "Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {}
            }

            match monitor.tick() {
                TickOutcome::Published(result) => self.publish(result),
                TickOutcome::SourceExhausted => break,
                TickOutcome::Idle
                | TickOutcome::NoSample
                | TickOutcome::Buffering { .. }
                | TickOutcome::Failed(_) => {}
            }

            ticks += 1;
        }

        monitor.stop();
        let stats = monitor.stats().clone();
        info!(
            sensor_id = %monitor.sensor_id(),
            ticks = stats.ticks,
            samples = stats.samples,
            analyses = stats.analyses,
            failures = stats.failures,
            "Live monitor stopped"
        );
        stats
    }

    fn publish(&self, result: AnalysisResult) {
        let Some(tx) = &self.publisher else {
            return;
        };
        match tx.try_send(result) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(result)) => {
                warn!(sensor_id = %result.sensor_id, "Result channel full; dropping result");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Result receiver dropped");
            }
        }
    }
}

/// Run a monitor on its own task, handing it back with its statistics when
/// the loop ends.
pub fn spawn_monitor(
    mut monitor: LiveMonitor,
    driver: MonitorLoop,
) -> tokio::task::JoinHandle<(LiveMonitor, MonitorStats)> {
    tokio::spawn(async move {
        let stats = driver.run(&mut monitor).await;
        (monitor, stats)
    })
}
