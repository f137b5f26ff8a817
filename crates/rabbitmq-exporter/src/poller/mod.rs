//! The fetch-and-apply cycle and the periodic loop driving it.
//!
//! Each cycle fetches from the broker with no lock held, then merges the
//! records into [`QueueSeries`](crate::obs::QueueSeries) in one exclusion
//! window. A failed fetch leaves every series untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use rabbitmq_exporter_core::error::{ExporterError, Result};

use crate::app_state::AppState;
use crate::broker::QueueSource;
use crate::obs::{ApplyReport, ExporterMetrics};

/// Poll health shared with `/readyz`.
#[derive(Debug, Default)]
pub struct PollStatus {
    ready: AtomicBool,
}

impl PollStatus {
    /// Set after the first successful cycle; never cleared.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    fn mark_ready(&self) {
        self.ready.store(true, Ordering::Relaxed);
    }
}

pub struct Updater {
    source: Arc<dyn QueueSource>,
    metrics: ExporterMetrics,
    status: Arc<PollStatus>,
    interval: Duration,
    prune_stale: bool,
}

impl Updater {
    pub fn new(source: Arc<dyn QueueSource>, state: &AppState) -> Self {
        let poll = &state.cfg().poll;
        Self {
            source,
            metrics: state.metrics().clone(),
            status: state.status(),
            interval: poll.interval(),
            prune_stale: poll.prune_stale,
        }
    }

    /// Run one cycle and record its outcome. A failure is logged here; the
    /// returned error is informational since the series were not touched.
    pub async fn poll_once(&self) -> Result<ApplyReport> {
        let started = Instant::now();
        let result = self.fetch_and_apply().await;
        self.metrics.poll_duration.observe(&[], started.elapsed());

        match &result {
            Ok(report) => {
                self.metrics.polls.inc(&[("outcome", "success")]);
                self.metrics
                    .queues_tracked
                    .set(i64::try_from(report.tracked).unwrap_or(i64::MAX));
                self.status.mark_ready();
                tracing::debug!(
                    queues = report.applied,
                    pruned = report.pruned,
                    tracked = report.tracked,
                    "queue metrics updated"
                );
            }
            Err(e) => {
                self.metrics.polls.inc(&[("outcome", e.outcome())]);
                tracing::warn!(outcome = e.outcome(), error = %e, "poll skipped, keeping previous values");
            }
        }
        result
    }

    async fn fetch_and_apply(&self) -> Result<ApplyReport> {
        let records = self.source.fetch_queues().await?;
        self.metrics
            .queues
            .apply(self.source.host(), &records, self.prune_stale)
    }

    /// Poll forever. Cycles never overlap; ticks missed while a slow fetch
    /// is in flight are dropped rather than replayed.
    pub async fn run(self) {
        let mut tick = tokio::time::interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            let _ = self.poll_once().await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Wait for the poll task to end and turn that into an error. The loop never
/// returns on its own, so reaching the end means it panicked or was aborted.
pub async fn supervise(handle: JoinHandle<()>) -> ExporterError {
    let err = match handle.await {
        Ok(()) => ExporterError::Internal("poll loop exited".into()),
        Err(e) if e.is_panic() => ExporterError::Internal(format!("poll loop panicked: {e}")),
        Err(e) => ExporterError::Internal(format!("poll loop stopped: {e}")),
    };
    tracing::error!(error = %err, "poll loop ended, queue metrics would go stale");
    err
}
