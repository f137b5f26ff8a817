//! Shared application state for the exporter.
//!
//! Built once at startup: registers every metric family (failure is fatal)
//! and hands out the handles the poll loop and the HTTP routes share.

use std::sync::Arc;

use rabbitmq_exporter_core::error::Result;

use crate::config::ExporterConfig;
use crate::obs::{ExporterMetrics, MetricsRegistry};
use crate::poller::PollStatus;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ExporterConfig,
    registry: MetricsRegistry,
    metrics: ExporterMetrics,
    status: Arc<PollStatus>,
}

impl AppState {
    /// Returns Result so main can exit with a logged error instead of a panic.
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        let mut registry = MetricsRegistry::new();
        let metrics = ExporterMetrics::register(&mut registry)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                metrics,
                status: Arc::new(PollStatus::default()),
            }),
        })
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.inner.registry
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.inner.metrics
    }

    pub fn status(&self) -> Arc<PollStatus> {
        Arc::clone(&self.inner.status)
    }

    pub fn is_ready(&self) -> bool {
        self.inner.status.is_ready()
    }
}
