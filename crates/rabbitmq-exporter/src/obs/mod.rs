//! In-process metrics for the exporter.
//!
//! The queue depth series and the exporter's own poll metrics live in a small
//! registry rendered in the Prometheus text format by the `/metrics` handler.
//! No client library is used; families are plain structs implementing
//! [`metrics::Collector`].

pub mod metrics;
pub mod queue_series;

pub use metrics::{Collector, CounterVec, ExporterMetrics, Gauge, HistogramVec, MetricsRegistry};
pub use queue_series::{ApplyReport, QueueKey, QueueSample, QueueSeries};
