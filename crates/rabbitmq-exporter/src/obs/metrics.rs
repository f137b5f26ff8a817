//! Minimal metrics registry for the exporter.
//!
//! Counter/gauge/histogram families with dynamic labels backed by `DashMap`.
//! Labels are flattened into sorted key vectors to keep deterministic
//! ordering. Histogram buckets are fixed in microseconds to avoid floating
//! point math.

use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rabbitmq_exporter_core::error::{ExporterError, Result};

use super::queue_series::QueueSeries;

/// Helper to escape label values.
pub(crate) fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

pub(crate) fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, escape_help(help));
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

pub(crate) fn label_string(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn sorted_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Something the registry can render.
pub trait Collector: Send + Sync {
    /// Metric family names this collector writes.
    fn families(&self) -> Vec<&'static str>;
    /// Append the families in Prometheus text exposition format.
    fn render(&self, out: &mut String);
}

/// Set of collectors rendered by `/metrics`.
///
/// Built once at startup, then shared read-only.
#[derive(Default)]
pub struct MetricsRegistry {
    collectors: Vec<Arc<dyn Collector>>,
    names: HashSet<&'static str>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collector. Fails on an invalid or already registered family name.
    pub fn register(&mut self, collector: Arc<dyn Collector>) -> Result<()> {
        let families = collector.families();
        for name in &families {
            if !valid_metric_name(name) {
                return Err(ExporterError::Registration(format!("invalid metric name: {name:?}")));
            }
            if self.names.contains(name) {
                return Err(ExporterError::Registration(format!("duplicate metric: {name}")));
            }
        }
        let mut seen = HashSet::new();
        for name in &families {
            if !seen.insert(*name) {
                return Err(ExporterError::Registration(format!("duplicate metric: {name}")));
            }
        }
        self.names.extend(families);
        self.collectors.push(collector);
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for c in &self.collectors {
            c.render(&mut out);
        }
        out
    }
}

pub struct CounterVec {
    name: &'static str,
    help: &'static str,
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    pub fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            map: DashMap::new(),
        }
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(sorted_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for a label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&sorted_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl Collector for CounterVec {
    fn families(&self) -> Vec<&'static str> {
        vec![self.name]
    }

    fn render(&self, out: &mut String) {
        write_header(out, self.name, self.help, "counter");
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", self.name, label_string(r.key()), val);
        }
    }
}

/// Unlabeled gauge.
pub struct Gauge {
    name: &'static str,
    help: &'static str,
    value: AtomicI64,
}

impl Gauge {
    pub fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            value: AtomicI64::new(0),
        }
    }

    pub fn set(&self, v: i64) {
        self.value.store(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Collector for Gauge {
    fn families(&self) -> Vec<&'static str> {
        vec![self.name]
    }

    fn render(&self, out: &mut String) {
        write_header(out, self.name, self.help, "gauge");
        let _ = writeln!(out, "{} {}", self.name, self.get());
    }
}

// Fixed Buckets in Microseconds (µs)
// 1ms, 5ms, 10ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s
const BUCKETS_MICROS: [u64; 9] = [
    1_000, 5_000, 10_000, 50_000, 100_000, 250_000, 500_000, 1_000_000, 5_000_000,
];

struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

impl Default for AtomicHistogram {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }
}

pub struct HistogramVec {
    name: &'static str,
    help: &'static str,
    map: DashMap<Vec<(String, String)>, AtomicHistogram>,
}

impl HistogramVec {
    pub fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            map: DashMap::new(),
        }
    }

    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(sorted_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        // Cumulative: every bucket at or above the value.
        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of observations for a label set.
    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&sorted_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl Collector for HistogramVec {
    fn families(&self) -> Vec<&'static str> {
        vec![self.name]
    }

    /// Render in Prometheus text exposition format (unit: microseconds).
    fn render(&self, out: &mut String) {
        write_header(out, self.name, self.help, "histogram");
        let name = self.name;
        for r in self.map.iter() {
            let hist = r.value();
            let label_str = label_string(r.key());
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{},", label_str)
            };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, label_str, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, label_str, count);
        }
    }
}

/// Handles to every family the exporter writes to.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub queues: Arc<QueueSeries>,
    pub polls: Arc<CounterVec>,
    pub poll_duration: Arc<HistogramVec>, // In Microseconds
    pub queues_tracked: Arc<Gauge>,
}

impl ExporterMetrics {
    /// Create all families and register them. Any failure here is a startup error.
    pub fn register(registry: &mut MetricsRegistry) -> Result<Self> {
        let m = Self {
            queues: Arc::new(QueueSeries::new()),
            polls: Arc::new(CounterVec::new(
                "rabbitmq_exporter_polls_total",
                "Management API polls by outcome",
            )),
            poll_duration: Arc::new(HistogramVec::new(
                "rabbitmq_exporter_poll_duration_micros",
                "Duration of one fetch-and-apply cycle in microseconds",
            )),
            queues_tracked: Arc::new(Gauge::new(
                "rabbitmq_exporter_queues_tracked",
                "Distinct queues currently exported",
            )),
        };

        registry.register(m.queues.clone())?;
        registry.register(m.polls.clone())?;
        registry.register(m.poll_duration.clone())?;
        registry.register(m.queues_tracked.clone())?;
        Ok(m)
    }
}
