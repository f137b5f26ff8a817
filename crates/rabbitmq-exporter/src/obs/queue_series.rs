//! Per-queue depth gauges.
//!
//! The three families (total, ready, unacknowledged) share one mutex. A poll
//! is merged under a single lock acquisition and `/metrics` renders under the
//! same lock, so a scrape sees all of a poll's values or none of them.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;
use std::sync::{Mutex, MutexGuard};

use rabbitmq_exporter_core::error::{ExporterError, Result};
use rabbitmq_exporter_core::QueueRecord;

use super::metrics::{escape_label, write_header, Collector};

pub const QUEUE_MESSAGES: &str = "rabbitmq_individual_queue_messages";
pub const QUEUE_MESSAGES_READY: &str = "rabbitmq_individual_queue_messages_ready";
pub const QUEUE_MESSAGES_UNACKNOWLEDGED: &str = "rabbitmq_individual_queue_messages_unacknowledged";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueKey {
    pub host: String,
    pub vhost: String,
    pub name: String,
}

impl QueueKey {
    pub fn new(host: &str, vhost: &str, name: &str) -> Self {
        Self {
            host: host.to_string(),
            vhost: vhost.to_string(),
            name: name.to_string(),
        }
    }

    // Label keys in sorted order: host, name, vhost.
    fn labels(&self) -> String {
        format!(
            "host=\"{}\",name=\"{}\",vhost=\"{}\"",
            escape_label(&self.host),
            escape_label(&self.name),
            escape_label(&self.vhost)
        )
    }
}

/// The three counters of one queue, read together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueSample {
    pub total: u64,
    pub ready: u64,
    pub unacknowledged: u64,
}

/// What one merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyReport {
    pub applied: usize,
    pub pruned: usize,
    /// Distinct keys held after the merge.
    pub tracked: usize,
}

#[derive(Default)]
struct Series {
    total: BTreeMap<QueueKey, u64>,
    ready: BTreeMap<QueueKey, u64>,
    unacknowledged: BTreeMap<QueueKey, u64>,
}

impl Series {
    fn remove(&mut self, key: &QueueKey) {
        self.total.remove(key);
        self.ready.remove(key);
        self.unacknowledged.remove(key);
    }
}

#[derive(Default)]
pub struct QueueSeries {
    inner: Mutex<Series>,
}

impl QueueSeries {
    pub fn new() -> Self {
        Self::default()
    }

    // Readers never mutate, so a poisoned lock still holds consistent data.
    fn read(&self) -> MutexGuard<'_, Series> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Overwrite the counters of every record, all in one exclusion window.
    ///
    /// With `prune_stale`, keys under `host` that are absent from `records`
    /// are dropped in the same window. Without it nothing is ever removed.
    pub fn apply(&self, host: &str, records: &[QueueRecord], prune_stale: bool) -> Result<ApplyReport> {
        // A writer panicked mid-merge; refuse to build on top of it.
        let mut s = self
            .inner
            .lock()
            .map_err(|_| ExporterError::Internal("queue series lock poisoned".into()))?;

        let mut seen = HashSet::with_capacity(records.len());
        for r in records {
            let key = QueueKey::new(host, &r.vhost, &r.name);
            s.total.insert(key.clone(), r.total_messages);
            s.ready.insert(key.clone(), r.ready_messages);
            s.unacknowledged.insert(key.clone(), r.unacknowledged_messages);
            seen.insert(key);
        }

        let mut pruned = 0;
        if prune_stale {
            let stale: Vec<QueueKey> = s
                .total
                .keys()
                .filter(|k| k.host == host && !seen.contains(*k))
                .cloned()
                .collect();
            for key in &stale {
                s.remove(key);
            }
            pruned = stale.len();
        }

        Ok(ApplyReport {
            applied: records.len(),
            pruned,
            tracked: s.total.len(),
        })
    }

    pub fn sample(&self, key: &QueueKey) -> Option<QueueSample> {
        let s = self.read();
        Some(QueueSample {
            total: *s.total.get(key)?,
            ready: *s.ready.get(key)?,
            unacknowledged: *s.unacknowledged.get(key)?,
        })
    }

    /// Every key with its three counters, ordered by key.
    pub fn snapshot(&self) -> Vec<(QueueKey, QueueSample)> {
        let s = self.read();
        s.total
            .iter()
            .filter_map(|(k, &total)| {
                Some((
                    k.clone(),
                    QueueSample {
                        total,
                        ready: *s.ready.get(k)?,
                        unacknowledged: *s.unacknowledged.get(k)?,
                    },
                ))
            })
            .collect()
    }

    /// Entries per family as (total, ready, unacknowledged).
    pub fn family_lens(&self) -> (usize, usize, usize) {
        let s = self.read();
        (s.total.len(), s.ready.len(), s.unacknowledged.len())
    }

    pub fn len(&self) -> usize {
        self.read().total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn render_family(out: &mut String, name: &str, help: &str, values: &BTreeMap<QueueKey, u64>) {
    write_header(out, name, help, "gauge");
    for (key, v) in values {
        let _ = writeln!(out, "{}{{{}}} {}", name, key.labels(), v);
    }
}

impl Collector for QueueSeries {
    fn families(&self) -> Vec<&'static str> {
        vec![QUEUE_MESSAGES, QUEUE_MESSAGES_READY, QUEUE_MESSAGES_UNACKNOWLEDGED]
    }

    fn render(&self, out: &mut String) {
        let s = self.read();
        render_family(out, QUEUE_MESSAGES, "Total messages in this queue", &s.total);
        render_family(out, QUEUE_MESSAGES_READY, "Ready messages in this queue", &s.ready);
        render_family(
            out,
            QUEUE_MESSAGES_UNACKNOWLEDGED,
            "Unacknowledged messages in this queue",
            &s.unacknowledged,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(vhost: &str, name: &str, total: u64, ready: u64, unack: u64) -> QueueRecord {
        QueueRecord {
            name: name.into(),
            vhost: vhost.into(),
            total_messages: total,
            ready_messages: ready,
            unacknowledged_messages: unack,
        }
    }

    #[test]
    fn unacknowledged_uses_real_vhost() {
        let s = QueueSeries::new();
        s.apply("http://mq", &[rec("billing", "invoices", 4, 1, 3)], false).unwrap();

        let key = QueueKey::new("http://mq", "billing", "invoices");
        assert_eq!(s.sample(&key).unwrap().unacknowledged, 3);
        assert!(s.sample(&QueueKey::new("http://mq", "/", "invoices")).is_none());
    }

    #[test]
    fn prune_only_touches_same_host() {
        let s = QueueSeries::new();
        s.apply("http://a", &[rec("/", "q1", 1, 1, 0)], false).unwrap();
        s.apply("http://b", &[rec("/", "q1", 2, 2, 0), rec("/", "q2", 1, 0, 1)], false).unwrap();

        let report = s.apply("http://b", &[rec("/", "q2", 0, 0, 0)], true).unwrap();
        assert_eq!(report.pruned, 1);
        assert_eq!(report.tracked, 2);
        assert!(s.sample(&QueueKey::new("http://a", "/", "q1")).is_some());
        assert!(s.sample(&QueueKey::new("http://b", "/", "q1")).is_none());
        assert_eq!(s.family_lens(), (2, 2, 2));
    }

    #[test]
    fn render_escapes_labels() {
        let s = QueueSeries::new();
        s.apply("http://mq", &[rec("/", "we\"ird", 7, 7, 0)], false).unwrap();

        let mut out = String::new();
        s.render(&mut out);
        assert!(out.contains("# TYPE rabbitmq_individual_queue_messages gauge\n"));
        assert!(out.contains(
            "rabbitmq_individual_queue_messages{host=\"http://mq\",name=\"we\\\"ird\",vhost=\"/\"} 7\n"
        ));
    }
}
