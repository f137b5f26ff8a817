//! Broker-facing side: where queue records come from.

pub mod client;

use async_trait::async_trait;

use rabbitmq_exporter_core::error::Result;
use rabbitmq_exporter_core::QueueRecord;

pub use client::ManagementClient;

/// A source of queue records, polled once per cycle.
#[async_trait]
pub trait QueueSource: Send + Sync {
    /// Value of the `host` label on every series fed from this source.
    fn host(&self) -> &str;
    async fn fetch_queues(&self) -> Result<Vec<QueueRecord>>;
}
