//! Queue entries as returned by `GET /api/queues`.
//!
//! The management API reports dozens of fields per queue; only the identity
//! and the three depth counters are kept. Everything else is ignored so the
//! model does not break when the broker adds fields.

use serde::{Deserialize, Deserializer};

use crate::error::{ExporterError, Result};

/// One queue as observed in a single poll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueRecord {
    /// Queue name, unique within its vhost.
    pub name: String,
    /// Owning virtual host.
    pub vhost: String,
    /// Ready plus unacknowledged messages.
    #[serde(rename = "messages", default, deserialize_with = "count_or_zero")]
    pub total_messages: u64,
    #[serde(rename = "messages_ready", default, deserialize_with = "count_or_zero")]
    pub ready_messages: u64,
    #[serde(
        rename = "messages_unacknowledged",
        default,
        deserialize_with = "count_or_zero"
    )]
    pub unacknowledged_messages: u64,
}

// Queues that have not emitted stats yet come back with the counters missing
// or set to null.
fn count_or_zero<'de, D>(de: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(de)?.unwrap_or(0))
}

/// Decode a `/api/queues` response body.
pub fn decode_queue_list(body: &[u8]) -> Result<Vec<QueueRecord>> {
    serde_json::from_slice(body).map_err(|e| ExporterError::Decode(format!("queue list: {e}")))
}
