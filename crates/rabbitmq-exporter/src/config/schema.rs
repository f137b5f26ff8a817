use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use hyper::Uri;
use rabbitmq_exporter_core::error::{ExporterError, Result};

#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub broker: BrokerSection,
    pub server: ServerSection,
    pub poll: PollSection,
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        self.broker.validate()?;
        self.server.validate()?;
        self.poll.validate()?;
        Ok(())
    }
}

/// Management API endpoint and credentials.
#[derive(Clone)]
pub struct BrokerSection {
    /// Base URL, `http://host[:port]`, trailing `/` already stripped.
    pub host: String,
    pub user: String,
    pub password: String,
    pub timeout_ms: Option<u64>,
}

// Keep the password out of logs.
impl fmt::Debug for BrokerSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerSection")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl BrokerSection {
    /// Full URL of the "list all queues" endpoint.
    pub fn queues_url(&self) -> String {
        format!("{}/api/queues", self.host)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        let uri: Uri = self.queues_url().parse().map_err(|e| {
            ExporterError::InvalidConfig(format!("RABBITMQ_HOST is not a valid url: {e}"))
        })?;
        if uri.scheme_str() != Some("http") {
            return Err(ExporterError::InvalidConfig(
                "RABBITMQ_HOST must use the http scheme".into(),
            ));
        }
        if uri.authority().is_none() {
            return Err(ExporterError::InvalidConfig(
                "RABBITMQ_HOST must include a host".into(),
            ));
        }
        if let Some(ms) = self.timeout_ms {
            if !(100..=60_000).contains(&ms) {
                return Err(ExporterError::InvalidConfig(
                    "RABBITMQ_TIMEOUT_MS must be between 100 and 60000".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ServerSection {
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            ExporterError::InvalidConfig(format!("EXPORTER_LISTEN must be a socket address: {e}"))
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }
}

#[derive(Debug, Clone)]
pub struct PollSection {
    pub interval_ms: u64,
    /// Drop series whose queue is missing from the latest successful poll.
    pub prune_stale: bool,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            prune_stale: false,
        }
    }
}

impl PollSection {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(100..=3_600_000).contains(&self.interval_ms) {
            return Err(ExporterError::InvalidConfig(
                "EXPORTER_POLL_INTERVAL_MS must be between 100 and 3600000".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn default_listen() -> String {
    "0.0.0.0:9051".into()
}
pub(crate) fn default_poll_interval_ms() -> u64 {
    2000
}
