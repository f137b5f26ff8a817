//! RabbitMQ management API client.
//!
//! One `GET /api/queues` per call with Basic auth. The underlying hyper client
//! is built once so connections are reused across polls. There is no retry:
//! a failed call is reported to the poll loop, which skips that cycle.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::{header, Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use rabbitmq_exporter_core::error::{ExporterError, Result};
use rabbitmq_exporter_core::{decode_queue_list, QueueRecord};

use super::QueueSource;
use crate::config::BrokerSection;

/// Longest slice of a non-200 body carried in the error.
const BODY_EXCERPT_CHARS: usize = 512;

pub struct ManagementClient {
    http: Client<HttpConnector, Empty<Bytes>>,
    host: String,
    queues_uri: Uri,
    authorization: String,
    timeout: Option<Duration>,
}

impl ManagementClient {
    pub fn new(cfg: &BrokerSection) -> Result<Self> {
        let queues_uri: Uri = cfg
            .queues_url()
            .parse()
            .map_err(|e| ExporterError::InvalidConfig(format!("management url: {e}")))?;

        Ok(Self {
            http: Client::builder(TokioExecutor::new()).build_http(),
            host: cfg.host.clone(),
            queues_uri,
            authorization: basic_auth(&cfg.user, &cfg.password),
            timeout: cfg.timeout(),
        })
    }

    pub fn queues_uri(&self) -> &Uri {
        &self.queues_uri
    }

    /// Fetch every queue the credentials can see.
    pub async fn list_queues(&self) -> Result<Vec<QueueRecord>> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.get_queues())
                .await
                .map_err(|_| ExporterError::Transport(format!("request timed out after {limit:?}")))?,
            None => self.get_queues().await,
        }
    }

    async fn get_queues(&self) -> Result<Vec<QueueRecord>> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(self.queues_uri.clone())
            .header(header::AUTHORIZATION, self.authorization.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| ExporterError::Transport(format!("building request: {e}")))?;

        let res = self
            .http
            .request(req)
            .await
            .map_err(|e| ExporterError::Transport(error_chain(&e)))?;

        let status = res.status();
        let body = res
            .into_body()
            .collect()
            .await
            .map_err(|e| ExporterError::Body(error_chain(&e)))?
            .to_bytes();

        if status != StatusCode::OK {
            return Err(ExporterError::UpstreamStatus {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        decode_queue_list(&body)
    }
}

#[async_trait]
impl QueueSource for ManagementClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn fetch_queues(&self) -> Result<Vec<QueueRecord>> {
        self.list_queues().await
    }
}

/// `Basic base64(user:password)`.
pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

// hyper's top-level errors are terse ("client error (Connect)"); keep the causes.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
