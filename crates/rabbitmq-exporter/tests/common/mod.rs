//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::StatusCode;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use rabbitmq_exporter::broker::QueueSource;
use rabbitmq_exporter::config::{self, ExporterConfig};
use rabbitmq_exporter_core::error::Result;
use rabbitmq_exporter_core::QueueRecord;

pub const HOST: &str = "http://rabbit.test:15672";

pub fn env_with(host: &str, extra: &[(&str, &str)]) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = [
        ("RABBITMQ_HOST", host),
        ("RABBITMQ_USER", "monitor"),
        ("RABBITMQ_PASSWORD", "s3cret"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        env.insert(k.to_string(), v.to_string());
    }
    env
}

pub fn exporter_cfg(host: &str, extra: &[(&str, &str)]) -> ExporterConfig {
    let env = env_with(host, extra);
    config::load_from_lookup(|k| env.get(k).cloned()).expect("test config must load")
}

pub fn rec(vhost: &str, name: &str, total: u64, ready: u64, unack: u64) -> QueueRecord {
    QueueRecord {
        name: name.into(),
        vhost: vhost.into(),
        total_messages: total,
        ready_messages: ready,
        unacknowledged_messages: unack,
    }
}

/// Replays queued fetch results; an exhausted script yields `Ok([])`.
pub struct ScriptedSource {
    host: String,
    script: Mutex<VecDeque<Result<Vec<QueueRecord>>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, next: Result<Vec<QueueRecord>>) {
        self.script.lock().unwrap().push_back(next);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueSource for ScriptedSource {
    fn host(&self) -> &str {
        &self.host
    }

    async fn fetch_queues(&self) -> Result<Vec<QueueRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub struct Reply {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

pub async fn http_get(url: &str) -> Reply {
    let client = Client::builder(TokioExecutor::new()).build_http::<Empty<Bytes>>();
    let res = client.get(url.parse().unwrap()).await.unwrap();
    let status = res.status();
    let content_type = res
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    Reply {
        status,
        content_type,
        body: String::from_utf8(body.to_vec()).unwrap(),
    }
}
