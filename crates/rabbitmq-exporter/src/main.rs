//! rabbitmq-exporter
//!
//! - Polls `GET {RABBITMQ_HOST}/api/queues` every `EXPORTER_POLL_INTERVAL_MS`
//! - Republishes per-queue depth gauges on `/metrics` (default port 9051)
//! - Config from the environment, optionally seeded by `.env`

use std::future::IntoFuture;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use rabbitmq_exporter::broker::ManagementClient;
use rabbitmq_exporter::poller::{self, Updater};
use rabbitmq_exporter::{app_state, config, router};
use rabbitmq_exporter_core::error::{ExporterError, Result};

#[tokio::main]
async fn main() -> ExitCode {
    // before the subscriber so RUST_LOG may come from .env
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, class = e.class().as_str(), "rabbitmq-exporter stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::load_from_env()?;
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;
    let client = ManagementClient::new(&state.cfg().broker)?;

    tracing::info!(
        %listen,
        broker = %state.cfg().broker.host,
        interval_ms = state.cfg().poll.interval_ms,
        prune_stale = state.cfg().poll.prune_stale,
        "rabbitmq-exporter starting"
    );

    let poll_task = Updater::new(Arc::new(client), &state).spawn();

    let app = router::build_router(state);
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ExporterError::Bind(format!("{listen}: {e}")))?;

    // Either side ending stops the process.
    tokio::select! {
        res = axum::serve(listener, app).into_future() => {
            res.map_err(|e| ExporterError::Internal(format!("server failed: {e}")))
        }
        err = poller::supervise(poll_task) => Err(err),
    }
}
