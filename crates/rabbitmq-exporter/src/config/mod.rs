//! Exporter config loader (environment, optional `.env`).

pub mod schema;

use rabbitmq_exporter_core::error::{ExporterError, Result};

pub use schema::{BrokerSection, ExporterConfig, PollSection, ServerSection};

pub const ENV_HOST: &str = "RABBITMQ_HOST";
pub const ENV_USER: &str = "RABBITMQ_USER";
pub const ENV_PASSWORD: &str = "RABBITMQ_PASSWORD";
pub const ENV_TIMEOUT_MS: &str = "RABBITMQ_TIMEOUT_MS";
pub const ENV_LISTEN: &str = "EXPORTER_LISTEN";
pub const ENV_POLL_INTERVAL_MS: &str = "EXPORTER_POLL_INTERVAL_MS";
pub const ENV_PRUNE_STALE: &str = "EXPORTER_PRUNE_STALE";

/// Read the process environment. `.env` is merged in by `main` beforehand.
pub fn load_from_env() -> Result<ExporterConfig> {
    load_from_lookup(|key| std::env::var(key).ok())
}

/// Build the config from an arbitrary key lookup. Empty values count as unset.
pub fn load_from_lookup<F>(lookup: F) -> Result<ExporterConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let require = |key: &'static str| get(key).ok_or(ExporterError::MissingEnv(key));

    let broker = BrokerSection {
        host: require(ENV_HOST)?.trim().trim_end_matches('/').to_string(),
        user: require(ENV_USER)?,
        password: require(ENV_PASSWORD)?,
        timeout_ms: get(ENV_TIMEOUT_MS)
            .map(|v| parse_u64(ENV_TIMEOUT_MS, &v))
            .transpose()?,
    };

    let server = match get(ENV_LISTEN) {
        Some(listen) => ServerSection { listen },
        None => ServerSection::default(),
    };

    let mut poll = PollSection::default();
    if let Some(v) = get(ENV_POLL_INTERVAL_MS) {
        poll.interval_ms = parse_u64(ENV_POLL_INTERVAL_MS, &v)?;
    }
    if let Some(v) = get(ENV_PRUNE_STALE) {
        poll.prune_stale = parse_bool(ENV_PRUNE_STALE, &v)?;
    }

    let cfg = ExporterConfig {
        broker,
        server,
        poll,
    };
    cfg.validate()?;
    Ok(cfg)
}

fn parse_u64(key: &str, v: &str) -> Result<u64> {
    v.trim()
        .parse()
        .map_err(|e| ExporterError::InvalidConfig(format!("{key}: {e}")))
}

fn parse_bool(key: &str, v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ExporterError::InvalidConfig(format!(
            "{key}: expected a boolean, got {other:?}"
        ))),
    }
}
