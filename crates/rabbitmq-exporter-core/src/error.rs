//! Shared error type across rabbitmq-exporter crates.

use thiserror::Error;

/// How the process reacts to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Startup cannot continue (config, registration, bind).
    Fatal,
    /// Drop the current poll cycle and keep the previous metric values.
    SkipCycle,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Fatal => "FATAL",
            ErrorClass::SkipCycle => "SKIP_CYCLE",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("metric registration failed: {0}")]
    Registration(String),
    #[error("bind failed: {0}")]
    Bind(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("reading response body: {0}")]
    Body(String),
    #[error("management api returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("decode: {0}")]
    Decode(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ExporterError {
    /// Map an error to the action the caller has to take.
    pub fn class(&self) -> ErrorClass {
        match self {
            ExporterError::MissingEnv(_)
            | ExporterError::InvalidConfig(_)
            | ExporterError::Registration(_)
            | ExporterError::Bind(_) => ErrorClass::Fatal,
            ExporterError::Transport(_)
            | ExporterError::Body(_)
            | ExporterError::UpstreamStatus { .. }
            | ExporterError::Decode(_)
            | ExporterError::Internal(_) => ErrorClass::SkipCycle,
        }
    }

    /// Stable label value for the `outcome` label of the poll counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            ExporterError::MissingEnv(_) | ExporterError::InvalidConfig(_) => "config",
            ExporterError::Registration(_) => "registration",
            ExporterError::Bind(_) => "bind",
            ExporterError::Transport(_) => "transport",
            ExporterError::Body(_) => "body",
            ExporterError::UpstreamStatus { .. } => "upstream_status",
            ExporterError::Decode(_) => "decode",
            ExporterError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_are_fatal() {
        assert_eq!(ExporterError::MissingEnv("RABBITMQ_HOST").class(), ErrorClass::Fatal);
        assert_eq!(ExporterError::Registration("dup".into()).class(), ErrorClass::Fatal);
    }

    #[test]
    fn cycle_errors_only_skip() {
        let e = ExporterError::UpstreamStatus { status: 500, body: String::new() };
        assert_eq!(e.class(), ErrorClass::SkipCycle);
        assert_eq!(e.outcome(), "upstream_status");
        assert_eq!(ExporterError::Decode("eof".into()).class().as_str(), "SKIP_CYCLE");
    }
}
