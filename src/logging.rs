//! Tracing setup for the command-line tool.
//!
//! `RUST_LOG` wins when it parses; otherwise the `-v` count picks the level.
//! Output goes to stderr so generated source on stdout stays clean.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("cannot install tracing subscriber: {0}")]
    SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
}

/// Directive used when `RUST_LOG` is unset or unparsable.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Filter from `directives`, else `RUST_LOG`, else the verbosity default.
pub fn resolve_filter(directives: Option<&str>, verbosity: u8) -> Result<EnvFilter, LoggingError> {
    if let Some(directives) = directives {
        return EnvFilter::try_new(directives).map_err(|err| LoggingError::InvalidFilter(err.to_string()));
    }
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::new(default_directive(verbosity))),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(verbosity: u8) -> Result<(), LoggingError> {
    let filter = resolve_filter(None, verbosity)?;
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .with_span_events(FmtSpan::NONE);
    Registry::default().with(filter).with(layer).try_init()?;
    Ok(())
}
