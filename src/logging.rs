//! Tracing subscriber setup.
//!
//! Priority for the filter (highest first):
//! 1. `DOCTREE_LOG` environment variable (any `EnvFilter` directive)
//! 2. `[logging].level` from the config file
//! 3. `info`
//!
//! Output always goes to stderr so command output on stdout stays
//! parseable (`doctree validate --json | jq`).

use anyhow::{bail, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::LoggingConfig;

pub const LOG_ENV: &str = "DOCTREE_LOG";

/// Install the global subscriber. Call once, from the binary.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_env_filter(config)?;
    let subscriber = Registry::default().with(filter);

    match config.format.as_str() {
        "json" => subscriber
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()?,
        "text" => subscriber
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()?,
        other => bail!("Invalid log format: {} (must be 'json' or 'text')", other),
    }
    Ok(())
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    Ok(EnvFilter::try_new(&config.level)?)
}
