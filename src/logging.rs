//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after the config is loaded. Logs go to
//! stderr so they never interleave with answers on stdout.

use anyhow::{anyhow, bail, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// If `prefer_level` is `true` (the level came from the command line),
/// `level` wins over `RUST_LOG`. Otherwise `RUST_LOG` wins and `level`
/// (from the config file) is the fallback.
pub fn init(level: &str, prefer_level: bool) -> Result<()> {
    let filter = if prefer_level {
        EnvFilter::try_new(level)
            .or_else(|_| EnvFilter::try_from_default_env())
            .map_err(|e| anyhow!("invalid log level '{level}': {e}"))?
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| anyhow!("invalid log level '{level}': {e}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to set subscriber: {e}"))?;

    Ok(())
}

/// Validate a log level string (`error`, `warn`, `info`, `debug`, `trace`, `off`).
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    if level.is_empty() {
        bail!("log level must not be empty");
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("unrecognised log level: '{level}'"))
}
