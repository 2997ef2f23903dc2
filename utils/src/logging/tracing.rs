use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

use std::env;
use std::fs::{create_dir_all, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::config::LoggingConfig;

/// Overrides `[logs] level` when set, e.g. `HUSH_LOG=hush_db=debug,info`.
pub const LOG_ENV: &str = "HUSH_LOG";

const ERROR_LOG: &str = "error.log";
const LOG: &str = "logs.log";

/// Installs the global subscriber: errors to `error.log`, everything the
/// filter lets through to `logs.log` and stdout.
pub fn start_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let directives = env::var(LOG_ENV).ok();
    let path = Path::new(&config.path);
    create_dir_all(path)?;
    let error_logs = append(path.join(ERROR_LOG))?;
    let logs = append(path.join(LOG))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(error_logs)
                .with_filter(LevelFilter::ERROR),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(logs)
                .with_filter(filter(config, directives.as_deref())?),
        )
        .with(fmt::Layer::default().with_filter(filter(config, directives.as_deref())?))
        .try_init()?;
    Ok(())
}

/// Builds the filter from `from_env` if given, otherwise from the config.
/// Bad directives are an error rather than a silent fallback.
pub fn filter(config: &LoggingConfig, from_env: Option<&str>) -> anyhow::Result<EnvFilter> {
    let directives = from_env.unwrap_or(&config.level);
    EnvFilter::try_new(directives)
        .map_err(|e| anyhow::anyhow!("Invalid log level {directives:?}, {e}"))
}

fn append(path: PathBuf) -> anyhow::Result<File> {
    Ok(OpenOptions::new().append(true).create(true).open(path)?)
}
