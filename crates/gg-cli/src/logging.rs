use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use gg_core::GalgameError;
use tracing_subscriber::EnvFilter;

use crate::map_cli_log_file;

pub(crate) const LOG_ENV: &str = "GALGAME_LOG";
const DEFAULT_FILTER: &str = "gg_cli=info,gg_runtime=info,gg_chat=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Agent mode: stdout carries the line protocol, so logs go to stderr.
pub(crate) fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// TUI mode: the alternate screen owns the terminal, logs are appended to `path`.
pub(crate) fn init_file_logging(path: &Path) -> Result<(), GalgameError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(map_cli_log_file)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(map_cli_log_file)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}
