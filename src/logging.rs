//! File logging. The terminal belongs to the UI, so nothing is printed.

use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::AppResult;

pub const LOG_FILE: &str = "astro_journal.log";

/// Installs the global subscriber writing to `dir/astro_journal.log`.
/// Keep the returned guard alive until exit so buffered lines are flushed.
/// Returns `Ok(None)` if a subscriber was already installed.
pub fn init(dir: &Path) -> AppResult<Option<WorkerGuard>> {
    fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn unusable_log_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let err = init(&blocker.join("logs")).unwrap_err();
        assert!(matches!(err, AppError::Logging(_)));
    }
}
