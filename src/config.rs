//! Runtime configuration from environment variables.
//!
//! - `ASTRO_JOURNAL_DATA`: path of the saved state file
//! - `ASTRO_JOURNAL_LOG_DIR`: directory for `astro_journal.log`
//! - `ASTRO_JOURNAL_AUTOSAVE_SECS`: auto-save interval in seconds (default 30)
//! - `ASTRO_JOURNAL_HOROSCOPE_URL`: real horoscope endpoint; unset means simulated
//! - `ASTRO_JOURNAL_FETCH_TIMEOUT_SECS`: timeout for the real endpoint (default 10)

use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::editing_session::DEFAULT_AUTO_SAVE_INTERVAL;
use crate::error::{AppError, AppResult};

pub const DATA_ENV: &str = "ASTRO_JOURNAL_DATA";
pub const LOG_DIR_ENV: &str = "ASTRO_JOURNAL_LOG_DIR";
pub const AUTOSAVE_ENV: &str = "ASTRO_JOURNAL_AUTOSAVE_SECS";
pub const HOROSCOPE_URL_ENV: &str = "ASTRO_JOURNAL_HOROSCOPE_URL";
pub const FETCH_TIMEOUT_ENV: &str = "ASTRO_JOURNAL_FETCH_TIMEOUT_SECS";

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const FALLBACK_DATA_FILE: &str = "astro_journal_state.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_file: PathBuf,
    pub log_dir: PathBuf,
    pub auto_save_interval: Duration,
    pub horoscope_url: Option<String>,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn load() -> AppResult<Self> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_file = get(DATA_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_file);
        let log_dir = get(LOG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| parent_dir(&data_file));
        let auto_save_interval = match get(AUTOSAVE_ENV) {
            Some(raw) => parse_seconds(AUTOSAVE_ENV, &raw)?,
            None => DEFAULT_AUTO_SAVE_INTERVAL,
        };
        let fetch_timeout = match get(FETCH_TIMEOUT_ENV) {
            Some(raw) => parse_seconds(FETCH_TIMEOUT_ENV, &raw)?,
            None => DEFAULT_FETCH_TIMEOUT,
        };

        Ok(Config {
            data_file,
            log_dir,
            auto_save_interval,
            horoscope_url: get(HOROSCOPE_URL_ENV),
            fetch_timeout,
        })
    }
}

fn default_data_file() -> PathBuf {
    ProjectDirs::from("", "", "astro_journal")
        .map(|dirs| dirs.data_dir().join("state.json"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_FILE))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn parse_seconds(key: &str, raw: &str) -> AppResult<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::Config(format!("{key} must be greater than zero"))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(AppError::Config(format!(
            "{key} must be a whole number of seconds, got '{raw}'"
        ))),
    }
}
