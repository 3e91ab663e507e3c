//! Error types shared by the journal core.
//!
//! Nothing here is fatal to the process: every variant is either shown to
//! the user as a dismissible notice or logged and retried later.

use std::io;
use thiserror::Error;

/// Failure of a horoscope fetch.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to connect to horoscope service")]
    Connection,

    #[error("Horoscope service did not respond within {0} seconds")]
    Timeout(u64),

    #[error("Horoscope service returned status {0}")]
    Status(u16),

    #[error("Horoscope service sent an unreadable response: {0}")]
    Decode(String),
}

/// A draft that cannot be written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please write something before saving.")]
    EmptyEntry,
}

/// Durable storage could not be read or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("could not encode state: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("stored state is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}

/// Startup failures; these end the process before the terminal is taken.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not prepare log directory: {0}")]
    Logging(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
