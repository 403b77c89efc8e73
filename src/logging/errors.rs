//! Logging-related error types

use std::{error::Error, fmt, io};

/// Errors that can occur during logging operations.
#[derive(Debug)]
pub enum LogError {
    /// I/O error when writing to the log file.
    Io(io::Error),
    /// Failed to create the log directory.
    DirectoryCreation(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Io(err) => write!(f, "I/O error: {}", err),
            LogError::DirectoryCreation(msg) => write!(f, "failed to create directory: {}", msg),
        }
    }
}

impl Error for LogError {}

impl From<io::Error> for LogError {
    fn from(err: io::Error) -> Self {
        LogError::Io(err)
    }
}
