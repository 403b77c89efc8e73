//! Debug/trace log file sink.

use super::{LogError, LogLevel};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

#[derive(Clone)]
pub(crate) struct DebugLogger {
    path: PathBuf,
}

impl DebugLogger {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn log(&self, level: LogLevel, message: &str) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|err| LogError::DirectoryCreation(err.to_string()))?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(file, "[{}] {} {}", timestamp, level.as_str(), message)?;
        Ok(())
    }
}
