//! Developer-facing debug logging for the session host and controller.
//!
//! Modeled on `color-ssh`'s `logging/` module: a level enum, a single
//! file-backed sink gated by an `AtomicBool`, and `log_*!` macros that grab
//! a fresh [`Logger`] handle per call site. This is not request/response
//! telemetry — it exists so a developer chasing a reconnect bug can tail a
//! file instead of instrumenting the call site by hand.

mod debug;
mod errors;
mod macros;

pub use errors::LogError;

use debug::DebugLogger;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_MODE: AtomicBool = AtomicBool::new(false);
static LOG_PATH: OnceCell<PathBuf> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Point the logger at a file. First caller wins; later calls are no-ops.
/// If never called, a default under the OS data directory is used lazily.
pub fn init(path: PathBuf) {
    let _ = LOG_PATH.set(path);
}

pub fn enable_debug() {
    DEBUG_MODE.store(true, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::SeqCst)
}

fn default_log_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(std::env::temp_dir).join("termstation").join("termstation-debug.log")
}

#[derive(Clone)]
pub struct Logger {
    sink: DebugLogger,
}

impl Logger {
    pub fn new() -> Self {
        let path = LOG_PATH.get_or_init(default_log_path).clone();
        Self { sink: DebugLogger::new(path) }
    }

    pub fn log(&self, level: LogLevel, message: &str) -> Result<(), LogError> {
        if matches!(level, LogLevel::Debug) && !is_debug_enabled() {
            return Ok(());
        }
        self.sink.log(level, message)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
