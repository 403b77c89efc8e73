//! Configuration discovery and (re)loading, modeled on `color-ssh`'s
//! `ConfigLoader`: check a handful of well-known locations, fall back to a
//! built-in default, and support being re-run by the hot-reload watcher.

use super::settings::Settings;
use super::{ConfigError, CONFIG};
use crate::log_debug;
use std::path::PathBuf;
use std::{env, fs};

const DEFAULT_SETTINGS_YAML: &str = include_str!("../../templates/default.termstation.yaml");

pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: Self::find_config_path() }
    }

    fn find_config_path() -> PathBuf {
        if let Some(dir) = dirs::config_dir() {
            let candidate = dir.join("termstation").join("termstation.yaml");
            if candidate.exists() {
                return candidate;
            }
        }
        if let Some(home) = dirs::home_dir() {
            let candidate = home.join(".termstation.yaml");
            if candidate.exists() {
                return candidate;
            }
        }
        let cwd_candidate = env::current_dir().unwrap_or_default().join(".termstation.yaml");
        if cwd_candidate.exists() {
            return cwd_candidate;
        }
        Self::default_config_path()
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir().unwrap_or_else(env::temp_dir).join("termstation").join("termstation.yaml")
    }

    pub fn load(&self) -> Result<Settings, ConfigError> {
        let content = match fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(_) => DEFAULT_SETTINGS_YAML.to_string(),
        };

        let mut settings: Settings = serde_yml::from_str(&content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        settings.config_path = self.config_path.clone();
        Ok(settings)
    }

    /// Reload the global settings in place, used by the file watcher.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let new_settings = self.load()?;
        let mut guard = CONFIG.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = new_settings;
        log_debug!("configuration reloaded from {:?}", self.config_path);
        Ok(())
    }

    pub fn path(&self) -> &std::path::Path {
        &self.config_path
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
