//! Global, hot-reloadable settings, modeled on `color-ssh`'s
//! `config::SESSION_CONFIG` static.

mod errors;
mod loader;
mod settings;
mod watcher;

pub use errors::ConfigError;
pub use loader::ConfigLoader;
pub use settings::Settings;
pub use watcher::config_watcher;

use once_cell::sync::Lazy;
use std::sync::RwLock;

pub static CONFIG: Lazy<RwLock<Settings>> = Lazy::new(|| {
    RwLock::new(ConfigLoader::new().load().unwrap_or_else(|err| {
        eprintln!("termstation: failed to load configuration, using defaults: {}", err);
        Settings::default()
    }))
});

pub fn settings() -> Settings {
    CONFIG.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let settings = Settings::default();
        assert_eq!(settings.output_buffer_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.output_buffer_chunks, 1000);
        assert_eq!(settings.process_memory_ceiling_bytes, 100 * 1024 * 1024);
        assert_eq!(settings.min_split_size_percent, 5.0);
        assert_eq!(settings.tab_hover_activate_ms, 350);
        assert_eq!(settings.resize_debounce_ms, 100);
        assert_eq!(settings.ssh_connect_timeout_secs, 30);
        assert_eq!(settings.ssh_keepalive_secs, 60);
    }
}
