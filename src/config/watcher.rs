//! Hot-reload the settings file on change, mirroring `color-ssh`'s
//! `config::config_watcher`: watch the parent directory (so editors that
//! write-then-rename still trigger a reload), debounce bursts of events,
//! and reload on a dedicated named thread.

use super::loader::ConfigLoader;
use crate::{log_debug, log_error, log_warn};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn event_targets_file(event: &Event, file_name: &str) -> bool {
    event.paths.iter().any(|path| path.file_name().and_then(|s| s.to_str()).map(|name| name == file_name).unwrap_or(false))
}

/// Start watching the settings file for changes. Returns the underlying
/// watcher; dropping it stops the watch.
pub fn config_watcher() -> Option<RecommendedWatcher> {
    let loader = ConfigLoader::new();
    let config_path = loader.path().to_path_buf();
    let file_name = config_path.file_name().and_then(|s| s.to_str()).unwrap_or("").to_string();

    let (tx, rx) = mpsc::channel();
    let watch_file_name = file_name.clone();

    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res
                && (event.kind.is_modify() || event.kind.is_create())
                && event_targets_file(&event, &watch_file_name)
            {
                let _ = tx.send(());
            }
        },
        notify::Config::default(),
    ) {
        Ok(watcher) => watcher,
        Err(err) => {
            log_error!("failed to create config watcher: {}", err);
            return None;
        }
    };

    let fallback = PathBuf::from(".");
    let watch_dir = config_path.parent().unwrap_or(&fallback);
    if let Err(err) = watcher.watch(watch_dir, RecursiveMode::NonRecursive) {
        log_warn!("configuration hot-reload disabled: {}", err);
        return None;
    }

    if let Err(err) = thread::Builder::new().name("config-watcher".to_string()).spawn(move || {
        while rx.recv().is_ok() {
            while rx.recv_timeout(Duration::from_millis(500)).is_ok() {}
            log_debug!("configuration change detected, reloading");
            if let Err(err) = ConfigLoader::new().reload() {
                log_error!("configuration reload failed: {}", err);
            }
        }
    }) {
        log_error!("failed to spawn config watcher thread: {}", err);
        return None;
    }

    Some(watcher)
}
