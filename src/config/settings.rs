//! Tunables with their documented defaults, overridable via YAML.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-session output buffer memory ceiling, in bytes.
    pub output_buffer_bytes: usize,
    /// Per-session output buffer chunk count ceiling.
    pub output_buffer_chunks: usize,
    /// Process-wide terminal memory ceiling, in bytes.
    pub process_memory_ceiling_bytes: usize,
    /// Minimum size, in percent, any split child may shrink to.
    pub min_split_size_percent: f64,
    /// How long a drag must hover a tab before it auto-activates.
    pub tab_hover_activate_ms: u64,
    /// Debounce window applied to widget resize events before they reach
    /// `Session Host::resize`.
    pub resize_debounce_ms: u64,
    /// Timeout for the SSH TCP connect + handshake + auth sequence.
    pub ssh_connect_timeout_secs: u64,
    /// Keep-alive ping interval for established SSH channels.
    pub ssh_keepalive_secs: u64,
    #[serde(skip)]
    pub config_path: std::path::PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_buffer_bytes: 10 * 1024 * 1024,
            output_buffer_chunks: 1000,
            process_memory_ceiling_bytes: 100 * 1024 * 1024,
            min_split_size_percent: 5.0,
            tab_hover_activate_ms: 350,
            resize_debounce_ms: 100,
            ssh_connect_timeout_secs: 30,
            ssh_keepalive_secs: 60,
            config_path: std::path::PathBuf::new(),
        }
    }
}
