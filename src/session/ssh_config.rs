//! Host-alias resolution against `~/.ssh/config`.
//!
//! A pared-down reading of `color-ssh`'s `ssh_config::parse_ssh_config` —
//! `Host`/`HostName`/`User`/`Port`/`IdentityFile` only, no `Include`, no
//! folder tree. `open_ssh` still takes an explicit `SshConfig`; this is
//! sugar that fills gaps in one before it's built.

use crate::log_debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
struct HostDefaults {
    hostname: Option<String>,
    user: Option<String>,
    port: Option<u16>,
    identity_file: Option<String>,
}

/// A parsed `~/.ssh/config`, keyed by the literal `Host` alias (wildcard
/// patterns are not expanded — this mirrors only the common single-alias
/// case a quick-connect flow relies on).
#[derive(Debug, Clone, Default)]
pub struct SshConfigLookup {
    hosts: HashMap<String, HostDefaults>,
}

impl SshConfigLookup {
    /// Loads and parses the given file. A missing file yields an empty
    /// lookup rather than an error, since having no `~/.ssh/config` is the
    /// common case, not a failure.
    pub fn load(path: &Path) -> Self {
        match Self::parse(path) {
            Ok(lookup) => lookup,
            Err(err) => {
                log_debug!("ssh config lookup: skipping {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_default() -> Self {
        match dirs::home_dir() {
            Some(home) => Self::load(&home.join(".ssh").join("config")),
            None => Self::default(),
        }
    }

    fn parse(path: &Path) -> std::io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut hosts = HashMap::new();
        let mut current: Option<(String, HostDefaults)> = None;

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((keyword, value)) = trimmed.split_once(char::is_whitespace) else { continue };
            let keyword = keyword.trim().to_ascii_lowercase();
            let value = value.trim();

            if keyword == "host" {
                if let Some((alias, defaults)) = current.take() {
                    hosts.insert(alias, defaults);
                }
                current = Some((value.to_string(), HostDefaults::default()));
                continue;
            }

            let Some((_, defaults)) = current.as_mut() else { continue };
            match keyword.as_str() {
                "hostname" => defaults.hostname = Some(value.to_string()),
                "user" => defaults.user = Some(value.to_string()),
                "port" => defaults.port = value.parse().ok(),
                "identityfile" => defaults.identity_file = Some(shellexpand_tilde(value)),
                _ => {}
            }
        }
        if let Some((alias, defaults)) = current.take() {
            hosts.insert(alias, defaults);
        }
        Ok(Self { hosts })
    }

    /// Fills in `hostname`/`port`/`user`/`identity_file` on `overrides`
    /// from the `alias` block, wherever `overrides` left that field unset.
    /// Explicit values in `overrides` always win.
    pub fn resolve(&self, alias: &str, overrides: ResolvedHost) -> ResolvedHost {
        let Some(defaults) = self.hosts.get(alias) else { return overrides };
        ResolvedHost {
            hostname: overrides.hostname.or_else(|| defaults.hostname.clone()),
            user: overrides.user.or_else(|| defaults.user.clone()),
            port: overrides.port.or(defaults.port),
            identity_file: overrides.identity_file.or_else(|| defaults.identity_file.clone().map(PathBuf::from)),
        }
    }
}

/// Caller-supplied explicit values for `open_ssh`; any field left `None`
/// is eligible to be filled in from `~/.ssh/config` by `SshConfigLookup::resolve`.
#[derive(Debug, Clone, Default)]
pub struct ResolvedHost {
    pub hostname: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<PathBuf>,
}

fn shellexpand_tilde(value: &str) -> String {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest).display().to_string()).unwrap_or_else(|| value.to_string()),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolves_missing_fields_from_matching_host_block() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Host prod\n  HostName 10.0.0.5\n  User deploy\n  Port 2222\n").unwrap();
        let lookup = SshConfigLookup::load(file.path());

        let resolved = lookup.resolve("prod", ResolvedHost::default());
        assert_eq!(resolved.hostname.as_deref(), Some("10.0.0.5"));
        assert_eq!(resolved.user.as_deref(), Some("deploy"));
        assert_eq!(resolved.port, Some(2222));
    }

    #[test]
    fn explicit_override_wins_over_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Host prod\n  User deploy\n").unwrap();
        let lookup = SshConfigLookup::load(file.path());

        let overrides = ResolvedHost { user: Some("root".to_string()), ..Default::default() };
        let resolved = lookup.resolve("prod", overrides);
        assert_eq!(resolved.user.as_deref(), Some("root"));
    }

    #[test]
    fn unknown_alias_returns_overrides_unchanged() {
        let lookup = SshConfigLookup::default();
        let overrides = ResolvedHost { hostname: Some("example.com".to_string()), ..Default::default() };
        let resolved = lookup.resolve("nope", overrides);
        assert_eq!(resolved.hostname.as_deref(), Some("example.com"));
    }
}
