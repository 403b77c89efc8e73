//! Workspace Serializer — versioned save/restore of tab/layout structure.
//! Grounded on `color-ssh`'s `config` module for the
//! "resolve a path under the user's data directory, read-or-default,
//! write back" shape; the schema itself is new.

mod schema;

pub use schema::{NodeRecord, OrientationRecord, SessionRecipe, SshRecipe, TabRecord, WorkspaceRecord, WorkspaceSnapshot};

use crate::controller::{Tab, TabId, World};
use crate::layout::{Node, Orientation};
use crate::session::{LocalConfig, SessionId, SessionKind, SshConfig};
use chrono::Local;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug)]
pub enum SerializerError {
    UnsupportedVersion(u32),
    Malformed(String),
    RestoreFailed { recipe_index: usize, reason: String },
    Io(std::io::Error),
}

impl fmt::Display for SerializerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializerError::UnsupportedVersion(version) => write!(f, "unsupported workspace schema version {version}"),
            SerializerError::Malformed(detail) => write!(f, "malformed workspace: {detail}"),
            SerializerError::RestoreFailed { recipe_index, reason } => write!(f, "failed to restore recipe #{recipe_index}: {reason}"),
            SerializerError::Io(err) => write!(f, "workspace I/O error: {err}"),
        }
    }
}

impl std::error::Error for SerializerError {}

impl From<std::io::Error> for SerializerError {
    fn from(err: std::io::Error) -> Self {
        SerializerError::Io(err)
    }
}

fn to_orientation(orientation: Orientation) -> OrientationRecord {
    match orientation {
        Orientation::Horizontal => OrientationRecord::Horizontal,
        Orientation::Vertical => OrientationRecord::Vertical,
    }
}

fn from_orientation(orientation: OrientationRecord) -> Orientation {
    match orientation {
        OrientationRecord::Horizontal => Orientation::Horizontal,
        OrientationRecord::Vertical => Orientation::Vertical,
    }
}

fn recipe_from_kind(title: String, kind: &SessionKind) -> SessionRecipe {
    match kind {
        SessionKind::Local(config) => SessionRecipe::Local { title, shell: config.shell.clone(), working_directory: config.cwd.as_ref().map(|path| path.display().to_string()) },
        SessionKind::Ssh(config) => SessionRecipe::Ssh {
            title,
            ssh: SshRecipe {
                host: config.host.clone(),
                port: config.port,
                username: config.username.clone(),
                password: config.password.as_ref().map(|secret| secret.expose_secret().to_string()),
                private_key: config.private_key.as_ref().map(|path| path.display().to_string()),
            },
        },
    }
}

fn node_to_record(node: &Node, world: &World) -> Result<NodeRecord, SerializerError> {
    match node {
        Node::Pane { session_id, .. } => {
            let metadata = world.sessions.metadata(session_id).map_err(|err| SerializerError::Malformed(err.to_string()))?;
            Ok(NodeRecord::Pane { session: recipe_from_kind(metadata.title, &metadata.kind) })
        }
        Node::Split { orientation, children, sizes, id: _ } => {
            let panes = children.iter().map(|child| node_to_record(child, world)).collect::<Result<Vec<_>, _>>()?;
            Ok(NodeRecord::Split { orientation: to_orientation(*orientation), panes, sizes: sizes.clone() })
        }
    }
}

/// Snapshots the tab named `tab_id` out of `world` into a save-ready
/// `WorkspaceRecord`. Only data recoverable at reopen time is captured;
/// scrollback and remote shell state are never persisted.
pub fn save_tab(world: &World, tab_id: &TabId, name: impl Into<String>, description: Option<String>) -> Result<WorkspaceRecord, SerializerError> {
    let tab = world.tabs.iter().find(|tab| &tab.id == tab_id).ok_or_else(|| SerializerError::Malformed(format!("no tab with id {tab_id}")))?;
    let now = Local::now();
    Ok(WorkspaceRecord {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.into(),
        description,
        created_at: now,
        updated_at: now,
        active_tab_index: 0,
        tabs: vec![TabRecord { title: tab.title.clone(), layout: node_to_record(&tab.layout, world)? }],
    })
}

/// Snapshots every open tab into one `WorkspaceRecord`.
pub fn save_all(world: &World, name: impl Into<String>, description: Option<String>) -> Result<WorkspaceRecord, SerializerError> {
    let now = Local::now();
    let active_tab_index = world.active_tab.as_ref().and_then(|id| world.tabs.iter().position(|tab| &tab.id == id)).unwrap_or(0);
    let tabs = world.tabs.iter().map(|tab| Ok(TabRecord { title: tab.title.clone(), layout: node_to_record(&tab.layout, world)? })).collect::<Result<Vec<_>, SerializerError>>()?;
    Ok(WorkspaceRecord { id: uuid::Uuid::new_v4().to_string(), name: name.into(), description, created_at: now, updated_at: now, active_tab_index, tabs })
}

/// Recreates sessions for `recipe`, bottom-up over the subtree, building a
/// fresh `Node`. On any failure, closes sessions already opened for this
/// subtree and returns the offending recipe's index.
fn record_to_node(record: &NodeRecord, world: &mut World, opened: &mut Vec<SessionId>, next_index: &mut usize) -> Result<Node, SerializerError> {
    match record {
        NodeRecord::Pane { session } => {
            let index = *next_index;
            *next_index += 1;
            let session_id = open_recipe(world, session).map_err(|reason| SerializerError::RestoreFailed { recipe_index: index, reason })?;
            opened.push(session_id.clone());
            Ok(Node::pane(session_id))
        }
        NodeRecord::Split { orientation, panes, sizes } => {
            if panes.len() < 2 || panes.len() != sizes.len() {
                return Err(SerializerError::Malformed("split node child/size count mismatch".to_string()));
            }
            let children = panes.iter().map(|pane| record_to_node(pane, world, opened, next_index)).collect::<Result<Vec<_>, _>>()?;
            Ok(Node::Split { id: crate::layout::SplitId::new(), orientation: from_orientation(*orientation), children, sizes: sizes.clone() })
        }
    }
}

fn open_recipe(world: &mut World, recipe: &SessionRecipe) -> Result<SessionId, String> {
    match recipe {
        SessionRecipe::Local { title, shell, working_directory } => {
            let config = LocalConfig { shell: shell.clone(), cwd: working_directory.clone().map(PathBuf::from), env: Default::default() };
            world.sessions.open_local(title.clone(), config).map_err(|err| err.to_string())
        }
        SessionRecipe::Ssh { title, ssh } => {
            let config = SshConfig {
                host: ssh.host.clone(),
                port: ssh.port,
                username: ssh.username.clone(),
                password: ssh.password.clone().map(SecretString::from),
                private_key: ssh.private_key.clone().map(PathBuf::from),
            };
            world.sessions.open_ssh(title.clone(), config, Duration::from_secs(crate::config::settings().ssh_connect_timeout_secs)).map_err(|err| err.to_string())
        }
    }
}

/// Restores every tab in `record` into `world`, appending them, then sets
/// the active tab to `record.active_tab_index` if it's in bounds. On
/// restore failure, every session already opened for this record — across
/// all tabs attempted so far — is closed before the error is returned, so
/// a failed load leaves no orphaned sessions.
pub fn load(snapshot: &WorkspaceSnapshot, record_id: &str, world: &mut World) -> Result<(), SerializerError> {
    if snapshot.version != CURRENT_VERSION {
        return Err(SerializerError::UnsupportedVersion(snapshot.version));
    }
    let record = snapshot.workspaces.iter().find(|candidate| candidate.id == record_id).ok_or_else(|| SerializerError::Malformed(format!("no workspace with id {record_id}")))?;

    let mut opened = Vec::new();
    let mut next_index = 0usize;
    let first_new_index = world.tabs.len();

    for tab_record in &record.tabs {
        match record_to_node(&tab_record.layout, world, &mut opened, &mut next_index) {
            Ok(layout) => world.tabs.push(Tab::new(tab_record.title.clone(), layout)),
            Err(err) => {
                for session_id in &opened {
                    world.sessions.close(session_id).ok();
                }
                world.tabs.truncate(first_new_index);
                return Err(err);
            }
        }
    }

    if let Some(tab) = world.tabs.get(first_new_index + record.active_tab_index) {
        let tab_id = tab.id.clone();
        world.set_active_tab(&tab_id).ok();
    }
    Ok(())
}

fn default_store_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(std::env::temp_dir).join("termstation").join("workspaces.json")
}

pub fn read_snapshot(path: Option<&PathBuf>) -> Result<WorkspaceSnapshot, SerializerError> {
    let path = path.cloned().unwrap_or_else(default_store_path);
    if !path.exists() {
        return Ok(WorkspaceSnapshot { version: CURRENT_VERSION, workspaces: Vec::new() });
    }
    let raw = fs::read_to_string(&path)?;
    let snapshot: WorkspaceSnapshot = serde_json::from_str(&raw).map_err(|err| SerializerError::Malformed(err.to_string()))?;
    if snapshot.version != CURRENT_VERSION {
        return Err(SerializerError::UnsupportedVersion(snapshot.version));
    }
    Ok(snapshot)
}

pub fn write_snapshot(snapshot: &WorkspaceSnapshot, path: Option<&PathBuf>) -> Result<(), SerializerError> {
    let path = path.cloned().unwrap_or_else(default_store_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = serde_json::to_string_pretty(snapshot).map_err(|err| SerializerError::Malformed(err.to_string()))?;
    fs::write(&path, serialized)?;
    Ok(())
}

/// Saves `record` into the on-disk store, replacing any existing entry
/// with the same name.
pub fn persist(record: WorkspaceRecord, path: Option<&PathBuf>) -> Result<(), SerializerError> {
    let mut snapshot = read_snapshot(path)?;
    snapshot.workspaces.retain(|existing| existing.name != record.name);
    snapshot.workspaces.push(record);
    write_snapshot(&snapshot, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionHost;

    fn world() -> World {
        World::new(SessionHost::new(1024, 100, 1024 * 1024))
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let snapshot = WorkspaceSnapshot { version: 99, workspaces: Vec::new() };
        let mut w = world();
        let err = load(&snapshot, "anything", &mut w).unwrap_err();
        assert!(matches!(err, SerializerError::UnsupportedVersion(99)));
    }

    #[test]
    fn unknown_workspace_id_is_malformed() {
        let snapshot = WorkspaceSnapshot { version: CURRENT_VERSION, workspaces: Vec::new() };
        let mut w = world();
        let err = load(&snapshot, "missing", &mut w).unwrap_err();
        assert!(matches!(err, SerializerError::Malformed(_)));
    }

    #[test]
    fn roundtrip_json_preserves_split_shape() {
        let record = WorkspaceRecord {
            id: "w1".to_string(),
            name: "dev".to_string(),
            description: None,
            created_at: Local::now(),
            updated_at: Local::now(),
            active_tab_index: 0,
            tabs: vec![TabRecord {
                title: "main".to_string(),
                layout: NodeRecord::Split {
                    orientation: OrientationRecord::Vertical,
                    panes: vec![
                        NodeRecord::Pane { session: SessionRecipe::Local { title: "left".to_string(), shell: None, working_directory: None } },
                        NodeRecord::Pane { session: SessionRecipe::Local { title: "right".to_string(), shell: None, working_directory: None } },
                    ],
                    sizes: vec![40.0, 60.0],
                },
            }],
        };
        let snapshot = WorkspaceSnapshot { version: CURRENT_VERSION, workspaces: vec![record] };
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let restored: WorkspaceSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.workspaces[0].tabs[0].layout, snapshot.workspaces[0].tabs[0].layout);
    }
}
