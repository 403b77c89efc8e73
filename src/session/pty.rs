//! Local PTY backend — spawns a child process on a pseudo-terminal.
//!
//! The reader/writer split and the "spawn, clone a reader, hand the writer
//! to the session, pump the reader on its own thread" shape is carried
//! straight from `color-ssh`'s `spawn_ssh_session` (it used the same
//! `portable_pty` APIs to run a child under a PTY); the content pumped is
//! now opaque bytes onto the event bus instead of a VT100 parser, since
//! escape-sequence interpretation is out of scope for this crate.

use super::SessionError;
use super::events::{EventBus, SessionEvent};
use super::types::{LocalConfig, SessionId};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;
const READ_CHUNK_SIZE: usize = 8192;

pub(crate) struct LocalHandle {
    pub(crate) master: Arc<Mutex<Box<dyn MasterPty + Send>>>,
    pub(crate) writer: Arc<Mutex<Box<dyn Write + Send>>>,
    child: Box<dyn Child + Send>,
}

impl LocalHandle {
    pub(crate) fn resize(&self, cols: u16, rows: u16) -> Result<(), SessionError> {
        let master = self.master.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        master.resize(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 }).map_err(|err| SessionError::Io(err.to_string()))
    }

    pub(crate) fn write(&self, bytes: &[u8]) -> Result<(), SessionError> {
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.write_all(bytes).map_err(|err| SessionError::Io(err.to_string()))
    }

    pub(crate) fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub(crate) fn spawn(session_id: SessionId, config: &LocalConfig, bus: Arc<EventBus>, on_exit: impl FnOnce() + Send + 'static) -> Result<LocalHandle, SessionError> {
    let pty_system = native_pty_system();
    let pty_pair = pty_system
        .openpty(PtySize { rows: DEFAULT_ROWS, cols: DEFAULT_COLS, pixel_width: 0, pixel_height: 0 })
        .map_err(|err| SessionError::Spawn(err.to_string()))?;

    let shell = config.shell.clone().unwrap_or_else(default_shell);
    let mut cmd = CommandBuilder::new(&shell);
    if let Some(cwd) = &config.cwd {
        cmd.cwd(cwd);
    }
    for (key, value) in &config.env {
        cmd.env(key, value);
    }

    let child = pty_pair.slave.spawn_command(cmd).map_err(|err| SessionError::Spawn(err.to_string()))?;
    drop(pty_pair.slave);

    let mut reader = pty_pair.master.try_clone_reader().map_err(|err| SessionError::Spawn(err.to_string()))?;
    let writer = pty_pair.master.take_writer().map_err(|err| SessionError::Spawn(err.to_string()))?;
    let writer = Arc::new(Mutex::new(writer));
    let master = Arc::new(Mutex::new(pty_pair.master));

    std::thread::spawn(move || {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => bus.publish(SessionEvent::Output { session_id: session_id.clone(), data: buf[..n].to_vec() }),
                Err(_) => break,
            }
        }
        on_exit();
    });

    Ok(LocalHandle { master, writer, child })
}

fn default_shell() -> String {
    if cfg!(windows) {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    } else {
        std::env::var("SHELL").ok().or_else(|| which::which("sh").ok().map(|p| p.to_string_lossy().into_owned())).unwrap_or_else(|| "/bin/sh".to_string())
    }
}
