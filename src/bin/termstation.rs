//! Thin interactive driver over the `termstation` library — not part of
//! the library's own contracts, just a consumer of the front-of-house
//! adapter, the way `color-ssh`'s `main.rs`/`tui.rs` drive `csh`'s
//! session and config modules.

use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction as RatatuiDirection, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use secrecy::SecretString;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use termstation::adapter::PaneAttachment;
use termstation::config;
use termstation::controller::World;
use termstation::session::{LocalConfig, ResolvedHost, SessionHost, SshConfigLookup, SshConfig};
use termstation::workspace;

#[derive(Parser)]
#[command(name = "termstation", about = "Desktop SSH/terminal workstation engine — demo driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a single local shell tab and attach an interactive pane.
    NewLocal {
        #[arg(long)]
        title: Option<String>,
    },
    /// Open a single SSH tab to `host` (resolved against `~/.ssh/config`).
    NewSsh {
        host: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        identity: Option<PathBuf>,
    },
    /// Open a default local tab, run it interactively, then save the
    /// resulting workspace under `name` on quit.
    Save { name: String },
    /// Restore a previously saved workspace by name and run it interactively.
    Load { name: String },
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let sessions = SessionHost::from_settings(&config::settings());
    let mut world = World::new(sessions.clone());

    let outcome = match &cli.command {
        Commands::NewLocal { title } => {
            world.new_local_tab(title.clone().unwrap_or_else(|| "local".to_string()), LocalConfig::default()).map_err(|err| io::Error::other(err.to_string()))?;
            run_interactive(&mut world, None)
        }
        Commands::NewSsh { host, user, port, identity } => {
            open_ssh_tab(&mut world, host, user.clone(), *port, identity.clone())?;
            run_interactive(&mut world, None)
        }
        Commands::Save { name } => {
            world.new_local_tab("local", LocalConfig::default()).map_err(|err| io::Error::other(err.to_string()))?;
            run_interactive(&mut world, Some(name.clone()))
        }
        Commands::Load { name } => {
            let snapshot = workspace::read_snapshot(None).map_err(|err| io::Error::other(err.to_string()))?;
            let record = snapshot.workspaces.iter().find(|record| &record.name == name).ok_or_else(|| io::Error::other(format!("no saved workspace named '{name}'")))?;
            let record_id = record.id.clone();
            workspace::load(&snapshot, &record_id, &mut world).map_err(|err| io::Error::other(err.to_string()))?;
            run_interactive(&mut world, Some(name.clone()))
        }
    };

    for session_id in world.tabs.iter().flat_map(|tab| tab.layout.session_ids()) {
        sessions.close(&session_id).ok();
    }

    outcome
}

fn open_ssh_tab(world: &mut World, host: &str, user: Option<String>, port: Option<u16>, identity: Option<PathBuf>) -> io::Result<()> {
    let lookup = SshConfigLookup::load_default();
    let overrides = ResolvedHost { hostname: None, user, port, identity_file: identity };
    let resolved = lookup.resolve(host, overrides);
    let username = resolved.user.or_else(|| std::env::var("USER").ok()).ok_or_else(|| io::Error::other("no username given or resolvable for ssh host"))?;
    let password = std::env::var("TERMSTATION_SSH_PASSWORD").ok().map(SecretString::from);
    let config = SshConfig {
        host: resolved.hostname.unwrap_or_else(|| host.to_string()),
        port: resolved.port.unwrap_or(22),
        username,
        password,
        private_key: resolved.identity_file,
    };
    let timeout = Duration::from_secs(config::settings().ssh_connect_timeout_secs);
    world.new_ssh_tab(host.to_string(), config, timeout).map_err(|err| io::Error::other(err.to_string()))?;
    Ok(())
}

/// Runs the alternate-screen ratatui loop for `world`'s active tab/pane,
/// forwarding keystrokes as input and reacting to resize. `Ctrl+Q` quits;
/// if `save_as` is set, the whole world is persisted under that name first.
fn run_interactive(world: &mut World, save_as: Option<String>) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, world);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(name) = save_as {
        let record = workspace::save_all(world, name, None).map_err(|err| io::Error::other(err.to_string()))?;
        workspace::persist(record, None).map_err(|err| io::Error::other(err.to_string()))?;
    }

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, world: &mut World) -> io::Result<()> {
    let Some(active_pane) = world.active_pane.clone() else { return Ok(()) };
    let Some(tab) = world.tabs.iter().find(|tab| tab.layout.pane_ids().contains(&active_pane)) else { return Ok(()) };
    let (_, node) = termstation::layout::find(&tab.layout, active_pane.as_str()).expect("active pane resolved from its own tab");
    let session_id = match node {
        termstation::layout::Node::Pane { session_id, .. } => session_id.clone(),
        termstation::layout::Node::Split { .. } => unreachable!("pane ids never resolve to a split node"),
    };

    let resize_debounce_ms = config::settings().resize_debounce_ms;
    let mut attachment = PaneAttachment::attach(world.sessions.clone(), session_id, resize_debounce_ms).map_err(|err| io::Error::other(err.to_string()))?;
    let mut scrollback = String::from_utf8_lossy(&attachment.take_backlog()).into_owned();

    loop {
        for event in attachment.poll() {
            if let termstation::session::SessionEvent::Output { data, .. } = event {
                scrollback.push_str(&String::from_utf8_lossy(&data));
            }
        }

        let tab_titles: Vec<Line> = world.tabs.iter().map(|tab| Line::from(tab.title.clone())).collect();
        let active_index = world.active_tab.as_ref().and_then(|id| world.tabs.iter().position(|tab| &tab.id == id)).unwrap_or(0);

        terminal.draw(|frame| {
            let chunks = Layout::default().direction(RatatuiDirection::Vertical).constraints([Constraint::Length(1), Constraint::Min(1)]).split(frame.area());
            let tabs = Tabs::new(tab_titles).select(active_index).style(Style::default().fg(Color::Gray));
            frame.render_widget(tabs, chunks[0]);

            let visible_rows = chunks[1].height.saturating_sub(2) as usize;
            let lines: Vec<&str> = scrollback.lines().collect();
            let start = lines.len().saturating_sub(visible_rows);
            let body = Text::from(lines[start..].join("\n"));
            let pane = Paragraph::new(body).block(Block::default().borders(Borders::ALL).title("pane"));
            frame.render_widget(pane, chunks[1]);
        })?;

        attachment.request_resize(terminal.size()?.width, terminal.size()?.height.saturating_sub(3));

        if event::poll(Duration::from_millis(33))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }
                    if let Some(bytes) = encode_key(key.code, key.modifiers) {
                        attachment.forward_input(&bytes).ok();
                    }
                }
                Event::Resize(cols, rows) => attachment.request_resize(cols, rows),
                _ => {}
            }
        }
    }
}

/// Translates a handful of common keys into the bytes a shell expects.
/// Not a full terminal-input encoder — arrow keys and printable characters
/// cover the demo's needs; a real front-of-house adapter would do more.
fn encode_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Vec<u8>> {
    match code {
        KeyCode::Char(ch) if modifiers.contains(KeyModifiers::CONTROL) && ch.is_ascii_alphabetic() => Some(vec![(ch.to_ascii_uppercase() as u8) - b'A' + 1]),
        KeyCode::Char(ch) => Some(ch.to_string().into_bytes()),
        KeyCode::Enter => Some(vec![b'\r']),
        KeyCode::Backspace => Some(vec![0x7f]),
        KeyCode::Tab => Some(vec![b'\t']),
        KeyCode::Esc => Some(vec![0x1b]),
        KeyCode::Up => Some(b"\x1b[A".to_vec()),
        KeyCode::Down => Some(b"\x1b[B".to_vec()),
        KeyCode::Right => Some(b"\x1b[C".to_vec()),
        KeyCode::Left => Some(b"\x1b[D".to_vec()),
        _ => None,
    }
}
