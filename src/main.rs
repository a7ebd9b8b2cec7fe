// netradar - Network Radar: LAN devices on an animated terminal radar

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use netradar::app::{self, event::handle_key_event, AppState, RefreshConfig};
use netradar::discovery::{ArpScanner, MockNetwork, OuiResolver, ScanSettings};
use netradar::feed::{spawn_local_feed, spawn_ws_feed, FeedHandle};
use netradar::ui;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Simulated duration of one mock scan
const MOCK_SCAN_DELAY: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    /// Synthetic devices, no network access
    Mock,
    /// Local neighbor table (Linux)
    Arp,
    /// Remote scanning backend over WebSocket
    Ws,
}

/// Discover devices on the local network and plot them on a radar
#[derive(Debug, Parser)]
#[command(name = "netradar", version, about)]
struct Args {
    /// Where device data comes from
    #[arg(long, value_enum, env = "NETRADAR_SOURCE", default_value = "mock")]
    source: Source,

    /// Backend endpoint for `--source ws`
    #[arg(long, env = "NETRADAR_WS_URL", default_value = "ws://127.0.0.1:8000/ws")]
    ws_url: String,

    /// UI refresh interval in milliseconds
    #[arg(long, default_value_t = app::config::DEFAULT_REFRESH_MS)]
    refresh_ms: u64,

    /// IEEE oui.txt used for vendor lookups
    #[arg(long)]
    oui_db: Option<PathBuf>,

    /// Write logs to this file (nothing is logged otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Skip the quick port probe during ARP scans
    #[arg(long)]
    no_port_scan: bool,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_oui(path: Option<&Path>) -> OuiResolver {
    let Some(path) = path else {
        return OuiResolver::empty();
    };
    match OuiResolver::load(path) {
        Ok(resolver) => {
            info!(path = %path.display(), entries = resolver.len(), "Loaded OUI database");
            resolver
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "OUI database unavailable, vendors unknown");
            OuiResolver::empty()
        }
    }
}

/// Start the feed worker; the flag says whether the app should rescan on its own
fn build_feed(args: &Args) -> (FeedHandle, bool) {
    let settings = ScanSettings {
        quick_probe: !args.no_port_scan,
        ..ScanSettings::default()
    };
    let timeout = settings.port_timeout;

    match args.source {
        Source::Mock => (
            spawn_local_feed(Box::new(MockNetwork::new(MOCK_SCAN_DELAY)), timeout),
            false,
        ),
        Source::Arp => {
            let oui = load_oui(args.oui_db.as_deref());
            (
                spawn_local_feed(Box::new(ArpScanner::new(oui, settings)), timeout),
                true,
            )
        }
        Source::Ws => (spawn_ws_feed(args.ws_url.clone(), timeout), false),
    }
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    info!(source = ?args.source, refresh_ms = args.refresh_ms, "netradar starting");

    // Leave the terminal usable if anything panics while it is in raw mode
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = restore_terminal();
        default_hook(panic);
    }));

    let (feed, auto_rescan) = build_feed(&args);
    let app = AppState::new(feed, RefreshConfig::new(args.refresh_ms), auto_rescan);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    restore_terminal()?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }
    info!("netradar stopped");
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, mut app: AppState) -> Result<()> {
    loop {
        app.on_tick();
        terminal.draw(|f| ui::draw(f, &mut app))?;

        if !app.running {
            return Ok(());
        }

        if event::poll(app.refresh_config.ui_interval())? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key_event(&mut app, key.code);
                }
            }
        }
    }
}
