//! homedash - a home information dashboard for the terminal
//!
//! Shows the time, local weather and forecast, active weather alerts, news
//! headlines, public network info and a bandwidth estimate, each refreshed on
//! its own schedule.

use std::io;
use std::panic;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use homedash::app::App;
use homedash::cache::CacheManager;
use homedash::cli::{Cli, StartupConfig};
use homedash::logging;
use homedash::refresh::RefreshHandle;
use homedash::scheduler::{SharedClock, SystemClock};
use homedash::ui;

type DashTerminal = Terminal<CrosstermBackend<io::Stdout>>;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Draws, reads keys and applies incoming panels until the user quits
fn run(
    terminal: &mut DashTerminal,
    app: &mut App,
    refresh: &mut RefreshHandle,
) -> io::Result<()> {
    loop {
        while let Some(message) = refresh.try_recv() {
            app.apply(message);
        }

        terminal.draw(|f| ui::render(f, app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if let Some(command) = app.take_refresh_request() {
            info!(?command, "manual refresh requested");
            refresh.send_command(command);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    if startup.print_config {
        println!("{}", startup.dashboard.to_redacted_json()?);
        return Ok(());
    }

    // Guard must live for the entire app lifetime
    let _log_guard = logging::init(startup.verbose);
    info!(version = env!("CARGO_PKG_VERSION"), "homedash starting");

    let cache = CacheManager::new();
    if cache.is_none() {
        warn!("no cache directory available; every refresh will hit the network");
    }

    let clock: SharedClock = Arc::new(SystemClock);
    let mut app = App::new(&startup.dashboard.enabled_features());
    let mut refresh = RefreshHandle::spawn_all(&startup.dashboard, cache, clock)?;

    setup_panic_hook();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &mut refresh);

    // Restore terminal even if the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    refresh.shutdown().await;
    info!("homedash stopped");

    result?;
    Ok(())
}
