//! fitlog - terminal workout logger
//!
//! Records workout sessions against a catalog of plans, autosaves edits in
//! progress, recovers them after a crash, and imports or exports the whole
//! history as a JSON document.

use std::io;
use std::time::{Duration, Instant};
use anyhow::Context;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;

use fitlog::application::{App, AppMode, AutosaveTiming, SessionManager};
use fitlog::infrastructure::{init_logging, Config, FileStore};
use fitlog::presentation::{render_ui, InputHandler};

/// Entry point for the fitlog terminal application.
///
/// Loads configuration, opens the durable and scratch stores, recovers any
/// session a previous run left behind, and runs the event loop until the
/// user quits.
fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let _guard = init_logging(&config).context("failed to initialise logging")?;
    info!(data_dir = %config.data_dir.display(), "starting fitlog");

    let durable = FileStore::new(config.data_dir.clone()).with_quota(config.store_quota_bytes);
    let scratch = FileStore::new(config.scratch_dir.clone()).with_quota(config.store_quota_bytes);
    let timing = AutosaveTiming {
        debounce: config.autosave.debounce(),
        poll_interval: config.autosave.poll_interval(),
    };

    let mut manager = SessionManager::open(Box::new(durable), Box::new(scratch), timing, Instant::now());
    let recovered = manager.recover_on_startup().is_some();

    let mut app = App::new(manager, config.export_dir.clone());
    if recovered {
        app.status_message = Some("Recovered unsaved session".to_string());
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);
    app.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    info!("fitlog stopped");
    Ok(())
}

/// Main application event loop.
///
/// Waits for input no longer than the next autosave deadline so that
/// debounced and periodic saves run while the user is idle. Returns when the
/// user presses 'q' in normal mode.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        let timeout = app
            .manager
            .next_deadline()
            .saturating_duration_since(Instant::now())
            .max(Duration::from_millis(10));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if matches!(app.mode, AppMode::Normal) => return Ok(()),
                        _ => InputHandler::handle_key_event(app, key.code, key.modifiers),
                    }
                }
            }
        }

        app.tick(Instant::now());
    }
}
