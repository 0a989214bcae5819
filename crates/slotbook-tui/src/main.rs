//! Slotbook - a terminal client for booking appointment slots.
//!
//! Patients browse open slots week by week, book them and cancel upcoming
//! bookings. Administrators page through every booking on the server.

mod app;
mod ui;
mod utils;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use slotbook_core::auth::{FileStorage, SessionStorage};
use slotbook_core::{ApiClient, ApiConfig, Config, SessionState, SessionStore};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_PREFIX: &str = "slotbook.log";

const USAGE: &str = "\
Usage: slotbook [OPTIONS]

Options:
  --login <email>   Log in from the command line and exit
  --logout          Forget the stored session and exit
  --whoami          Print the stored session and exit
  --stderr-log      Write logs to stderr instead of the log file
  -h, --help        Show this help";

/// Parsed command line.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    stderr_log: bool,
    command: Option<Command>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Login(String),
    Logout,
    WhoAmI,
    Help,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let command = match arg.as_str() {
            "--stderr-log" => {
                parsed.stderr_log = true;
                continue;
            }
            "--login" => match args.next() {
                Some(email) => Command::Login(email),
                None => bail!("--login requires an email address"),
            },
            "--logout" => Command::Logout,
            "--whoami" => Command::WhoAmI,
            "-h" | "--help" => Command::Help,
            other => bail!("Unknown argument: {}\n\n{}", other, USAGE),
        };
        if parsed.command.replace(command).is_some() {
            bail!("Only one command may be given\n\n{}", USAGE);
        }
    }

    Ok(parsed)
}

/// Initialize the tracing subscriber.
///
/// The terminal belongs to the UI, so logs go to a daily file under the
/// data directory unless `--stderr-log` is given. Use RUST_LOG to change
/// the level (e.g., RUST_LOG=slotbook_core=debug).
fn init_tracing(data_dir: &std::path::Path, to_stderr: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if to_stderr {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(data_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = parse_args(std::env::args().skip(1))?;
    if args.command == Some(Command::Help) {
        println!("{}", USAGE);
        return Ok(());
    }

    let data_dir = Config::data_dir().unwrap_or_else(|_| PathBuf::from("."));
    // Logging is not up yet; a failure here surfaces when storage is written
    let _ = std::fs::create_dir_all(&data_dir);
    let _guard = init_tracing(&data_dir, args.stderr_log);
    info!("Slotbook starting");

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    let api_config = ApiConfig::resolve(&config);
    let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::new(&data_dir));

    match args.command {
        Some(Command::Login(email)) => return login_command(api_config, storage, &email).await,
        Some(Command::Logout) => return logout_command(storage),
        Some(Command::WhoAmI) => return whoami_command(storage),
        Some(Command::Help) | None => {}
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = match App::new(config, api_config, storage) {
        Ok(mut app) => {
            // Draw the loading screen before touching storage
            terminal.draw(|f| render(f, &app))?;
            app.initialize();
            run_app(&mut terminal, &mut app).await
        }
        Err(e) => Err(e),
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Slotbook shutting down");
    Ok(())
}

/// Log in without the UI, prompting for the password on the terminal.
async fn login_command(
    api_config: ApiConfig,
    storage: Arc<dyn SessionStorage>,
    email: &str,
) -> Result<()> {
    let session = Arc::new(SessionStore::new(storage));
    session.initialize(Utc::now());
    let api = ApiClient::new(api_config, session).context("Failed to build HTTP client")?;

    print!("Password for {}: ", email);
    io::stdout().flush()?;
    let password = rpassword::read_password().context("Failed to read password")?;

    let logged_in = api.login(email, &password).await?;
    println!(
        "Logged in as {} ({})",
        logged_in.user.display_name(),
        logged_in.role()
    );
    Ok(())
}

fn logout_command(storage: Arc<dyn SessionStorage>) -> Result<()> {
    let session = SessionStore::new(storage);
    session.initialize(Utc::now());
    session.logout();
    println!("Logged out.");
    Ok(())
}

fn whoami_command(storage: Arc<dyn SessionStorage>) -> Result<()> {
    let session = SessionStore::new(storage);
    match session.initialize(Utc::now()) {
        SessionState::Active(active) => {
            println!("{}", serde_json::to_string_pretty(&active.user)?);
            match active.minutes_until_expiry(Utc::now()) {
                Some(minutes) => println!("Session expires in {} minutes", minutes),
                None => println!("Session expiry unknown"),
            }
        }
        SessionState::Absent | SessionState::Loading => println!("Not logged in."),
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Expire messages and the session, apply finished calls
        app.tick();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
