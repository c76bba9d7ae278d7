//! study-timer - Countdown timer and study session history
//!
//! Usage:
//!   study-timer                  Open the timer (same as `run`)
//!   study-timer run              Open the interactive timer and analytics
//!   study-timer stats [--json]   Show today/week totals and the last 7 days
//!   study-timer export           Write all data to a JSON file
//!   study-timer import FILE      Restore data from an export file
//!   study-timer clear [--yes]    Delete all sessions and settings
//!   study-timer config           Show or set the timer duration

mod app;
mod cli;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use study_core::{Config, Paths};
use study_timer::{Alarm, SessionStore, Silent, StudyTimer, SystemClock, TerminalBell};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use app::App;

/// Study timer - countdown sessions with history and analytics
#[derive(Parser)]
#[command(name = "study-timer")]
#[command(about = "Countdown study timer with session history and analytics")]
#[command(version)]
#[command(after_help = r#"WHEN TO USE:
    Before sitting down to study. Runs of 30 seconds or more are recorded,
    finished countdowns are marked complete.

EXAMPLES:
    study-timer                      # Open the timer
    study-timer config --minutes 50  # Default to 50-minute sessions
    study-timer stats                # Today, this week, last 7 days
    study-timer export --output ~/   # Back up everything as JSON
    study-timer clear                # Start over (asks first)

KEYS (interactive):
    s, Space    Start / resume
    p           Pause
    x           Stop
    h / H       Hours +1 / -1 (idle only)
    m / M       Minutes +1 / -1 (idle only)
    Tab, 1, 2   Switch between timer and analytics
    e           Export to the current directory
    c           Clear all data (asks first)
    ?           Help
    q, Esc      Quit
"#)]
struct Cli {
    /// Keep sessions and settings in this directory
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive timer
    Run,

    /// Show study statistics
    #[command(alias = "st")]
    Stats {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Export sessions and settings to a JSON file
    Export {
        /// Directory to write the export into (default: current directory)
        #[arg(long, short, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Replace all data with the contents of an export file
    Import {
        /// Export file to restore
        file: PathBuf,
    },

    /// Delete all sessions and settings
    Clear {
        /// Don't ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Show or set the default timer duration
    Config {
        /// Hours (non-numeric input counts as 0)
        #[arg(long, allow_hyphen_values = true)]
        hours: Option<String>,

        /// Minutes (a zero-length target becomes 1 minute)
        #[arg(long, allow_hyphen_values = true)]
        minutes: Option<String>,
    },
}

/// Where log output goes
enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = Paths::new();
    let (config, config_error) = match Config::load(&paths.config_file()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.data_dir.clone())
        .unwrap_or_else(|| paths.data.clone());
    let paths = paths.with_data_dir(&data_dir);

    let interactive = matches!(cli.command, None | Some(Commands::Run));
    let target = if interactive {
        LogTarget::File(paths.log_file())
    } else {
        LogTarget::Stderr
    };
    init_logging(&config, target)?;

    if let Some(e) = config_error {
        // Only `config` reports a broken file; everything else carries on
        if matches!(cli.command, Some(Commands::Config { .. })) {
            return Err(e);
        }
        warn!("Using default config: {:#}", e);
    }

    let store = SessionStore::new(&paths.data)?;

    match cli.command {
        None | Some(Commands::Run) => cmd_run(store, &config),
        Some(Commands::Stats { json }) => cli::cmd_stats(store, json),
        Some(Commands::Export { output }) => cli::cmd_export(store, output),
        Some(Commands::Import { file }) => cli::cmd_import(store, &file),
        Some(Commands::Clear { yes }) => cli::cmd_clear(store, yes),
        Some(Commands::Config { hours, minutes }) => cli::cmd_config(store, hours, minutes),
    }
}

fn init_logging(config: &Config, target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    }
    Ok(())
}

/// Open the interactive timer
fn cmd_run(store: SessionStore, config: &Config) -> Result<()> {
    let alarm: Box<dyn Alarm> = if config.alarm {
        Box::new(TerminalBell::stdout())
    } else {
        Box::new(Silent)
    };
    let timer = StudyTimer::new(store, SystemClock, alarm);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(timer);
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.shutdown();

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<SystemClock, Box<dyn Alarm>>,
) -> Result<()> {
    // Keep the screen responsive even if the next deadline is far away
    let max_wait = Duration::from_millis(250);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = app.time_until_due().min(max_wait);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key.code) {
                    return Ok(());
                }
            }
        }

        app.on_tick();
    }
}
