use std::error::Error;
use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod cost;
mod dates;
mod form;
mod job;
mod record;
mod report;
mod settings;
mod stopwatch;
mod storage;
mod store;
mod timecode;
mod ui;

use app::App;
use job::JobId;
use store::JobStore;

const LOG_FILE: &str = ".draftjobs.log";
// Also the stopwatch redisplay rate.
const TICK: Duration = Duration::from_millis(200);

#[derive(Debug, Parser)]
#[command(name = "draftjobs", version, about = "Drafting job tracker with revision stopwatches")]
struct Cli {
    /// JSON file holding the jobs
    #[arg(long, value_name = "PATH", conflicts_with = "api")]
    store: Option<PathBuf>,
    /// Base URL of a job API server
    #[arg(long, value_name = "URL")]
    api: Option<String>,
    /// Where to write the log (default: ~/.draftjobs.log)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every job with its totals
    List,
    /// Export a job report without opening the interface
    Report {
        job_id: String,
        /// Directory for the report file
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

fn log_appender(path: &Path) -> Result<RollingFileAppender, Box<dyn Error>> {
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("invalid log file path: {}", path.display()))?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(directory)
        .map_err(|err| format!("cannot open log file {}: {err}", path.display()))?;
    Ok(appender)
}

fn init_logging(path: &Path) -> Result<WorkerGuard, Box<dyn Error>> {
    let (non_blocking, guard) = tracing_appender::non_blocking(log_appender(path)?);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| format!("failed to init logging: {err}"))?;
    Ok(guard)
}

fn default_log_path() -> PathBuf {
    match dirs::home_dir() {
        Some(mut path) => {
            path.push(LOG_FILE);
            path
        }
        None => PathBuf::from(LOG_FILE),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    let _log_guard = init_logging(&log_path)?;

    let settings = settings::load();
    let env_api = std::env::var(settings::API_URL_ENV).ok();
    let backend = settings::resolve_backend(cli.store, cli.api, env_api, &settings);
    let store = backend.open();
    tracing::info!(store = %store.describe(), "starting");

    match cli.command {
        Some(Command::List) => print_jobs(store.as_ref()),
        Some(Command::Report { job_id, out }) => {
            let dir = out.unwrap_or_else(|| settings.export_dir());
            let job = store.get(&JobId::new(job_id))?;
            let path = report::export(&job, &dir)?;
            println!("{}", path.display());
            Ok(())
        }
        None => run_tui(App::new(store, settings)),
    }
}

fn print_jobs(store: &dyn JobStore) -> Result<(), Box<dyn Error>> {
    for job in store.list()? {
        let id = job.id.as_ref().map(JobId::as_str).unwrap_or("-");
        println!(
            "{id}\t{}\t{}\t{}\t{}",
            job.title(),
            dates::format_iso(job.date),
            timecode::encode(job.total_seconds()),
            cost::format_currency(job.total_cost()),
        );
    }
    Ok(())
}

fn run_tui(mut app: App) -> Result<(), Box<dyn Error>> {
    let mut stdout = std::io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!("app error: {err}");
    }
    tracing::info!("exiting");
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if app.needs_refresh {
            app.refresh_data();
        }

        if app.should_quit {
            return Ok(());
        }

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key_event(key);
                }
            }
        }
    }
}
