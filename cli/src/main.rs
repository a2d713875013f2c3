//! Waffle - Command-line front end for the update session.
//!
//! Searches for updates, downloads and installs them, printing one line per
//! progress tick. The jobs run against an in-process simulated agent.

mod sim;

use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use engine::agent::{DownloadProgress, InstallationProgress, Session, Update};
use engine::{CallbackError, ProgressEvent, ProgressSnapshot, SessionConfig, Timeout};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::sim::{Scenario, SimulatedAgent};

/// Waffle - search, download and install updates
#[derive(Parser, Debug)]
#[command(name = "waffle")]
#[command(version = "0.1.0")]
#[command(about = "Search, download and install updates with progress output")]
struct Args {
    /// Session configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Search criteria, overriding the configured one
    #[arg(long, value_name = "QUERY")]
    criteria: Option<String>,

    /// Search timeout in milliseconds, overriding the configured one
    #[arg(long, value_name = "MS")]
    search_timeout_ms: Option<u64>,

    /// Behaviour of the simulated update agent
    #[arg(long, value_enum, default_value = "normal")]
    scenario: Scenario,

    /// Delay between simulated progress ticks in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 50)]
    tick_ms: u64,

    /// Enable verbose output
    #[arg(long)]
    verbose: bool,
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    Done,
    RebootRequired,
}

/// Print one progress tick as `index:progress title`.
fn print_tick<P>(event: ProgressEvent<'_, Update, P>) -> Result<(), CallbackError>
where
    P: ProgressSnapshot + Display,
{
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}:{} {}", event.index, event.progress, event.item.title)?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let exit_code = match run_cli(&args) {
        Ok(Finish::Done) => 0,
        Ok(Finish::RebootRequired) => {
            eprintln!("Reboot Required.");
            1
        }
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<Finish, String> {
    let mut config = match &args.config {
        Some(path) => {
            SessionConfig::load(path).map_err(|e| format!("Invalid configuration: {}", e))?
        }
        None => SessionConfig::default(),
    };
    if let Some(ms) = args.search_timeout_ms {
        config.search_timeout = Timeout::from_millis(ms);
    }
    let criteria = args.criteria.clone().unwrap_or_else(|| config.criteria.clone());

    let agent = SimulatedAgent::new(args.scenario).with_tick(Duration::from_millis(args.tick_ms));
    let mut session =
        Session::open(agent, config).map_err(|e| format!("Failed to open session: {}", e))?;
    info!(
        client = session.service().client_id().unwrap_or("(none)"),
        scenario = ?args.scenario,
        "session opened"
    );

    if args.verbose {
        eprintln!("Searching: {}", criteria);
    }
    let updates = session
        .search(&criteria)
        .map_err(|e| format!("Search failed: {}", e))?;

    if args.verbose {
        for update in updates.iter() {
            eprintln!("  {}", update.describe());
        }
    }
    info!(count = updates.len(), "updates found");

    if !updates.is_empty() {
        session
            .download(&updates, print_tick::<DownloadProgress>)
            .map_err(|e| format!("Download failed: {}", e))?;
        session
            .install(&updates, print_tick::<InstallationProgress>)
            .map_err(|e| format!("Installation failed: {}", e))?;
    }

    if session.reboot_required() {
        Ok(Finish::RebootRequired)
    } else {
        Ok(Finish::Done)
    }
}
