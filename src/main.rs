mod calc;
mod cmd;
mod data;
mod session;
mod ui;

use anyhow::Context;
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "leaves.log";

#[derive(Parser)]
#[command(name = "leaves", about = "employee leave calendar")]
struct Cli {
    /// Path to the data directory containing config and data files (default: ./config)
    #[arg(long, default_value = "./config")]
    data_dir: PathBuf,

    /// Calendar year to show (default: current year)
    #[arg(long)]
    year: Option<i32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize data files
    Init,
    /// List leave days per employee and month
    List {
        /// Only show this employee
        #[arg(short, long)]
        employee: Option<String>,
    },
    /// Rewrite legacy per-month leave entries as date periods
    Migrate {
        /// Year the legacy month entries belong to (default: current year)
        #[arg(long)]
        anchor_year: Option<i32>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.data_dir)
    };
    data::persistence::set_data_dir(data_dir.clone());

    // Auto-init when the data directory is missing or empty and the user did not
    // explicitly invoke the `init` subcommand.
    let is_init_command = matches!(cli.command, Some(Commands::Init));
    let needs_init = !is_init_command && dir_needs_init(&data_dir);

    init_logging(&data_dir)?;

    if needs_init {
        eprintln!(
            "Data directory '{}' is missing or empty, running init...",
            data_dir.display()
        );
        cmd::init::run()?;
    }

    let year = cli.year.unwrap_or_else(|| Local::now().year());
    match cli.command {
        None => cmd::root::run(year),
        Some(Commands::Init) => cmd::init::run(),
        Some(Commands::List { employee }) => cmd::list::run(year, employee.as_deref()),
        Some(Commands::Migrate { anchor_year }) => {
            cmd::migrate::run(anchor_year.unwrap_or_else(|| Local::now().year()))
        }
    }
}

/// Sends log output to `<dir>/leaves.log`; the terminal belongs to the UI.
/// `RUST_LOG` overrides the default `info` level.
fn init_logging(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create dir {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Returns true when `dir` does not exist or holds nothing but the log file.
fn dir_needs_init(dir: &Path) -> bool {
    if !dir.exists() {
        return true;
    }
    dir.read_dir()
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .all(|e| e.file_name() == LOG_FILE)
        })
        .unwrap_or(false)
}
