mod app;
mod clock;
mod config;
mod economy;
mod error;
mod input;
mod interact;
mod model;
mod quest;
mod render;
mod sim;
mod storage;
mod world;

use anyhow::{Context, Result};
use clap::Parser;
use model::Role;
use std::{fs::OpenOptions, path::Path, path::PathBuf, sync::Mutex};
use tracing_subscriber::EnvFilter;

/// A small town life sim in the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub(crate) struct Cli {
    /// Role for new runs: actor, thug or police
    #[arg(long)]
    pub(crate) role: Option<Role>,
    /// Base seed for the run's random numbers
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Frame rate cap
    #[arg(long)]
    pub(crate) fps: Option<u32>,
    /// Disable colors
    #[arg(long)]
    pub(crate) mono: bool,
    /// Use this save file instead of the default one
    #[arg(long)]
    pub(crate) save: Option<PathBuf>,
    /// Skip the menu and start a new run
    #[arg(long)]
    pub(crate) new: bool,
}

// The terminal belongs to the renderer, so logs go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = config::project_paths()?;
    init_logging(&paths.log_path)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "streetlife starting");
    app::run(cli, paths)
}
