pub mod cli;
pub mod config;
mod config_commands;
pub mod db;
pub mod journal;
pub mod navigation;
mod utils;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cli::{Cli, Commands};
use config::{ConfigStore, CONFIG_FILE, DATABASE_FILE};
use db::Database;
use journal::{commands, JournalController};
use navigation::{Clock, Route};

/// Everything a command needs, opened once per process and torn down with
/// [`AppState::shutdown`].
pub struct AppState {
    pub db: Database,
    pub journal: JournalController,
    pub config: ConfigStore,
}

impl AppState {
    /// Opens the journal in `data_dir`. Must run inside a Tokio runtime.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = ConfigStore::new(data_dir.join(CONFIG_FILE))?;
        let settings = config.config();

        let db = Database::new(data_dir.join(DATABASE_FILE))?;
        let journal =
            JournalController::new(db.clone(), Clock::from(settings.clock), settings.write_retries);

        Ok(Self {
            db,
            journal,
            config,
        })
    }

    /// Waits for queued writes, then stops the writer.
    pub async fn shutdown(&self) {
        self.journal.shutdown().await;
        info!("daybook shut down");
    }
}

pub async fn execute(state: &AppState, command: Commands, json: bool) -> Result<()> {
    let journal = &state.journal;
    journal.start().await?;

    match command {
        Commands::Show { date } => {
            let route = date.map(Route::Entry).unwrap_or(Route::Today);
            commands::show(journal, route, json).await
        }
        Commands::Today => commands::show(journal, navigation::go_to_today(), json).await,
        Commands::Prev { date } => commands::previous(journal, date, json).await,
        Commands::Next { date } => commands::next(journal, date, json).await,
        Commands::Morning(args) => commands::morning(journal, args, json).await,
        Commands::Evening(args) => commands::evening(journal, args, json).await,
        Commands::History => commands::history(journal, json).await,
        Commands::Settings { action } => commands::settings(journal, action, json).await,
        Commands::Config { action } => config_commands::config(state, action, json),
    }
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let data_dir = config::resolve_data_dir(cli.data_dir.clone());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let state = AppState::open(&data_dir)?;
        info!("daybook opened at {}", data_dir.display());

        let result = execute(&state, cli.command, cli.json).await;
        state.shutdown().await;
        result
    })
}
