mod app;
mod config;
mod error;
mod resources;
mod ui;

use std::{fs::OpenOptions, sync::Mutex};

use datatable::JsonFileStore;
use tracing_subscriber::EnvFilter;

use crate::{
    config::AppConfig,
    error::{AppError, Result},
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_logging(&config)?;

    let store = JsonFileStore::load(&config.state_path)?;
    tracing::info!(
        "starting admin console against {} (state in {})",
        config.base_url,
        store.path().display()
    );

    let mut app = app::App::new(config, store)?;
    app.run().await?;
    Ok(())
}

/// The terminal belongs to the UI, so events go to the configured log file.
fn init_logging(config: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    let filter = EnvFilter::try_new(format!(
        "admin_tui={level},datatable={level}",
        level = config.log_level
    ))
    .map_err(|err| AppError::Logging(err.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| AppError::Logging(err.to_string()))?;
    Ok(())
}
