use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/admin.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub page_size: u64,
    /// Key-value file holding sidebar flags and the auth token.
    pub state_path: String,
    pub log_file: String,
    pub log_level: String,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            page_size: 20,
            state_path: "config/admin_state.json".to_string(),
            log_file: "admin_tui.log".to_string(),
            log_level: "info".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "admin_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:8080/api).
    #[arg(long)]
    base_url: Option<String>,
    /// Override rows per page.
    #[arg(long)]
    page_size: Option<u64>,
    /// Override the persisted state file.
    #[arg(long)]
    state: Option<String>,
    /// Override the log file.
    #[arg(long)]
    log_file: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("ADMIN_TUI"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size;
    }
    if let Some(state) = args.state {
        settings.state_path = state;
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = log_file;
    }

    Ok(settings)
}
