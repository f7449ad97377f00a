use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Args;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Connection and storage settings, from flags or `GAINS_*` environment variables.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Root of the workout REST API
    #[arg(long, env = "GAINS_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Directory for client state, settings and logs
    #[arg(long, env = "GAINS_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, env = "GAINS_TIMEOUT_SECS", default_value_t = 15, global = true)]
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join("gains"))
                .context("no platform data directory; set GAINS_DATA_DIR"),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("gains.sqlite3"))
    }

    pub fn settings_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("settings.json"))
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("gains.log"))
    }
}
