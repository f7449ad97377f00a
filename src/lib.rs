pub mod api;
pub mod auth;
pub mod cli;
mod commands;
pub mod config;
pub mod db;
pub mod models;
pub mod session;
pub mod settings;
pub mod timer;
pub mod tracking;
pub mod tui;
pub mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use tokio::sync::broadcast::error::TryRecvError;

use api::ApiClient;
use auth::AuthTokens;
use cli::{Cli, Command};
use config::AppConfig;
use db::Database;
use session::{NoticeLevel, Notifier, SessionStore};
use settings::SettingsStore;
use timer::{SystemClock, TimerController};
use utils::logging::{init_logging, LogSink};

/// Long-lived services shared by every command.
pub struct AppContext {
    pub config: AppConfig,
    pub db: Database,
    pub tokens: AuthTokens,
    pub api: ApiClient,
    pub notifier: Notifier,
    pub store: SessionStore,
    pub timer: TimerController,
    pub settings: Arc<SettingsStore>,
}

impl AppContext {
    pub async fn open(config: AppConfig) -> Result<Self> {
        let db = Database::new(config.database_path()?)?;
        let tokens = AuthTokens::load(db.clone())
            .await
            .context("failed to restore session")?;
        let api = ApiClient::new(&config.api_url, config.timeout(), tokens.clone())
            .context("failed to create API client")?;

        let notifier = Notifier::default();
        let store = SessionStore::new(Arc::new(api.clone()), notifier.clone());
        let timer = TimerController::new(db.clone(), Arc::new(SystemClock));
        let settings = Arc::new(SettingsStore::new(config.settings_path()?)?);

        Ok(Self {
            config,
            db,
            tokens,
            api,
            notifier,
            store,
            timer,
            settings,
        })
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // The live view owns the terminal, so it logs to a file instead.
    let interactive = matches!(cli.command, Command::Track { .. });
    if interactive {
        let log_path = cli.config.log_path()?;
        init_logging(LogSink::File(&log_path), LevelFilter::Info)?;
    } else {
        init_logging(LogSink::Stderr, LevelFilter::Warn)?;
    }

    info!("gains starting up against {}", cli.config.api_url);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let ctx = AppContext::open(cli.config).await?;
        let mut notices = ctx.notifier.subscribe();

        let result = commands::dispatch(&ctx, cli.command).await;

        if !interactive {
            loop {
                match notices.try_recv() {
                    Ok(notice) => match notice.level {
                        NoticeLevel::Error => eprintln!("! {}", notice.message),
                        _ => println!("{}", notice.message),
                    },
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        }
        result
    })
}
