mod cli;
mod config;
mod http;
mod jobs;
mod state;
mod wiring;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Mode};
use crate::config::ConfigError;
use crate::http::HttpError;
use crate::jobs::JobError;
use crate::wiring::WiringError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid cli: {0}")]
    InvalidCli(String),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("http error: {0}")]
    Http(#[from] HttpError),
    #[error("job error: {0}")]
    Jobs(#[from] JobError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    config::load_dotenv()?;
    let mut config = config::AppConfig::from_env()?;
    if cli.mode == Mode::Api && (cli.post_url.is_some() || cli.max_comments.is_some()) {
        return Err(AppError::InvalidCli(
            "--post-url and --max-comments require harvest mode".to_string(),
        ));
    }
    if let Some(post_url) = cli.post_url {
        config.harvest.post_url = Some(post_url);
    }
    if let Some(max_comments) = cli.max_comments {
        config.harvest.max_comments = max_comments;
    }
    let state = wiring::build_state(config)?;

    match cli.mode {
        Mode::Harvest => {
            jobs::run_harvest(state, shutdown_signal()).await?;
        }
        Mode::Api => {
            let addr = state.config.http_addr;
            info!(%addr, model = state.model.name(), "http server starting");
            tokio::select! {
                _ = shutdown_signal() => {
                    info!("shutdown signal received");
                }
                res = http::serve(addr, state) => {
                    res?;
                }
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}
