//! Eventide admin entry point.

use clap::Parser;
use eventide_event_store::connect_pool;
use eventide_event_store::schema::{create_event_store, truncate_event_store};
use tracing_subscriber::EnvFilter;

use crate::cli::{AdminCommand, Cli};
use crate::error::AppError;

mod cli;
mod error;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = cli.store_config()?;
    let pool = connect_pool(&config).await?;

    match cli.command {
        AdminCommand::CreateStore => {
            create_event_store(&pool).await?;
            tracing::info!("Event store created");
        }
        AdminCommand::TruncateStore => {
            truncate_event_store(&pool).await?;
            tracing::warn!("Event store truncated");
        }
    }

    pool.close().await;
    Ok(())
}
