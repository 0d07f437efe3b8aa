//! Slotwise Server — application entry point.

mod config;

use slotwise_db::DbManager;
use slotwise_scheduling::Directory;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Db(#[from] slotwise_db::DbError),

    #[error(transparent)]
    Domain(#[from] slotwise_core::SlotwiseError),

    #[error("signal handling failed: {0}")]
    Signal(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slotwise=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "Slotwise server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    tracing::info!("Starting Slotwise server...");

    let config = ServerConfig::from_env()?;
    let manager = DbManager::connect(&config.db).await?;
    let repos = manager.repositories();
    let directory = Directory::new(repos);
    let (owner, created) = directory
        .ensure_platform_owner(&config.owner_name, &config.owner_email)
        .await?;
    if created {
        tracing::warn!(
            principal_id = %owner.id,
            email = %owner.email,
            "Seeded platform owner; grant operators their own accounts"
        );
    }

    tracing::info!(
        principal_id = %owner.id,
        scheduling = ?config.scheduling,
        "Slotwise server ready"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Slotwise server stopped.");
    Ok(())
}
