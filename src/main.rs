use std::sync::Arc;

use anyhow::Result;
use dotenv::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use livestream_hub::api::{self, AppState};
use livestream_hub::config::{Config, LogFormat, StoreBackend};
use livestream_hub::db::Database;
use livestream_hub::payments::StripeClient;
use livestream_hub::store::{MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,livestream_hub=debug".into()),
    );
    match config.log.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
    info!("Initialized configuration");

    if config.stripe.secret_key.is_empty() {
        warn!("STRIPE_SECRET_KEY is not set, checkout requests will fail");
    }
    if config.stripe.webhook_secret.is_empty() {
        warn!("STRIPE_WEBHOOK_SECRET is not set, every webhook will be rejected");
    }

    let processor = Arc::new(StripeClient::new(
        config.stripe.api_base.clone(),
        config.stripe.secret_key.clone(),
    )?);

    let state = match config.store {
        StoreBackend::Postgres => {
            let db = Arc::new(Database::connect(&config.database).await?);
            info!("Connected to database");
            AppState::new(Arc::new(PgStore::new(db)), processor, config.stripe.billing())
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store, data will not survive a restart");
            AppState::new(Arc::new(MemoryStore::new()), processor, config.stripe.billing())
        }
    };

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, initiating graceful shutdown"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    };

    if let Err(e) = api::start_api_server(&config.server, state, shutdown).await {
        error!("API server error: {}", e);
        return Err(e);
    }

    info!("Livestream hub shutdown complete");
    Ok(())
}
