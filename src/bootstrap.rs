use std::{sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::{
    api::handlers::AppState,
    config::Config,
    error::AppResult,
    ledger::repository::LedgerRepository,
    provider::DiamondClient,
    settlement::{sweeper::Sweeper, BetSettler},
};

pub async fn initialize_app_state(config: Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let pool = initialize_database(&config.database_url).await?;

    let ledger = Arc::new(LedgerRepository::new(pool));
    let settler = Arc::new(BetSettler::new(ledger.clone()));

    let provider = Arc::new(DiamondClient::new(
        config.provider_base_url.clone(),
        config.provider_api_key.clone(),
    )?);
    info!("Diamond result provider initialized: {}", config.provider_base_url);

    let sweeper = Arc::new(Sweeper::new(
        ledger.clone(),
        settler.clone(),
        provider,
    ));

    if config.settle_api_key.is_none() {
        warn!("SETTLE_API_KEY not set - settlement endpoints are open");
    }

    // Background sweep: periodically settle every pending bet whose
    // result the provider has declared.
    if config.sweep_interval_secs > 0 {
        sweeper.clone().start(config.sweep_interval_secs);
        info!(
            "Settlement sweep task started (every {}s)",
            config.sweep_interval_secs
        );
    } else {
        info!("Settlement sweep task disabled (SWEEP_INTERVAL_SECS=0)");
    }

    Ok(AppState {
        config: Arc::new(config),
        ledger,
        settler,
        sweeper,
    })
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database initialized");
    Ok(pool)
}
