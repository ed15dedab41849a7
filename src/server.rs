use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::api::handlers::{
    auto_settle_bets, bet_settlement, get_wallet_balance, health_check, list_pending_bets,
    AppState,
};

pub async fn create_app(state: AppState) -> Router {
    info!("Setting up HTTP routes...");

    let app = Router::new()
        .route("/health", get(health_check))
        // Settlement endpoints (action selected by query parameter)
        .route("/bet-settlement", post(bet_settlement))
        .route("/auto-settle-bets", post(auto_settle_bets))
        // Read endpoints for operational visibility
        .route("/bets/pending", get(list_pending_bets))
        .route("/wallet/:user_id/balance", get(get_wallet_balance))
        // CORS-open by design: callers are edge functions and dashboards
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Server listening on: {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
