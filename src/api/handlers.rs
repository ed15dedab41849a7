use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    Json,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::models::*;
use crate::{
    config::Config,
    error::{AppError, AppResult},
    ledger::{models::Bet, repository::LedgerRepository},
    settlement::{sweeper::Sweeper, BetSettler},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ledger: Arc<LedgerRepository>,
    pub settler: Arc<BetSettler>,
    pub sweeper: Arc<Sweeper>,
}

/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /bet-settlement?action=...
///
/// Dispatches on the `action` query parameter:
/// - `settle`: caller-driven settlement with an explicit status
/// - `auto-settle-casino`: settle a casino bet against a declared
///   winning selection
pub async fn bet_settlement(
    State(state): State<AppState>,
    Query(params): Query<SettlementAction>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<SettleResponse>> {
    authorize(&state.config, &headers)?;

    match params.action.as_str() {
        "settle" => {
            let request: SettleRequest = serde_json::from_value(body)
                .map_err(|e| AppError::InvalidInput(format!("Invalid settle request: {}", e)))?;

            info!(bet_id = %request.bet_id, status = %request.status, "manual settlement requested");

            let outcome = state
                .settler
                .settle_manual(request.bet_id, request.status, request.payout)
                .await?;
            Ok(Json(outcome.into()))
        }
        "auto-settle-casino" => {
            let request: CasinoSettleRequest = serde_json::from_value(body).map_err(|e| {
                AppError::InvalidInput(format!("Invalid casino settle request: {}", e))
            })?;

            info!(
                bet_id = %request.bet_id,
                winning_selection = %request.winning_selection,
                round_result = request.result.as_deref().unwrap_or("-"),
                "casino settlement requested"
            );

            let outcome = state
                .settler
                .settle_casino(request.bet_id, &request.winning_selection)
                .await?;
            Ok(Json(outcome.into()))
        }
        other => Err(AppError::InvalidInput(format!("Unknown action: {}", other))),
    }
}

/// POST /auto-settle-bets
///
/// Settle one bet by id, or sweep every pending bet when `auto` is set.
pub async fn auto_settle_bets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AutoSettleRequest>,
) -> AppResult<Json<SweepResponse>> {
    authorize(&state.config, &headers)?;

    let summary = match request.bet_id {
        Some(bet_id) => state.sweeper.sweep_one(bet_id).await?,
        None if request.auto.unwrap_or(false) => state.sweeper.sweep_all().await?,
        None => {
            return Err(AppError::InvalidInput(
                "Provide bet_id or auto=true".to_string(),
            ))
        }
    };

    Ok(Json(summary.into()))
}

/// GET /bets/pending
pub async fn list_pending_bets(State(state): State<AppState>) -> AppResult<Json<Vec<Bet>>> {
    let bets = state.ledger.list_pending_bets().await?;
    Ok(Json(bets))
}

/// GET /wallet/:user_id/balance
pub async fn get_wallet_balance(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<BalanceResponse>> {
    let balance = state.ledger.balance(user_id).await?;
    Ok(Json(BalanceResponse { user_id, balance }))
}

/// Shared-secret check for mutating endpoints. No configured key means
/// the endpoints are open.
fn authorize(config: &Config, headers: &HeaderMap) -> AppResult<()> {
    let Some(expected) = config.settle_api_key.as_deref() else {
        return Ok(());
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if provided == Some(expected) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}
