use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tokio::sync::watch;
use tracing::info;

use super::models::*;
use crate::{
    error::{AppError, AppResult},
    notifications::NotificationBroadcaster,
    panel::{balance_rows, Balances, ContextUpdate, PanelContext, PanelStore, PreferenceStore},
    settlement::{ManualSettler, SchedulerStatus},
};

#[derive(Clone)]
pub struct AppState {
    pub panel: Arc<PanelStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub manual_settler: Arc<ManualSettler>,
    pub notifications: Arc<NotificationBroadcaster>,
    pub scheduler_status: watch::Receiver<SchedulerStatus>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        // The sender lives inside the scheduler task
        scheduler_running: state.scheduler_status.has_changed().is_ok(),
    })
}

/// Balance display
/// GET /panel/balances
pub async fn get_balances(State(state): State<AppState>) -> Json<BalancesResponse> {
    let context = state.panel.context();
    let balances = state.panel.balances();

    Json(BalancesResponse {
        market: context.market.as_ref().map(|m| m.address.clone()),
        connected: context.connected,
        rows: balance_rows(context.market.as_ref(), &balances),
    })
}

/// Publish market, accounts and wallet state
/// PUT /panel/context
pub async fn put_context(
    State(state): State<AppState>,
    Json(update): Json<ContextUpdate>,
) -> AppResult<StatusCode> {
    validate_context(&update)?;
    state.panel.apply_context(update);
    Ok(StatusCode::NO_CONTENT)
}

/// Publish balance snapshots
/// PUT /panel/balances
pub async fn put_balances(
    State(state): State<AppState>,
    Json(balances): Json<Balances>,
) -> AppResult<StatusCode> {
    for snapshot in [balances.base, balances.quote].iter().flatten() {
        if snapshot.wallet.is_sign_negative() || snapshot.unsettled.is_sign_negative() {
            return Err(AppError::InvalidInput(
                "Balances must not be negative".to_string(),
            ));
        }
    }
    state.panel.set_balances(balances);
    Ok(StatusCode::NO_CONTENT)
}

/// Settle all funds
/// POST /settlement/settle
pub async fn settle_funds(State(state): State<AppState>) -> AppResult<Json<SettleResponse>> {
    info!("Manual settlement requested");

    // Detached so a dropped request never cancels the operation or its notification
    let settler = state.manual_settler.clone();
    let outcome = tokio::spawn(async move { settler.settle_funds().await })
        .await
        .map_err(|e| AppError::Internal(format!("Manual settlement task failed: {}", e)))?;

    // Failures were already pushed to the notification stream
    outcome.clone().into_result()?;

    Ok(Json(SettleResponse { outcome }))
}

/// GET /settlement/status
pub async fn get_settlement_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler_status.borrow().clone())
}

/// GET /preferences/auto-settle
pub async fn get_auto_settle(State(state): State<AppState>) -> Json<AutoSettlePreference> {
    Json(AutoSettlePreference {
        enabled: state.preferences.auto_settle_enabled(),
    })
}

/// PUT /preferences/auto-settle
pub async fn put_auto_settle(
    State(state): State<AppState>,
    Json(preference): Json<AutoSettlePreference>,
) -> AppResult<Json<AutoSettlePreference>> {
    state.preferences.set_auto_settle_enabled(preference.enabled)?;
    Ok(Json(preference))
}

fn validate_context(update: &ContextUpdate) -> AppResult<()> {
    let Some(market) = update.market.as_ref() else {
        return Ok(());
    };

    if let Some(account) = update.base_currency_account.as_ref() {
        if account.mint != market.base_mint {
            return Err(AppError::InvalidInput(format!(
                "Base currency account {} holds mint {}, market expects {}",
                account.address, account.mint, market.base_mint
            )));
        }
    }

    if let Some(account) = update.quote_currency_account.as_ref() {
        if account.mint != market.quote_mint {
            return Err(AppError::InvalidInput(format!(
                "Quote currency account {} holds mint {}, market expects {}",
                account.address, account.mint, market.quote_mint
            )));
        }
    }

    Ok(())
}
