// Settlement guard: the preconditions shared by manual and automatic settlement
//
// Manual path: five required fields, first missing one wins.
// Automatic path: kill switch, fields, preference, unsettled funds,
// cooldown/in-flight, auto-approve, connection, in that order. A failed
// automatic check is a silent skip.

use serde::Serialize;
use uuid::Uuid;

use crate::error::PreconditionError;
use crate::panel::{Balances, PanelSnapshot};
use crate::settlement::SettlementRequest;

/// Resolve the context into a settlement request, or name the first missing field
pub fn require_settlement(context: &PanelSnapshot) -> Result<SettlementRequest, PreconditionError> {
    let wallet = context
        .wallet
        .as_ref()
        .ok_or(PreconditionError::WalletNotConnected)?;
    let market = context
        .market
        .as_ref()
        .ok_or(PreconditionError::MarketUnavailable)?;
    let open_orders = context
        .open_orders_account
        .as_ref()
        .ok_or(PreconditionError::OpenOrdersAccountUnavailable)?;
    let base_currency_account = context
        .base_currency_account
        .as_ref()
        .ok_or(PreconditionError::BaseAccountUnavailable)?;
    let quote_currency_account = context
        .quote_currency_account
        .as_ref()
        .ok_or(PreconditionError::QuoteAccountUnavailable)?;

    Ok(SettlementRequest {
        market: market.clone(),
        open_orders: open_orders.clone(),
        connection: context.connection.clone(),
        wallet: wallet.clone(),
        base_currency_account: base_currency_account.clone(),
        quote_currency_account: quote_currency_account.clone(),
    })
}

/// Automatic-path lifecycle owned by the scheduler task
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GuardState {
    Idle,
    Invoking { attempt_id: Uuid, started_at_ms: i64 },
    Cooldown { until_ms: i64 },
}

impl GuardState {
    /// An elapsed cooldown collapses back to `Idle`
    pub fn refresh(self, now_ms: i64) -> Self {
        match self {
            GuardState::Cooldown { until_ms } if now_ms >= until_ms => GuardState::Idle,
            other => other,
        }
    }

    /// State after an attempt triggered at `triggered_at_ms` resolves
    pub fn after_completion(triggered_at_ms: i64, cooldown_ms: i64, now_ms: i64) -> Self {
        GuardState::Cooldown {
            until_ms: triggered_at_ms.saturating_add(cooldown_ms),
        }
        .refresh(now_ms)
    }

    fn blocking_reason(&self, now_ms: i64) -> Option<SkipReason> {
        match *self {
            GuardState::Idle => None,
            GuardState::Invoking { attempt_id, .. } => Some(SkipReason::InFlight { attempt_id }),
            GuardState::Cooldown { until_ms } if now_ms < until_ms => {
                Some(SkipReason::CoolingDown {
                    remaining_ms: until_ms - now_ms,
                })
            }
            GuardState::Cooldown { .. } => None,
        }
    }
}

/// Why a tick did not settle
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    KillSwitch,
    MissingContext { missing: PreconditionError },
    AutoSettleDisabled,
    NothingUnsettled,
    InFlight { attempt_id: Uuid },
    CoolingDown { remaining_ms: i64 },
    WalletNotAutoApprove,
    Disconnected,
}

/// Everything one tick reads, captured fresh
pub struct AutoSettleInputs<'a> {
    pub override_active: bool,
    pub context: &'a PanelSnapshot,
    pub balances: &'a Balances,
    pub auto_settle_enabled: bool,
    pub now_ms: i64,
}

pub fn evaluate_auto(
    inputs: &AutoSettleInputs<'_>,
    state: &GuardState,
) -> Result<SettlementRequest, SkipReason> {
    if inputs.override_active {
        return Err(SkipReason::KillSwitch);
    }

    let request = require_settlement(inputs.context)
        .map_err(|missing| SkipReason::MissingContext { missing })?;

    if !inputs.auto_settle_enabled {
        return Err(SkipReason::AutoSettleDisabled);
    }

    if !inputs.balances.has_unsettled() {
        return Err(SkipReason::NothingUnsettled);
    }

    if let Some(reason) = state.blocking_reason(inputs.now_ms) {
        return Err(reason);
    }

    if !inputs.context.wallet_auto_approves() {
        return Err(SkipReason::WalletNotAutoApprove);
    }

    if !inputs.context.connected {
        return Err(SkipReason::Disconnected);
    }

    Ok(request)
}
