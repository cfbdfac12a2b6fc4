// Settlement: moving unsettled proceeds from the open-orders account back to the wallet
pub mod guard;
pub mod manual;
pub mod relay;
pub mod scheduler;

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::SettlementError;
use crate::panel::{Connection, Market, OpenOrdersAccount, TokenAccount, Wallet};

pub use guard::{GuardState, SkipReason};
pub use manual::{ManualOutcome, ManualSettler};
pub use relay::RelaySettlement;
pub use scheduler::{AutoSettler, Clock, SchedulerHandle, SchedulerStatus, SystemClock};

/// A fully resolved settlement: every account present
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettlementRequest {
    pub market: Market,
    pub open_orders: OpenOrdersAccount,
    pub connection: Connection,
    pub wallet: Wallet,
    pub base_currency_account: TokenAccount,
    pub quote_currency_account: TokenAccount,
}

/// The on-chain settlement itself. Shared by the automatic and manual paths.
#[async_trait]
pub trait SettlementOperation: Send + Sync {
    async fn settle(&self, request: SettlementRequest) -> Result<(), SettlementError>;
}

/// Run the operation, turning a panic into an ordinary settlement failure
pub(crate) async fn run_settlement(
    operation: &dyn SettlementOperation,
    request: SettlementRequest,
) -> Result<(), SettlementError> {
    match AssertUnwindSafe(operation.settle(request)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(SettlementError::Panicked(message))
        }
    }
}
