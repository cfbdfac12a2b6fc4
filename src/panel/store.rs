use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::panel::models::{
    Balances, Connection, Market, OpenOrdersAccount, PanelSnapshot, TokenAccount, Wallet,
};

/// Read access to the panel's current context and balances.
///
/// Implementations return fresh copies; callers never hold locks across awaits.
pub trait PanelContext: Send + Sync {
    fn context(&self) -> PanelSnapshot;

    fn balances(&self) -> Balances;
}

/// Fields the external collaborators publish (everything but the send connection)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContextUpdate {
    pub market: Option<Market>,
    pub open_orders_account: Option<OpenOrdersAccount>,
    pub base_currency_account: Option<TokenAccount>,
    pub quote_currency_account: Option<TokenAccount>,
    pub wallet: Option<Wallet>,
    #[serde(default)]
    pub connected: bool,
}

/// In-memory panel state written by the API layer
pub struct PanelStore {
    context: RwLock<PanelSnapshot>,
    balances: RwLock<Balances>,
}

impl PanelStore {
    pub fn new(connection: Connection) -> Self {
        Self {
            context: RwLock::new(PanelSnapshot::disconnected(connection)),
            balances: RwLock::new(Balances::default()),
        }
    }

    /// Replace everything except the send connection
    pub fn apply_context(&self, update: ContextUpdate) {
        let mut context = self.context.write();
        let was_connected = context.connected;

        context.market = update.market;
        context.open_orders_account = update.open_orders_account;
        context.base_currency_account = update.base_currency_account;
        context.quote_currency_account = update.quote_currency_account;
        context.wallet = update.wallet;
        context.connected = update.connected;

        if was_connected != context.connected {
            info!(
                "🔌 Wallet {}",
                if context.connected { "connected" } else { "disconnected" }
            );
        }
        debug!(
            "Panel context updated (market: {:?}, wallet: {:?})",
            context.market.as_ref().map(|m| &m.address),
            context.wallet.as_ref().map(|w| &w.public_key)
        );
    }

    pub fn set_balances(&self, balances: Balances) {
        debug!("Balances updated: {:?}", balances);
        *self.balances.write() = balances;
    }
}

impl PanelContext for PanelStore {
    fn context(&self) -> PanelSnapshot {
        self.context.read().clone()
    }

    fn balances(&self) -> Balances {
        self.balances.read().clone()
    }
}
