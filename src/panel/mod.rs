// Panel context: market, accounts, wallet state, balances and preferences
pub mod models;
pub mod preferences;
pub mod store;

pub use models::{
    balance_rows, BalanceRow, BalanceSnapshot, Balances, Connection, Market, OpenOrdersAccount,
    PairSide, PanelSnapshot, TokenAccount, Wallet,
};
pub use preferences::{FilePreferenceStore, PreferenceStore, Preferences};
pub use store::{ContextUpdate, PanelContext, PanelStore};
