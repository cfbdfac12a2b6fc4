use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trading pair the panel is bound to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Market {
    pub address: String,
    pub base_symbol: String,
    pub quote_symbol: String,
    pub base_mint: String,
    pub quote_mint: String,
}

/// Open-orders account holding working orders and settleable proceeds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenOrdersAccount {
    pub address: String,
}

/// Token account funds are settled into
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenAccount {
    pub address: String,
    pub mint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wallet {
    pub public_key: String,
    /// Wallet can sign without an interactive prompt
    #[serde(default)]
    pub auto_approve: bool,
}

/// Network connection used to send settlement transactions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    pub endpoint: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub wallet: Decimal,
    pub unsettled: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Balances {
    pub base: Option<BalanceSnapshot>,
    pub quote: Option<BalanceSnapshot>,
}

impl Balances {
    /// True when either side has a non-zero unsettled amount
    pub fn has_unsettled(&self) -> bool {
        [self.base, self.quote]
            .iter()
            .flatten()
            .any(|snapshot| !snapshot.unsettled.is_zero())
    }
}

/// Everything a settlement needs, as currently known by the panel.
///
/// Market, accounts and wallet stay `None` until a wallet connects and the
/// market loads. The send connection is provisioned at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PanelSnapshot {
    pub market: Option<Market>,
    pub open_orders_account: Option<OpenOrdersAccount>,
    pub base_currency_account: Option<TokenAccount>,
    pub quote_currency_account: Option<TokenAccount>,
    pub wallet: Option<Wallet>,
    pub connection: Connection,
    pub connected: bool,
}

impl PanelSnapshot {
    pub fn disconnected(connection: Connection) -> Self {
        Self {
            market: None,
            open_orders_account: None,
            base_currency_account: None,
            quote_currency_account: None,
            wallet: None,
            connection,
            connected: false,
        }
    }

    pub fn wallet_auto_approves(&self) -> bool {
        self.wallet.as_ref().map(|w| w.auto_approve).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PairSide {
    Base,
    Quote,
}

/// One row of the balance display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceRow {
    pub side: PairSide,
    pub currency: Option<String>,
    pub mint: Option<String>,
    pub wallet: Option<Decimal>,
    pub unsettled: Option<Decimal>,
}

/// Base row first, then quote
pub fn balance_rows(market: Option<&Market>, balances: &Balances) -> Vec<BalanceRow> {
    let row = |side: PairSide, snapshot: Option<BalanceSnapshot>| {
        let (currency, mint) = match (side, market) {
            (PairSide::Base, Some(m)) => (Some(m.base_symbol.clone()), Some(m.base_mint.clone())),
            (PairSide::Quote, Some(m)) => {
                (Some(m.quote_symbol.clone()), Some(m.quote_mint.clone()))
            }
            (_, None) => (None, None),
        };
        BalanceRow {
            side,
            currency,
            mint,
            wallet: snapshot.map(|s| s.wallet),
            unsettled: snapshot.map(|s| s.unsettled),
        }
    };

    vec![
        row(PairSide::Base, balances.base),
        row(PairSide::Quote, balances.quote),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_has_unsettled() {
        let mut balances = Balances::default();
        assert!(!balances.has_unsettled());

        balances.base = Some(BalanceSnapshot { wallet: dec!(4), unsettled: Decimal::ZERO });
        balances.quote = Some(BalanceSnapshot { wallet: dec!(0), unsettled: dec!(0.000) });
        assert!(!balances.has_unsettled());

        balances.quote = Some(BalanceSnapshot { wallet: dec!(0), unsettled: dec!(0.25) });
        assert!(balances.has_unsettled());
    }

    #[test]
    fn test_balance_rows_without_market() {
        let balances = Balances {
            base: Some(BalanceSnapshot { wallet: dec!(1.5), unsettled: dec!(0.5) }),
            quote: None,
        };

        let rows = balance_rows(None, &balances);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].side, PairSide::Base);
        assert_eq!(rows[0].currency, None);
        assert_eq!(rows[0].unsettled, Some(dec!(0.5)));
        assert_eq!(rows[1].wallet, None);
    }

    #[test]
    fn test_balance_rows_with_market() {
        let market = Market {
            address: "mkt".into(),
            base_symbol: "SOL".into(),
            quote_symbol: "USDC".into(),
            base_mint: "So111".into(),
            quote_mint: "EPjF".into(),
        };

        let rows = balance_rows(Some(&market), &Balances::default());
        assert_eq!(rows[0].currency.as_deref(), Some("SOL"));
        assert_eq!(rows[1].currency.as_deref(), Some("USDC"));
        assert_eq!(rows[1].mint.as_deref(), Some("EPjF"));
    }
}
