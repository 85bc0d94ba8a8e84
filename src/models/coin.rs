use serde::{Deserialize, Serialize};

/// Coin metadata returned by the availability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub symbol: String,
    /// Fiat-pegged assets settle at 2 decimal places
    pub fiat_pegged: bool,
    /// Display symbol used in notifications (e.g. `R$`)
    pub currency_symbol: String,
}
