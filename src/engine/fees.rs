use rust_decimal::Decimal;
use std::sync::Arc;

use crate::database::repositories::FeeRepository;
use crate::engine::errors::ExecutionError;
use crate::models::{FeeSlot, OrderSide, Pair};
use crate::utils::decimal::{percent_of, AMOUNT_SCALE, FIAT_SCALE};

/// Resolves the fee rate that applies to one user on one pair
///
/// A custom rate for the user wins when it is set for the requested slot;
/// otherwise the latest default schedule row for the pair is used.
#[derive(Clone)]
pub struct FeeResolver {
    fees: Arc<dyn FeeRepository>,
}

impl FeeResolver {
    pub fn new(fees: Arc<dyn FeeRepository>) -> Self {
        Self { fees }
    }

    /// Effective rate, in percent, for a user on a pair
    pub fn resolve(&self, user_id: i64, pair: &Pair, slot: FeeSlot) -> Result<Decimal, ExecutionError> {
        let fee_key = pair.fee_key();

        let custom = self
            .fees
            .find_custom_rates(user_id, &fee_key)?
            .and_then(|rates| rates.rate(slot));
        if let Some(rate) = custom {
            return Ok(rate);
        }

        self.fees
            .find_latest_default_rates(&fee_key)?
            .and_then(|rates| rates.rate(slot))
            .ok_or(ExecutionError::FeeScheduleMissing(fee_key))
    }
}

/// Fee charged to one leg of a trade
///
/// Without a fiat-pegged coin both legs pay on the filled quantity at 8
/// decimals. With one, the buy leg still pays on quantity while the sell leg
/// pays on the total at 2 decimals.
pub fn calculate_fee(side: OrderSide, fill: Decimal, total: Decimal, rate: Decimal, fiat: bool) -> Decimal {
    match (fiat, side) {
        (true, OrderSide::Sell) => percent_of(total, rate, FIAT_SCALE),
        _ => percent_of(fill, rate, AMOUNT_SCALE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeeRates;
    use crate::testing::InMemoryExchange;
    use rust_decimal_macros::dec;

    fn btc_brl() -> Pair {
        Pair::parse("BTC/BRL").unwrap()
    }

    #[test]
    fn test_default_rates_by_slot() {
        let resolver = FeeResolver::new(Arc::new(InMemoryExchange::with_btc_brl()));

        assert_eq!(resolver.resolve(1, &btc_brl(), FeeSlot::Maker).unwrap(), dec!(0.1));
        assert_eq!(resolver.resolve(1, &btc_brl(), FeeSlot::Taker).unwrap(), dec!(0.2));
    }

    #[test]
    fn test_custom_rate_overrides_default() {
        let exchange = InMemoryExchange::with_btc_brl();
        exchange.set_custom_fees(
            7,
            "btcbrl",
            FeeRates {
                maker: Some(dec!(0)),
                taker: None,
            },
        );
        let resolver = FeeResolver::new(Arc::new(exchange));

        // Zero is a valid override, a missing slot falls back
        assert_eq!(resolver.resolve(7, &btc_brl(), FeeSlot::Maker).unwrap(), dec!(0));
        assert_eq!(resolver.resolve(7, &btc_brl(), FeeSlot::Taker).unwrap(), dec!(0.2));
        assert_eq!(resolver.resolve(8, &btc_brl(), FeeSlot::Maker).unwrap(), dec!(0.1));
    }

    #[test]
    fn test_latest_default_row_is_used() {
        let exchange = InMemoryExchange::with_btc_brl();
        exchange.add_default_fees("btcbrl", FeeRates::new(dec!(0.05), dec!(0.15)));
        let resolver = FeeResolver::new(Arc::new(exchange));

        assert_eq!(resolver.resolve(1, &btc_brl(), FeeSlot::Taker).unwrap(), dec!(0.15));
    }

    #[test]
    fn test_missing_schedule() {
        let resolver = FeeResolver::new(Arc::new(InMemoryExchange::new()));
        let err = resolver.resolve(1, &btc_brl(), FeeSlot::Maker).unwrap_err();
        assert!(matches!(err, ExecutionError::FeeScheduleMissing(ref key) if key == "btcbrl"));
    }

    #[test]
    fn test_fee_on_quantity_without_fiat() {
        assert_eq!(
            calculate_fee(OrderSide::Sell, dec!(2), dec!(0.06), dec!(0.25), false),
            dec!(0.005)
        );
        assert_eq!(
            calculate_fee(OrderSide::Buy, dec!(0.123456789), dec!(1), dec!(0.2), false),
            dec!(0.00024691)
        );
    }

    #[test]
    fn test_fiat_sell_fee_on_total() {
        // 0.2% of 300 at 2 decimals, not 0.2% of 3
        assert_eq!(
            calculate_fee(OrderSide::Sell, dec!(3), dec!(300), dec!(0.2), true),
            dec!(0.60)
        );
        assert_eq!(
            calculate_fee(OrderSide::Buy, dec!(3), dec!(300), dec!(0.1), true),
            dec!(0.003)
        );
    }
}
