//! Trade economics of one match step
//!
//! Pure rules (fill, settlement price, total) are free functions; the
//! calculator adds the coin metadata and fee rates that need lookups.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::collaborators::MarketValidator;
use crate::engine::errors::ExecutionError;
use crate::engine::fees::{calculate_fee, FeeResolver};
use crate::models::{CoinInfo, FeeSlot, OperationType, Order, OrderSide, Pair};
use crate::utils::decimal::{round_to, AMOUNT_SCALE, FIAT_SCALE};

/// Everything a match step needs to write its records
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEconomics {
    pub pair: Pair,
    pub base: CoinInfo,
    pub quote: CoinInfo,
    /// Either coin is fiat-pegged
    pub fiat: bool,
    pub fill: Decimal,
    pub price: Decimal,
    pub total: Decimal,
    /// The identified order was placed first (lower id)
    pub identified_is_maker: bool,
    pub identified_fee_rate: Decimal,
    pub candidate_fee_rate: Decimal,
    pub identified_fee: Decimal,
    pub candidate_fee: Decimal,
}

/// Quantity exchanged: the smaller of the two remaining amounts
pub fn fill_quantity(identified: &Order, candidate: &Order) -> Decimal {
    identified.amount.min(candidate.amount)
}

/// Price the trade settles at
///
/// Between two orders of the same type the older order's price wins, with
/// ties going to the candidate. Two limit orders must cross first. A limit
/// order always sets the price against a market order.
pub fn settlement_price(identified: &Order, candidate: &Order) -> Result<Decimal, ExecutionError> {
    let older_price = if identified.placed_before(candidate) {
        identified.price_unity
    } else {
        candidate.price_unity
    };

    match (identified.operation_type, candidate.operation_type) {
        (OperationType::Market, OperationType::Market) => Ok(older_price),
        (OperationType::Limit, OperationType::Limit) => {
            let crosses = match identified.side {
                OrderSide::Buy => candidate.price_unity <= identified.price_unity,
                OrderSide::Sell => candidate.price_unity >= identified.price_unity,
            };
            if !crosses {
                return Err(ExecutionError::PriceInconsistency {
                    identified_id: identified.id,
                    identified_price: identified.price_unity,
                    candidate_id: candidate.id,
                    candidate_price: candidate.price_unity,
                });
            }
            Ok(older_price)
        }
        (OperationType::Limit, OperationType::Market) => Ok(identified.price_unity),
        (OperationType::Market, OperationType::Limit) => Ok(candidate.price_unity),
    }
}

/// Value of the trade in the quote coin
pub fn settlement_total(fill: Decimal, price: Decimal, fiat: bool) -> Decimal {
    let scale = if fiat { FIAT_SCALE } else { AMOUNT_SCALE };
    round_to(fill * price, scale)
}

/// Computes [`TradeEconomics`] for an identified order and one candidate
#[derive(Clone)]
pub struct TradeEconomicsCalculator {
    validator: Arc<dyn MarketValidator>,
    fees: FeeResolver,
}

impl TradeEconomicsCalculator {
    pub fn new(validator: Arc<dyn MarketValidator>, fees: FeeResolver) -> Self {
        Self { validator, fees }
    }

    pub async fn calculate(
        &self,
        identified: &Order,
        candidate: &Order,
    ) -> Result<TradeEconomics, ExecutionError> {
        let pair = Pair::parse(&identified.pair)
            .ok_or_else(|| ExecutionError::InvalidAsset(format!("Pair {}", identified.pair)))?;

        let fill = fill_quantity(identified, candidate);
        let price = settlement_price(identified, candidate)?;

        let base = self.validator.validate_coin_available(&pair.base).await?;
        let quote = self.validator.validate_coin_available(&pair.quote).await?;
        let fiat = base.fiat_pegged || quote.fiat_pegged;
        let total = settlement_total(fill, price, fiat);

        let identified_is_maker = identified.id < candidate.id;
        let identified_fee_rate = self.fees.resolve(
            identified.user.id,
            &pair,
            FeeSlot::for_maker(identified_is_maker),
        )?;
        let candidate_fee_rate = self.fees.resolve(
            candidate.user.id,
            &pair,
            FeeSlot::for_maker(!identified_is_maker),
        )?;

        let identified_fee = calculate_fee(identified.side, fill, total, identified_fee_rate, fiat);
        let candidate_fee = calculate_fee(candidate.side, fill, total, candidate_fee_rate, fiat);

        tracing::debug!(
            "Economics {} x {}: fill={} price={} total={} fees={}/{} (identified maker: {})",
            identified.identificator,
            candidate.identificator,
            fill,
            price,
            total,
            identified_fee,
            candidate_fee,
            identified_is_maker
        );

        Ok(TradeEconomics {
            pair,
            base,
            quote,
            fiat,
            fill,
            price,
            total,
            identified_is_maker,
            identified_fee_rate,
            candidate_fee_rate,
            identified_fee,
            candidate_fee,
        })
    }
}
