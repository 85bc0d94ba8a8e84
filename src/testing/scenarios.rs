use crate::models::Order;
use crate::testing::exchange::InMemoryExchange;
use crate::testing::fixtures::{base_time, OrderBuilder};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Pre-defined order books seeded into an [`InMemoryExchange`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestScenario {
    /// Limit buy 10 @ 100 against one resting limit sell 10 @ 100
    FullCross,
    /// Market sell 15 against resting limit buys 10 @ 101 and 10 @ 100
    MarketSellSweep,
    /// Limit buy with only same-side and other-pair orders resting
    NoCounterOrders,
    /// Limit sell 3 @ 100 against a resting limit buy 3 @ 100 on a fiat pair
    FiatSellFee,
}

impl TestScenario {
    /// Seed the book and return the identified order
    pub fn seed(self, exchange: &InMemoryExchange) -> Order {
        let identified = match self {
            TestScenario::FullCross => {
                exchange.insert_order(
                    OrderBuilder::limit_sell(1, dec!(100), dec!(10))
                        .placed_at(base_time())
                        .build(),
                );
                OrderBuilder::limit_buy(2, dec!(100), dec!(10))
                    .placed_at(base_time())
                    .build()
            }

            TestScenario::MarketSellSweep => {
                exchange.insert_order(OrderBuilder::limit_buy(1, dec!(101), dec!(10)).build());
                exchange.insert_order(OrderBuilder::limit_buy(2, dec!(100), dec!(10)).build());
                OrderBuilder::market_sell(3, dec!(15)).build()
            }

            TestScenario::NoCounterOrders => {
                exchange.insert_order(OrderBuilder::limit_buy(1, dec!(99), dec!(10)).build());
                exchange.insert_order(
                    OrderBuilder::limit_sell(2, dec!(90), dec!(10))
                        .pair("ETH/BRL")
                        .build(),
                );
                OrderBuilder::limit_buy(3, dec!(100), dec!(10)).build()
            }

            TestScenario::FiatSellFee => {
                exchange.insert_order(OrderBuilder::limit_buy(1, dec!(100), dec!(3)).build());
                OrderBuilder::limit_sell(2, dec!(100), dec!(3)).build()
            }
        };

        exchange.insert_order(identified.clone());
        identified
    }
}
