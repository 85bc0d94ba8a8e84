use std::sync::Arc;

use crate::collaborators::{BlockedUsers, MarketValidator};
use crate::database::repositories::{CandidateQuery, OrderRepository};
use crate::engine::errors::ExecutionError;
use crate::models::{Order, Pair};

/// An identified order with the counter-orders it may trade against
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidates {
    pub identified: Order,
    /// Best price first, newest first at equal price
    pub candidates: Vec<Order>,
}

/// Finds the counter-orders an identified order can be matched with
pub struct CounterOrderFinder {
    orders: Arc<dyn OrderRepository>,
    validator: Arc<dyn MarketValidator>,
    blocked: Arc<dyn BlockedUsers>,
}

impl CounterOrderFinder {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        validator: Arc<dyn MarketValidator>,
        blocked: Arc<dyn BlockedUsers>,
    ) -> Self {
        Self {
            orders,
            validator,
            blocked,
        }
    }

    /// Load the identified order and its candidates
    ///
    /// Returns `None` when the order is missing or not eligible, its market
    /// is unavailable, or no candidate survives filtering.
    pub async fn find(&self, identificator: &str) -> Result<Option<MatchCandidates>, ExecutionError> {
        let identified = match self.orders.find_by_identificator(identificator)? {
            Some(order) if order.is_eligible() => order,
            Some(_) => {
                tracing::debug!("Order {} is not eligible for execution", identificator);
                return Ok(None);
            }
            None => {
                tracing::debug!("Order {} not found", identificator);
                return Ok(None);
            }
        };

        if !self.market_available(&identified).await {
            return Ok(None);
        }

        let query = CandidateQuery::for_order(&identified);
        let candidates: Vec<Order> = self
            .orders
            .find_candidates(&query)?
            .into_iter()
            .filter(|candidate| {
                let blocked = self.blocked.is_blocked(candidate.user.id);
                if blocked {
                    tracing::debug!(
                        "Skipping order {} of blocked user {}",
                        candidate.identificator,
                        candidate.user.id
                    );
                }
                !blocked
            })
            .collect();

        if candidates.is_empty() {
            tracing::debug!("No counter-orders for {}", identificator);
            return Ok(None);
        }

        tracing::debug!(
            "Found {} counter-orders for {}",
            candidates.len(),
            identificator
        );
        Ok(Some(MatchCandidates {
            identified,
            candidates,
        }))
    }

    async fn market_available(&self, order: &Order) -> bool {
        let Some(pair) = Pair::parse(&order.pair) else {
            tracing::debug!("Order {} has malformed pair {}", order.identificator, order.pair);
            return false;
        };

        if let Err(e) = self
            .validator
            .validate_pair_available(&pair.availability_key())
            .await
        {
            tracing::debug!("Market check failed for {}: {}", order.identificator, e);
            return false;
        }

        for coin in [&pair.base, &pair.quote] {
            if let Err(e) = self.validator.validate_coin_available(coin).await {
                tracing::debug!("Market check failed for {}: {}", order.identificator, e);
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{BlockedUserCache, DbMarketValidator};
    use crate::testing::{InMemoryExchange, OrderBuilder, TestScenario};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn finder(exchange: &InMemoryExchange, blocked: &BlockedUserCache) -> CounterOrderFinder {
        CounterOrderFinder::new(
            Arc::new(exchange.clone()),
            Arc::new(DbMarketValidator::new(Arc::new(exchange.clone()))),
            Arc::new(blocked.clone()),
        )
    }

    fn ids(found: &MatchCandidates) -> Vec<i64> {
        found.candidates.iter().map(|o| o.id).collect()
    }

    #[tokio::test]
    async fn test_sell_candidates_ascending_for_buy() {
        let exchange = InMemoryExchange::with_btc_brl();
        exchange.insert_order(OrderBuilder::limit_sell(1, dec!(100), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_sell(2, dec!(98), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_sell(3, dec!(99), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_sell(4, dec!(102), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_buy(5, dec!(100), dec!(3)).build());

        let found = finder(&exchange, &BlockedUserCache::new())
            .find("ord-5")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.identified.id, 5);
        assert_eq!(ids(&found), vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_market_sell_takes_any_price_descending() {
        let exchange = InMemoryExchange::with_btc_brl();
        TestScenario::MarketSellSweep.seed(&exchange);
        exchange.insert_order(OrderBuilder::limit_buy(4, dec!(1), dec!(1)).build());

        let found = finder(&exchange, &BlockedUserCache::new())
            .find("ord-3")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ids(&found), vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_equal_price_newest_first() {
        let exchange = InMemoryExchange::with_btc_brl();
        let first = OrderBuilder::limit_sell(1, dec!(100), dec!(1)).build();
        exchange.insert_order(first.clone());
        exchange.insert_order(
            OrderBuilder::limit_sell(2, dec!(100), dec!(1))
                .placed_at(first.time + Duration::minutes(1))
                .build(),
        );
        exchange.insert_order(OrderBuilder::limit_buy(3, dec!(100), dec!(2)).build());

        let found = finder(&exchange, &BlockedUserCache::new())
            .find("ord-3")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ids(&found), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_blocked_users_are_skipped() {
        let exchange = InMemoryExchange::with_btc_brl();
        let blocked = BlockedUserCache::new();
        exchange.insert_order(OrderBuilder::limit_sell(1, dec!(99), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_sell(2, dec!(100), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_buy(3, dec!(100), dec!(2)).build());
        blocked.mark_blocked(101);

        let found = finder(&exchange, &blocked).find("ord-3").await.unwrap().unwrap();
        assert_eq!(ids(&found), vec![2]);

        blocked.mark_blocked(102);
        assert!(finder(&exchange, &blocked).find("ord-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_counter_orders() {
        let exchange = InMemoryExchange::with_btc_brl();
        let identified = TestScenario::NoCounterOrders.seed(&exchange);

        let found = finder(&exchange, &BlockedUserCache::new())
            .find(&identified.identificator)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_ineligible_or_missing_identified_order() {
        let exchange = InMemoryExchange::with_btc_brl();
        exchange.insert_order(OrderBuilder::limit_sell(1, dec!(100), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_buy(2, dec!(100), dec!(1)).locked().build());
        exchange.insert_order(OrderBuilder::limit_buy(3, dec!(0), dec!(1)).build());
        let finder = finder(&exchange, &BlockedUserCache::new());

        assert!(finder.find("ord-2").await.unwrap().is_none());
        assert!(finder.find("ord-3").await.unwrap().is_none());
        assert!(finder.find("ord-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_market() {
        let exchange = InMemoryExchange::with_btc_brl();
        exchange.insert_order(OrderBuilder::limit_sell(1, dec!(100), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_buy(2, dec!(100), dec!(1)).build());
        exchange.add_pair("btc_brl", false);

        let found = finder(&exchange, &BlockedUserCache::new()).find("ord-2").await.unwrap();
        assert!(found.is_none());

        exchange.add_pair("btc_brl", true);
        exchange.deactivate_coin("BRL");
        let found = finder(&exchange, &BlockedUserCache::new()).find("ord-2").await.unwrap();
        assert!(found.is_none());
    }
}
