use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::{OrderRow, OrderSettlementChangeset, UserRow};
use crate::database::schema::{orders, users};
use crate::models::{Order, OrderSide};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::sync::Arc;

/// Price limit a counter-order must respect to cross a limit order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBound {
    /// Candidate price must be at most this value (identified order buys)
    AtMost(Decimal),
    /// Candidate price must be at least this value (identified order sells)
    AtLeast(Decimal),
}

/// Primary sort applied to counter-orders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrder {
    /// Cheapest first, used when buying
    Ascending,
    /// Most expensive first, used when selling
    Descending,
}

/// Selection of counter-orders for an identified order
///
/// Candidates are same-pair, opposite-side, eligible orders. When the
/// identified order is a limit order the candidate price must cross it.
/// Results are sorted by price (best first) and, at equal price, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub pair: String,
    pub side: OrderSide,
    pub price_bound: Option<PriceBound>,
    pub price_order: PriceOrder,
}

impl CandidateQuery {
    pub fn for_order(identified: &Order) -> Self {
        let side = identified.side.opposite();
        let price_order = match identified.side {
            OrderSide::Buy => PriceOrder::Ascending,
            OrderSide::Sell => PriceOrder::Descending,
        };
        let price_bound = identified.is_limit().then(|| match identified.side {
            OrderSide::Buy => PriceBound::AtMost(identified.price_unity),
            OrderSide::Sell => PriceBound::AtLeast(identified.price_unity),
        });

        Self {
            pair: identified.pair.clone(),
            side,
            price_bound,
            price_order,
        }
    }

    /// Check an order against the query filters
    pub fn matches(&self, order: &Order) -> bool {
        if order.pair != self.pair || order.side != self.side || !order.is_eligible() {
            return false;
        }

        match self.price_bound {
            Some(PriceBound::AtMost(limit)) => order.price_unity <= limit,
            Some(PriceBound::AtLeast(limit)) => order.price_unity >= limit,
            None => true,
        }
    }

    /// Ordering of two matching orders in the result list
    pub fn compare(&self, a: &Order, b: &Order) -> Ordering {
        let by_price = match self.price_order {
            PriceOrder::Ascending => a.price_unity.cmp(&b.price_unity),
            PriceOrder::Descending => b.price_unity.cmp(&a.price_unity),
        };
        by_price.then_with(|| b.time.cmp(&a.time))
    }
}

/// Order repository trait - reads, locks and settles orders
pub trait OrderRepository: Send + Sync {
    /// Find an order (with its owner) by public identificator
    fn find_by_identificator(&self, identificator: &str) -> Result<Option<Order>, DatabaseError>;

    /// Find an order (with its owner) by internal id
    fn find_by_id(&self, order_id: i64) -> Result<Option<Order>, DatabaseError>;

    /// Load counter-orders in match priority
    fn find_candidates(&self, query: &CandidateQuery) -> Result<Vec<Order>, DatabaseError>;

    /// Set the lock flag if the order is still open and unlocked
    ///
    /// Returns false when the order was locked, filled or deleted in the
    /// meantime.
    fn try_lock(&self, order_id: i64) -> Result<bool, DatabaseError>;

    /// Clear the lock flag
    fn unlock(&self, order_id: i64) -> Result<(), DatabaseError>;

    /// Write back remaining amount, flags and last fill price/time
    fn save_settlement(&self, order: &Order) -> Result<(), DatabaseError>;
}

/// Concrete implementation of OrderRepository
pub struct OrderRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl OrderRepositoryImpl {
    /// Create new order repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl OrderRepository for OrderRepositoryImpl {
    fn find_by_identificator(&self, identificator: &str) -> Result<Option<Order>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let row = orders::table
            .inner_join(users::table)
            .filter(orders::identificator.eq(identificator))
            .select((OrderRow::as_select(), UserRow::as_select()))
            .first::<(OrderRow, UserRow)>(&mut conn)
            .optional()?;

        row.map(|(order, user)| order.into_order(user)).transpose()
    }

    fn find_by_id(&self, order_id: i64) -> Result<Option<Order>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let row = orders::table
            .inner_join(users::table)
            .filter(orders::id.eq(order_id))
            .select((OrderRow::as_select(), UserRow::as_select()))
            .first::<(OrderRow, UserRow)>(&mut conn)
            .optional()?;

        row.map(|(order, user)| order.into_order(user)).transpose()
    }

    fn find_candidates(&self, query: &CandidateQuery) -> Result<Vec<Order>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let mut statement = orders::table
            .inner_join(users::table)
            .filter(orders::pair.eq(&query.pair))
            .filter(orders::side.eq(query.side.as_str()))
            .filter(orders::done.eq(0i16))
            .filter(orders::del.eq(0i16))
            .filter(orders::locked.eq(0i16))
            .filter(orders::amount.gt(Decimal::ZERO))
            .filter(
                orders::operation_type
                    .ne("limit")
                    .or(orders::price_unity.gt(Decimal::ZERO)),
            )
            .select((OrderRow::as_select(), UserRow::as_select()))
            .into_boxed();

        statement = match query.price_bound {
            Some(PriceBound::AtMost(limit)) => statement.filter(orders::price_unity.le(limit)),
            Some(PriceBound::AtLeast(limit)) => statement.filter(orders::price_unity.ge(limit)),
            None => statement,
        };

        statement = match query.price_order {
            PriceOrder::Ascending => statement.order_by(orders::price_unity.asc()),
            PriceOrder::Descending => statement.order_by(orders::price_unity.desc()),
        };

        let rows = statement
            .then_order_by(orders::time.desc())
            .load::<(OrderRow, UserRow)>(&mut conn)?;

        rows.into_iter()
            .map(|(order, user)| order.into_order(user))
            .collect()
    }

    fn try_lock(&self, order_id: i64) -> Result<bool, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let updated = diesel::update(orders::table)
            .filter(orders::id.eq(order_id))
            .filter(orders::locked.eq(0i16))
            .filter(orders::done.eq(0i16))
            .filter(orders::del.eq(0i16))
            .filter(orders::amount.gt(Decimal::ZERO))
            .set(orders::locked.eq(1i16))
            .execute(&mut conn)?;

        Ok(updated == 1)
    }

    fn unlock(&self, order_id: i64) -> Result<(), DatabaseError> {
        let mut conn = (self.get_conn)()?;

        diesel::update(orders::table)
            .filter(orders::id.eq(order_id))
            .set(orders::locked.eq(0i16))
            .execute(&mut conn)?;

        Ok(())
    }

    fn save_settlement(&self, order: &Order) -> Result<(), DatabaseError> {
        let mut conn = (self.get_conn)()?;

        diesel::update(orders::table)
            .filter(orders::id.eq(order.id))
            .set(&OrderSettlementChangeset::from(order))
            .execute(&mut conn)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::OrderBuilder;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_limit_buy_query() {
        let identified = OrderBuilder::limit_buy(1, dec!(100), dec!(1)).build();
        let query = CandidateQuery::for_order(&identified);

        assert_eq!(query.side, OrderSide::Sell);
        assert_eq!(query.price_order, PriceOrder::Ascending);
        assert_eq!(query.price_bound, Some(PriceBound::AtMost(dec!(100))));
    }

    #[test]
    fn test_market_sell_query_has_no_bound() {
        let identified = OrderBuilder::market_sell(1, dec!(1)).build();
        let query = CandidateQuery::for_order(&identified);

        assert_eq!(query.side, OrderSide::Buy);
        assert_eq!(query.price_order, PriceOrder::Descending);
        assert_eq!(query.price_bound, None);
    }

    #[test]
    fn test_matches_respects_crossing_and_eligibility() {
        let identified = OrderBuilder::limit_buy(1, dec!(100), dec!(1)).build();
        let query = CandidateQuery::for_order(&identified);

        assert!(query.matches(&OrderBuilder::limit_sell(2, dec!(99), dec!(1)).build()));
        assert!(query.matches(&OrderBuilder::limit_sell(3, dec!(100), dec!(1)).build()));
        assert!(!query.matches(&OrderBuilder::limit_sell(4, dec!(101), dec!(1)).build()));
        assert!(!query.matches(&OrderBuilder::limit_buy(5, dec!(90), dec!(1)).build()));
        assert!(!query.matches(&OrderBuilder::limit_sell(6, dec!(90), dec!(1)).locked().build()));
        assert!(!query.matches(
            &OrderBuilder::limit_sell(7, dec!(90), dec!(1))
                .pair("ETH/BRL")
                .build()
        ));
    }

    #[test]
    fn test_equal_price_sorts_newest_first() {
        let identified = OrderBuilder::limit_buy(1, dec!(100), dec!(1)).build();
        let query = CandidateQuery::for_order(&identified);

        let older = OrderBuilder::limit_sell(2, dec!(100), dec!(1)).build();
        let newer = OrderBuilder::limit_sell(3, dec!(100), dec!(1))
            .placed_at(older.time + Duration::seconds(5))
            .build();
        let cheaper = OrderBuilder::limit_sell(4, dec!(95), dec!(1)).build();

        let mut orders = vec![older.clone(), newer.clone(), cheaper.clone()];
        orders.sort_by(|a, b| query.compare(a, b));

        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![cheaper.id, newer.id, older.id]);
    }
}
