use crate::database::repositories::{
    CandidateQuery, CoinRepository, ExecutionRepository, FeeRepository, LedgerRepository,
    OrderRepository,
};
use crate::database::DatabaseError;
use crate::models::{
    CoinInfo, ExecutionRecord, FeeRates, NewExecutionRecord, NewTrade, NewTransaction, Order,
    Trade,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Injected failure of a ledger batch
#[derive(Debug, Clone)]
struct LedgerFailure {
    /// Batches that still go through before the failing one
    skip_batches: usize,
    /// Zero-based index of the entry that fails
    at_entry: usize,
    message: String,
}

#[derive(Debug, Default)]
struct ExchangeState {
    orders: BTreeMap<i64, Order>,
    executions: Vec<ExecutionRecord>,
    trades: Vec<Trade>,
    transactions: Vec<NewTransaction>,
    custom_fees: HashMap<(i64, String), FeeRates>,
    default_fees: Vec<(i64, String, FeeRates)>,
    coins: HashMap<String, (CoinInfo, bool)>,
    pairs: HashMap<String, bool>,
    ledger_failure: Option<LedgerFailure>,
    lock_rejections: HashSet<i64>,
    /// Successful locks left before an order starts rejecting
    locks_allowed: HashMap<i64, usize>,
}

/// In-memory exchange store implementing every repository trait
///
/// Clones share the same state, so a test can hand one clone to the engine
/// and inspect another afterwards. Ledger batches stay all-or-nothing, and a
/// failure can be injected at a given entry of the next batch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExchange {
    state: Arc<Mutex<ExchangeState>>,
}

impl InMemoryExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with BTC and BRL listed, `btc_brl` open and a default fee row
    /// of 0.1% maker / 0.2% taker
    pub fn with_btc_brl() -> Self {
        let exchange = Self::new();
        exchange.add_coin("BTC", false, "₿");
        exchange.add_coin("BRL", true, "R$");
        exchange.add_pair("btc_brl", true);
        exchange.add_default_fees(
            "btcbrl",
            FeeRates::new(Decimal::new(1, 1), Decimal::new(2, 1)),
        );
        exchange
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    pub fn insert_order(&self, order: Order) {
        self.state.lock().orders.insert(order.id, order);
    }

    pub fn add_coin(&self, symbol: &str, fiat_pegged: bool, currency_symbol: &str) {
        let info = CoinInfo {
            symbol: symbol.to_uppercase(),
            fiat_pegged,
            currency_symbol: currency_symbol.to_string(),
        };
        self.state
            .lock()
            .coins
            .insert(symbol.to_uppercase(), (info, true));
    }

    pub fn deactivate_coin(&self, symbol: &str) {
        if let Some(entry) = self.state.lock().coins.get_mut(&symbol.to_uppercase()) {
            entry.1 = false;
        }
    }

    pub fn add_pair(&self, pair_key: &str, active: bool) {
        self.state.lock().pairs.insert(pair_key.to_string(), active);
    }

    /// Append a default schedule row; later rows win
    pub fn add_default_fees(&self, fee_key: &str, rates: FeeRates) {
        let mut state = self.state.lock();
        let id = state.default_fees.len() as i64 + 1;
        state.default_fees.push((id, fee_key.to_string(), rates));
    }

    pub fn set_custom_fees(&self, user_id: i64, fee_key: &str, rates: FeeRates) {
        self.state
            .lock()
            .custom_fees
            .insert((user_id, fee_key.to_string()), rates);
    }

    /// Make the next ledger batch fail when it reaches entry `at_entry`
    pub fn fail_ledger_at(&self, at_entry: usize, message: &str) {
        self.fail_ledger_after(0, at_entry, message);
    }

    /// Let `skip_batches` ledger batches through, then fail the next one
    pub fn fail_ledger_after(&self, skip_batches: usize, at_entry: usize, message: &str) {
        self.state.lock().ledger_failure = Some(LedgerFailure {
            skip_batches,
            at_entry,
            message: message.to_string(),
        });
    }

    /// Make every lock attempt on an order fail, as if another run held it
    pub fn reject_locks_for(&self, order_id: i64) {
        self.state.lock().lock_rejections.insert(order_id);
    }

    /// Allow `allowed` more locks on an order, then reject every attempt
    pub fn reject_locks_after(&self, order_id: i64, allowed: usize) {
        self.state.lock().locks_allowed.insert(order_id, allowed);
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn order(&self, order_id: i64) -> Option<Order> {
        self.state.lock().orders.get(&order_id).cloned()
    }

    pub fn executions(&self) -> Vec<ExecutionRecord> {
        self.state.lock().executions.clone()
    }

    pub fn trades(&self) -> Vec<Trade> {
        self.state.lock().trades.clone()
    }

    pub fn transactions(&self) -> Vec<NewTransaction> {
        self.state.lock().transactions.clone()
    }
}

impl OrderRepository for InMemoryExchange {
    fn find_by_identificator(&self, identificator: &str) -> Result<Option<Order>, DatabaseError> {
        Ok(self
            .state
            .lock()
            .orders
            .values()
            .find(|order| order.identificator == identificator)
            .cloned())
    }

    fn find_by_id(&self, order_id: i64) -> Result<Option<Order>, DatabaseError> {
        Ok(self.order(order_id))
    }

    fn find_candidates(&self, query: &CandidateQuery) -> Result<Vec<Order>, DatabaseError> {
        let mut candidates: Vec<Order> = self
            .state
            .lock()
            .orders
            .values()
            .filter(|order| query.matches(order))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| query.compare(a, b));
        Ok(candidates)
    }

    fn try_lock(&self, order_id: i64) -> Result<bool, DatabaseError> {
        let mut state = self.state.lock();
        if state.lock_rejections.contains(&order_id) {
            return Ok(false);
        }
        if let Some(allowed) = state.locks_allowed.get_mut(&order_id) {
            if *allowed == 0 {
                return Ok(false);
            }
            *allowed -= 1;
        }

        match state.orders.get_mut(&order_id) {
            Some(order)
                if !order.locked && !order.done && !order.del && order.amount > Decimal::ZERO =>
            {
                order.locked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn unlock(&self, order_id: i64) -> Result<(), DatabaseError> {
        if let Some(order) = self.state.lock().orders.get_mut(&order_id) {
            order.locked = false;
        }
        Ok(())
    }

    fn save_settlement(&self, order: &Order) -> Result<(), DatabaseError> {
        let mut state = self.state.lock();
        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| DatabaseError::QueryError(format!("order {} not found", order.id)))?;

        stored.amount = order.amount;
        stored.done = order.done;
        stored.locked = order.locked;
        stored.price_done = order.price_done;
        stored.time_done = order.time_done;
        Ok(())
    }
}

impl ExecutionRepository for InMemoryExchange {
    fn insert_execution(&self, record: &NewExecutionRecord) -> Result<ExecutionRecord, DatabaseError> {
        let mut state = self.state.lock();
        let id = state.executions.len() as i64 + 1;
        let stored = record.clone().into_record(id);
        state.executions.push(stored.clone());
        Ok(stored)
    }

    fn link_counterpart(&self, record_id: i64, counterpart_id: i64) -> Result<(), DatabaseError> {
        let mut state = self.state.lock();
        let record = state
            .executions
            .iter_mut()
            .find(|record| record.id == record_id)
            .ok_or_else(|| {
                DatabaseError::QueryError(format!("execution {} not found", record_id))
            })?;
        record.done_with = Some(counterpart_id);
        Ok(())
    }

    fn insert_trade(&self, trade: &NewTrade) -> Result<Trade, DatabaseError> {
        let mut state = self.state.lock();
        let id = state.trades.len() as i64 + 1;
        let stored = trade.clone().into_trade(id);
        state.trades.push(stored.clone());
        Ok(stored)
    }
}

impl LedgerRepository for InMemoryExchange {
    fn post_entries(&self, entries: &[NewTransaction]) -> Result<usize, DatabaseError> {
        let mut state = self.state.lock();

        if let Some(mut failure) = state.ledger_failure.take() {
            if failure.skip_batches == 0 && failure.at_entry < entries.len() {
                return Err(DatabaseError::QueryError(failure.message));
            }
            failure.skip_batches = failure.skip_batches.saturating_sub(1);
            state.ledger_failure = Some(failure);
        }

        state.transactions.extend_from_slice(entries);
        Ok(entries.len())
    }
}

impl FeeRepository for InMemoryExchange {
    fn find_custom_rates(&self, user_id: i64, fee_key: &str) -> Result<Option<FeeRates>, DatabaseError> {
        Ok(self
            .state
            .lock()
            .custom_fees
            .get(&(user_id, fee_key.to_string()))
            .copied())
    }

    fn find_latest_default_rates(&self, fee_key: &str) -> Result<Option<FeeRates>, DatabaseError> {
        Ok(self
            .state
            .lock()
            .default_fees
            .iter()
            .filter(|(_, key, _)| key == fee_key)
            .max_by_key(|(id, _, _)| *id)
            .map(|(_, _, rates)| *rates))
    }
}

impl CoinRepository for InMemoryExchange {
    fn find_active_coin(&self, symbol: &str) -> Result<Option<CoinInfo>, DatabaseError> {
        Ok(self
            .state
            .lock()
            .coins
            .get(&symbol.to_uppercase())
            .filter(|(_, active)| *active)
            .map(|(info, _)| info.clone()))
    }

    fn is_pair_active(&self, pair_key: &str) -> Result<bool, DatabaseError> {
        Ok(self
            .state
            .lock()
            .pairs
            .get(pair_key)
            .copied()
            .unwrap_or(false))
    }
}
