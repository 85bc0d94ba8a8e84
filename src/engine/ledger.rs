//! One executed match step
//!
//! The poster locks both orders, writes the execution records and the trade,
//! posts the eight ledger entries as one batch, settles both orders and
//! queues the follow-up side effects.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::repositories::{ExecutionRepository, LedgerRepository, OrderRepository};
use crate::engine::economics::{TradeEconomics, TradeEconomicsCalculator};
use crate::engine::errors::ExecutionError;
use crate::engine::locks::OrderLocks;
use crate::engine::notification::email_payload;
use crate::models::{
    ExecutedOrderSummary, ExecutionRecord, LedgerLeg, NewExecutionRecord, NewTrade,
    NewTransaction, Order, OrderSide, Pair,
};
use crate::side_effects::{SideEffect, SideEffectSender};
use crate::utils::decimal::round_amount;

/// Result of one match step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Both orders were settled against each other
    Executed(Box<MatchStep>),
    /// The candidate was taken by another run before it could be locked
    Skipped,
    /// The identified order was filled or locked by another run; nothing
    /// was written and the candidate lock was released
    IdentifiedTaken,
}

/// A completed match step
#[derive(Debug, Clone, PartialEq)]
pub struct MatchStep {
    pub execution_id: String,
    /// Identified order after settlement
    pub identified: Order,
    /// Candidate order after settlement
    pub candidate: Order,
    pub identified_record: ExecutionRecord,
    pub candidate_record: ExecutionRecord,
    pub economics: TradeEconomics,
}

impl MatchStep {
    /// Response summaries, identified leg first
    pub fn summaries(&self) -> [ExecutedOrderSummary; 2] {
        [
            summary(&self.identified, self.economics.fill),
            summary(&self.candidate, self.economics.fill),
        ]
    }
}

fn summary(order: &Order, fill: Decimal) -> ExecutedOrderSummary {
    ExecutedOrderSummary {
        done: u8::from(order.done),
        order_identificator: order.identificator.clone(),
        amount: fill,
    }
}

/// The four ledger entries of one side of a trade
///
/// A buy gives up the quote coin and receives the base coin, paying the fee
/// in the base coin; a sell mirrors it. The retention leg releases the funds
/// reserved when the order was placed.
pub fn side_entries(
    order: &Order,
    pair: &Pair,
    economics: &TradeEconomics,
    fee: Decimal,
    time: DateTime<Utc>,
) -> [NewTransaction; 4] {
    let (base, quote) = (pair.base_coin(), pair.quote_coin());
    let fill = economics.fill;
    let total = economics.total;

    let entry = |leg: LedgerLeg, coin: &str, amount: Decimal| NewTransaction {
        user_id: order.user.id,
        coin: coin.to_string(),
        amount,
        is_retention: leg == LedgerLeg::Retention,
        kind: leg.kind(order.side),
        item_id: order.id,
        time,
    };

    match order.side {
        OrderSide::Buy => [
            entry(LedgerLeg::Value, &quote, -total),
            entry(LedgerLeg::Amount, &base, round_amount(fill)),
            entry(LedgerLeg::Fee, &base, -fee),
            entry(LedgerLeg::Retention, &quote, total),
        ],
        OrderSide::Sell => [
            entry(LedgerLeg::Value, &base, round_amount(-fill)),
            entry(LedgerLeg::Amount, &quote, total),
            entry(LedgerLeg::Fee, &quote, -fee),
            entry(LedgerLeg::Retention, &base, round_amount(fill)),
        ],
    }
}

/// Executes one identified order against one candidate
pub struct LedgerPoster {
    orders: Arc<dyn OrderRepository>,
    executions: Arc<dyn ExecutionRepository>,
    ledger: Arc<dyn LedgerRepository>,
    economics: TradeEconomicsCalculator,
    locks: OrderLocks,
    side_effects: SideEffectSender,
}

impl LedgerPoster {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        executions: Arc<dyn ExecutionRepository>,
        ledger: Arc<dyn LedgerRepository>,
        economics: TradeEconomicsCalculator,
        locks: OrderLocks,
        side_effects: SideEffectSender,
    ) -> Self {
        Self {
            orders,
            executions,
            ledger,
            economics,
            locks,
            side_effects,
        }
    }

    /// Run one match step
    ///
    /// Execution records and the trade are committed before the ledger batch;
    /// a ledger failure leaves them in place and both orders locked.
    pub async fn execute(
        &self,
        identified: &Order,
        candidate: &Order,
    ) -> Result<StepOutcome, ExecutionError> {
        let _guard = self
            .locks
            .acquire(&identified.identificator, &candidate.identificator)
            .await;

        // ====================================================================
        // 1. Lock both orders, re-reading them under the lock
        // ====================================================================
        if !self.orders.try_lock(candidate.id)? {
            tracing::warn!(
                "Skipping order {}: no longer available for {}",
                candidate.identificator,
                identified.identificator
            );
            return Ok(StepOutcome::Skipped);
        }
        if !self.orders.try_lock(identified.id)? {
            self.orders.unlock(candidate.id)?;
            tracing::warn!(
                "Order {} was taken by another run, releasing {}",
                identified.identificator,
                candidate.identificator
            );
            return Ok(StepOutcome::IdentifiedTaken);
        }
        tracing::debug!(
            "Locked orders {} and {}",
            identified.identificator,
            candidate.identificator
        );

        let mut identified = self.reload(identified)?;
        let mut candidate = self.reload(candidate)?;

        // ====================================================================
        // 2. Economics
        // ====================================================================
        let economics = self.economics.calculate(&identified, &candidate).await?;
        let fill = economics.fill;

        // ====================================================================
        // 3-4. Execution records and trade
        // ====================================================================
        let execution_id = Uuid::new_v4().simple().to_string();
        let time = Utc::now();

        let identified_record = self.executions.insert_execution(&new_record(
            &identified,
            &economics,
            economics.identified_fee,
            &execution_id,
            time,
            None,
        ))?;
        let candidate_record = self.executions.insert_execution(&new_record(
            &candidate,
            &economics,
            economics.candidate_fee,
            &execution_id,
            time,
            Some(identified_record.id),
        ))?;
        self.executions
            .link_counterpart(identified_record.id, candidate_record.id)?;
        let identified_record = ExecutionRecord {
            done_with: Some(candidate_record.id),
            ..identified_record
        };

        self.executions.insert_trade(&NewTrade {
            user_id_active: identified.user.uid.clone(),
            user_id_passive: candidate.user.uid.clone(),
            order_id: identified.id,
            order_compatible_id: candidate.id,
            side: identified.side,
            pair: identified.pair.clone(),
            amount_executed: fill,
            price_unity: economics.price,
            execution_id: execution_id.clone(),
            time_executed: time,
        })?;

        // ====================================================================
        // 5. Ledger batch
        // ====================================================================
        let mut entries = Vec::with_capacity(8);
        entries.extend(side_entries(
            &identified,
            &economics.pair,
            &economics,
            economics.identified_fee,
            time,
        ));
        entries.extend(side_entries(
            &candidate,
            &economics.pair,
            &economics,
            economics.candidate_fee,
            time,
        ));
        self.ledger.post_entries(&entries)?;

        // ====================================================================
        // 6-7. Settle, persist, unlock
        // ====================================================================
        let identified_filled = settle(&mut identified, fill, economics.price, time);
        let candidate_filled = settle(&mut candidate, fill, economics.price, time);

        self.orders.save_settlement(&identified)?;
        self.orders.save_settlement(&candidate)?;
        self.orders.unlock(identified.id)?;
        self.orders.unlock(candidate.id)?;
        identified.locked = false;
        candidate.locked = false;

        // ====================================================================
        // 8-9. Side effects
        // ====================================================================
        for order in [(identified_filled, &identified), (candidate_filled, &candidate)]
            .into_iter()
            .filter_map(|(filled, order)| filled.then_some(order))
        {
            self.side_effects
                .dispatch(SideEffect::FixOrderTotal(Box::new(order.clone())));
        }

        let internal_record = if identified.user.internal_account {
            Some(&identified_record)
        } else if candidate.user.internal_account {
            Some(&candidate_record)
        } else {
            None
        };
        if let Some(record) = internal_record {
            self.side_effects.dispatch(SideEffect::InsertBridgeOrder {
                execution_record_id: record.id,
                pair: record.pair.clone(),
            });
        }

        let symbol = economics.base.currency_symbol.as_str();
        for (record, order) in [(&identified_record, &identified), (&candidate_record, &candidate)] {
            match email_payload(record, order, symbol) {
                Ok(payload) => self.side_effects.dispatch(SideEffect::QueueEmail(payload)),
                Err(e) => tracing::error!(
                    "Failed to build notification for order {}: {}",
                    order.identificator,
                    e
                ),
            }
        }

        tracing::info!(
            "Executed {} {} of {} at {} ({} x {})",
            execution_id,
            fill,
            identified.pair,
            economics.price,
            identified.identificator,
            candidate.identificator
        );

        Ok(StepOutcome::Executed(Box::new(MatchStep {
            execution_id,
            identified,
            candidate,
            identified_record,
            candidate_record,
            economics,
        })))
    }

    fn reload(&self, order: &Order) -> Result<Order, ExecutionError> {
        self.orders
            .find_by_id(order.id)?
            .ok_or_else(|| ExecutionError::OrderUnavailable(order.identificator.clone()))
    }
}

fn new_record(
    order: &Order,
    economics: &TradeEconomics,
    fee: Decimal,
    execution_id: &str,
    time: DateTime<Utc>,
    done_with: Option<i64>,
) -> NewExecutionRecord {
    NewExecutionRecord {
        execution_id: execution_id.to_string(),
        int_done: order.amount_source == economics.fill,
        order_id: order.id,
        side: order.side,
        pair: order.pair.clone(),
        user_id: order.user.id,
        price_unity: economics.price,
        order_amount: order.amount_source,
        amount_executed: economics.fill,
        fee,
        amount_left: round_amount(order.amount - economics.fill),
        total: economics.total,
        time_executed: time,
        done_with,
    }
}

/// Apply a fill to an order, returning true when it became done
fn settle(order: &mut Order, fill: Decimal, price: Decimal, time: DateTime<Utc>) -> bool {
    order.amount = round_amount(order.amount - fill);
    order.price_done = Some(price);
    order.time_done = Some(time);
    if order.amount.is_zero() {
        order.done = true;
    }
    order.done
}
