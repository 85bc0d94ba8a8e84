use std::collections::BTreeSet;
use std::sync::Arc;

use crate::collaborators::{BlockedUsers, MarketValidator};
use crate::database::repositories::{
    ExecutionRepository, FeeRepository, LedgerRepository, OrderRepository,
};
use crate::engine::compensation::FailureCompensation;
use crate::engine::economics::TradeEconomicsCalculator;
use crate::engine::errors::ExecutionError;
use crate::engine::fees::FeeResolver;
use crate::engine::finder::{CounterOrderFinder, MatchCandidates};
use crate::engine::ledger::{LedgerPoster, StepOutcome};
use crate::engine::locks::OrderLocks;
use crate::models::ExecutionOutcome;
use crate::side_effects::SideEffectSender;

/// Stores the execution engine reads and writes
#[derive(Clone)]
pub struct ExecutionStores {
    pub orders: Arc<dyn OrderRepository>,
    pub executions: Arc<dyn ExecutionRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub fees: Arc<dyn FeeRepository>,
}

/// Drives the execution of one identified order against its counter-orders
///
/// Candidates are processed one at a time in finder order until the
/// identified order is done, another run takes it, or the list runs out. A
/// failed step stops the run, freezes every user seen so far and returns the
/// step's error.
pub struct OrderExecutionEngine {
    finder: CounterOrderFinder,
    poster: LedgerPoster,
    compensation: FailureCompensation,
}

impl OrderExecutionEngine {
    pub fn new(
        stores: ExecutionStores,
        validator: Arc<dyn MarketValidator>,
        blocked: Arc<dyn BlockedUsers>,
        side_effects: SideEffectSender,
    ) -> Self {
        let economics = TradeEconomicsCalculator::new(
            Arc::clone(&validator),
            FeeResolver::new(stores.fees),
        );

        Self {
            finder: CounterOrderFinder::new(
                Arc::clone(&stores.orders),
                validator,
                Arc::clone(&blocked),
            ),
            poster: LedgerPoster::new(
                stores.orders,
                stores.executions,
                stores.ledger,
                economics,
                OrderLocks::new(),
                side_effects.clone(),
            ),
            compensation: FailureCompensation::new(side_effects, blocked),
        }
    }

    /// Execute an order by its public identificator
    pub async fn execute(&self, identificator: &str) -> Result<ExecutionOutcome, ExecutionError> {
        tracing::info!("Executing order {}", identificator);

        let Some(MatchCandidates {
            mut identified,
            candidates,
        }) = self.finder.find(identificator).await?
        else {
            tracing::info!("No compatible orders for {}", identificator);
            return Err(ExecutionError::NoCompatibleOrders);
        };

        let identified_user_id = identified.user.uid.clone();
        let mut counterpart_user_id = candidates[0].user.uid.clone();
        let mut touched_users = BTreeSet::from([identified.user.id, candidates[0].user.id]);
        let mut orders_executed = Vec::new();

        for candidate in &candidates {
            if identified.done {
                break;
            }
            touched_users.insert(candidate.user.id);
            counterpart_user_id = candidate.user.uid.clone();

            match self.poster.execute(&identified, candidate).await {
                Ok(StepOutcome::Executed(step)) => {
                    orders_executed.extend(step.summaries());
                    identified = step.identified;
                }
                Ok(StepOutcome::Skipped) => continue,
                Ok(StepOutcome::IdentifiedTaken) => break,
                Err(e) => {
                    tracing::error!(
                        "Execution of {} failed against {}: {}",
                        identificator,
                        candidate.identificator,
                        e
                    );
                    self.compensation.compensate(&touched_users);
                    return Err(e);
                }
            }
        }

        if orders_executed.is_empty() {
            tracing::info!("Nothing of {} could be executed before other runs took it", identificator);
            return Err(ExecutionError::NoCompatibleOrders);
        }

        tracing::info!(
            "Order {} executed in {} steps (done: {}, remaining: {})",
            identificator,
            orders_executed.len() / 2,
            identified.done,
            identified.amount
        );

        Ok(ExecutionOutcome {
            success: true,
            counterpart_user_id,
            identified_user_id,
            orders_executed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{BlockedUserCache, DbMarketValidator};
    use crate::models::{ExecutedOrderSummary, OrderSide};
    use crate::side_effects::SideEffectWorker;
    use crate::testing::{InMemoryExchange, OrderBuilder, RecordingCollaborators, TestScenario};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tokio::task::JoinHandle;

    struct Harness {
        exchange: InMemoryExchange,
        recorder: RecordingCollaborators,
        blocked: BlockedUserCache,
        engine: OrderExecutionEngine,
        worker: JoinHandle<()>,
    }

    impl Harness {
        fn new(exchange: InMemoryExchange) -> Self {
            let recorder = RecordingCollaborators::new();
            let blocked = BlockedUserCache::new();
            let (sender, worker) = SideEffectWorker::new(
                Arc::new(recorder.clone()),
                Arc::new(recorder.clone()),
                Arc::new(recorder.clone()),
            )
            .start();

            let stores = ExecutionStores {
                orders: Arc::new(exchange.clone()),
                executions: Arc::new(exchange.clone()),
                ledger: Arc::new(exchange.clone()),
                fees: Arc::new(exchange.clone()),
            };
            let engine = OrderExecutionEngine::new(
                stores,
                Arc::new(DbMarketValidator::new(Arc::new(exchange.clone()))),
                Arc::new(blocked.clone()),
                sender,
            );

            Self {
                exchange,
                recorder,
                blocked,
                engine,
                worker,
            }
        }

        /// Stop the engine and wait for queued side effects
        async fn drain(self) -> (InMemoryExchange, RecordingCollaborators, BlockedUserCache) {
            drop(self.engine);
            self.worker.await.unwrap();
            (self.exchange, self.recorder, self.blocked)
        }
    }

    fn summary(done: u8, identificator: &str, amount: Decimal) -> ExecutedOrderSummary {
        ExecutedOrderSummary {
            done,
            order_identificator: identificator.to_string(),
            amount,
        }
    }

    #[tokio::test]
    async fn test_full_cross_single_step() {
        let exchange = InMemoryExchange::with_btc_brl();
        let identified = TestScenario::FullCross.seed(&exchange);
        let harness = Harness::new(exchange);

        let outcome = harness.engine.execute(&identified.identificator).await.unwrap();
        let (exchange, recorder, _) = harness.drain().await;

        assert!(outcome.success);
        assert_eq!(outcome.identified_user_id, "user-2");
        assert_eq!(outcome.counterpart_user_id, "user-1");
        assert_eq!(
            outcome.orders_executed,
            vec![summary(1, "ord-2", dec!(10)), summary(1, "ord-1", dec!(10))]
        );

        let trades = exchange.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].amount_executed, dec!(10));
        assert_eq!(trades[0].price_unity, dec!(100));
        assert_eq!(exchange.transactions().len(), 8);

        for id in [1, 2] {
            let order = exchange.order(id).unwrap();
            assert!(order.done);
            assert!(!order.locked);
            assert_eq!(order.amount, Decimal::ZERO);
        }

        let mut fixed = recorder.fixed_orders();
        fixed.sort();
        assert_eq!(fixed, vec![1, 2]);
        assert_eq!(recorder.emails().len(), 2);
        assert!(recorder.blocked_users().is_empty());
    }

    #[tokio::test]
    async fn test_market_sell_sweeps_two_bids() {
        let exchange = InMemoryExchange::with_btc_brl();
        let identified = TestScenario::MarketSellSweep.seed(&exchange);
        let harness = Harness::new(exchange);

        let outcome = harness.engine.execute(&identified.identificator).await.unwrap();
        let (exchange, _, _) = harness.drain().await;

        assert_eq!(
            outcome.orders_executed,
            vec![
                summary(0, "ord-3", dec!(10)),
                summary(1, "ord-1", dec!(10)),
                summary(1, "ord-3", dec!(5)),
                summary(0, "ord-2", dec!(5)),
            ]
        );
        assert_eq!(outcome.counterpart_user_id, "user-2");

        let trades = exchange.trades();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price_unity, dec!(101));
        assert_eq!(trades[1].price_unity, dec!(100));
        assert!(trades.iter().all(|t| t.side == OrderSide::Sell));

        assert!(exchange.order(3).unwrap().done);
        let resting = exchange.order(2).unwrap();
        assert!(!resting.done);
        assert_eq!(resting.amount, dec!(5));
        // Partial fills still record the last fill price
        assert_eq!(resting.price_done, Some(dec!(100)));
        assert_eq!(exchange.transactions().len(), 16);
    }

    #[tokio::test]
    async fn test_no_compatible_orders_takes_no_locks() {
        let exchange = InMemoryExchange::with_btc_brl();
        let identified = TestScenario::NoCounterOrders.seed(&exchange);
        let harness = Harness::new(exchange);

        let err = harness.engine.execute(&identified.identificator).await.unwrap_err();
        let (exchange, recorder, _) = harness.drain().await;

        assert!(err.is_no_match());
        assert!(exchange.transactions().is_empty());
        assert!(exchange.executions().is_empty());
        for id in [1, 2, 3] {
            assert!(!exchange.order(id).unwrap().locked);
        }
        assert!(recorder.blocked_users().is_empty());
    }

    #[tokio::test]
    async fn test_fiat_sell_fee_on_total() {
        let exchange = InMemoryExchange::with_btc_brl();
        let identified = TestScenario::FiatSellFee.seed(&exchange);
        let harness = Harness::new(exchange);

        harness.engine.execute(&identified.identificator).await.unwrap();
        let (exchange, _, _) = harness.drain().await;

        let records = exchange.executions();
        assert_eq!(records[0].order_id, identified.id);
        assert_eq!(records[0].total, dec!(300));
        assert_eq!(records[0].fee, dec!(0.60));
        assert_eq!(records[1].fee, dec!(0.003));

        let fee_entry = exchange
            .transactions()
            .into_iter()
            .find(|t| t.item_id == identified.id && t.kind == "order_execution_sell_fee")
            .unwrap();
        assert_eq!(fee_entry.coin, "brl");
        assert_eq!(fee_entry.amount, dec!(-0.60));
    }

    #[tokio::test]
    async fn test_ledger_failure_keeps_records_and_freezes_users() {
        let exchange = InMemoryExchange::with_btc_brl();
        let identified = TestScenario::MarketSellSweep.seed(&exchange);
        exchange.fail_ledger_at(2, "could not write transaction row");
        let harness = Harness::new(exchange);

        let err = harness.engine.execute(&identified.identificator).await.unwrap_err();
        let (exchange, recorder, blocked) = harness.drain().await;

        assert_eq!(err.to_string(), "Database query error: could not write transaction row");
        assert_eq!(exchange.executions().len(), 2);
        assert_eq!(exchange.trades().len(), 1);
        assert!(exchange.transactions().is_empty());

        // Identified user and the first candidate's user
        assert_eq!(recorder.blocked_users(), vec![101, 103]);
        assert!(blocked.is_blocked(101) && blocked.is_blocked(103));
        assert!(!blocked.is_blocked(102));

        // Nothing settled; both orders of the failed step stay locked
        let failed = exchange.order(3).unwrap();
        assert_eq!(failed.amount, dec!(15));
        assert!(failed.locked);
        assert!(exchange.order(1).unwrap().locked);
        assert!(recorder.emails().is_empty());
    }

    #[tokio::test]
    async fn test_failure_on_later_step_freezes_every_seen_user() {
        let exchange = InMemoryExchange::with_btc_brl();
        let identified = TestScenario::MarketSellSweep.seed(&exchange);
        exchange.fail_ledger_after(1, 0, "connection reset");
        let harness = Harness::new(exchange);

        let err = harness.engine.execute(&identified.identificator).await.unwrap_err();
        let (exchange, recorder, _) = harness.drain().await;

        assert!(err.is_internal_error());
        assert_eq!(recorder.blocked_users(), vec![101, 102, 103]);

        // First step stays settled
        assert!(exchange.order(1).unwrap().done);
        assert_eq!(exchange.transactions().len(), 8);
        assert_eq!(exchange.executions().len(), 4);
        assert_eq!(exchange.trades().len(), 2);

        let identified = exchange.order(3).unwrap();
        assert_eq!(identified.amount, dec!(5));
        assert!(identified.locked);
        assert!(exchange.order(2).unwrap().locked);
    }

    #[tokio::test]
    async fn test_blocked_counterparty_not_matched_after_failure() {
        let exchange = InMemoryExchange::with_btc_brl();
        exchange.insert_order(OrderBuilder::limit_sell(1, dec!(100), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_buy(2, dec!(100), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_buy(3, dec!(100), dec!(1)).build());
        exchange.fail_ledger_at(0, "connection reset");
        let harness = Harness::new(exchange.clone());

        assert!(harness.engine.execute("ord-2").await.is_err());

        // The seller is now flagged, so another buyer finds nothing
        let err = harness.engine.execute("ord-3").await.unwrap_err();
        assert!(err.is_no_match());
        harness.drain().await;
    }

    #[tokio::test]
    async fn test_skipped_candidate_moves_to_next() {
        let exchange = InMemoryExchange::with_btc_brl();
        exchange.insert_order(OrderBuilder::limit_sell(1, dec!(99), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_sell(2, dec!(100), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_buy(3, dec!(100), dec!(1)).build());
        exchange.reject_locks_for(1);
        let harness = Harness::new(exchange);

        let outcome = harness.engine.execute("ord-3").await.unwrap();
        let (exchange, _, _) = harness.drain().await;

        assert_eq!(
            outcome.orders_executed,
            vec![summary(1, "ord-3", dec!(1)), summary(1, "ord-2", dec!(1))]
        );
        assert_eq!(outcome.counterpart_user_id, "user-2");
        assert!(!exchange.order(1).unwrap().done);
    }

    #[tokio::test]
    async fn test_identified_taken_by_other_run_freezes_nobody() {
        let exchange = InMemoryExchange::with_btc_brl();
        exchange.insert_order(OrderBuilder::limit_sell(1, dec!(100), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_buy(2, dec!(100), dec!(1)).build());
        exchange.reject_locks_for(2);
        let harness = Harness::new(exchange);

        let err = harness.engine.execute("ord-2").await.unwrap_err();
        let (exchange, recorder, blocked) = harness.drain().await;

        assert!(err.is_no_match());
        assert!(recorder.blocked_users().is_empty());
        assert!(blocked.is_empty());
        assert!(exchange.executions().is_empty());
        assert!(exchange.trades().is_empty());
        assert!(exchange.transactions().is_empty());
        assert!(!exchange.order(1).unwrap().locked);
    }

    #[tokio::test]
    async fn test_identified_taken_mid_run_keeps_completed_steps() {
        let exchange = InMemoryExchange::with_btc_brl();
        let identified = TestScenario::MarketSellSweep.seed(&exchange);
        // First step locks the sell; another run holds it before the second
        exchange.reject_locks_after(identified.id, 1);
        let harness = Harness::new(exchange);

        let outcome = harness.engine.execute(&identified.identificator).await.unwrap();
        let (exchange, recorder, _) = harness.drain().await;

        assert_eq!(
            outcome.orders_executed,
            vec![summary(0, "ord-3", dec!(10)), summary(1, "ord-1", dec!(10))]
        );
        assert!(recorder.blocked_users().is_empty());
        assert_eq!(exchange.trades().len(), 1);
        assert_eq!(exchange.order(3).unwrap().amount, dec!(5));

        let untouched = exchange.order(2).unwrap();
        assert!(!untouched.locked);
        assert_eq!(untouched.amount, dec!(10));
    }

    #[tokio::test]
    async fn test_all_candidates_skipped_is_no_match() {
        let exchange = InMemoryExchange::with_btc_brl();
        exchange.insert_order(OrderBuilder::limit_sell(1, dec!(99), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_buy(2, dec!(100), dec!(1)).build());
        exchange.reject_locks_for(1);
        let harness = Harness::new(exchange);

        let err = harness.engine.execute("ord-2").await.unwrap_err();
        let (exchange, recorder, _) = harness.drain().await;

        assert!(err.is_no_match());
        assert!(!exchange.order(2).unwrap().locked);
        assert!(recorder.blocked_users().is_empty());
    }

    #[tokio::test]
    async fn test_fill_and_decrement_hold_for_every_step() {
        let exchange = InMemoryExchange::with_btc_brl();
        exchange.insert_order(OrderBuilder::limit_sell(1, dec!(100), dec!(0.12345678)).build());
        exchange.insert_order(OrderBuilder::limit_sell(2, dec!(100.5), dec!(0.3)).build());
        exchange.insert_order(OrderBuilder::limit_sell(3, dec!(101), dec!(2)).build());
        let identified = OrderBuilder::limit_buy(4, dec!(101), dec!(1)).build();
        exchange.insert_order(identified.clone());
        let before: Vec<_> = (1..=3).map(|id| exchange.order(id).unwrap()).collect();
        let harness = Harness::new(exchange);

        harness.engine.execute("ord-4").await.unwrap();
        let (exchange, _, _) = harness.drain().await;

        let mut identified_remaining = identified.amount;
        for (record_pair, candidate_before) in exchange.executions().chunks(2).zip(before.iter()) {
            let fill = identified_remaining.min(candidate_before.amount);
            assert_eq!(record_pair[0].amount_executed, fill);
            assert_eq!(record_pair[1].amount_executed, fill);
            assert_eq!(record_pair[0].amount_left, identified_remaining - fill);
            assert_eq!(
                exchange.order(candidate_before.id).unwrap().amount,
                candidate_before.amount - fill
            );
            identified_remaining -= fill;
        }

        assert_eq!(identified_remaining, Decimal::ZERO);
        assert_eq!(exchange.order(3).unwrap().amount, dec!(1.42345678));
    }

    #[tokio::test]
    async fn test_fee_schedule_missing_aborts_and_compensates() {
        let exchange = InMemoryExchange::new();
        exchange.add_coin("BTC", false, "₿");
        exchange.add_coin("BRL", true, "R$");
        exchange.add_pair("btc_brl", true);
        exchange.insert_order(OrderBuilder::limit_sell(1, dec!(100), dec!(1)).build());
        exchange.insert_order(OrderBuilder::limit_buy(2, dec!(100), dec!(1)).build());
        let harness = Harness::new(exchange);

        let err = harness.engine.execute("ord-2").await.unwrap_err();
        let (exchange, recorder, _) = harness.drain().await;

        assert!(matches!(err, ExecutionError::FeeScheduleMissing(_)));
        assert!(exchange.executions().is_empty());
        assert_eq!(recorder.blocked_users(), vec![101, 102]);
    }
}
