use crate::collaborators::{AccountControl, NotificationQueue, OrderAggregation};
use crate::models::{EmailQueuePayload, Order};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Work handed to sibling services after core writes are done
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    BlockUserAccount { user_id: i64 },
    FixOrderTotal(Box<Order>),
    InsertBridgeOrder { execution_record_id: i64, pair: String },
    QueueEmail(EmailQueuePayload),
}

impl SideEffect {
    fn name(&self) -> &'static str {
        match self {
            SideEffect::BlockUserAccount { .. } => "block_user_account",
            SideEffect::FixOrderTotal(_) => "fix_order_total",
            SideEffect::InsertBridgeOrder { .. } => "insert_bridge_order",
            SideEffect::QueueEmail(_) => "save_email_queue",
        }
    }
}

/// Cloneable handle for submitting side effects
#[derive(Debug, Clone)]
pub struct SideEffectSender {
    tx: mpsc::UnboundedSender<SideEffect>,
}

impl SideEffectSender {
    /// Queue an effect without waiting for it
    pub fn dispatch(&self, effect: SideEffect) {
        if let Err(e) = self.tx.send(effect) {
            tracing::error!("Side-effect worker stopped, dropping {}", e.0.name());
        }
    }
}

/// Background worker delivering side effects to collaborators
///
/// Effects are delivered one at a time in submission order. Collaborator
/// failures are logged and never reported back to the execution run.
pub struct SideEffectWorker {
    accounts: Arc<dyn AccountControl>,
    notifications: Arc<dyn NotificationQueue>,
    aggregation: Arc<dyn OrderAggregation>,
}

impl SideEffectWorker {
    pub fn new(
        accounts: Arc<dyn AccountControl>,
        notifications: Arc<dyn NotificationQueue>,
        aggregation: Arc<dyn OrderAggregation>,
    ) -> Self {
        Self {
            accounts,
            notifications,
            aggregation,
        }
    }

    /// Start the worker task
    ///
    /// The task ends once every sender has been dropped and the queue is
    /// drained.
    pub fn start(self) -> (SideEffectSender, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<SideEffect>();

        let handle = tokio::spawn(async move {
            while let Some(effect) = rx.recv().await {
                self.deliver(effect).await;
            }
            tracing::debug!("Side-effect worker drained and stopped");
        });

        (SideEffectSender { tx }, handle)
    }

    async fn deliver(&self, effect: SideEffect) {
        let name = effect.name();
        let result = match effect {
            SideEffect::BlockUserAccount { user_id } => {
                self.accounts.block_user_account(user_id).await
            }
            SideEffect::FixOrderTotal(order) => self.aggregation.fix_order_total(&order).await,
            SideEffect::InsertBridgeOrder {
                execution_record_id,
                pair,
            } => {
                self.aggregation
                    .insert_bridge_order(execution_record_id, &pair)
                    .await
            }
            SideEffect::QueueEmail(payload) => self.notifications.save_email_queue(payload).await,
        };

        match result {
            Ok(()) => tracing::trace!("Delivered {}", name),
            Err(e) => tracing::error!("Failed to deliver {}: {}", name, e),
        }
    }
}
