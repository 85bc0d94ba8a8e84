use crate::collaborators::{AccountControl, CollaboratorError, NotificationQueue, OrderAggregation};
use crate::models::{EmailQueuePayload, Order};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Recorded {
    blocked_users: Vec<i64>,
    emails: Vec<EmailQueuePayload>,
    fixed_orders: Vec<i64>,
    bridge_orders: Vec<(i64, String)>,
}

/// Collaborator double that records every call
///
/// Implements the account, notification and order-aggregation contracts.
/// `fail_all` makes every call return an error after recording it, which
/// lets tests check that collaborator failures never reach the caller.
#[derive(Debug, Clone, Default)]
pub struct RecordingCollaborators {
    recorded: Arc<Mutex<Recorded>>,
    failing: Arc<AtomicBool>,
}

impl RecordingCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::Release);
    }

    pub fn blocked_users(&self) -> Vec<i64> {
        self.recorded.lock().blocked_users.clone()
    }

    pub fn emails(&self) -> Vec<EmailQueuePayload> {
        self.recorded.lock().emails.clone()
    }

    /// Ids of orders whose totals were fixed
    pub fn fixed_orders(&self) -> Vec<i64> {
        self.recorded.lock().fixed_orders.clone()
    }

    /// `(execution record id, pair)` of every bridge insert
    pub fn bridge_orders(&self) -> Vec<(i64, String)> {
        self.recorded.lock().bridge_orders.clone()
    }

    fn outcome(&self) -> Result<(), CollaboratorError> {
        if self.failing.load(Ordering::Acquire) {
            Err(CollaboratorError::Unavailable("recording double set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AccountControl for RecordingCollaborators {
    async fn block_user_account(&self, user_id: i64) -> Result<(), CollaboratorError> {
        self.recorded.lock().blocked_users.push(user_id);
        self.outcome()
    }
}

#[async_trait]
impl NotificationQueue for RecordingCollaborators {
    async fn save_email_queue(&self, payload: EmailQueuePayload) -> Result<(), CollaboratorError> {
        self.recorded.lock().emails.push(payload);
        self.outcome()
    }
}

#[async_trait]
impl OrderAggregation for RecordingCollaborators {
    async fn fix_order_total(&self, order: &Order) -> Result<(), CollaboratorError> {
        self.recorded.lock().fixed_orders.push(order.id);
        self.outcome()
    }

    async fn insert_bridge_order(
        &self,
        execution_record_id: i64,
        pair: &str,
    ) -> Result<(), CollaboratorError> {
        self.recorded
            .lock()
            .bridge_orders
            .push((execution_record_id, pair.to_string()));
        self.outcome()
    }
}
