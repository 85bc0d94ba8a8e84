use std::collections::BTreeSet;
use std::sync::Arc;

use crate::collaborators::BlockedUsers;
use crate::side_effects::{SideEffect, SideEffectSender};

/// Freezes every account touched by a failed execution run
///
/// Freeze requests go through the side-effect worker, so their outcome never
/// changes the error the caller sees.
pub struct FailureCompensation {
    side_effects: SideEffectSender,
    blocked: Arc<dyn BlockedUsers>,
}

impl FailureCompensation {
    pub fn new(side_effects: SideEffectSender, blocked: Arc<dyn BlockedUsers>) -> Self {
        Self {
            side_effects,
            blocked,
        }
    }

    pub fn compensate(&self, user_ids: &BTreeSet<i64>) {
        tracing::warn!("Freezing {} accounts after failed execution: {:?}", user_ids.len(), user_ids);

        for &user_id in user_ids {
            self.blocked.mark_blocked(user_id);
            self.side_effects
                .dispatch(SideEffect::BlockUserAccount { user_id });
        }
    }
}
