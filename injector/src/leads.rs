//! Lead dialable-state transitions
//!
//! A lead is either dialable (eligible for injection) or non-dialable
//! (in the queue or being worked). The state machine owns the call-count
//! bookkeeping that accompanies each transition; the store write carries
//! the computed count because the wide-column store cannot increment a
//! regular column server-side.

use crate::error::InjectorResult;
use crate::traits::LeadStore;
use chrono::Utc;
use shared::Lead;
use std::sync::Arc;
use tracing::warn;

pub struct LeadStateMachine<S: LeadStore> {
    store: Arc<S>,
}

impl<S: LeadStore> LeadStateMachine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Dialable -> non-dialable, the injection transition.
    ///
    /// Increments the call count and stamps the last-call date. Returns
    /// the updated snapshot once the store write has landed; the caller
    /// must not enqueue the lead before this returns.
    pub async fn mark_non_dialable(&self, lead: &Lead) -> InjectorResult<Lead> {
        let call_count = lead.call_count + 1;
        self.store
            .update_dialable_status(
                &lead.workspace_id,
                &lead.list_number,
                &lead.lead_id,
                false,
                call_count,
            )
            .await?;

        let mut updated = lead.clone();
        updated.dialable = false;
        updated.call_count = call_count;
        updated.last_call_date = Some(Utc::now());
        Ok(updated)
    }

    /// Non-dialable -> dialable, the explicit reset path (operator action
    /// or call-outcome requeue). The call count decrement saturates at
    /// zero; it never goes negative.
    pub async fn reset_dialable(&self, lead: &Lead) -> InjectorResult<Lead> {
        let call_count = lead.call_count.saturating_sub(1);
        self.store
            .update_dialable_status(
                &lead.workspace_id,
                &lead.list_number,
                &lead.lead_id,
                true,
                call_count,
            )
            .await?;

        let mut updated = lead.clone();
        updated.dialable = true;
        updated.call_count = call_count;
        Ok(updated)
    }

    /// Record a call outcome. Orthogonal to the dialable flag.
    pub async fn record_call_status(&self, lead: &Lead, status: &str) -> InjectorResult<()> {
        self.store
            .update_call_status(&lead.workspace_id, &lead.list_number, &lead.lead_id, status)
            .await
    }

    /// Mark a batch of leads non-dialable, all-attempted: a single lead's
    /// failure is logged and skipped, never aborting the batch. Returns
    /// the successfully transitioned snapshots.
    pub async fn mark_batch_non_dialable(&self, leads: &[Lead]) -> Vec<Lead> {
        let mut transitioned = Vec::with_capacity(leads.len());

        for lead in leads {
            match self.mark_non_dialable(lead).await {
                Ok(updated) => transitioned.push(updated),
                Err(e) => {
                    warn!(
                        "failed to mark lead {} in list {} non-dialable: {}",
                        lead.lead_id, lead.list_number, e
                    );
                }
            }
        }

        transitioned
    }
}
