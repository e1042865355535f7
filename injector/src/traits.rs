//! Collaborator traits with mockall annotations for testing
//!
//! The pipeline talks to two external systems: the wide-column record
//! store holding campaigns/lists/leads, and the counter/queue store the
//! downstream dialer consumes from. Both are injected at construction
//! time; tests substitute mockall mocks or in-memory fakes.

use crate::error::InjectorResult;
use shared::{Campaign, Lead, List, QueuedLead};
use std::collections::HashMap;

/// Record store access for campaigns, lists, and leads.
///
/// Implementations return [`crate::InjectorError::NotConnected`] when the
/// underlying session is unavailable.
#[mockall::automock]
#[async_trait::async_trait]
pub trait LeadStore: Send + Sync {
    /// All campaigns currently flagged active, across every workspace.
    async fn list_active_campaigns(&self) -> InjectorResult<Vec<Campaign>>;

    /// Active lists owned by one campaign.
    async fn list_active_lists_for_campaign(&self, campaign_id: &str) -> InjectorResult<Vec<List>>;

    /// Count of dialable leads per list number within a workspace.
    ///
    /// Lists with no dialable leads may be absent from the map.
    async fn count_dialable_leads_per_list(
        &self,
        workspace_id: &str,
    ) -> InjectorResult<HashMap<String, u32>>;

    /// Up to `limit` dialable leads from one list.
    async fn fetch_dialable_leads(
        &self,
        workspace_id: &str,
        list_number: &str,
        limit: u32,
    ) -> InjectorResult<Vec<Lead>>;

    /// Write a dialable-state transition along with the call count the
    /// state machine computed for it. The store stamps the last-call
    /// timestamp as part of the same write.
    async fn update_dialable_status(
        &self,
        workspace_id: &str,
        list_number: &str,
        lead_id: &str,
        dialable: bool,
        call_count: u32,
    ) -> InjectorResult<()>;

    /// Record a call outcome code; does not touch the dialable flag.
    async fn update_call_status(
        &self,
        workspace_id: &str,
        list_number: &str,
        lead_id: &str,
        status: &str,
    ) -> InjectorResult<()>;
}

/// Counter and queue access, keyed by workspace.
///
/// Counters are mutated with atomic single-key operations only; no
/// multi-key transactions are assumed.
#[mockall::automock]
#[async_trait::async_trait]
pub trait QueueStore: Send + Sync {
    /// Calls currently in progress for a workspace.
    async fn calls_in_progress(&self, workspace_id: &str) -> InjectorResult<u32>;

    /// Atomically increment the in-progress counter; returns the new value.
    async fn increment_calls_in_progress(&self, workspace_id: &str) -> InjectorResult<u32>;

    /// Atomically decrement the in-progress counter, flooring at zero.
    /// A decrement that would go below zero resets the counter to zero.
    async fn decrement_calls_in_progress(&self, workspace_id: &str) -> InjectorResult<u32>;

    /// Depth of the workspace call queue.
    async fn queue_depth(&self, workspace_id: &str) -> InjectorResult<u32>;

    /// Push one lead onto the workspace call queue.
    async fn enqueue(&self, workspace_id: &str, lead: QueuedLead) -> InjectorResult<()>;

    /// Pop the oldest queued lead, if any.
    async fn dequeue(&self, workspace_id: &str) -> InjectorResult<Option<QueuedLead>>;

    /// Cache a campaign's effective rate for downstream consumers.
    /// Best-effort; callers log and continue on failure.
    async fn cache_campaign_rate(&self, campaign_id: &str, max_rate: u32) -> InjectorResult<()>;
}
