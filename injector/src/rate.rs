//! Injection-rate calculation against live counters
//!
//! Sizes each campaign's injection budget for the upcoming planning
//! window from the workspace's live load: calls already in progress plus
//! leads already sitting in the queue. Counter reads are taken back to
//! back to minimize skew, but atomicity across the two keys is not
//! assumed or required.

use crate::error::InjectorResult;
use crate::traits::QueueStore;
use shared::Campaign;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fixed planning horizon the controller sizes capacity for.
pub const PLANNING_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Per-campaign, per-cycle rate snapshot. Never persisted; discarded after
/// the cycle that computed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateCalculation {
    pub campaign_id: String,
    pub workspace_id: String,
    pub max_rate_per_minute: u32,
    pub current_calls_in_progress: u32,
    pub queue_depth: u32,
    /// Net capacity for the window: leads the campaign may inject now.
    pub calculated_rate: u32,
    pub time_window: Duration,
}

/// Computes injection budgets from the counter/queue store.
pub struct RateController<Q: QueueStore> {
    queue_store: Arc<Q>,
}

impl<Q: QueueStore> RateController<Q> {
    pub fn new(queue_store: Arc<Q>) -> Self {
        Self { queue_store }
    }

    /// How many leads this campaign may inject over the planning window.
    ///
    /// `capacity = max(0, effective_rate * window_minutes - calls_in_progress - queue_depth)`.
    /// Any counter read failure aborts the calculation; the caller skips
    /// the campaign for this cycle rather than injecting a default.
    pub async fn calculate_injection_rate(
        &self,
        campaign: &Campaign,
    ) -> InjectorResult<RateCalculation> {
        let current_calls = self
            .queue_store
            .calls_in_progress(&campaign.workspace_id)
            .await?;
        let queue_depth = self.queue_store.queue_depth(&campaign.workspace_id).await?;

        let max_rate = campaign.effective_max_rate();
        let window_minutes = PLANNING_WINDOW.as_secs() as u32 / 60;
        // Store-supplied rates are unbounded; saturate rather than
        // overflow on a pathological value.
        let total_capacity = max_rate.saturating_mul(window_minutes);

        let available_capacity = total_capacity
            .saturating_sub(current_calls)
            .saturating_sub(queue_depth);

        debug!(
            "Rate calculation for campaign {}: max={}/min, current={}, queue={}, calculated={} for {:?} window",
            campaign.id, max_rate, current_calls, queue_depth, available_capacity, PLANNING_WINDOW
        );

        Ok(RateCalculation {
            campaign_id: campaign.id.clone(),
            workspace_id: campaign.workspace_id.clone(),
            max_rate_per_minute: max_rate,
            current_calls_in_progress: current_calls,
            queue_depth,
            calculated_rate: available_capacity,
            time_window: PLANNING_WINDOW,
        })
    }

    /// Guard check: whether the workspace is under its load buffer, and by
    /// how much.
    pub async fn can_inject(
        &self,
        workspace_id: &str,
        max_rate_per_minute: u32,
    ) -> InjectorResult<(bool, u32)> {
        let current_calls = self.queue_store.calls_in_progress(workspace_id).await?;
        let queue_depth = self.queue_store.queue_depth(workspace_id).await?;

        let buffer_capacity = max_rate_per_minute.saturating_mul(5);
        let current_load = current_calls.saturating_add(queue_depth);

        let allowed = current_load < buffer_capacity;
        let available_capacity = buffer_capacity.saturating_sub(current_load);

        debug!(
            "Can inject check for workspace {}: current_load={}, buffer_capacity={}, can_inject={}, available={}",
            workspace_id, current_load, buffer_capacity, allowed, available_capacity
        );

        Ok((allowed, available_capacity))
    }
}
