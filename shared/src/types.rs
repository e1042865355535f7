//! Core domain records and the queue transit shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{SharedError, SharedResult};

/// Default maximum injection rate applied when a campaign's configured
/// rate is zero or negative.
pub const DEFAULT_MAX_RATE_PER_MINUTE: u32 = 60;

/// A dialing campaign with its calling window and rate cap.
///
/// Read-only to the pipeline; owned by the record store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub workspace_id: String,
    pub active: bool,
    /// Configured cap in leads per minute. Zero or negative means unset.
    pub max_rate_per_min: i32,
    /// Inclusive local-hour bounds of the calling window (0-23).
    pub dial_start_hour: u32,
    pub dial_end_hour: u32,
    /// Weekday ordinals permitted for dialing, Sunday = 0.
    pub dial_days: Vec<u32>,
}

impl Campaign {
    /// Effective per-minute rate: the configured cap when positive,
    /// otherwise the system default of 60/min.
    pub fn effective_max_rate(&self) -> u32 {
        if self.max_rate_per_min > 0 {
            self.max_rate_per_min as u32
        } else {
            DEFAULT_MAX_RATE_PER_MINUTE
        }
    }
}

/// A list of leads belonging to exactly one campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub list_number: String,
    pub campaign_id: String,
    pub workspace_id: String,
    pub active: bool,
}

/// A contact record with dialable state and call history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: String,
    pub list_number: String,
    pub workspace_id: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub zip_code: String,
    pub extra_data: HashMap<String, String>,
    /// Number of times this lead has been handed to the queue.
    /// Never negative.
    pub call_count: u32,
    pub dialable: bool,
    pub last_call_date: Option<DateTime<Utc>>,
    pub call_status: String,
}

/// Denormalized snapshot of a lead written to the call queue at injection
/// time and consumed exactly once by the downstream dialer.
///
/// The serialized field names are a wire contract with the dialer; do not
/// rename them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueuedLead {
    pub lead_id: String,
    pub list_number: String,
    pub workspace_id: String,
    pub campaign_id: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub zip_code: String,
    pub extra_data: HashMap<String, String>,
    pub queued_at: DateTime<Utc>,
    pub call_attempts: u32,
    pub call_status: String,
}

impl QueuedLead {
    /// Snapshot a lead for the queue.
    pub fn from_lead(lead: &Lead, campaign_id: &str, queued_at: DateTime<Utc>) -> Self {
        Self {
            lead_id: lead.lead_id.clone(),
            list_number: lead.list_number.clone(),
            workspace_id: lead.workspace_id.clone(),
            campaign_id: campaign_id.to_string(),
            phone_number: lead.phone_number.clone(),
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            zip_code: lead.zip_code.clone(),
            extra_data: lead.extra_data.clone(),
            queued_at,
            call_attempts: lead.call_count,
            call_status: lead.call_status.clone(),
        }
    }

    /// Serialize to the queue wire format.
    pub fn to_wire(&self) -> SharedResult<String> {
        serde_json::to_string(self).map_err(|e| SharedError::SerializationError {
            message: e.to_string(),
        })
    }

    /// Parse a queue payload back into a lead snapshot.
    pub fn from_wire(payload: &str) -> SharedResult<Self> {
        serde_json::from_str(payload).map_err(|e| SharedError::DeserializationError {
            message: e.to_string(),
        })
    }
}
