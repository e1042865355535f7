//! Test fixtures and data for injector tests
//!
//! Consistent campaign, list, and lead factories used across the test
//! suites.

use shared::{Campaign, Lead, List};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const WORKSPACE_1: &'static str = "ws-alpha";
    pub const WORKSPACE_2: &'static str = "ws-beta";

    /// Campaign whose calling window is open around the clock, every
    /// day of the week. Tests that exercise the pipeline rather than
    /// the schedule filter should use this.
    pub fn always_open_campaign(id: &str, workspace_id: &str) -> Campaign {
        Campaign {
            id: id.to_string(),
            workspace_id: workspace_id.to_string(),
            active: true,
            max_rate_per_min: 60,
            dial_start_hour: 0,
            dial_end_hour: 23,
            dial_days: (0..7).collect(),
        }
    }

    pub fn list(list_number: &str, campaign_id: &str, workspace_id: &str) -> List {
        List {
            list_number: list_number.to_string(),
            campaign_id: campaign_id.to_string(),
            workspace_id: workspace_id.to_string(),
            active: true,
        }
    }

    pub fn lead(lead_id: &str, list_number: &str, workspace_id: &str) -> Lead {
        Lead {
            lead_id: lead_id.to_string(),
            list_number: list_number.to_string(),
            workspace_id: workspace_id.to_string(),
            phone_number: "+15550001111".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            zip_code: "10001".to_string(),
            extra_data: Default::default(),
            call_count: 0,
            dialable: true,
            last_call_date: None,
            call_status: String::new(),
        }
    }

    /// `count` dialable leads numbered `{prefix}-0..count` for one list.
    pub fn leads(prefix: &str, count: usize, list_number: &str, workspace_id: &str) -> Vec<Lead> {
        (0..count)
            .map(|i| Self::lead(&format!("{}-{}", prefix, i), list_number, workspace_id))
            .collect()
    }
}
