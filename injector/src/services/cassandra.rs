//! CQL-backed lead store
//!
//! Campaigns, lists, and per-lead state live in a wide-column cluster.
//! Regular columns cannot be incremented server-side, so dialable
//! transitions write the caller-computed call count in full; the call
//! timestamp is stamped server-side with `toTimestamp(now())`.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use scylla::frame::value::CqlTimestamp;
use scylla::{Session, SessionBuilder};
use tracing::{debug, info};

use crate::error::{InjectorError, InjectorResult};
use crate::traits::LeadStore;
use shared::{Campaign, Lead, List};

pub struct CassandraLeadStore {
    session: Session,
}

impl CassandraLeadStore {
    /// Connect to the cluster and switch to the given keyspace.
    pub async fn connect(contact_points: &[String], keyspace: &str) -> InjectorResult<Self> {
        let mut builder = SessionBuilder::new();
        for node in contact_points {
            builder = builder.known_node(node);
        }

        let session = builder
            .build()
            .await
            .map_err(|e| InjectorError::query("connect", e))?;

        session
            .use_keyspace(keyspace, false)
            .await
            .map_err(|e| InjectorError::query("use_keyspace", e))?;

        info!(
            "connected to cluster at {:?}, keyspace {}",
            contact_points, keyspace
        );
        Ok(Self { session })
    }

    fn lead_from_row(
        workspace_id: &str,
        list_number: &str,
        row: CqlLeadRow,
    ) -> Lead {
        let (
            lead_id,
            phone_number,
            first_name,
            last_name,
            zip_code,
            extra_data,
            call_count,
            call_status,
            last_call_date,
        ) = row;

        Lead {
            lead_id,
            list_number: list_number.to_string(),
            workspace_id: workspace_id.to_string(),
            phone_number: phone_number.unwrap_or_default(),
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            zip_code: zip_code.unwrap_or_default(),
            extra_data: extra_data.unwrap_or_default(),
            call_count: call_count.unwrap_or(0).max(0) as u32,
            dialable: true,
            last_call_date: last_call_date
                .and_then(|ts| Utc.timestamp_millis_opt(ts.0).single()),
            call_status: call_status.unwrap_or_default(),
        }
    }
}

type CqlLeadRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<HashMap<String, String>>,
    Option<i32>,
    Option<String>,
    Option<CqlTimestamp>,
);

#[async_trait::async_trait]
impl LeadStore for CassandraLeadStore {
    async fn list_active_campaigns(&self) -> InjectorResult<Vec<Campaign>> {
        let result = self
            .session
            .query(
                "SELECT id, workspace_id, active, max_rate_per_min, \
                 dial_start_hour, dial_end_hour, dial_days FROM campaigns",
                (),
            )
            .await
            .map_err(|e| InjectorError::query("list_active_campaigns", e))?;

        let mut campaigns = Vec::new();
        let rows = result
            .rows_typed::<(
                String,
                Option<String>,
                Option<bool>,
                Option<i32>,
                Option<i32>,
                Option<i32>,
                Option<Vec<i32>>,
            )>()
            .map_err(|e| InjectorError::query("list_active_campaigns", e))?;

        for row in rows {
            let (id, workspace_id, active, max_rate, start_hour, end_hour, dial_days) =
                row.map_err(|e| InjectorError::query("list_active_campaigns", e))?;

            if !active.unwrap_or(false) {
                continue;
            }

            campaigns.push(Campaign {
                id,
                workspace_id: workspace_id.unwrap_or_default(),
                active: true,
                max_rate_per_min: max_rate.unwrap_or(0),
                dial_start_hour: start_hour.unwrap_or(0).max(0) as u32,
                dial_end_hour: end_hour.unwrap_or(0).max(0) as u32,
                dial_days: dial_days
                    .unwrap_or_default()
                    .into_iter()
                    .map(|d| d.max(0) as u32)
                    .collect(),
            });
        }

        debug!("found {} active campaigns", campaigns.len());
        Ok(campaigns)
    }

    async fn list_active_lists_for_campaign(
        &self,
        campaign_id: &str,
    ) -> InjectorResult<Vec<List>> {
        let result = self
            .session
            .query(
                "SELECT listnumber, campaignid, workspace_id, active \
                 FROM lists WHERE campaignid = ? ALLOW FILTERING",
                (campaign_id,),
            )
            .await
            .map_err(|e| InjectorError::query("list_active_lists_for_campaign", e))?;

        let mut lists = Vec::new();
        let rows = result
            .rows_typed::<(String, Option<String>, Option<String>, Option<bool>)>()
            .map_err(|e| InjectorError::query("list_active_lists_for_campaign", e))?;

        for row in rows {
            let (list_number, campaign, workspace_id, active) =
                row.map_err(|e| InjectorError::query("list_active_lists_for_campaign", e))?;

            if !active.unwrap_or(false) {
                continue;
            }

            lists.push(List {
                list_number,
                campaign_id: campaign.unwrap_or_default(),
                workspace_id: workspace_id.unwrap_or_default(),
                active: true,
            });
        }

        Ok(lists)
    }

    async fn count_dialable_leads_per_list(
        &self,
        workspace_id: &str,
    ) -> InjectorResult<HashMap<String, u32>> {
        let result = self
            .session
            .query(
                "SELECT listnumber FROM list_data \
                 WHERE workspace_id = ? AND dialable = true ALLOW FILTERING",
                (workspace_id,),
            )
            .await
            .map_err(|e| InjectorError::query("count_dialable_leads_per_list", e))?;

        let mut counts: HashMap<String, u32> = HashMap::new();
        let rows = result
            .rows_typed::<(String,)>()
            .map_err(|e| InjectorError::query("count_dialable_leads_per_list", e))?;

        for row in rows {
            let (list_number,) =
                row.map_err(|e| InjectorError::query("count_dialable_leads_per_list", e))?;
            *counts.entry(list_number).or_insert(0) += 1;
        }

        Ok(counts)
    }

    async fn fetch_dialable_leads(
        &self,
        workspace_id: &str,
        list_number: &str,
        limit: u32,
    ) -> InjectorResult<Vec<Lead>> {
        let result = self
            .session
            .query(
                "SELECT leadid, phonenumber, firstname, lastname, zipcode, \
                 extradata, callcount, callstatus, lastcalldate \
                 FROM list_data \
                 WHERE workspace_id = ? AND listnumber = ? AND dialable = true \
                 LIMIT ? ALLOW FILTERING",
                (workspace_id, list_number, limit as i32),
            )
            .await
            .map_err(|e| InjectorError::query("fetch_dialable_leads", e))?;

        let mut leads = Vec::new();
        let rows = result
            .rows_typed::<CqlLeadRow>()
            .map_err(|e| InjectorError::query("fetch_dialable_leads", e))?;

        for row in rows {
            let row = row.map_err(|e| InjectorError::query("fetch_dialable_leads", e))?;
            leads.push(Self::lead_from_row(workspace_id, list_number, row));
        }

        debug!(
            "fetched {} dialable leads from list {} in workspace {}",
            leads.len(),
            list_number,
            workspace_id
        );
        Ok(leads)
    }

    async fn update_dialable_status(
        &self,
        workspace_id: &str,
        list_number: &str,
        lead_id: &str,
        dialable: bool,
        call_count: u32,
    ) -> InjectorResult<()> {
        self.session
            .query(
                "UPDATE list_data \
                 SET dialable = ?, callcount = ?, lastcalldate = toTimestamp(now()) \
                 WHERE workspace_id = ? AND listnumber = ? AND leadid = ?",
                (
                    dialable,
                    call_count as i32,
                    workspace_id,
                    list_number,
                    lead_id,
                ),
            )
            .await
            .map_err(|e| InjectorError::query("update_dialable_status", e))?;
        Ok(())
    }

    async fn update_call_status(
        &self,
        workspace_id: &str,
        list_number: &str,
        lead_id: &str,
        call_status: &str,
    ) -> InjectorResult<()> {
        self.session
            .query(
                "UPDATE list_data SET callstatus = ?, lastcalldate = toTimestamp(now()) \
                 WHERE workspace_id = ? AND listnumber = ? AND leadid = ?",
                (call_status, workspace_id, list_number, lead_id),
            )
            .await
            .map_err(|e| InjectorError::query("update_call_status", e))?;
        Ok(())
    }
}

// ts helper used by lead_from_row is exercised indirectly; conversions
// from CqlTimestamp are covered here.
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_lead_row_mapping_fills_defaults() {
        let row: CqlLeadRow = (
            "lead-1".to_string(),
            Some("+15550001111".to_string()),
            None,
            None,
            Some("10001".to_string()),
            None,
            Some(2),
            None,
            Some(CqlTimestamp(1_705_320_000_000)),
        );

        let lead = CassandraLeadStore::lead_from_row("ws-1", "100", row);

        assert_eq!(lead.lead_id, "lead-1");
        assert_eq!(lead.workspace_id, "ws-1");
        assert_eq!(lead.list_number, "100");
        assert_eq!(lead.phone_number, "+15550001111");
        assert_eq!(lead.first_name, "");
        assert_eq!(lead.call_count, 2);
        assert!(lead.dialable);
        assert!(lead.extra_data.is_empty());

        let last_call = lead.last_call_date.unwrap();
        assert_eq!(last_call.year(), 2024);
    }

    #[test]
    fn test_negative_call_count_clamps_to_zero() {
        let row: CqlLeadRow = (
            "lead-2".to_string(),
            None,
            None,
            None,
            None,
            None,
            Some(-3),
            None,
            None,
        );

        let lead = CassandraLeadStore::lead_from_row("ws-1", "100", row);
        assert_eq!(lead.call_count, 0);
        assert!(lead.last_call_date.is_none());
    }
}
