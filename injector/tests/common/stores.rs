//! In-memory store fakes
//!
//! Behave like the real stores over owned data: the lead store keeps
//! campaigns, lists, and per-list lead vectors; the queue store keeps
//! integer counters with the floor-at-zero rule and FIFO queues of
//! serialized payloads. Failure toggles let tests knock out individual
//! operations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use injector::{InjectorError, InjectorResult, LeadStore, QueueStore};
use shared::{Campaign, Lead, List, QueuedLead};

#[derive(Default)]
pub struct InMemoryLeadStore {
    campaigns: Mutex<Vec<Campaign>>,
    lists: Mutex<Vec<List>>,
    /// (workspace_id, list_number) -> leads
    leads: Mutex<HashMap<(String, String), Vec<Lead>>>,

    disconnected: AtomicBool,
    /// Workspace whose lead-count query should fail, if any.
    fail_counts_for: Mutex<Option<String>>,
    /// Artificial latency inside fetch_dialable_leads, to widen the
    /// window in which concurrent cycles could select the same leads.
    fetch_delay_ms: AtomicU32,

    /// Times a lead already non-dialable was marked non-dialable again.
    /// Any value above zero means two cycles selected the same lead.
    double_transitions: AtomicU32,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_campaign(&self, campaign: Campaign) {
        self.campaigns.lock().await.push(campaign);
    }

    pub async fn add_list(&self, list: List) {
        self.lists.lock().await.push(list);
    }

    pub async fn add_leads(&self, leads: Vec<Lead>) {
        let mut map = self.leads.lock().await;
        for lead in leads {
            map.entry((lead.workspace_id.clone(), lead.list_number.clone()))
                .or_default()
                .push(lead);
        }
    }

    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    pub async fn fail_lead_counts_for(&self, workspace_id: &str) {
        *self.fail_counts_for.lock().await = Some(workspace_id.to_string());
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        self.fetch_delay_ms
            .store(delay.as_millis() as u32, Ordering::SeqCst);
    }

    pub fn double_transitions(&self) -> u32 {
        self.double_transitions.load(Ordering::SeqCst)
    }

    pub async fn dialable_count(&self, workspace_id: &str, list_number: &str) -> usize {
        self.leads
            .lock()
            .await
            .get(&(workspace_id.to_string(), list_number.to_string()))
            .map(|leads| leads.iter().filter(|l| l.dialable).count())
            .unwrap_or(0)
    }

    pub async fn find_lead(&self, workspace_id: &str, list_number: &str, lead_id: &str) -> Option<Lead> {
        self.leads
            .lock()
            .await
            .get(&(workspace_id.to_string(), list_number.to_string()))
            .and_then(|leads| leads.iter().find(|l| l.lead_id == lead_id).cloned())
    }

    fn check_connected(&self) -> InjectorResult<()> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(InjectorError::NotConnected);
        }
        Ok(())
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn list_active_campaigns(&self) -> InjectorResult<Vec<Campaign>> {
        self.check_connected()?;
        Ok(self
            .campaigns
            .lock()
            .await
            .iter()
            .filter(|c| c.active)
            .cloned()
            .collect())
    }

    async fn list_active_lists_for_campaign(&self, campaign_id: &str) -> InjectorResult<Vec<List>> {
        self.check_connected()?;
        Ok(self
            .lists
            .lock()
            .await
            .iter()
            .filter(|l| l.active && l.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn count_dialable_leads_per_list(
        &self,
        workspace_id: &str,
    ) -> InjectorResult<HashMap<String, u32>> {
        self.check_connected()?;
        if self.fail_counts_for.lock().await.as_deref() == Some(workspace_id) {
            return Err(InjectorError::query(
                "count_dialable_leads_per_list",
                "induced failure",
            ));
        }

        let mut counts: HashMap<String, u32> = HashMap::new();
        for ((ws, list_number), leads) in self.leads.lock().await.iter() {
            if ws == workspace_id {
                let dialable = leads.iter().filter(|l| l.dialable).count() as u32;
                if dialable > 0 {
                    counts.insert(list_number.clone(), dialable);
                }
            }
        }
        Ok(counts)
    }

    async fn fetch_dialable_leads(
        &self,
        workspace_id: &str,
        list_number: &str,
        limit: u32,
    ) -> InjectorResult<Vec<Lead>> {
        self.check_connected()?;

        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }

        Ok(self
            .leads
            .lock()
            .await
            .get(&(workspace_id.to_string(), list_number.to_string()))
            .map(|leads| {
                leads
                    .iter()
                    .filter(|l| l.dialable)
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_dialable_status(
        &self,
        workspace_id: &str,
        list_number: &str,
        lead_id: &str,
        dialable: bool,
        call_count: u32,
    ) -> InjectorResult<()> {
        self.check_connected()?;

        let mut map = self.leads.lock().await;
        let leads = map
            .get_mut(&(workspace_id.to_string(), list_number.to_string()))
            .ok_or_else(|| InjectorError::query("update_dialable_status", "unknown list"))?;
        let lead = leads
            .iter_mut()
            .find(|l| l.lead_id == lead_id)
            .ok_or_else(|| InjectorError::query("update_dialable_status", "unknown lead"))?;

        if !dialable && !lead.dialable {
            self.double_transitions.fetch_add(1, Ordering::SeqCst);
        }

        lead.dialable = dialable;
        lead.call_count = call_count;
        lead.last_call_date = Some(Utc::now());
        Ok(())
    }

    async fn update_call_status(
        &self,
        workspace_id: &str,
        list_number: &str,
        lead_id: &str,
        status: &str,
    ) -> InjectorResult<()> {
        self.check_connected()?;

        let mut map = self.leads.lock().await;
        let lead = map
            .get_mut(&(workspace_id.to_string(), list_number.to_string()))
            .and_then(|leads| leads.iter_mut().find(|l| l.lead_id == lead_id))
            .ok_or_else(|| InjectorError::query("update_call_status", "unknown lead"))?;
        lead.call_status = status.to_string();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryQueueStore {
    counters: Mutex<HashMap<String, i64>>,
    /// Per-workspace FIFO of serialized queue payloads.
    queues: Mutex<HashMap<String, Vec<String>>>,
    rates: Mutex<HashMap<String, u32>>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_calls_in_progress(&self, workspace_id: &str, value: i64) {
        self.counters
            .lock()
            .await
            .insert(workspace_id.to_string(), value);
    }

    pub async fn queued(&self, workspace_id: &str) -> Vec<QueuedLead> {
        self.queues
            .lock()
            .await
            .get(workspace_id)
            .map(|payloads| {
                payloads
                    .iter()
                    .filter_map(|p| QueuedLead::from_wire(p).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn cached_rate(&self, campaign_id: &str) -> Option<u32> {
        self.rates.lock().await.get(campaign_id).copied()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn calls_in_progress(&self, workspace_id: &str) -> InjectorResult<u32> {
        Ok(self
            .counters
            .lock()
            .await
            .get(workspace_id)
            .copied()
            .unwrap_or(0)
            .max(0) as u32)
    }

    async fn increment_calls_in_progress(&self, workspace_id: &str) -> InjectorResult<u32> {
        let mut counters = self.counters.lock().await;
        let value = counters.entry(workspace_id.to_string()).or_insert(0);
        *value += 1;
        Ok((*value).max(0) as u32)
    }

    async fn decrement_calls_in_progress(&self, workspace_id: &str) -> InjectorResult<u32> {
        let mut counters = self.counters.lock().await;
        let value = counters.entry(workspace_id.to_string()).or_insert(0);
        *value -= 1;
        if *value <= 0 {
            *value = 0;
            return Ok(0);
        }
        Ok(*value as u32)
    }

    async fn queue_depth(&self, workspace_id: &str) -> InjectorResult<u32> {
        Ok(self
            .queues
            .lock()
            .await
            .get(workspace_id)
            .map(|q| q.len() as u32)
            .unwrap_or(0))
    }

    async fn enqueue(&self, workspace_id: &str, lead: QueuedLead) -> InjectorResult<()> {
        let payload = lead.to_wire()?;
        self.queues
            .lock()
            .await
            .entry(workspace_id.to_string())
            .or_default()
            .push(payload);
        Ok(())
    }

    async fn dequeue(&self, workspace_id: &str) -> InjectorResult<Option<QueuedLead>> {
        let mut queues = self.queues.lock().await;
        let queue = match queues.get_mut(workspace_id) {
            Some(queue) if !queue.is_empty() => queue,
            _ => return Ok(None),
        };
        let payload = queue.remove(0);
        Ok(Some(QueuedLead::from_wire(&payload)?))
    }

    async fn cache_campaign_rate(&self, campaign_id: &str, max_rate: u32) -> InjectorResult<()> {
        self.rates
            .lock()
            .await
            .insert(campaign_id.to_string(), max_rate);
        Ok(())
    }
}
