//! Main injection pipeline driver
//!
//! Runs the periodic planning cycle: enumerate workspaces, filter
//! campaigns by calling window, size each campaign's budget against live
//! counters, split the budget across lists, and move the selected leads
//! into the call queue while marking them non-dialable.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::core::{
    allocate, is_schedulable, CycleSummary, InjectorState, ListAvailability, ZipCodeCache,
};
use crate::error::{InjectorError, InjectorResult};
use crate::leads::LeadStateMachine;
use crate::rate::{RateController, PLANNING_WINDOW};
use crate::traits::{LeadStore, QueueStore};
use shared::{Campaign, QueuedLead};

/// Tunables for the pipeline driver.
#[derive(Clone, Debug)]
pub struct InjectorConfig {
    /// Time between planning cycles; matches the rate controller's window
    /// by default.
    pub cycle_interval: Duration,

    /// Upper bound on concurrently processed workspaces. Keeps the cycle
    /// from overwhelming the record store with parallel range scans.
    pub max_workspace_workers: usize,

    /// Representative zip code used to resolve local time for schedule
    /// evaluation. When unset, server-local time is used instead.
    pub schedule_zip: Option<String>,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            cycle_interval: PLANNING_WINDOW,
            max_workspace_workers: 4,
            schedule_zip: None,
        }
    }
}

/// Per-workspace tally for one cycle.
#[derive(Debug, Default)]
struct WorkspaceOutcome {
    campaigns_processed: u32,
    campaign_errors: u32,
    leads_injected: u64,
}

/// The pipeline driver, generic over its injected store collaborators.
pub struct Injector<S, Q>
where
    S: LeadStore + 'static,
    Q: QueueStore + 'static,
{
    lead_store: Arc<S>,
    queue_store: Arc<Q>,
    zip_cache: Arc<ZipCodeCache>,
    config: InjectorConfig,

    rate: RateController<Q>,
    leads: LeadStateMachine<S>,

    /// Cycle bookkeeping and per-list advisory locks.
    state: Arc<Mutex<InjectorState>>,

    /// Set on shutdown; checked between lists so the current list's
    /// transition+enqueue pair always completes.
    cancelled: Arc<AtomicBool>,

    shutdown_tx: mpsc::Sender<()>,
    /// Taken by `run`; the receiver must live as a local there so it can
    /// be polled while a cycle is in flight.
    shutdown_rx: Option<mpsc::Receiver<()>>,
}

impl<S, Q> Injector<S, Q>
where
    S: LeadStore + 'static,
    Q: QueueStore + 'static,
{
    pub fn new(
        lead_store: Arc<S>,
        queue_store: Arc<Q>,
        zip_cache: Arc<ZipCodeCache>,
        config: InjectorConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Self {
            rate: RateController::new(Arc::clone(&queue_store)),
            leads: LeadStateMachine::new(Arc::clone(&lead_store)),
            lead_store,
            queue_store,
            zip_cache,
            config,
            state: Arc::new(Mutex::new(InjectorState::new())),
            cancelled: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            shutdown_rx: Some(shutdown_rx),
        }
    }

    /// Main loop: one planning cycle per timer tick until shutdown.
    /// A failed cycle is logged and retried on the next tick.
    ///
    /// A shutdown received while a cycle is in flight sets the
    /// cancellation flag immediately, so the cycle stops scheduling
    /// further lists, then the loop waits for the cycle to wind down
    /// before exiting. The in-flight cycle future is never dropped; the
    /// current list's transition+enqueue pair always completes.
    pub async fn run(&mut self) -> InjectorResult<()> {
        let mut shutdown_rx = self
            .shutdown_rx
            .take()
            .ok_or_else(|| InjectorError::config("shutdown_receiver"))?;

        let mut cycle_timer = interval(self.config.cycle_interval);
        info!(
            "🚀 Injector started, planning cycle every {:?}",
            self.config.cycle_interval
        );

        loop {
            tokio::select! {
                _ = cycle_timer.tick() => {
                    let cycle = self.run_cycle();
                    tokio::pin!(cycle);

                    let result = loop {
                        tokio::select! {
                            result = &mut cycle => break result,

                            Some(_) = shutdown_rx.recv() => {
                                info!("🛑 Shutting down injector...");
                                self.cancelled.store(true, Ordering::SeqCst);
                            }
                        }
                    };

                    if let Err(e) = result {
                        error!("⚠️ Injection cycle failed: {}. Will retry on next interval.", e);
                    }
                    if self.cancelled.load(Ordering::SeqCst) {
                        break;
                    }
                }

                Some(_) = shutdown_rx.recv() => {
                    info!("🛑 Shutting down injector...");
                    self.cancelled.store(true, Ordering::SeqCst);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run one full planning cycle across all workspaces.
    ///
    /// Workspaces are processed concurrently up to the configured worker
    /// bound, in sorted workspace order for reproducibility. A failed
    /// workspace is logged and skipped; the cycle always completes with a
    /// summary.
    pub async fn run_cycle(&self) -> InjectorResult<CycleSummary> {
        let started = Instant::now();
        let now = Utc::now();
        let cycle = self.state.lock().await.next_cycle();
        debug!("🔁 Starting injection cycle {}", cycle);

        let campaigns = self.lead_store.list_active_campaigns().await?;

        let mut workspaces: BTreeMap<String, Vec<Campaign>> = BTreeMap::new();
        for campaign in campaigns {
            if campaign.active {
                workspaces
                    .entry(campaign.workspace_id.clone())
                    .or_default()
                    .push(campaign);
            }
        }

        let workspaces_attempted = workspaces.len() as u32;
        let results: Vec<(String, InjectorResult<WorkspaceOutcome>)> = stream::iter(workspaces)
            .map(|(workspace_id, campaigns)| async move {
                let outcome = self.process_workspace(&workspace_id, campaigns, now).await;
                (workspace_id, outcome)
            })
            .buffer_unordered(self.config.max_workspace_workers.max(1))
            .collect()
            .await;

        let mut workspaces_succeeded = 0u32;
        let mut campaigns_processed = 0u32;
        let mut leads_injected = 0u64;

        for (workspace_id, outcome) in results {
            match outcome {
                Ok(outcome) => {
                    campaigns_processed += outcome.campaigns_processed;
                    leads_injected += outcome.leads_injected;
                    if outcome.campaign_errors == 0 {
                        workspaces_succeeded += 1;
                        debug!("successfully processed workspace {}", workspace_id);
                    } else {
                        warn!(
                            "workspace {} finished with {} failed campaigns",
                            workspace_id, outcome.campaign_errors
                        );
                    }
                }
                Err(e) => {
                    error!("failed to process workspace {}: {}", workspace_id, e);
                }
            }
        }

        let summary = CycleSummary {
            cycle,
            workspaces_attempted,
            workspaces_succeeded,
            campaigns_processed,
            leads_injected,
            duration_seconds: started.elapsed().as_secs_f64(),
            timestamp: shared::logging::format_timestamp(),
        };

        info!(
            "✅ Cycle {}: processed {}/{} workspaces successfully, injected {} leads",
            cycle, workspaces_succeeded, workspaces_attempted, leads_injected
        );

        self.state.lock().await.record_cycle(summary.clone());
        Ok(summary)
    }

    /// Filter one workspace's campaigns by calling window, then process
    /// each schedulable campaign. Campaign failures are counted and
    /// skipped at campaign granularity.
    async fn process_workspace(
        &self,
        workspace_id: &str,
        campaigns: Vec<Campaign>,
        now: DateTime<Utc>,
    ) -> InjectorResult<WorkspaceOutcome> {
        let schedulable = self.schedulable_campaigns(campaigns, now)?;

        if schedulable.is_empty() {
            debug!(
                "no campaign inside its calling window for workspace {}",
                workspace_id
            );
            return Ok(WorkspaceOutcome::default());
        }
        debug!(
            "found {} schedulable campaigns for {}",
            schedulable.len(),
            workspace_id
        );

        let mut outcome = WorkspaceOutcome::default();
        for campaign in &schedulable {
            if self.cancelled.load(Ordering::SeqCst) {
                break;
            }

            match self.process_campaign(workspace_id, campaign).await {
                Ok(injected) => {
                    outcome.campaigns_processed += 1;
                    outcome.leads_injected += injected;
                }
                Err(e) => {
                    outcome.campaign_errors += 1;
                    warn!("skipping campaign {} this cycle: {}", campaign.id, e);
                }
            }
        }

        Ok(outcome)
    }

    /// Campaigns whose calling window contains the evaluation instant,
    /// using the configured representative zip for local time when set.
    fn schedulable_campaigns(
        &self,
        campaigns: Vec<Campaign>,
        now: DateTime<Utc>,
    ) -> InjectorResult<Vec<Campaign>> {
        if let Some(zip) = &self.config.schedule_zip {
            let local = self.zip_cache.local_time(zip, now)?;
            Ok(campaigns
                .into_iter()
                .filter(|campaign| is_schedulable(campaign, &local))
                .collect())
        } else {
            let local = now.with_timezone(&chrono::Local);
            Ok(campaigns
                .into_iter()
                .filter(|campaign| is_schedulable(campaign, &local))
                .collect())
        }
    }

    /// Size the campaign's budget and inject leads list by list.
    /// Returns the number of leads injected for this campaign.
    async fn process_campaign(
        &self,
        workspace_id: &str,
        campaign: &Campaign,
    ) -> InjectorResult<u64> {
        debug!("processing campaign {}", campaign.id);

        let max_rate = campaign.effective_max_rate();
        let (allowed, _) = self.rate.can_inject(workspace_id, max_rate).await?;
        if !allowed {
            debug!(
                "workspace {} is at capacity, campaign {} waits for the next cycle",
                workspace_id, campaign.id
            );
            return Ok(0);
        }

        let calculation = self.rate.calculate_injection_rate(campaign).await?;

        // Best-effort rate hint for downstream consumers.
        if let Err(e) = self
            .queue_store
            .cache_campaign_rate(&campaign.id, calculation.max_rate_per_minute)
            .await
        {
            debug!("failed to cache rate for campaign {}: {}", campaign.id, e);
        }

        let budget = calculation.calculated_rate;
        if budget == 0 {
            debug!("campaign {} has no capacity this cycle", campaign.id);
            return Ok(0);
        }

        let lists = self
            .lead_store
            .list_active_lists_for_campaign(&campaign.id)
            .await?;
        let counts = self
            .lead_store
            .count_dialable_leads_per_list(workspace_id)
            .await?;

        let availability: Vec<ListAvailability> = lists
            .iter()
            .filter(|list| list.active && list.workspace_id == workspace_id)
            .map(|list| {
                ListAvailability::new(
                    list.list_number.clone(),
                    counts.get(&list.list_number).copied().unwrap_or(0),
                )
            })
            .collect();

        let quotas = allocate(budget, &availability);
        if quotas.is_empty() {
            debug!("no dialable leads available for campaign {}", campaign.id);
            return Ok(0);
        }

        let mut injected = 0u64;
        for (list_number, quota) in quotas {
            if self.cancelled.load(Ordering::SeqCst) {
                debug!(
                    "cancellation requested, stopping campaign {} before list {}",
                    campaign.id, list_number
                );
                break;
            }

            match self
                .inject_from_list(workspace_id, campaign, &list_number, quota)
                .await
            {
                Ok(count) => injected += count,
                Err(e) => warn!("failed to inject from list {}: {}", list_number, e),
            }
        }

        Ok(injected)
    }

    /// Fetch up to `quota` dialable leads from one list, mark them
    /// non-dialable, then enqueue them.
    ///
    /// The whole sequence holds the list's advisory lock so an
    /// overlapping cycle cannot select the same leads. The non-dialable
    /// write must land before the enqueue: a failure between the two
    /// drops the lead (it stays non-dialable) rather than risking a
    /// duplicate in the queue.
    async fn inject_from_list(
        &self,
        workspace_id: &str,
        campaign: &Campaign,
        list_number: &str,
        quota: u32,
    ) -> InjectorResult<u64> {
        let lock = self.state.lock().await.list_lock(workspace_id, list_number);
        let _guard = lock.lock().await;

        let leads = self
            .lead_store
            .fetch_dialable_leads(workspace_id, list_number, quota)
            .await?;
        if leads.is_empty() {
            return Ok(0);
        }

        let transitioned = self.leads.mark_batch_non_dialable(&leads).await;

        let mut enqueued = 0u64;
        for lead in &transitioned {
            let queued = QueuedLead::from_lead(lead, &campaign.id, Utc::now());
            match self.queue_store.enqueue(workspace_id, queued).await {
                Ok(()) => enqueued += 1,
                Err(e) => {
                    error!(
                        "failed to enqueue lead {} for workspace {}: {}",
                        lead.lead_id, workspace_id, e
                    );
                }
            }
        }

        debug!(
            "injected {}/{} leads from list {} for campaign {}",
            enqueued, quota, list_number, campaign.id
        );
        Ok(enqueued)
    }

    /// Get shutdown sender for external shutdown requests
    pub fn get_shutdown_sender(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub async fn cycles_run(&self) -> u32 {
        self.state.lock().await.cycles_run()
    }

    pub async fn total_leads_injected(&self) -> u64 {
        self.state.lock().await.total_leads_injected()
    }
}
