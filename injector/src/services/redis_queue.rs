//! Redis-backed queue store
//!
//! Call queues are per-workspace lists (`ws_{id}`), live call counters
//! are plain integer keys (`ws_{id}_calls_in_progress`). A counter that
//! would go negative is reset to zero with a one-hour expiry so stale
//! keys age out on their own.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::error::{InjectorError, InjectorResult};
use crate::traits::QueueStore;
use shared::QueuedLead;

const COUNTER_RESET_TTL_SECS: u64 = 3600;
const RATE_CACHE_TTL_SECS: u64 = 3600;

pub struct RedisQueueStore {
    manager: ConnectionManager,
}

impl RedisQueueStore {
    /// Connect and verify the server responds to PING.
    pub async fn connect(url: &str) -> InjectorResult<Self> {
        let client =
            redis::Client::open(url).map_err(|e| InjectorError::query("redis_open", e))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| InjectorError::query("redis_connect", e))?;

        let mut conn = manager.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| InjectorError::query("redis_ping", e))?;

        info!("connected to redis");
        Ok(Self { manager })
    }

    fn counter_key(workspace_id: &str) -> String {
        format!("ws_{}_calls_in_progress", workspace_id)
    }

    fn queue_key(workspace_id: &str) -> String {
        format!("ws_{}", workspace_id)
    }

    fn rate_key(campaign_id: &str) -> String {
        format!("campaign_{}_max_rate", campaign_id)
    }
}

#[async_trait::async_trait]
impl QueueStore for RedisQueueStore {
    async fn calls_in_progress(&self, workspace_id: &str) -> InjectorResult<u32> {
        let mut conn = self.manager.clone();
        let value: Option<i64> = conn
            .get(Self::counter_key(workspace_id))
            .await
            .map_err(|e| InjectorError::query("calls_in_progress", e))?;

        // A missing key means no live calls for this workspace.
        Ok(value.unwrap_or(0).max(0) as u32)
    }

    async fn increment_calls_in_progress(&self, workspace_id: &str) -> InjectorResult<u32> {
        let mut conn = self.manager.clone();
        let value: i64 = conn
            .incr(Self::counter_key(workspace_id), 1i64)
            .await
            .map_err(|e| InjectorError::query("increment_calls_in_progress", e))?;
        Ok(value.max(0) as u32)
    }

    async fn decrement_calls_in_progress(&self, workspace_id: &str) -> InjectorResult<u32> {
        let mut conn = self.manager.clone();
        let key = Self::counter_key(workspace_id);
        let value: i64 = conn
            .decr(&key, 1i64)
            .await
            .map_err(|e| InjectorError::query("decrement_calls_in_progress", e))?;

        if value <= 0 {
            // Floor at zero so a missed increment can never drive the
            // counter negative and inflate future capacity.
            let _: () = conn
                .set_ex(&key, 0i64, COUNTER_RESET_TTL_SECS)
                .await
                .map_err(|e| InjectorError::query("decrement_calls_in_progress", e))?;
            return Ok(0);
        }

        Ok(value as u32)
    }

    async fn queue_depth(&self, workspace_id: &str) -> InjectorResult<u32> {
        let mut conn = self.manager.clone();
        let depth: i64 = conn
            .llen(Self::queue_key(workspace_id))
            .await
            .map_err(|e| InjectorError::query("queue_depth", e))?;
        Ok(depth.max(0) as u32)
    }

    async fn enqueue(&self, workspace_id: &str, lead: QueuedLead) -> InjectorResult<()> {
        let payload = lead.to_wire()?;

        let mut conn = self.manager.clone();
        let _: i64 = conn
            .lpush(Self::queue_key(workspace_id), payload)
            .await
            .map_err(|e| InjectorError::query("enqueue", e))?;

        debug!(
            "queued lead {} for workspace {}",
            lead.lead_id, workspace_id
        );
        Ok(())
    }

    async fn dequeue(&self, workspace_id: &str) -> InjectorResult<Option<QueuedLead>> {
        let mut conn = self.manager.clone();
        let payload: Option<String> = conn
            .rpop(Self::queue_key(workspace_id), None)
            .await
            .map_err(|e| InjectorError::query("dequeue", e))?;

        match payload {
            Some(payload) => Ok(Some(QueuedLead::from_wire(&payload)?)),
            None => Ok(None),
        }
    }

    async fn cache_campaign_rate(&self, campaign_id: &str, rate: u32) -> InjectorResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .set_ex(Self::rate_key(campaign_id), rate as i64, RATE_CACHE_TTL_SECS)
            .await
            .map_err(|e| InjectorError::query("cache_campaign_rate", e))?;
        Ok(())
    }
}
