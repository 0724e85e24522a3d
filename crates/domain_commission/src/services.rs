//! Commission domain services
//!
//! `CommissionService` sits between the desk API and the commissions backend.
//! It fetches snapshots through a [`CommissionPort`], runs them through
//! intake once, and keeps the parsed result per query until it expires or is
//! invalidated. Classification is re-run on every read; it is pure and cheap,
//! and `now` moves between reads.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use core_kernel::{AgentId, CommissionId, HealthCheckResult, OperationMetadata, Timezone};

use crate::batch::{prepare_mark_paid, BatchPlan, MarkPaidReceipt};
use crate::classifier::{classify, Classification};
use crate::commission::Commission;
use crate::error::CommissionError;
use crate::intake::{parse_commissions, IntakeMode, RejectedRecord};
use crate::ports::{CommissionPort, CommissionQuery};

/// Parsed commission data for one query
#[derive(Debug, Clone)]
pub struct CommissionSnapshot {
    pub query: CommissionQuery,
    pub commissions: Vec<Commission>,
    pub rejected: Vec<RejectedRecord>,
    pub coerced_amounts: usize,
    pub negative_amounts: usize,
    pub fetched_at: DateTime<Utc>,
}

impl CommissionSnapshot {
    /// Classifies the snapshot at `now`
    pub fn classify(&self, now: DateTime<Utc>, tz: &Timezone) -> Classification<'_> {
        classify(&self.commissions, now, tz)
    }

    /// Returns true if any commission in the snapshot belongs to `agent_id`
    pub fn involves_agent(&self, agent_id: &AgentId) -> bool {
        self.commissions.iter().any(|c| c.agent_id == *agent_id)
    }
}

#[derive(Debug)]
struct CachedSnapshot {
    snapshot: Arc<CommissionSnapshot>,
    cached_at: Instant,
}

/// Settings for [`CommissionService`]
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// How long a fetched snapshot is served before re-fetching
    pub cache_ttl: Duration,
    /// Upper bound on cached queries; the oldest snapshot is evicted first
    pub max_cached_queries: usize,
    pub intake_mode: IntakeMode,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            max_cached_queries: 256,
            intake_mode: IntakeMode::Lenient,
        }
    }
}

/// Result of a submitted batch
#[derive(Debug, Clone)]
pub struct MarkPaidOutcome {
    pub plan: BatchPlan,
    pub receipt: MarkPaidReceipt,
}

/// Service for reading and paying out commissions
pub struct CommissionService {
    port: Arc<dyn CommissionPort>,
    settings: ServiceSettings,
    cache: RwLock<HashMap<CommissionQuery, CachedSnapshot>>,
}

impl CommissionService {
    /// Creates a new commission service
    pub fn new(port: Arc<dyn CommissionPort>, settings: ServiceSettings) -> Self {
        Self {
            port,
            settings,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the snapshot for `query`, fetching it when not cached
    ///
    /// # Errors
    ///
    /// Returns `CommissionError::Port` when the backend call fails and
    /// `CommissionError::MalformedPayload` in strict intake mode.
    pub async fn snapshot(
        &self,
        query: &CommissionQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Arc<CommissionSnapshot>, CommissionError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(query) {
                if cached.cached_at.elapsed() < self.settings.cache_ttl {
                    debug!(?query, "Serving cached commission snapshot");
                    return Ok(Arc::clone(&cached.snapshot));
                }
            }
        }
        self.refresh(query, metadata).await
    }

    /// Fetches `query` from the backend and replaces any cached snapshot
    pub async fn refresh(
        &self,
        query: &CommissionQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Arc<CommissionSnapshot>, CommissionError> {
        let payload = self.port.fetch_commissions(query, metadata).await?;
        let report = parse_commissions(&payload, self.settings.intake_mode)?;

        if !report.rejected.is_empty() {
            warn!(rejected = report.rejected.len(), ?query, "Commission snapshot had unusable records");
        }

        let snapshot = Arc::new(CommissionSnapshot {
            query: query.clone(),
            commissions: report.commissions,
            rejected: report.rejected,
            coerced_amounts: report.coerced_amounts,
            negative_amounts: report.negative_amounts,
            fetched_at: Utc::now(),
        });

        info!(
            commissions = snapshot.commissions.len(),
            start = %query.date_range.start,
            end = %query.date_range.end,
            agent_id = query.agent_id.as_ref().map(|a| a.as_str()).unwrap_or("all"),
            "Fetched commission snapshot"
        );

        self.store(query, Arc::clone(&snapshot)).await;

        Ok(snapshot)
    }

    /// Caches `snapshot`, first dropping expired entries and then the oldest
    /// ones until there is room
    async fn store(&self, query: &CommissionQuery, snapshot: Arc<CommissionSnapshot>) {
        let ttl = self.settings.cache_ttl;
        let mut cache = self.cache.write().await;
        cache.retain(|_, cached| cached.cached_at.elapsed() < ttl);

        if !cache.contains_key(query) {
            while !cache.is_empty() && cache.len() >= self.settings.max_cached_queries {
                let oldest = cache
                    .iter()
                    .min_by_key(|(_, cached)| cached.cached_at)
                    .map(|(q, _)| q.clone());
                let Some(oldest) = oldest else { break };
                debug!(query = ?oldest, "Evicting oldest commission snapshot");
                cache.remove(&oldest);
            }
        }

        cache.insert(
            query.clone(),
            CachedSnapshot {
                snapshot,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drops every cached snapshot
    pub async fn invalidate_all(&self) -> usize {
        let mut cache = self.cache.write().await;
        let dropped = cache.len();
        cache.clear();
        info!(dropped, "Invalidated all commission snapshots");
        dropped
    }

    /// Drops the cached snapshots that may contain `agent_id`'s commissions
    ///
    /// That is the agent's own queries plus any unscoped query whose snapshot
    /// holds one of the agent's rows.
    pub async fn invalidate_agent(&self, agent_id: &AgentId) -> usize {
        let mut cache = self.cache.write().await;
        let before = cache.len();
        cache.retain(|query, cached| match &query.agent_id {
            Some(scoped) => scoped != agent_id,
            None => !cached.snapshot.involves_agent(agent_id),
        });
        let dropped = before - cache.len();
        info!(agent_id = %agent_id, dropped, "Invalidated commission snapshots for agent");
        dropped
    }

    /// Number of cached snapshots, including expired ones not yet evicted
    pub async fn cached_queries(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Prepares a batch against the snapshot for `query` without submitting
    pub async fn preview_mark_paid(
        &self,
        query: &CommissionQuery,
        selected_ids: &[CommissionId],
        payment_date: NaiveDate,
        now: DateTime<Utc>,
        metadata: Option<OperationMetadata>,
    ) -> Result<BatchPlan, CommissionError> {
        let snapshot = self.snapshot(query, metadata).await?;
        prepare_mark_paid(&snapshot.commissions, selected_ids, payment_date, now)
    }

    /// Prepares and submits a batch mark-as-paid
    ///
    /// On success the cached snapshots of every agent in the batch are
    /// invalidated so the next read reflects the backend's state. The same
    /// happens on a transient failure, since the backend may have applied
    /// the batch before the connection dropped. The submission itself is
    /// never retried here.
    pub async fn mark_paid(
        &self,
        query: &CommissionQuery,
        selected_ids: &[CommissionId],
        payment_date: NaiveDate,
        now: DateTime<Utc>,
        metadata: Option<OperationMetadata>,
    ) -> Result<MarkPaidOutcome, CommissionError> {
        let snapshot = self.snapshot(query, metadata.clone()).await?;
        let plan = prepare_mark_paid(&snapshot.commissions, selected_ids, payment_date, now)?;

        let receipt = match self.port.mark_paid(&plan.request, metadata).await {
            Ok(receipt) => receipt,
            Err(e) => {
                let err = CommissionError::from(e);
                if err.is_transient() {
                    warn!(error = %err, "Batch outcome unknown; dropping affected snapshots");
                    self.forget_batch(query, &snapshot, &plan).await;
                }
                return Err(err);
            }
        };

        self.forget_batch(query, &snapshot, &plan).await;

        info!(
            submitted = plan.request.commission_ids.len(),
            updated = ?receipt.updated,
            total = %plan.total,
            "Batch marked as paid"
        );

        Ok(MarkPaidOutcome { plan, receipt })
    }

    async fn forget_batch(&self, query: &CommissionQuery, snapshot: &CommissionSnapshot, plan: &BatchPlan) {
        let submitted: BTreeSet<&str> = plan.request.commission_ids.iter().map(CommissionId::as_str).collect();
        let agents: BTreeSet<&AgentId> = snapshot
            .commissions
            .iter()
            .filter(|c| submitted.contains(c.id.as_str()))
            .map(|c| &c.agent_id)
            .collect();
        for agent_id in agents {
            self.invalidate_agent(agent_id).await;
        }
        // the submitting query may be unscoped and hold no other rows
        self.cache.write().await.remove(query);
    }

    /// Reports the backend adapter's health
    pub async fn health_check(&self) -> HealthCheckResult {
        self.port.health_check().await
    }
}
