//! Connectivity state machine and reconciliation passes

use tokio::sync::{broadcast, watch};

use super::merge::MergeReport;
use super::SyncEvent;
use crate::draw::{self, RandomSampler, SampleSource};
use crate::error::{Error, Result};
use crate::models::{
    DrawOrigin, DrawOutcome, InventoryEntry, InventorySnapshot, PendingOperation, SyncCursor,
    SyncStatus,
};
use crate::remote::RemoteAuthority;
use crate::services::ReplicaService;
use crate::state::ConnectivityState;
use crate::util::now_millis;

const EVENT_CAPACITY: usize = 64;

/// Counters of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileSummary {
    /// Operations acknowledged and removed from the log
    pub pushed: usize,
    /// Operations the remote refused
    pub rejected: usize,
    /// Operations still queued after the pass
    pub remaining: usize,
    /// Whether the push phase stopped before draining the log
    pub push_aborted: bool,
    /// Merge result; `None` when the pull was skipped or failed
    pub pull: Option<MergeReport>,
}

enum PushStop {
    Network(String),
    Unauthorized,
}

/// Reconciles one user's local replica with the remote authority.
///
/// Starts `Offline`. A successful probe moves to `Reconciling`, which pushes
/// the pending-operation log in order, pulls the remote inventory, and ends
/// `Online`. Any network failure on a remote call moves back to `Offline`.
pub struct ReconciliationController<R> {
    replica: ReplicaService,
    remote: R,
    user_id: String,
    state: watch::Sender<ConnectivityState>,
    events: broadcast::Sender<SyncEvent>,
    in_flight: tokio::sync::Mutex<()>,
    sampler: std::sync::Mutex<Box<dyn SampleSource + Send>>,
}

impl<R: RemoteAuthority> ReconciliationController<R> {
    pub fn new(replica: ReplicaService, remote: R, user_id: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ConnectivityState::Offline);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            replica,
            remote,
            user_id: user_id.into(),
            state,
            events,
            in_flight: tokio::sync::Mutex::new(()),
            sampler: std::sync::Mutex::new(Box::new(RandomSampler::from_entropy())),
        }
    }

    /// Replace the sample source used for local draws.
    #[must_use]
    pub fn with_sampler(self, sampler: impl SampleSource + Send + 'static) -> Self {
        Self {
            sampler: std::sync::Mutex::new(Box::new(sampler)),
            ..self
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub const fn replica(&self) -> &ReplicaService {
        &self.replica
    }

    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub async fn last_sync_timestamps(&self) -> Result<SyncCursor> {
        self.replica.load_cursor().await
    }

    pub async fn inventory(&self) -> Result<InventorySnapshot> {
        self.replica.inventory(&self.user_id).await
    }

    pub async fn pending_operations(&self) -> Result<Vec<PendingOperation>> {
        self.replica.pending_operations(&self.user_id).await
    }

    /// Probe the remote and react to the result.
    pub async fn probe(&self) -> Result<Option<ReconcileSummary>> {
        let reachable = match self.remote.liveness_probe().await {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!("Liveness probe failed: {error}");
                false
            }
        };
        self.handle_probe(reachable).await
    }

    /// Apply a probe result.
    ///
    /// A successful probe starts a reconciliation pass while `Offline`, or
    /// while `Online` with operations still queued (a pass that ended on an
    /// authorization failure). A failed probe while `Online` goes `Offline`.
    /// Everything else (including probes during a pass) is a no-op.
    pub async fn handle_probe(&self, reachable: bool) -> Result<Option<ReconcileSummary>> {
        match (self.state(), reachable) {
            (ConnectivityState::Offline, true) => self.reconcile_now().await,
            (ConnectivityState::Online, true) => {
                if self.replica.pending_count(&self.user_id).await? > 0 {
                    self.reconcile_now().await
                } else {
                    Ok(None)
                }
            }
            (ConnectivityState::Online, false) => {
                self.transition(ConnectivityState::Offline);
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Record a network failure seen outside a reconciliation pass.
    pub fn observe_network_failure(&self) {
        if self.state() == ConnectivityState::Online {
            self.transition(ConnectivityState::Offline);
        }
    }

    /// Run one reconciliation pass now.
    ///
    /// Returns `None` without doing anything when a pass is already in flight.
    pub async fn reconcile_now(&self) -> Result<Option<ReconcileSummary>> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("Reconciliation already in flight; ignoring trigger");
            return Ok(None);
        };

        self.transition(ConnectivityState::Reconciling);
        match self.run_pass().await {
            Ok((summary, next_state)) => {
                self.transition(next_state);
                Ok(Some(summary))
            }
            Err(error) => {
                tracing::warn!("Reconciliation pass failed: {error}");
                self.transition(if error.is_network() {
                    ConnectivityState::Offline
                } else {
                    ConnectivityState::Online
                });
                Err(error)
            }
        }
    }

    async fn run_pass(&self) -> Result<(ReconcileSummary, ConnectivityState)> {
        let mut summary = ReconcileSummary::default();
        let mut cursor = self.replica.load_cursor().await?;

        let stop = self.push(&mut summary).await?;
        if summary.pushed > 0 {
            cursor.last_push_at = Some(now_millis());
        }

        summary.remaining = self.replica.refresh_pending_status(&self.user_id).await?.len();

        match stop {
            Some(PushStop::Network(reason)) => {
                self.emit(SyncEvent::PushAborted {
                    remaining: summary.remaining,
                    reason,
                });
                self.replica.save_cursor(&cursor).await?;
                return Ok((summary, ConnectivityState::Offline));
            }
            Some(PushStop::Unauthorized) => {
                self.emit(SyncEvent::PushAborted {
                    remaining: summary.remaining,
                    reason: Error::Unauthorized.to_string(),
                });
                self.replica.save_cursor(&cursor).await?;
                return Ok((summary, ConnectivityState::Online));
            }
            None => {}
        }

        let next_state = self.pull(&mut summary, &mut cursor).await?;
        self.replica.save_cursor(&cursor).await?;
        tracing::debug!(
            "Reconciled {}: pushed {}, rejected {}, remaining {}",
            self.user_id,
            summary.pushed,
            summary.rejected,
            summary.remaining
        );
        Ok((summary, next_state))
    }

    /// Drain the log oldest first.
    async fn push(&self, summary: &mut ReconcileSummary) -> Result<Option<PushStop>> {
        let operations = self.replica.pending_operations(&self.user_id).await?;
        let mut rejected = Vec::new();
        let mut stop = None;

        for op in operations {
            match self.remote.commit_offline_draw(&op).await {
                Ok(()) => {
                    self.replica.remove_pending(&op.op_id).await?;
                    summary.pushed += 1;
                    self.emit(SyncEvent::OperationCommitted {
                        op_id: op.op_id,
                        skin_id: op.skin.id.clone(),
                    });
                }
                Err(error) if error.is_retryable() => {
                    tracing::warn!("Push of {} interrupted, keeping it queued: {error}", op.op_id);
                    self.replica
                        .record_pending_failure(&op.op_id, &error.to_string())
                        .await?;
                    summary.push_aborted = true;
                    stop = Some(if error.is_network() {
                        PushStop::Network(error.to_string())
                    } else {
                        PushStop::Unauthorized
                    });
                    break;
                }
                Err(error) => {
                    tracing::warn!(
                        "Remote rejected offline draw {} ({}): {error}",
                        op.op_id,
                        op.skin.name
                    );
                    self.replica.remove_pending(&op.op_id).await?;
                    summary.rejected += 1;
                    self.emit(SyncEvent::OperationRejected {
                        op_id: op.op_id,
                        skin_id: op.skin.id.clone(),
                        reason: error.to_string(),
                    });
                    rejected.push(op);
                }
            }
        }

        if !rejected.is_empty() {
            self.replica
                .discard_rejected(&self.user_id, &rejected)
                .await?;
        }
        Ok(stop)
    }

    async fn pull(
        &self,
        summary: &mut ReconcileSummary,
        cursor: &mut SyncCursor,
    ) -> Result<ConnectivityState> {
        let pull_started = now_millis();
        match self
            .remote
            .fetch_inventory(&self.user_id, cursor.last_pull_at)
            .await
        {
            Ok(inventory) => {
                let (merged, report) = self
                    .replica
                    .merge_pull(&self.user_id, &inventory.items, pull_started)
                    .await?;

                if report.changed() {
                    tracing::info!(
                        "Pulled {} new and {} updated skins for {}",
                        report.added,
                        report.updated,
                        self.user_id
                    );
                }
                if inventory.total_count > merged.total_count {
                    tracing::debug!(
                        "Remote reports {} skins, local replica holds {}",
                        inventory.total_count,
                        merged.total_count
                    );
                }
                cursor.last_pull_at = Some(pull_started);
                summary.pull = Some(report);
                self.emit(SyncEvent::PullCompleted { report });
                Ok(ConnectivityState::Online)
            }
            Err(error) => {
                tracing::warn!("Pull for {} failed: {error}", self.user_id);
                self.emit(SyncEvent::PullFailed {
                    reason: error.to_string(),
                });
                // The pass still completes; a dead link is caught right after.
                self.transition(ConnectivityState::Online);
                Ok(if error.is_network() {
                    ConnectivityState::Offline
                } else {
                    ConnectivityState::Online
                })
            }
        }
    }

    /// Open a case.
    ///
    /// Unless `Offline`, the remote draws and commits; on a network failure
    /// (or while `Offline`) the draw resolves locally from the cached catalog
    /// and is queued as a pending operation. Validation errors leave all state
    /// untouched.
    pub async fn open_case(&self, case_id: &str) -> Result<DrawOutcome> {
        if self.state() != ConnectivityState::Offline {
            match self.remote.submit_draw(case_id, &self.user_id).await {
                Ok(remote_draw) => {
                    let timestamp = now_millis();
                    let entry =
                        InventoryEntry::from_skin(&remote_draw.skin, timestamp, SyncStatus::Synced);
                    self.replica.record_synced_entry(&self.user_id, entry).await?;
                    return Ok(DrawOutcome {
                        case_id: case_id.to_string(),
                        user_id: self.user_id.clone(),
                        sample: remote_draw.sample,
                        skin_sample: None,
                        chosen_rarity: remote_draw.rarity,
                        chosen_skin_id: remote_draw.skin.id.clone(),
                        skin: remote_draw.skin,
                        timestamp,
                        origin: DrawOrigin::Remote,
                        op_id: None,
                    });
                }
                Err(error) if error.is_network() => {
                    tracing::warn!("Remote draw failed, falling back to local draw: {error}");
                    self.observe_network_failure();
                }
                Err(error) => return Err(error),
            }
        }

        self.open_case_locally(case_id).await
    }

    async fn open_case_locally(&self, case_id: &str) -> Result<DrawOutcome> {
        let detail = self
            .replica
            .case_detail(case_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Case {case_id} is not cached")))?;

        let mut outcome = {
            let mut sampler = self
                .sampler
                .lock()
                .map_err(|_| Error::InvalidInput("sample source poisoned".to_string()))?;
            draw::resolve(&detail, &self.user_id, &mut **sampler, now_millis())?
        };

        let op = PendingOperation::new(
            self.user_id.as_str(),
            case_id,
            outcome.skin.clone(),
            outcome.timestamp,
        );
        let entry =
            InventoryEntry::from_skin(&outcome.skin, outcome.timestamp, SyncStatus::Pending);
        self.replica.record_offline_draw(&op, entry).await?;
        tracing::info!(
            "Drew {} ({}) offline from case {case_id}; queued {}",
            outcome.skin.name,
            outcome.chosen_rarity,
            op.op_id
        );

        outcome.op_id = Some(op.op_id);
        Ok(outcome)
    }

    /// Fetch the case list and every case detail into the catalog cache.
    pub async fn refresh_catalog(&self) -> Result<usize> {
        let summaries = self.remote_call(self.remote.fetch_cases().await)?;
        for summary in &summaries {
            let detail = self.remote_call(self.remote.fetch_case(&summary.id).await)?;
            self.replica.cache_case_detail(&detail).await?;
        }

        tracing::info!("Cached {} cases", summaries.len());
        self.emit(SyncEvent::CatalogRefreshed {
            cases: summaries.len(),
        });
        Ok(summaries.len())
    }

    fn remote_call<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(error) = &result {
            if error.is_network() {
                self.observe_network_failure();
            }
        }
        result
    }

    fn transition(&self, to: ConnectivityState) {
        let mut from = to;
        let changed = self.state.send_if_modified(|state| {
            if *state == to {
                false
            } else {
                from = *state;
                *state = to;
                true
            }
        });
        if changed {
            tracing::info!("Connectivity {from} -> {to}");
            self.emit(SyncEvent::StateChanged { from, to });
        }
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
