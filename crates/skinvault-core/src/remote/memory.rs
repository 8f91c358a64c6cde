//! In-process remote authority used by controller tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use super::{RemoteAuthority, RemoteDraw, RemoteInventory, RemoteInventoryItem};
use crate::draw::{self, ScriptedSampler};
use crate::error::{Error, Result};
use crate::models::{CaseDetail, CaseSummary, OpId, PendingOperation, Skin};
use crate::util::now_millis;

#[derive(Debug, Clone)]
struct StoredItem {
    item: RemoteInventoryItem,
    updated_at: i64,
}

#[derive(Debug)]
struct RemoteState {
    reachable: bool,
    cases: BTreeMap<String, CaseDetail>,
    inventories: HashMap<String, Vec<StoredItem>>,
    applied: HashSet<OpId>,
    rejected_skins: HashSet<String>,
    commit_calls: usize,
    disconnect_after_commits: Option<usize>,
    fail_pulls: bool,
    fail_draws: bool,
    unauthorized_commits: usize,
    pull_gate: Option<Arc<Notify>>,
    pull_waiting: bool,
    partial_pull: Option<Vec<RemoteInventoryItem>>,
    pull_calls: usize,
    probe_calls: usize,
    sampler: ScriptedSampler,
}

/// Remote authority that keeps its inventory in memory.
///
/// Applies offline commits idempotently by op id, like the real server is
/// required to.
#[derive(Debug)]
pub(crate) struct InMemoryRemote {
    state: Mutex<RemoteState>,
}

impl InMemoryRemote {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(RemoteState {
                reachable: true,
                cases: BTreeMap::new(),
                inventories: HashMap::new(),
                applied: HashSet::new(),
                rejected_skins: HashSet::new(),
                commit_calls: 0,
                disconnect_after_commits: None,
                fail_pulls: false,
                fail_draws: false,
                unauthorized_commits: 0,
                pull_gate: None,
                pull_waiting: false,
                partial_pull: None,
                pull_calls: 0,
                probe_calls: 0,
                sampler: ScriptedSampler::new(vec![0.5]),
            }),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut RemoteState) -> T) -> T {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }

    pub(crate) fn add_case(&self, detail: CaseDetail) {
        self.with_state(|state| {
            state.cases.insert(detail.case.id.clone(), detail);
        });
    }

    pub(crate) fn set_reachable(&self, reachable: bool) {
        self.with_state(|state| state.reachable = reachable);
    }

    pub(crate) fn set_samples(&self, samples: Vec<f64>) {
        self.with_state(|state| state.sampler = ScriptedSampler::new(samples));
    }

    pub(crate) fn reject_skin(&self, skin_id: &str) {
        self.with_state(|state| {
            state.rejected_skins.insert(skin_id.to_string());
        });
    }

    /// Become unreachable once `commits` more offline commits have been accepted.
    pub(crate) fn disconnect_after_commits(&self, commits: usize) {
        self.with_state(|state| state.disconnect_after_commits = Some(commits));
    }

    pub(crate) fn fail_pulls(&self, fail: bool) {
        self.with_state(|state| state.fail_pulls = fail);
    }

    /// Fail remote draws as unreachable while everything else keeps working.
    pub(crate) fn fail_draws(&self, fail: bool) {
        self.with_state(|state| state.fail_draws = fail);
    }

    /// Answer the next `commits` offline commits with 401.
    pub(crate) fn reject_auth_for_commits(&self, commits: usize) {
        self.with_state(|state| state.unauthorized_commits = commits);
    }

    /// Park the next pull until `gate` is notified.
    pub(crate) fn hold_next_pull(&self, gate: Arc<Notify>) {
        self.with_state(|state| state.pull_gate = Some(gate));
    }

    /// Whether a held pull is currently parked.
    pub(crate) fn pull_waiting(&self) -> bool {
        self.with_state(|state| state.pull_waiting)
    }

    /// Answer the next pull with exactly these items.
    pub(crate) fn serve_partial_pull(&self, items: Vec<RemoteInventoryItem>) {
        self.with_state(|state| state.partial_pull = Some(items));
    }

    /// Put a skin directly into a user's remote inventory.
    pub(crate) fn grant(&self, user_id: &str, skin: &Skin, acquired_at: i64) {
        self.with_state(|state| {
            insert_item(state, user_id, item_from_skin(skin, acquired_at));
        });
    }

    pub(crate) fn skin_ids(&self, user_id: &str) -> Vec<String> {
        self.with_state(|state| {
            state
                .inventories
                .get(user_id)
                .map(|items| items.iter().map(|stored| stored.item.skin_id.clone()).collect())
                .unwrap_or_default()
        })
    }

    pub(crate) fn commit_calls(&self) -> usize {
        self.with_state(|state| state.commit_calls)
    }

    pub(crate) fn applied_count(&self) -> usize {
        self.with_state(|state| state.applied.len())
    }

    pub(crate) fn pull_calls(&self) -> usize {
        self.with_state(|state| state.pull_calls)
    }

    pub(crate) fn probe_calls(&self) -> usize {
        self.with_state(|state| state.probe_calls)
    }
}

fn ensure_reachable(state: &RemoteState) -> Result<()> {
    if state.reachable {
        Ok(())
    } else {
        Err(Error::NetworkUnavailable("connection refused".to_string()))
    }
}

fn item_from_skin(skin: &Skin, acquired_at: i64) -> RemoteInventoryItem {
    RemoteInventoryItem {
        skin_id: skin.id.clone(),
        name: skin.name.clone(),
        rarity: skin.rarity.clone(),
        image_ref: skin.image_ref.clone(),
        cost: skin.cost,
        case_id: Some(skin.case_id.clone()),
        acquired_at: Some(acquired_at),
    }
}

fn insert_item(state: &mut RemoteState, user_id: &str, item: RemoteInventoryItem) {
    let items = state.inventories.entry(user_id.to_string()).or_default();
    let stored = StoredItem {
        item,
        updated_at: now_millis(),
    };
    match items
        .iter_mut()
        .find(|existing| existing.item.skin_id == stored.item.skin_id)
    {
        Some(existing) => *existing = stored,
        None => items.push(stored),
    }
}

impl RemoteAuthority for InMemoryRemote {
    async fn liveness_probe(&self) -> Result<()> {
        self.with_state(|state| {
            state.probe_calls += 1;
            ensure_reachable(state)
        })
    }

    async fn submit_draw(&self, case_id: &str, user_id: &str) -> Result<RemoteDraw> {
        self.with_state(|state| {
            ensure_reachable(state)?;
            if state.fail_draws {
                return Err(Error::NetworkUnavailable("draw timed out".to_string()));
            }
            let detail = state
                .cases
                .get(case_id)
                .cloned()
                .ok_or_else(|| Error::RemoteRejected(format!("Case {case_id} not found")))?;
            let outcome = draw::resolve(&detail, user_id, &mut state.sampler, now_millis())?;
            insert_item(state, user_id, item_from_skin(&outcome.skin, outcome.timestamp));
            Ok(RemoteDraw {
                skin: outcome.skin,
                sample: outcome.sample,
                rarity: outcome.chosen_rarity,
            })
        })
    }

    async fn commit_offline_draw(&self, op: &PendingOperation) -> Result<()> {
        self.with_state(|state| {
            ensure_reachable(state)?;
            if let Some(remaining) = state.disconnect_after_commits {
                if remaining == 0 {
                    state.reachable = false;
                    return Err(Error::NetworkUnavailable("connection reset".to_string()));
                }
                state.disconnect_after_commits = Some(remaining - 1);
            }

            if state.unauthorized_commits > 0 {
                state.unauthorized_commits -= 1;
                return Err(Error::Unauthorized);
            }

            state.commit_calls += 1;
            if state.rejected_skins.contains(&op.skin.id) {
                return Err(Error::RemoteRejected(format!(
                    "Skin {} not found (400)",
                    op.skin.id
                )));
            }
            if state.applied.insert(op.op_id) {
                insert_item(state, &op.user_id, item_from_skin(&op.skin, op.created_at));
            }
            Ok(())
        })
    }

    async fn fetch_inventory(&self, user_id: &str, since: Option<i64>) -> Result<RemoteInventory> {
        let gate = self.with_state(|state| {
            let gate = state.pull_gate.take();
            state.pull_waiting = gate.is_some();
            gate
        });
        if let Some(gate) = gate {
            gate.notified().await;
            self.with_state(|state| state.pull_waiting = false);
        }

        self.with_state(|state| {
            ensure_reachable(state)?;
            state.pull_calls += 1;
            if state.fail_pulls {
                return Err(Error::RemoteRejected("inventory unavailable (500)".to_string()));
            }

            let all = state.inventories.get(user_id).cloned().unwrap_or_default();
            let total_count = all.len();
            let total_value = all.iter().map(|stored| stored.item.cost).sum();
            let items = match state.partial_pull.take() {
                Some(items) => items,
                None => all
                    .into_iter()
                    .filter(|stored| since.map_or(true, |since| stored.updated_at > since))
                    .map(|stored| stored.item)
                    .collect(),
            };

            Ok(RemoteInventory {
                total_count,
                total_value,
                items,
            })
        })
    }

    async fn fetch_cases(&self) -> Result<Vec<CaseSummary>> {
        self.with_state(|state| {
            ensure_reachable(state)?;
            Ok(state
                .cases
                .values()
                .map(|detail| detail.case.summary())
                .collect())
        })
    }

    async fn fetch_case(&self, case_id: &str) -> Result<CaseDetail> {
        self.with_state(|state| {
            ensure_reachable(state)?;
            state
                .cases
                .get(case_id)
                .cloned()
                .ok_or_else(|| Error::RemoteRejected(format!("Case {case_id} not found (404)")))
        })
    }
}
