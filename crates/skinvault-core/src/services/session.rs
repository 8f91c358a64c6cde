//! Per-user sync session: the context shared by every interface.

use tokio::sync::{broadcast, watch, Mutex};

use super::ReplicaService;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{DrawOutcome, InventorySnapshot, PendingOperation, SyncCursor};
use crate::remote::RemoteAuthority;
use crate::state::ConnectivityState;
use crate::sync::{
    ConnectivityHint, ConnectivityMonitor, MonitorHandle, ReconcileSummary,
    ReconciliationController, SyncEvent,
};

/// Session state created at login and torn down at logout.
pub struct SyncSession<R> {
    controller: ReconciliationController<R>,
    monitor: Mutex<Option<ConnectivityMonitor>>,
    handle: MonitorHandle,
}

impl<R: RemoteAuthority> SyncSession<R> {
    pub fn start(
        replica: ReplicaService,
        remote: R,
        user_id: impl Into<String>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user id must not be empty".to_string()));
        }
        Ok(Self::from_controller(
            ReconciliationController::new(replica, remote, user_id),
            config,
        ))
    }

    pub fn from_controller(controller: ReconciliationController<R>, config: &ClientConfig) -> Self {
        let (monitor, handle) = ConnectivityMonitor::new(config.probe_interval());
        tracing::debug!("Started sync session for {}", controller.user_id());
        Self {
            controller,
            monitor: Mutex::new(Some(monitor)),
            handle,
        }
    }

    pub const fn controller(&self) -> &ReconciliationController<R> {
        &self.controller
    }

    /// Run the connectivity monitor until [`SyncSession::teardown`].
    ///
    /// The monitor runs at most once per session.
    pub async fn run_monitor(&self) -> Result<()> {
        let monitor = self
            .monitor
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::InvalidInput("connectivity monitor already ran".to_string()))?;
        monitor.run(&self.controller).await;
        Ok(())
    }

    pub fn hint(&self, hint: ConnectivityHint) {
        self.handle.hint(hint);
    }

    pub async fn open_case(&self, case_id: &str) -> Result<DrawOutcome> {
        self.controller.open_case(case_id).await
    }

    pub async fn inventory_snapshot(&self) -> Result<InventorySnapshot> {
        self.controller.inventory().await
    }

    pub fn connectivity_state(&self) -> ConnectivityState {
        self.controller.state()
    }

    pub fn watch_connectivity(&self) -> watch::Receiver<ConnectivityState> {
        self.controller.subscribe_state()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.controller.subscribe_events()
    }

    pub async fn last_sync_timestamps(&self) -> Result<SyncCursor> {
        self.controller.last_sync_timestamps().await
    }

    pub async fn reconcile_now(&self) -> Result<Option<ReconcileSummary>> {
        self.controller.reconcile_now().await
    }

    pub async fn refresh_catalog(&self) -> Result<usize> {
        self.controller.refresh_catalog().await
    }

    pub async fn pending_operations(&self) -> Result<Vec<PendingOperation>> {
        self.controller.pending_operations().await
    }

    /// Stop the monitor. Persisted state stays on disk for the next session.
    pub fn teardown(&self) {
        tracing::debug!("Tearing down sync session for {}", self.controller.user_id());
        self.handle.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::remote::memory::InMemoryRemote;

    async fn session() -> SyncSession<InMemoryRemote> {
        let replica = ReplicaService::open_in_memory().await.unwrap();
        SyncSession::start(replica, InMemoryRemote::new(), "user-1", &ClientConfig::default())
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_rejects_blank_user() {
        let replica = ReplicaService::open_in_memory().await.unwrap();
        let result =
            SyncSession::start(replica, InMemoryRemote::new(), "  ", &ClientConfig::default());
        assert!(result.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn teardown_stops_monitor_and_state_is_observable() {
        let session = session().await;
        let mut states = session.watch_connectivity();

        let drive = async {
            states.wait_for(|state| *state == ConnectivityState::Online).await.unwrap();
            session.teardown();
        };
        let (ran, ()) = tokio::join!(session.run_monitor(), drive);

        ran.unwrap();
        assert_eq!(session.connectivity_state(), ConnectivityState::Online);
        assert!(session.last_sync_timestamps().await.unwrap().last_pull_at.is_some());
        assert!(session.run_monitor().await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn hints_reach_the_monitor() {
        let session = session().await;
        session.controller().remote().set_reachable(false);
        let drive = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            session.controller().remote().set_reachable(true);
            session.hint(ConnectivityHint::Up);
            tokio::time::sleep(Duration::from_millis(30)).await;
            session.teardown();
        };
        let (ran, ()) = tokio::join!(session.run_monitor(), drive);

        ran.unwrap();
        assert_eq!(session.connectivity_state(), ConnectivityState::Online);
    }
}
