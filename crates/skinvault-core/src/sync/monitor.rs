//! Connectivity monitor: interval probes plus external hints

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use super::controller::ReconciliationController;
use crate::remote::RemoteAuthority;

const HINT_CAPACITY: usize = 16;

/// Connectivity change reported by the platform (network interface events,
/// browser online/offline, and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityHint {
    Up,
    Down,
}

/// Sender side of a monitor.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    hints: mpsc::Sender<ConnectivityHint>,
    shutdown: watch::Sender<bool>,
}

impl MonitorHandle {
    /// Deliver a hint. Dropped when the queue is full; queued hints are
    /// coalesced anyway.
    pub fn hint(&self, hint: ConnectivityHint) {
        if self.hints.try_send(hint).is_err() {
            tracing::debug!("Connectivity hint {hint:?} dropped");
        }
    }

    /// Stop the monitor loop.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

/// Polls the liveness probe on a fixed interval and reacts to hints.
///
/// Runs on the caller's task; [`ConnectivityMonitor::run`] returns once the
/// handle signals shutdown or is dropped.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    interval: Duration,
    hints: mpsc::Receiver<ConnectivityHint>,
    shutdown: watch::Receiver<bool>,
}

impl ConnectivityMonitor {
    pub fn new(interval: Duration) -> (Self, MonitorHandle) {
        let (hint_tx, hint_rx) = mpsc::channel(HINT_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        (
            Self {
                interval,
                hints: hint_rx,
                shutdown: shutdown_rx,
            },
            MonitorHandle {
                hints: hint_tx,
                shutdown: shutdown_tx,
            },
        )
    }

    pub async fn run<R: RemoteAuthority>(mut self, controller: &ReconciliationController<R>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut hints_open = true;

        tracing::debug!("Connectivity monitor started ({:?} interval)", self.interval);
        loop {
            tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                hint = self.hints.recv(), if hints_open => {
                    match hint {
                        Some(hint) => {
                            let latest = self.coalesce(hint);
                            Self::apply_hint(controller, latest).await;
                        }
                        None => hints_open = false,
                    }
                }
                _ = ticker.tick() => {
                    if let Err(error) = controller.probe().await {
                        tracing::warn!("Scheduled reconciliation failed: {error}");
                    }
                }
            }
        }
        tracing::debug!("Connectivity monitor stopped");
    }

    /// Collapse queued hints into the most recent one.
    fn coalesce(&mut self, mut latest: ConnectivityHint) -> ConnectivityHint {
        while let Ok(next) = self.hints.try_recv() {
            latest = next;
        }
        latest
    }

    async fn apply_hint<R: RemoteAuthority>(
        controller: &ReconciliationController<R>,
        hint: ConnectivityHint,
    ) {
        let result = match hint {
            ConnectivityHint::Up => controller.probe().await,
            ConnectivityHint::Down => controller.handle_probe(false).await,
        };
        if let Err(error) = result {
            tracing::warn!("Reconciliation after {hint:?} hint failed: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::InMemoryRemote;
    use crate::services::ReplicaService;
    use crate::state::ConnectivityState;

    const LONG: Duration = Duration::from_secs(3600);

    async fn controller() -> ReconciliationController<InMemoryRemote> {
        let replica = ReplicaService::open_in_memory().await.unwrap();
        ReconciliationController::new(replica, InMemoryRemote::new(), "user-1")
    }

    async fn run_for(
        monitor: ConnectivityMonitor,
        handle: &MonitorHandle,
        controller: &ReconciliationController<InMemoryRemote>,
    ) {
        let stop = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.shutdown();
        };
        tokio::join!(monitor.run(controller), stop);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn first_tick_probes_and_reconciles() {
        let controller = controller().await;
        let (monitor, handle) = ConnectivityMonitor::new(LONG);

        run_for(monitor, &handle, &controller).await;

        assert_eq!(controller.state(), ConnectivityState::Online);
        assert_eq!(controller.remote().probe_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn hint_bursts_coalesce_into_one_probe() {
        let controller = controller().await;
        let (monitor, handle) = ConnectivityMonitor::new(LONG);
        for _ in 0..5 {
            handle.hint(ConnectivityHint::Up);
        }

        run_for(monitor, &handle, &controller).await;

        // One probe for the burst, one for the first tick.
        assert_eq!(controller.remote().probe_calls(), 2);
        assert_eq!(controller.remote().pull_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn down_hint_goes_offline_without_probing() {
        let controller = controller().await;
        controller.handle_probe(true).await.unwrap();
        let (monitor, handle) = ConnectivityMonitor::new(LONG);

        let drive = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.hint(ConnectivityHint::Down);
            tokio::time::sleep(Duration::from_millis(30)).await;
            handle.shutdown();
        };
        tokio::join!(monitor.run(&controller), drive);

        assert_eq!(controller.state(), ConnectivityState::Offline);
        assert_eq!(controller.remote().probe_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dropped_handle_stops_monitor() {
        let controller = controller().await;
        let (monitor, handle) = ConnectivityMonitor::new(LONG);
        drop(handle);

        monitor.run(&controller).await;
    }
}
