//! Top-level registration loop
//!
//! Consumes configuration snapshots in order. Each snapshot supersedes the
//! previous one: the live attempt is canceled and its heartbeat stopped before
//! the new snapshot is dispatched (or withdrawn, when empty).

use nfreg_core::ConfigurationSnapshot;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::attempt::RegistrationAttempt;
use super::heartbeat::HeartbeatScheduler;
use super::state::{ActiveAttempt, RegistrationMonitor, RegistrationState, SharedLifecycle};
use super::timer::Scheduler;
use super::RegistrationSettings;
use crate::client::RepositoryClient;

/// Drives registration, heartbeating and deregistration from a snapshot stream
pub struct RegistrationCoordinator {
    heartbeat: HeartbeatScheduler,
    lifecycle: SharedLifecycle,
    /// Parent of every attempt token; canceled on shutdown
    root: CancellationToken,
    attempts: TaskTracker,
}

impl RegistrationCoordinator {
    #[must_use]
    pub fn new(
        client: Arc<dyn RepositoryClient>,
        scheduler: Arc<dyn Scheduler>,
        settings: RegistrationSettings,
    ) -> Self {
        let lifecycle = SharedLifecycle::default();
        let root = CancellationToken::new();
        let heartbeat = HeartbeatScheduler::new(
            client,
            scheduler,
            lifecycle.clone(),
            settings,
            root.clone(),
        );

        Self {
            heartbeat,
            lifecycle,
            root,
            attempts: TaskTracker::new(),
        }
    }

    /// Observer for state and keep-alive status
    #[must_use]
    pub fn monitor(&self) -> RegistrationMonitor {
        RegistrationMonitor::new(self.lifecycle.clone())
    }

    /// Run until `shutdown` is canceled or the snapshot channel closes
    ///
    /// Either way every attempt is canceled and the keep-alive timer stopped.
    /// Shutdown alone does not deregister; send an empty snapshot first for
    /// that.
    pub async fn run(
        self,
        shutdown: CancellationToken,
        mut snapshots: mpsc::Receiver<ConfigurationSnapshot>,
    ) {
        info!("NF registration service started");

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!("NF registration service shutting down");
                    break;
                }
                received = snapshots.recv() => match received {
                    Some(snapshot) => self.apply(snapshot, &shutdown).await,
                    None => {
                        info!("configuration channel closed, stopping NF registration service");
                        break;
                    }
                }
            }
        }

        self.stop().await;
    }

    /// Supersede whatever is live, then dispatch or withdraw `snapshot`
    async fn apply(&self, snapshot: ConfigurationSnapshot, shutdown: &CancellationToken) {
        debug!(plmns = %snapshot, "received new served PLMN configuration");

        {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.supersede();

            if !snapshot.is_empty() {
                let token = self.root.child_token();
                lifecycle.active = Some(ActiveAttempt {
                    token: token.clone(),
                    snapshot: snapshot.clone(),
                });
                lifecycle.state = RegistrationState::Registering;

                let attempt = RegistrationAttempt::new(self.heartbeat.clone(), token, snapshot);
                self.attempts.spawn(attempt.run());
                return;
            }

            lifecycle.state = RegistrationState::Deregistering;
        }

        self.deregister(shutdown).await;
    }

    /// Best-effort withdrawal: reported on failure, never retried
    async fn deregister(&self, shutdown: &CancellationToken) {
        info!("served PLMN set is empty, deregistering from NRF");

        let result = tokio::select! {
            biased;
            () = shutdown.cancelled() => None,
            result = self.heartbeat.client().deregister() => Some(result),
        };

        match result {
            Some(Ok(())) => info!("NF deregistered from NRF"),
            Some(Err(e)) => error!(error = %e, "NRF deregistration failed"),
            None => warn!("NRF deregistration interrupted by shutdown"),
        }

        self.lifecycle.lock().state = RegistrationState::Idle;
    }

    async fn stop(self) {
        self.root.cancel();
        {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.supersede();
            lifecycle.state = RegistrationState::Idle;
        }

        self.attempts.close();
        self.attempts.wait().await;
        info!("NF registration service stopped");
    }
}
