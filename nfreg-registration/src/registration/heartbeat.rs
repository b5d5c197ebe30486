//! Keep-alive scheduling
//!
//! Every heartbeat session is bound to the cancellation token of the attempt
//! that registered it. Superseding that attempt therefore also silences any
//! Update already in flight for it.

use futures::FutureExt;
use nfreg_core::{ConfigurationSnapshot, PatchItem};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::attempt::RegistrationAttempt;
use super::state::{ActiveAttempt, RegistrationState, SharedLifecycle};
use super::timer::Scheduler;
use super::RegistrationSettings;
use crate::client::RepositoryClient;

/// Owner of the keep-alive timer
#[derive(Clone)]
pub struct HeartbeatScheduler {
    client: Arc<dyn RepositoryClient>,
    scheduler: Arc<dyn Scheduler>,
    lifecycle: SharedLifecycle,
    settings: RegistrationSettings,
    /// Parent of every attempt token minted for re-registration
    root: CancellationToken,
}

impl HeartbeatScheduler {
    pub(crate) fn new(
        client: Arc<dyn RepositoryClient>,
        scheduler: Arc<dyn Scheduler>,
        lifecycle: SharedLifecycle,
        settings: RegistrationSettings,
        root: CancellationToken,
    ) -> Self {
        Self {
            client,
            scheduler,
            lifecycle,
            settings,
            root,
        }
    }

    pub(crate) fn client(&self) -> &Arc<dyn RepositoryClient> {
        &self.client
    }

    pub(crate) const fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    /// Delay before the next firing
    ///
    /// The advertised value wins whenever it is positive, whether it is
    /// shorter or longer than the default.
    #[must_use]
    pub fn keep_alive_duration(&self, heartbeat_secs: i32) -> Duration {
        u64::try_from(heartbeat_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .map_or(self.settings.default_heartbeat, Duration::from_secs)
    }

    /// Arm the keep-alive timer for the session owned by `session`
    ///
    /// Replaces (and stops) any timer already armed. Returns `false` without
    /// scheduling anything when `session` has been canceled, so a stale
    /// success can never resurrect a superseded snapshot.
    pub fn start(
        &self,
        heartbeat_secs: i32,
        snapshot: ConfigurationSnapshot,
        session: &CancellationToken,
    ) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if session.is_cancelled() {
            return false;
        }

        let after = self.keep_alive_duration(heartbeat_secs);
        let firing = self.clone().fire(snapshot, session.clone()).boxed();
        let handle = self.scheduler.schedule(after, firing);

        if let Some(previous) = lifecycle.keep_alive.replace(handle) {
            previous.stop();
        }
        lifecycle.state = RegistrationState::Heartbeating;

        debug!(interval = ?after, "NRF heartbeat scheduled");
        true
    }

    /// Send one liveness update and decide what happens next
    ///
    /// Success reschedules with the interval from the fresh profile. Failure
    /// hands liveness back to a new registration attempt, which runs on this
    /// task until it registers again or is superseded.
    pub async fn fire(self, snapshot: ConfigurationSnapshot, session: CancellationToken) {
        if session.is_cancelled() {
            return;
        }

        let patch = PatchItem::heartbeat(&snapshot);
        let result = tokio::select! {
            biased;
            () = session.cancelled() => {
                debug!("heartbeat superseded while update was in flight");
                return;
            }
            result = self.client.update(&patch) => result,
        };

        match result {
            Ok(profile) => {
                if !self.start(profile.heartbeat_interval(), snapshot, &session) {
                    debug!("discarding heartbeat result for superseded registration");
                }
            }
            Err(e) => {
                warn!(error = %e, "NRF heartbeat failed, re-registering");
                let Some(token) = self.demote(&session, &snapshot) else {
                    return;
                };
                RegistrationAttempt::new(self, token, snapshot).run().await;
            }
        }
    }

    /// Stop the keep-alive timer; no-op when none is armed
    pub fn stop(&self) {
        self.lifecycle.lock().stop_keep_alive();
    }

    /// Whether a firing is currently scheduled
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.lifecycle.lock().keep_alive.is_some()
    }

    /// Close a failed heartbeat session and install a fresh attempt for it
    fn demote(
        &self,
        session: &CancellationToken,
        snapshot: &ConfigurationSnapshot,
    ) -> Option<CancellationToken> {
        let mut lifecycle = self.lifecycle.lock();
        if session.is_cancelled() {
            return None;
        }

        session.cancel();
        lifecycle.stop_keep_alive();

        let token = self.root.child_token();
        lifecycle.active = Some(ActiveAttempt {
            token: token.clone(),
            snapshot: snapshot.clone(),
        });
        lifecycle.state = RegistrationState::Registering;

        info!(plmns = %snapshot, "liveness returned to registration retry loop");
        Some(token)
    }
}
