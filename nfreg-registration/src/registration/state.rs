//! Shared lifecycle state
//!
//! The coordinator loop and heartbeat firings both mutate the current attempt
//! and the keep-alive handle. All of it lives behind one mutex so that
//! "cancel + stop" on one side and "check token + arm timer" on the other are
//! never interleaved.

use nfreg_core::ConfigurationSnapshot;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::timer::TimerHandle;

/// Where the registration lifecycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    #[default]
    Idle,
    Registering,
    Heartbeating,
    Deregistering,
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Registering => "registering",
            Self::Heartbeating => "heartbeating",
            Self::Deregistering => "deregistering",
        };
        f.write_str(name)
    }
}

/// The one live registration task and the snapshot it serves
#[derive(Debug, Clone)]
pub(crate) struct ActiveAttempt {
    pub(crate) token: CancellationToken,
    pub(crate) snapshot: ConfigurationSnapshot,
}

#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    pub(crate) state: RegistrationState,
    pub(crate) active: Option<ActiveAttempt>,
    pub(crate) keep_alive: Option<TimerHandle>,
}

impl Lifecycle {
    /// Cancel the current attempt (if any) and stop its heartbeat
    pub(crate) fn supersede(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
        }
        self.stop_keep_alive();
    }

    pub(crate) fn stop_keep_alive(&mut self) {
        if let Some(timer) = self.keep_alive.take() {
            timer.stop();
        }
    }
}

pub(crate) type SharedLifecycle = Arc<Mutex<Lifecycle>>;

/// Point-in-time view of the lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationStatus {
    pub state: RegistrationState,
    /// Whether a heartbeat firing is currently scheduled
    pub keep_alive_armed: bool,
    /// Snapshot of the live attempt, if any
    pub served: Option<ConfigurationSnapshot>,
}

/// Read-only observer of a coordinator's lifecycle
#[derive(Clone)]
pub struct RegistrationMonitor {
    lifecycle: SharedLifecycle,
}

impl RegistrationMonitor {
    pub(crate) fn new(lifecycle: SharedLifecycle) -> Self {
        Self { lifecycle }
    }

    #[must_use]
    pub fn status(&self) -> RegistrationStatus {
        let lifecycle = self.lifecycle.lock();
        RegistrationStatus {
            state: lifecycle.state,
            keep_alive_armed: lifecycle.keep_alive.is_some(),
            served: lifecycle.active.as_ref().map(|a| a.snapshot.clone()),
        }
    }

    #[must_use]
    pub fn state(&self) -> RegistrationState {
        self.lifecycle.lock().state
    }
}
