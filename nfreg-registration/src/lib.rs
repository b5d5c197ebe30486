//! NF registration and liveness against the NRF
//!
//! A [`RegistrationCoordinator`] consumes served-PLMN snapshots and keeps the
//! Repository's view of this network function in line with the latest one.

pub mod client;
pub mod error;
pub mod registration;
pub mod watcher;

pub use client::{NrfClient, NrfClientConfig, Registration, RepositoryClient};
pub use error::{PollError, RepositoryError, Result};
pub use registration::{
    HeartbeatScheduler, RegistrationCoordinator, RegistrationMonitor, RegistrationSettings,
    RegistrationState, RegistrationStatus, Scheduler, TimerHandle, TokioScheduler,
};
pub use watcher::{PlmnConfigPoller, PlmnPollerConfig};
