//! NF registration lifecycle
//!
//! ```ignore
//! snapshot channel ─► RegistrationCoordinator ─► RegistrationAttempt (retry loop)
//!                            │ cancel/stop               │ success
//!                            ▼                           ▼
//!                      shared lifecycle ◄──────── HeartbeatScheduler ─► Update
//!                                                        │ failure
//!                                                        └─► new RegistrationAttempt
//! ```

pub mod attempt;
pub mod coordinator;
pub mod heartbeat;
pub mod state;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;

use nfreg_core::config::RegistrationConfig;
use std::time::Duration;

pub use attempt::{AttemptOutcome, RegistrationAttempt};
pub use coordinator::RegistrationCoordinator;
pub use heartbeat::HeartbeatScheduler;
pub use state::{RegistrationMonitor, RegistrationState, RegistrationStatus};
pub use timer::{Scheduler, TimerHandle, TimerTask, TokioScheduler};

/// Delay between failed Register attempts; constant, no backoff
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Heartbeat interval used when the Repository does not advertise one
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Timing knobs for the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSettings {
    pub retry_interval: Duration,
    pub default_heartbeat: Duration,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
            default_heartbeat: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

impl From<&RegistrationConfig> for RegistrationSettings {
    fn from(config: &RegistrationConfig) -> Self {
        Self {
            retry_interval: config.retry_interval(),
            default_heartbeat: config.default_heartbeat(),
        }
    }
}
