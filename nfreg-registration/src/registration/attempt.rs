//! Cancellable Register retry loop

use nfreg_core::ConfigurationSnapshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::heartbeat::HeartbeatScheduler;

/// How an attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Registered and handed off to the heartbeat scheduler
    Registered,
    /// Abandoned because its token was canceled; not a failure
    Cancelled,
}

/// Keeps calling Register for one snapshot until it succeeds or is superseded
pub struct RegistrationAttempt {
    heartbeat: HeartbeatScheduler,
    token: CancellationToken,
    snapshot: ConfigurationSnapshot,
}

impl RegistrationAttempt {
    #[must_use]
    pub fn new(
        heartbeat: HeartbeatScheduler,
        token: CancellationToken,
        snapshot: ConfigurationSnapshot,
    ) -> Self {
        Self {
            heartbeat,
            token,
            snapshot,
        }
    }

    /// Run the retry loop
    ///
    /// Register errors are never surfaced: they are logged and retried after
    /// the fixed retry interval. The Register call and the retry wait both
    /// end as soon as the token is canceled.
    pub async fn run(self) -> AttemptOutcome {
        let retry_interval = self.heartbeat.settings().retry_interval;
        let client = self.heartbeat.client().clone();
        let mut tries: u32 = 0;

        loop {
            if self.token.is_cancelled() {
                debug!(plmns = %self.snapshot, "registration attempt canceled");
                return AttemptOutcome::Cancelled;
            }
            tries = tries.saturating_add(1);

            let result = tokio::select! {
                biased;
                () = self.token.cancelled() => {
                    debug!(plmns = %self.snapshot, "registration canceled while waiting for NRF");
                    return AttemptOutcome::Cancelled;
                }
                result = client.register(&self.snapshot) => result,
            };

            match result {
                Ok(registration) => {
                    let heartbeat_secs = registration.profile.heartbeat_interval();
                    if self
                        .heartbeat
                        .start(heartbeat_secs, self.snapshot.clone(), &self.token)
                    {
                        info!(
                            plmns = %self.snapshot,
                            location = %registration.location,
                            heartbeat_secs,
                            tries,
                            "NF registered with NRF"
                        );
                        return AttemptOutcome::Registered;
                    }
                    debug!(
                        plmns = %self.snapshot,
                        "discarding registration for superseded configuration"
                    );
                    return AttemptOutcome::Cancelled;
                }
                Err(e) => {
                    warn!(
                        plmns = %self.snapshot,
                        error = %e,
                        tries,
                        retry_in = ?retry_interval,
                        "NRF registration failed, retrying"
                    );
                }
            }

            tokio::select! {
                biased;
                () = self.token.cancelled() => {
                    debug!(plmns = %self.snapshot, "registration retry canceled");
                    return AttemptOutcome::Cancelled;
                }
                () = tokio::time::sleep(retry_interval) => {}
            }
        }
    }
}
