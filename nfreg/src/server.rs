use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use nfreg_core::{Config, ConfigurationSnapshot};
use nfreg_registration::{
    NrfClient, NrfClientConfig, PlmnConfigPoller, PlmnPollerConfig, RegistrationCoordinator,
    RegistrationSettings, RegistrationState, TokioScheduler,
};

/// Wires the snapshot source to the registration coordinator
pub struct NfRegServer {
    config: Config,
    coordinator: RegistrationCoordinator,
    poller: Option<PlmnConfigPoller>,
}

impl NfRegServer {
    pub fn new(config: Config) -> Result<Self> {
        let client = NrfClient::new(NrfClientConfig::from_config(&config))
            .map_err(|e| anyhow::anyhow!("Failed to create NRF client: {e}"))?;
        info!("NRF instance URL: {}", client.instance_url());

        let coordinator = RegistrationCoordinator::new(
            Arc::new(client),
            Arc::new(TokioScheduler),
            RegistrationSettings::from(&config.registration),
        );

        let poller = if config.webui.enabled {
            let poller = PlmnConfigPoller::new(PlmnPollerConfig::from_config(&config))
                .map_err(|e| anyhow::anyhow!("Failed to create PLMN poller: {e}"))?;
            info!("Polling served PLMNs from {}", poller.url());
            Some(poller)
        } else {
            None
        };

        Ok(Self {
            config,
            coordinator,
            poller,
        })
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            coordinator,
            poller,
        } = self;

        let (snapshots, rx) = mpsc::channel(config.registration.channel_capacity.max(1));
        let shutdown = CancellationToken::new();
        let monitor = coordinator.monitor();
        let mut coordinator_handle = tokio::spawn(coordinator.run(shutdown.clone(), rx));

        let poller_handle = match &poller {
            Some(poller) => Some(poller.start(snapshots.clone())),
            None => {
                let served = config.configuration.snapshot();
                info!(plmns = %served, "Using static served PLMN configuration");
                snapshots
                    .send(served)
                    .await
                    .map_err(|_| {
                        anyhow::anyhow!("Registration coordinator exited before startup")
                    })?;
                None
            }
        };

        tokio::select! {
            result = &mut coordinator_handle => {
                if let Err(e) = result {
                    error!("Registration coordinator stopped unexpectedly: {}", e);
                }
                return Ok(());
            }
            () = shutdown_signal() => {
                info!(
                    state = %monitor.state(),
                    "Shutdown signal received, starting graceful shutdown..."
                );
            }
        }

        // 1. Stop feeding new snapshots
        if let Some(poller) = &poller {
            poller.shutdown();
        }
        if let Some(handle) = poller_handle {
            if let Err(e) = handle.await {
                warn!("PLMN poller task failed: {}", e);
            }
        }

        // 2. Optionally withdraw, then close the channel so the coordinator drains
        let state = monitor.state();
        if needs_withdrawal(config.registration.deregister_on_shutdown, state) {
            info!("Deregistering from NRF before exit");
            if snapshots.send(ConfigurationSnapshot::empty()).await.is_err() {
                warn!("Registration coordinator already stopped, skipping deregistration");
            }
        } else if config.registration.deregister_on_shutdown {
            info!(state = %state, "Nothing registered, skipping deregistration");
        }
        drop(snapshots);

        // 3. Bounded wait, then force cancellation
        let timeout = Duration::from_secs(config.registration.shutdown_timeout_secs);
        match tokio::time::timeout(timeout, &mut coordinator_handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Registration coordinator task failed: {}", e),
            Err(_) => {
                warn!(
                    "Registration coordinator did not stop within {}s, cancelling",
                    timeout.as_secs()
                );
                shutdown.cancel();
                if let Err(e) = coordinator_handle.await {
                    error!("Registration coordinator task failed: {}", e);
                }
            }
        }

        info!("nfreg stopped");
        Ok(())
    }
}

/// Whether an empty snapshot must be sent before exit
///
/// Only a registering or registered NF has anything to withdraw; from `Idle`
/// or `Deregistering` another DELETE would be redundant.
fn needs_withdrawal(deregister_on_shutdown: bool, state: RegistrationState) -> bool {
    deregister_on_shutdown
        && matches!(
            state,
            RegistrationState::Registering | RegistrationState::Heartbeating
        )
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
