//! Polls the webui for the served PLMN list

use nfreg_core::config::Config;
use nfreg_core::{ConfigurationSnapshot, PlmnId};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::PollError;

const PLMN_CONFIG_PATH: &str = "nfconfig/plmn";

#[derive(Debug, Clone)]
pub struct PlmnPollerConfig {
    pub webui_uri: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl PlmnPollerConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            webui_uri: config.webui.uri.clone(),
            poll_interval: Duration::from_secs(config.webui.poll_interval_secs),
            request_timeout: Duration::from_secs(config.nrf.request_timeout_secs),
        }
    }
}

/// Turns webui polling into a stream of configuration snapshots
///
/// A snapshot is sent only when the fetched list differs from the last one
/// sent; the first successful fetch is always sent.
pub struct PlmnConfigPoller {
    http: Client,
    url: String,
    poll_interval: Duration,
    cancel_token: CancellationToken,
}

impl PlmnConfigPoller {
    pub fn new(config: PlmnPollerConfig) -> Result<Self, PollError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        let url = format!(
            "{}/{}",
            config.webui_uri.trim_end_matches('/'),
            PLMN_CONFIG_PATH
        );

        Ok(Self {
            http,
            url,
            poll_interval: config.poll_interval,
            cancel_token: CancellationToken::new(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current served set once
    pub async fn fetch(&self) -> Result<ConfigurationSnapshot, PollError> {
        Self::fetch_from(&self.http, &self.url).await
    }

    async fn fetch_from(http: &Client, url: &str) -> Result<ConfigurationSnapshot, PollError> {
        let response = http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status.as_u16()));
        }

        let plmns: Vec<PlmnId> = response.json().await?;
        if let Some(invalid) = plmns.iter().find(|p| !p.is_valid()) {
            return Err(PollError::InvalidPlmn(invalid.to_string()));
        }
        Ok(ConfigurationSnapshot::new(plmns))
    }

    /// Start the polling loop
    ///
    /// The loop ends on `shutdown()` or once the receiving side of `snapshots`
    /// is closed.
    pub fn start(&self, snapshots: mpsc::Sender<ConfigurationSnapshot>) -> JoinHandle<()> {
        let http = self.http.clone();
        let url = self.url.clone();
        let cancel_token = self.cancel_token.clone();
        let mut timer = interval(self.poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::spawn(async move {
            let mut last_sent: Option<ConfigurationSnapshot> = None;

            loop {
                tokio::select! {
                    () = cancel_token.cancelled() => {
                        tracing::info!("PLMN poller shutting down");
                        return;
                    }
                    _ = timer.tick() => {}
                }

                let snapshot = match Self::fetch_from(&http, &url).await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        tracing::warn!(
                            url = %url,
                            error = %e,
                            "Failed to fetch PLMN configuration"
                        );
                        continue;
                    }
                };

                if last_sent.as_ref() == Some(&snapshot) {
                    continue;
                }

                tracing::info!(plmns = %snapshot, "Served PLMN configuration changed");
                let sent = tokio::select! {
                    () = cancel_token.cancelled() => return,
                    sent = snapshots.send(snapshot.clone()) => sent,
                };
                if sent.is_err() {
                    tracing::info!("Configuration channel closed, PLMN poller stopping");
                    return;
                }
                last_sent = Some(snapshot);
            }
        })
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
