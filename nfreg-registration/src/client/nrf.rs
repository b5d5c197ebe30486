//! HTTP client for the Repository's NF management API
//!
//! Register is `PUT {nrf}/nnrf-nfm/v1/nf-instances/{id}`, Update is a JSON
//! Patch on the same resource and Deregister deletes it.

use async_trait::async_trait;
use nfreg_core::config::Config;
use nfreg_core::models::NF_STATUS_REGISTERED;
use nfreg_core::{ConfigurationSnapshot, NfProfile, PatchItem, ProblemDetails};
use parking_lot::Mutex;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

use super::{Registration, RepositoryClient};
use crate::error::{RepositoryError, Result};

const NF_INSTANCES_PATH: &str = "nnrf-nfm/v1/nf-instances";
const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";
const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Settings for [`NrfClient`]
#[derive(Debug, Clone)]
pub struct NrfClientConfig {
    pub nrf_uri: String,
    pub nf_instance_id: String,
    pub nf_type: String,
    pub ipv4_addresses: Vec<String>,
    pub fqdn: Option<String>,
    pub request_timeout: Duration,
}

impl NrfClientConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            nrf_uri: config.nrf.uri.clone(),
            nf_instance_id: config.nf.instance_id.clone(),
            nf_type: config.nf.nf_type.clone(),
            ipv4_addresses: vec![config.nf.register_ipv4.clone()],
            fqdn: config.nf.fqdn.clone(),
            request_timeout: Duration::from_secs(config.nrf.request_timeout_secs),
        }
    }
}

/// Repository client speaking the NF management HTTP API
pub struct NrfClient {
    http: Client,
    config: NrfClientConfig,
    instance_url: String,
    /// Last profile the Repository returned, reused when Update answers 204
    last_profile: Mutex<Option<NfProfile>>,
}

impl NrfClient {
    pub fn new(config: NrfClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                RepositoryError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        let instance_url = format!(
            "{}/{}/{}",
            config.nrf_uri.trim_end_matches('/'),
            NF_INSTANCES_PATH,
            config.nf_instance_id
        );

        Ok(Self {
            http,
            config,
            instance_url,
            last_profile: Mutex::new(None),
        })
    }

    /// Resource URL of this instance at the Repository
    #[must_use]
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Profile announced for `snapshot`
    #[must_use]
    pub fn build_profile(&self, snapshot: &ConfigurationSnapshot) -> NfProfile {
        NfProfile {
            nf_instance_id: self.config.nf_instance_id.clone(),
            nf_type: self.config.nf_type.clone(),
            nf_status: NF_STATUS_REGISTERED.to_string(),
            plmn_list: snapshot.clone(),
            ipv4_addresses: self.config.ipv4_addresses.clone(),
            fqdn: self.config.fqdn.clone(),
            heart_beat_timer: None,
        }
    }

    async fn read_profile(&self, response: Response) -> Result<NfProfile> {
        let profile: NfProfile = response.json().await?;
        *self.last_profile.lock() = Some(profile.clone());
        Ok(profile)
    }
}

/// Turn a non-success response into the matching error
async fn error_from_response(response: Response) -> RepositoryError {
    let status = response.status().as_u16();
    let is_problem = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(PROBLEM_CONTENT_TYPE));

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return RepositoryError::from(e),
    };

    if is_problem {
        if let Ok(mut problem) = serde_json::from_str::<ProblemDetails>(&body) {
            problem.status.get_or_insert(status);
            return RepositoryError::Problem(problem);
        }
    }
    RepositoryError::UnexpectedStatus { status, body }
}

#[async_trait]
impl RepositoryClient for NrfClient {
    async fn register(&self, snapshot: &ConfigurationSnapshot) -> Result<Registration> {
        let profile = self.build_profile(snapshot);
        let response = self
            .http
            .put(&self.instance_url)
            .json(&profile)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map_or_else(|| self.instance_url.clone(), str::to_string);
                let profile = self.read_profile(response).await?;
                tracing::debug!(
                    nf_instance_id = %profile.nf_instance_id,
                    location = %location,
                    "NRF accepted registration"
                );
                Ok(Registration { profile, location })
            }
            _ => Err(error_from_response(response).await),
        }
    }

    async fn update(&self, patch: &[PatchItem]) -> Result<NfProfile> {
        let body = serde_json::to_vec(patch)
            .map_err(|e| RepositoryError::Serialization(format!("Failed to encode patch: {e}")))?;
        let response = self
            .http
            .patch(&self.instance_url)
            .header(CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => self.read_profile(response).await,
            StatusCode::NO_CONTENT => Ok(self.last_profile.lock().clone().unwrap_or_default()),
            _ => Err(error_from_response(response).await),
        }
    }

    async fn deregister(&self) -> Result<()> {
        let response = self.http.delete(&self.instance_url).send().await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                *self.last_profile.lock() = None;
                Ok(())
            }
            _ => Err(error_from_response(response).await),
        }
    }
}
