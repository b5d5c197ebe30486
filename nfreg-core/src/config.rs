use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::models::{ConfigurationSnapshot, PlmnId};

/// Config file version this build understands
pub const EXPECTED_CONFIG_VERSION: &str = "1.0.0";

/// Webui address used when none is configured
pub const DEFAULT_WEBUI_URI: &str = "http://webui:5001";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub info: InfoConfig,
    pub nf: NfConfig,
    pub nrf: NrfConfig,
    pub webui: WebuiConfig,
    pub registration: RegistrationConfig,
    pub configuration: ServedConfig,
    pub logging: LoggingConfig,
    #[serde(skip)]
    webui_uri_defaulted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoConfig {
    pub version: String,
    pub description: String,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            version: EXPECTED_CONFIG_VERSION.to_string(),
            description: "network function registration manager".to_string(),
        }
    }
}

/// Identity of the network function being registered
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NfConfig {
    pub instance_id: String,
    pub nf_type: String,
    pub scheme: String,
    pub register_ipv4: String,
    pub sbi_port: u16,
    pub fqdn: Option<String>,
}

impl Default for NfConfig {
    fn default() -> Self {
        Self {
            instance_id: "00000000-0000-0000-0000-000000000001".to_string(),
            nf_type: "AUSF".to_string(),
            scheme: "http".to_string(),
            register_ipv4: "127.0.0.1".to_string(),
            sbi_port: 29509,
            fqdn: None,
        }
    }
}

/// Repository (NRF) endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NrfConfig {
    pub uri: String,
    pub request_timeout_secs: u64,
}

impl Default for NrfConfig {
    fn default() -> Self {
        Self {
            uri: "http://nrf:29510".to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// Source of served-PLMN snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebuiConfig {
    pub uri: String,
    pub enabled: bool,
    pub poll_interval_secs: u64,
}

impl Default for WebuiConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_WEBUI_URI.to_string(),
            enabled: true,
            poll_interval_secs: 5,
        }
    }
}

/// Registration lifecycle tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Fixed delay between failed Register attempts
    pub retry_interval_secs: u64,
    /// Heartbeat interval used when the Repository advertises none
    pub default_heartbeat_secs: u64,
    /// Send an empty snapshot (deregister) before exiting
    pub deregister_on_shutdown: bool,
    pub channel_capacity: usize,
    pub shutdown_timeout_secs: u64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: 10,
            default_heartbeat_secs: 60,
            deregister_on_shutdown: true,
            channel_capacity: 16,
            shutdown_timeout_secs: 5,
        }
    }
}

impl RegistrationConfig {
    #[must_use]
    pub const fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    #[must_use]
    pub const fn default_heartbeat(&self) -> Duration {
        Duration::from_secs(self.default_heartbeat_secs)
    }
}

/// Statically configured served set, used when webui polling is disabled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServedConfig {
    pub plmn_support_list: Vec<PlmnId>,
    /// Peer NFs configured by hand instead of discovered through the NRF
    pub manual_configs: Option<ManualConfigs>,
}

impl ServedConfig {
    #[must_use]
    pub fn snapshot(&self) -> ConfigurationSnapshot {
        ConfigurationSnapshot::new(self.plmn_support_list.clone())
    }
}

/// Manually configured peer NFs, keyed by NF type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfigs {
    pub nfs: BTreeMap<String, Vec<ManualNf>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualNf {
    pub nf_instance_name: String,
    pub nf_services: Vec<ManualNfService>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualNfService {
    pub service_name: String,
    pub url: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // NFREG_NRF__URI, NFREG_REGISTRATION__RETRY_INTERVAL_SECS, ...
        builder = builder.add_source(
            Environment::with_prefix("NFREG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.apply_defaults();
        Ok(config)
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    fn apply_defaults(&mut self) {
        if self.webui.uri.trim().is_empty() {
            self.webui.uri = DEFAULT_WEBUI_URI.to_string();
            self.webui_uri_defaulted = true;
        }
    }

    /// Whether the webui URI was missing and replaced by `DEFAULT_WEBUI_URI`
    #[must_use]
    pub const fn webui_uri_defaulted(&self) -> bool {
        self.webui_uri_defaulted
    }

    /// Report load-time decisions; call once logging is initialized
    pub fn log_loaded(&self) {
        tracing::info!(version = %self.info.version, "config version");
        if self.webui_uri_defaulted {
            tracing::info!(
                webui_uri = %self.webui.uri,
                "webui uri not set in configuration, using default"
            );
        }

        match &self.configuration.manual_configs {
            Some(manual) => {
                tracing::info!("Manual configuration provided for network functions");
                for (nf_type, nfs) in &manual.nfs {
                    for nf in nfs {
                        for service in &nf.nf_services {
                            tracing::debug!(
                                nf_type = %nf_type,
                                name = %nf.nf_instance_name,
                                service = %service.service_name,
                                url = %service.url,
                                port = service.port,
                                "Manual configuration"
                            );
                        }
                    }
                }
            }
            None => tracing::info!("No manual configuration provided for network functions"),
        }
    }

    /// Reject config files written for a different schema version
    pub fn check_version(&self) -> Result<()> {
        if self.info.version != EXPECTED_CONFIG_VERSION {
            return Err(Error::ConfigVersion {
                found: self.info.version.clone(),
                expected: EXPECTED_CONFIG_VERSION.to_string(),
            });
        }
        Ok(())
    }

    /// Validate the whole configuration, collecting every problem found
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = self.check_version() {
            errors.push(e.to_string());
        }
        if let Err(e) = validate_http_uri(&self.nrf.uri) {
            errors.push(format!("nrf.uri: {e}"));
        }
        if self.webui.enabled {
            if let Err(e) = validate_http_uri(&self.webui.uri) {
                errors.push(format!("webui.uri: {e}"));
            }
            if self.webui.poll_interval_secs == 0 {
                errors.push("webui.poll_interval_secs must be greater than 0".to_string());
            }
        }
        if self.nf.instance_id.trim().is_empty() {
            errors.push("nf.instance_id must not be empty".to_string());
        }
        if self.nf.nf_type.trim().is_empty() {
            errors.push("nf.nf_type must not be empty".to_string());
        }
        if self.nrf.request_timeout_secs == 0 {
            errors.push("nrf.request_timeout_secs must be greater than 0".to_string());
        }
        if self.registration.retry_interval_secs == 0 {
            errors.push("registration.retry_interval_secs must be greater than 0".to_string());
        }
        if self.registration.default_heartbeat_secs == 0 {
            errors.push("registration.default_heartbeat_secs must be greater than 0".to_string());
        }
        if self.registration.channel_capacity == 0 {
            errors.push("registration.channel_capacity must be greater than 0".to_string());
        }
        for plmn in &self.configuration.plmn_support_list {
            if !plmn.is_valid() {
                errors.push(format!(
                    "configuration.plmn_support_list: invalid PLMN {plmn}"
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Base URL of the NF's own SBI endpoint
    #[must_use]
    pub fn sbi_address(&self) -> String {
        format!("{}://{}:{}", self.nf.scheme, self.nf.register_ipv4, self.nf.sbi_port)
    }
}

/// Accept only absolute http(s) URLs that name a host
pub fn validate_http_uri(uri: &str) -> Result<Url> {
    let parsed = Url::parse(uri).map_err(|e| Error::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::InvalidUri {
            uri: uri.to_string(),
            reason: format!("unsupported scheme: {}", parsed.scheme()),
        });
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(Error::InvalidUri {
            uri: uri.to_string(),
            reason: "missing host".to_string(),
        }),
    }
}
