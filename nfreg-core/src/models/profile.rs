//! Repository-facing records: NF profile, JSON patch items, problem details

use serde::{Deserialize, Serialize};
use std::fmt;

use super::plmn::ConfigurationSnapshot;

/// Status value the Repository expects for a live instance
pub const NF_STATUS_REGISTERED: &str = "REGISTERED";

/// The Repository's record of this function instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfProfile {
    #[serde(default)]
    pub nf_instance_id: String,
    #[serde(default)]
    pub nf_type: String,
    #[serde(default)]
    pub nf_status: String,
    #[serde(default, skip_serializing_if = "ConfigurationSnapshot::is_empty")]
    pub plmn_list: ConfigurationSnapshot,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4_addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    /// Heartbeat interval in seconds advertised by the Repository
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_beat_timer: Option<i32>,
}

impl NfProfile {
    /// Advertised heartbeat interval, 0 when the Repository did not send one
    #[must_use]
    pub fn heartbeat_interval(&self) -> i32 {
        self.heart_beat_timer.unwrap_or(0)
    }
}

/// JSON Patch operation (RFC 6902)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOperation {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

/// One JSON Patch entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchItem {
    pub op: PatchOperation,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl PatchItem {
    #[must_use]
    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: PatchOperation::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    /// Liveness patch for the given served set
    ///
    /// Marks the instance registered and restates the PLMN list so the
    /// Repository record tracks the snapshot being heartbeated.
    #[must_use]
    pub fn heartbeat(snapshot: &ConfigurationSnapshot) -> Vec<Self> {
        vec![
            Self::replace("/nfStatus", serde_json::json!(NF_STATUS_REGISTERED)),
            Self::replace(
                "/plmnList",
                serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null),
            ),
        ]
    }
}

/// Error body returned by the Repository (RFC 7807)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "{status} ")?;
        }
        f.write_str(self.title.as_deref().unwrap_or("problem"))?;
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}
