//! Served network identifiers and configuration snapshots

use serde::{Deserialize, Serialize};
use std::fmt;

/// Public land mobile network identifier (MCC + MNC)
///
/// Codes are kept as digit strings so leading zeros survive ("001", "01").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlmnId {
    pub mcc: String,
    pub mnc: String,
}

impl PlmnId {
    #[must_use]
    pub fn new(mcc: impl Into<String>, mnc: impl Into<String>) -> Self {
        Self {
            mcc: mcc.into(),
            mnc: mnc.into(),
        }
    }

    /// MCC must be 3 digits, MNC 2 or 3 digits
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        self.mcc.len() == 3
            && digits(&self.mcc)
            && matches!(self.mnc.len(), 2 | 3)
            && digits(&self.mnc)
    }
}

impl fmt::Display for PlmnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.mcc, self.mnc)
    }
}

/// Complete desired served set at a point in time
///
/// Not a delta: every snapshot replaces the previous one. An empty snapshot
/// means "serve nothing" and withdraws the registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationSnapshot {
    plmns: Vec<PlmnId>,
}

impl ConfigurationSnapshot {
    /// Build a snapshot, dropping repeated identifiers but keeping first-seen order
    #[must_use]
    pub fn new(plmns: Vec<PlmnId>) -> Self {
        let mut unique: Vec<PlmnId> = Vec::with_capacity(plmns.len());
        for plmn in plmns {
            if !unique.contains(&plmn) {
                unique.push(plmn);
            }
        }
        Self { plmns: unique }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plmns.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plmns.len()
    }

    #[must_use]
    pub fn plmns(&self) -> &[PlmnId] {
        &self.plmns
    }
}

impl From<Vec<PlmnId>> for ConfigurationSnapshot {
    fn from(plmns: Vec<PlmnId>) -> Self {
        Self::new(plmns)
    }
}

impl FromIterator<PlmnId> for ConfigurationSnapshot {
    fn from_iter<T: IntoIterator<Item = PlmnId>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for ConfigurationSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, plmn) in self.plmns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{plmn}")?;
        }
        f.write_str("]")
    }
}
