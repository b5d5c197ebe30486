//! Repository client capability
//!
//! The lifecycle code only ever talks to `dyn RepositoryClient`; the HTTP
//! implementation lives in [`nrf`].

pub mod nrf;

use async_trait::async_trait;
use nfreg_core::{ConfigurationSnapshot, NfProfile, PatchItem};

use crate::error::Result;

pub use nrf::{NrfClient, NrfClientConfig};

/// Successful Register result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub profile: NfProfile,
    /// Resource location (instance URI) assigned by the Repository
    pub location: String,
}

/// Register / Update / Deregister against the Repository
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Announce this function serving `snapshot`
    async fn register(&self, snapshot: &ConfigurationSnapshot) -> Result<Registration>;

    /// Liveness update; returns the Repository's current profile
    async fn update(&self, patch: &[PatchItem]) -> Result<NfProfile>;

    /// Withdraw the registration
    async fn deregister(&self) -> Result<()>;
}
