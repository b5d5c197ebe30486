pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::config::Config;
pub use error::{Error, Result};
pub use models::{ConfigurationSnapshot, NfProfile, PatchItem, PlmnId, ProblemDetails};
