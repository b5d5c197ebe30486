use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Unsupported config version: found [{found}], expected [{expected}]")]
    ConfigVersion { found: String, expected: String },

    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
