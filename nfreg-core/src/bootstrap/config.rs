//! Configuration loading

use anyhow::Result;
use std::path::Path;

use crate::Config;

/// Well-known config locations probed when no explicit path is given
const DEFAULT_CONFIG_PATHS: &[&str] = &["nfcfg.yaml", "/config/nfcfg.yaml"];

/// Load configuration from config file or environment variables
///
/// Config file search order:
/// 1. Explicit path (CLI flag or NFREG_CONFIG_PATH); an error if it does not exist
/// 2. ./nfcfg.yaml (current working directory)
/// 3. /config/nfcfg.yaml (Kubernetes mount path)
/// 4. Fall back to environment variables only
///
/// Runs before logging is initialized, so progress goes to stderr.
pub fn load_config(explicit_path: Option<&str>) -> Result<Config> {
    if let Some(path) = explicit_path {
        if !Path::new(path).exists() {
            anyhow::bail!("Config file {path} not found");
        }
    }

    let config_path = explicit_path.map(str::to_string).or_else(|| {
        DEFAULT_CONFIG_PATHS
            .iter()
            .find(|p| Path::new(p).exists())
            .map(|p| (*p).to_string())
    });

    let config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        Config::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load {path}: {e}"))?
    } else {
        eprintln!("No config file found, using environment variables");
        Config::from_env()?
    };

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    Ok(config)
}
