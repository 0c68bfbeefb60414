mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse and validate TOML config content
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path in default_paths() {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            return load_config(&path);
        }
    }

    Ok(Config::default())
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("./config.toml"),
        PathBuf::from("./youtube-fetch.toml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("youtube-fetch").join("config.toml"));
    }
    paths
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.tool.binary.trim().is_empty() {
        anyhow::bail!("Tool binary cannot be empty");
    }

    if config.tool.attempt_timeout_secs == Some(0) {
        anyhow::bail!("Attempt timeout must be positive when set");
    }

    if config.storage.sweep_interval_secs == 0 {
        anyhow::bail!("Sweep interval cannot be 0");
    }

    Ok(())
}
