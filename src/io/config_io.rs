use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

pub const CONFIG_FILE: &str = "config.toml";

/// Error type for reading config.toml
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Read config.toml from the data directory. A missing file means defaults.
pub fn read_config(data_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_path(data_dir);
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    let config = parse_config(&text).map_err(|e| match e {
        ParseFailure::Toml(source) => ConfigError::ParseError {
            path: path.clone(),
            source,
        },
        ParseFailure::Invalid(reason) => ConfigError::Invalid {
            path: path.clone(),
            reason,
        },
    })?;
    tracing::debug!(path = %path.display(), levels = config.levels.len(), "config loaded");
    Ok(config)
}

enum ParseFailure {
    Toml(toml::de::Error),
    Invalid(String),
}

fn parse_config(text: &str) -> Result<Config, ParseFailure> {
    let config: Config = toml::from_str(text).map_err(ParseFailure::Toml)?;
    config.validate().map_err(ParseFailure::Invalid)?;
    Ok(config)
}
