use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use label_engine::{ConfigError, LabelConfig};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub(crate) enum ConfigFileError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}{location}: {message}")]
    Parse {
        path: PathBuf,
        location: String,
        message: String,
    },
    #[error("invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Loads a label config from JSON. A missing file yields the defaults.
pub(crate) fn load_label_config(path: &Path) -> Result<LabelConfig, ConfigFileError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "config_missing_using_defaults");
            return Ok(LabelConfig::default());
        }
        Err(source) => {
            return Err(ConfigFileError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_label_config(&raw, path)
}

pub(crate) fn parse_label_config(raw: &str, path: &Path) -> Result<LabelConfig, ConfigFileError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: LabelConfig = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        let location = if field.is_empty() || field == "." {
            String::new()
        } else {
            format!(" at {field}")
        };
        ConfigFileError::Parse {
            path: path.to_path_buf(),
            location,
            message: error.into_inner().to_string(),
        }
    })?;
    config.validate().map_err(|source| ConfigFileError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}
