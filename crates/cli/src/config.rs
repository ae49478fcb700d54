//! Run configuration
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! command-line flags applied by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Settings for the loader and the artifact writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Directory the artifacts are written into
    pub output_dir: PathBuf,

    pub json_file_name: String,

    pub markdown_file_name: String,

    /// Network timeout for remote sources, in seconds
    pub timeout_secs: u64,

    /// Verify TLS certificates of remote sources
    pub verify_tls: bool,

    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output/apiscope"),
            json_file_name: "swagger-analysis.json".to_string(),
            markdown_file_name: "API-README.md".to_string(),
            timeout_secs: 30,
            verify_tls: true,
            user_agent: format!("apiscope/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl AppConfig {
    /// Parse a YAML config; missing keys keep their defaults
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        // An empty file deserializes to unit rather than an empty mapping
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults overlaid with the file at `path`, if one is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_yaml(&text, path)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(&self.json_file_name)
    }

    pub fn markdown_path(&self) -> PathBuf {
        self.output_dir.join(&self.markdown_file_name)
    }
}
