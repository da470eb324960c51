//! Configuration loading for the query server binary.
//!
//! The canonical configuration lives in `chronicle-config.yaml`. This
//! module defines strongly-typed structs mirroring the YAML structure and a
//! loader that falls back to defaults when the file is absent, so the
//! server runs out of the box against a local data directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level query server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuerydConfig {
    /// Root directory holding one subdirectory of event files per run.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,
}

/// HTTP bind settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// The host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("chronicle-data")
}

fn default_host() -> String {
    String::from("127.0.0.1")
}

const fn default_port() -> u16 {
    7077
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for QuerydConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server: ServerSection::default(),
        }
    }
}

impl QuerydConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// A missing file is not an error: defaults apply. The environment
    /// variable `CHRONICLE_DATA_DIR` overrides `data_dir` either way.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if an existing file cannot be read, or
    /// [`ConfigError::Yaml`] if its content does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_yml::from_str(&contents)?
        } else {
            Self::default()
        };

        if let Ok(dir) = std::env::var("CHRONICLE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = QuerydConfig::load(Path::new("/nonexistent/chronicle.yaml")).unwrap();
        assert_eq!(config, QuerydConfig::default());
        assert_eq!(config.server.port, 7077);
    }

    #[test]
    fn yaml_fields_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "data_dir: /var/lib/chronicle\nserver:\n  port: 9000"
        )
        .unwrap();

        let config = QuerydConfig::load(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/chronicle"));
        assert_eq!(config.server.port, 9000);
        // Unspecified fields keep their defaults.
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_dir: [not, a, path").unwrap();
        assert!(QuerydConfig::load(file.path()).is_err());
    }
}
