//! Configuration primitives for proc clients and tooling.
//!
//! This crate parses the TOML-based `~/.proc/config.toml` (and project-specific
//! variants) so that the client library and the CLI agree on where the evaluator
//! lives, which encoding to speak, and how bare symbols are written on the wire.
//! Authorization resolution lives in [`auth`].

pub mod auth;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs::home_dir;
use proc_core::WireOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use auth::{Environment, SystemEnvironment, resolve_authorization};

pub(crate) type Result<T> = std::result::Result<T, ConfigError>;

/// Directory under the home directory (or a project root) holding proc files.
pub const CONFIG_DIR: &str = ".proc";

/// Default evaluator host.
pub const DEFAULT_HOST: &str = "proc.run";

/// Default URL scheme.
pub const DEFAULT_SCHEME: &str = "https";

/// Application configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProcConfig {
    /// Where and how to reach the evaluator.
    pub client: ClientConfig,

    /// Encoder settings.
    pub wire: WireOptions,
}

/// Connection settings for the remote evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// URL scheme, `https` unless testing against a local evaluator.
    pub scheme: String,

    /// Evaluator host, optionally with a port.
    pub host: String,

    /// Body encoding for requests and responses.
    pub encoding: Encoding,

    /// Explicit token; takes precedence over `PROC_AUTH` and `~/.proc/auth`.
    pub authorization: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
            encoding: Encoding::default(),
            authorization: None,
        }
    }
}

impl ClientConfig {
    /// `scheme://host`
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

/// Request and response body encoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Json,
    Msgpack,
}

impl Encoding {
    /// Media type sent as both `accept` and `content-type`.
    pub fn media_type(&self) -> &'static str {
        match self {
            Encoding::Json => "application/vnd.proc+json",
            Encoding::Msgpack => "application/vnd.proc+msgpack",
        }
    }
}

impl ProcConfig {
    /// Loads configuration from the given path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config = toml::from_str::<ProcConfig>(&contents).map_err(ConfigError::Parse)?;
        debug!(path = %path.display(), "loaded proc config");
        Ok(config)
    }

    /// Returns the default configuration path (`$HOME/.proc/config.toml`).
    pub fn default_path() -> Result<PathBuf> {
        let home = home_dir().ok_or(ConfigError::HomeDirMissing)?;
        Ok(home.join(CONFIG_DIR).join("config.toml"))
    }

    /// Load configuration from the default location, or defaults when the file
    /// does not exist.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Load configuration for the current working directory, falling back to the
    /// global config when no project-level file exists.
    pub fn load_scoped() -> Result<Self> {
        let cwd = env::current_dir().map_err(ConfigError::Io)?;
        if let Some(path) = project_config_path(&cwd) {
            return Self::from_file(path);
        }
        Self::load_default()
    }
}

/// Finds the nearest `.proc/config.toml` at or above `start`.
pub fn project_config_path(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|ancestor| ancestor.join(CONFIG_DIR).join("config.toml"))
        .find(|candidate| candidate.is_file())
}

/// Errors that can occur while loading proc configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO failure when reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unable to determine home directory for default config path")]
    HomeDirMissing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proc_core::SymbolMode;
    use tempfile::tempdir;

    #[test]
    fn deserialize_basic_config() {
        let toml = r#"
            [client]
            scheme = "http"
            host = "localhost:4242"
            encoding = "msgpack"
            authorization = "token"

            [wire]
            symbols = "literal"
        "#;

        let config: ProcConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.client.base_url(), "http://localhost:4242");
        assert_eq!(config.client.encoding, Encoding::Msgpack);
        assert_eq!(config.client.authorization.as_deref(), Some("token"));
        assert_eq!(config.wire.symbols, SymbolMode::Literal);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config: ProcConfig = toml::from_str("[client]\nhost = \"example.test\"").unwrap();

        assert_eq!(config.client.scheme, "https");
        assert_eq!(config.client.host, "example.test");
        assert_eq!(config.client.encoding, Encoding::Json);
        assert_eq!(config.wire, WireOptions::default());
    }

    #[test]
    fn rejects_unknown_encodings() {
        let res = toml::from_str::<ProcConfig>("[client]\nencoding = \"xml\"");
        assert!(res.is_err());
    }

    #[test]
    fn from_file_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[client\n").unwrap();

        assert!(matches!(ProcConfig::from_file(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(
            ProcConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn project_config_is_found_from_nested_directories() {
        let dir = tempdir().unwrap();
        let config_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.toml"), "[client]\nhost = \"nested.test\"").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let path = project_config_path(&nested).unwrap();
        assert_eq!(path, config_dir.join("config.toml"));
        assert_eq!(ProcConfig::from_file(path).unwrap().client.host, "nested.test");
    }

    #[test]
    fn media_types() {
        assert_eq!(Encoding::Json.media_type(), "application/vnd.proc+json");
        assert_eq!(Encoding::Msgpack.media_type(), "application/vnd.proc+msgpack");
    }
}
