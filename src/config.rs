//! Configuration management for credsift.
//!
//! Structured options loaded from defaults, a TOML file, environment variables
//! and finally command-line arguments (highest precedence). Every context
//! window radius used by the extractors lives here so that it can be tuned
//! without touching the pattern code.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::CredSiftError;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Context window radii used by the extractors
    pub windows: WindowConfig,

    /// Optional remote inference collaborator
    pub remote: RemoteConfig,

    /// Output preferences
    pub output: OutputConfig,
}

/// Context window radii, in characters on each side of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Look-back used to find a free-text system label before a login pair
    pub system_label: usize,

    /// Mailbox password lookup around an email literal
    pub email_password: usize,

    /// Password lookup around a free-standing login
    pub generic_pair: usize,

    /// Username / password / port lookup around FTP hosts and website URLs
    pub credential: usize,

    /// Username / password lookup around server and panel hosts
    pub server: usize,

    /// Migration-intent keyword lookup around an email literal
    pub migration_keyword: usize,

    /// Maximum extent of a DNS record section after its header
    pub dns_section: usize,

    /// Pre-text checked for a login keyword before an email literal
    pub login_exclusion: usize,

    /// Window attached to formatted records when context is requested
    pub record_context: usize,
}

/// Remote inference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Whether the aggregator should try the remote collaborator first
    pub enabled: bool,

    /// Endpoint receiving `{ "text": ... }` and answering with the payload
    pub endpoint: Option<String>,

    /// Bearer token sent with the request
    pub api_key: Option<String>,

    /// Bound on the single remote attempt
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

/// Output preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON artifacts
    pub pretty_json: bool,

    /// Client name used when grouping records without one
    pub default_client_name: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            system_label: 50,
            email_password: 100,
            generic_pair: 100,
            credential: 200,
            server: 300,
            migration_keyword: 300,
            dns_section: 400,
            login_exclusion: 20,
            record_context: 100,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty_json: true,
            default_client_name: "Unknown Client".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
            path: path.as_ref().to_string_lossy().to_string(),
            source: e,
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string; absent keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            format: "TOML".to_string(),
            reason: e.to_string(),
        })
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `CREDSIFT_*` environment variables on top of the current values
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("CREDSIFT_REMOTE_URL")
            && !endpoint.trim().is_empty()
        {
            self.remote.endpoint = Some(endpoint.trim().to_string());
            self.remote.enabled = true;
        }

        if let Ok(key) = std::env::var("CREDSIFT_REMOTE_API_KEY")
            && !key.is_empty()
        {
            self.remote.api_key = Some(key);
        }

        if let Ok(timeout) = std::env::var("CREDSIFT_REMOTE_TIMEOUT_SECS")
            && let Ok(secs) = timeout.parse::<u64>()
        {
            self.remote.timeout = Duration::from_secs(secs);
        }

        if let Ok(enabled) = std::env::var("CREDSIFT_REMOTE_ENABLED") {
            self.remote.enabled = enabled.eq_ignore_ascii_case("true")
                || enabled.eq_ignore_ascii_case("1")
                || enabled.eq_ignore_ascii_case("yes");
        }

        if let Ok(radius) = std::env::var("CREDSIFT_CREDENTIAL_RADIUS")
            && let Ok(r) = radius.parse::<usize>()
        {
            self.windows.credential = r;
        }

        if let Ok(radius) = std::env::var("CREDSIFT_SERVER_RADIUS")
            && let Ok(r) = radius.parse::<usize>()
        {
            self.windows.server = r;
        }

        if let Ok(name) = std::env::var("CREDSIFT_DEFAULT_CLIENT_NAME")
            && !name.trim().is_empty()
        {
            self.output.default_client_name = name.trim().to_string();
        }
    }

    /// Merge with CLI arguments, giving CLI precedence
    pub fn merge_with_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(ref url) = cli.remote_url {
            self.remote.endpoint = Some(url.clone());
            self.remote.enabled = true;
        }

        if let Some(secs) = cli.remote_timeout {
            self.remote.timeout = Duration::from_secs(secs);
        }

        if cli.no_remote {
            self.remote.enabled = false;
        }

        if cli.compact {
            self.output.pretty_json = false;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let radii = [
            ("windows.system_label", self.windows.system_label),
            ("windows.email_password", self.windows.email_password),
            ("windows.generic_pair", self.windows.generic_pair),
            ("windows.credential", self.windows.credential),
            ("windows.server", self.windows.server),
            ("windows.migration_keyword", self.windows.migration_keyword),
            ("windows.dns_section", self.windows.dns_section),
            ("windows.login_exclusion", self.windows.login_exclusion),
        ];
        for (field, value) in radii {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                    reason: "Context radius must be greater than 0".to_string(),
                });
            }
        }

        if self.remote.enabled && self.remote.endpoint.is_none() {
            return Err(ConfigError::MissingRequired {
                field: "remote.endpoint".to_string(),
            });
        }

        if self.remote.enabled && self.remote.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "remote.timeout".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration format
    #[error("Failed to parse {format} config: {reason}")]
    Parse { format: String, reason: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Missing required configuration
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },
}

impl From<ConfigError> for CredSiftError {
    fn from(e: ConfigError) -> Self {
        CredSiftError::configuration(e.to_string())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
