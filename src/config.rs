//! # Client Configuration
//!
//! Layered configuration for the enrollment core: built-in defaults, then an
//! optional TOML file, then `ENROLLMENT_`-prefixed environment variables.

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{EnrollmentError, EnrollmentResult};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "ENROLLMENT_CONFIG";

/// Config file looked up in the working directory when `ENROLLMENT_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "enrollment-client.toml";

/// Client configuration for API access and reconciliation behavior
///
/// # Examples
///
/// ```rust
/// use enrollment_core::config::ClientConfig;
///
/// let config = ClientConfig::default();
/// assert_eq!(config.api.base_url, "http://localhost:8080");
/// assert_eq!(config.reconciliation.max_concurrent_students, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Enrollment API endpoint
    pub api: ApiEndpointConfig,
    /// Roster reconciliation settings
    pub reconciliation: ReconciliationConfig,
}

/// API endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEndpointConfig {
    /// Base URL for the API (e.g., "<http://localhost:8080/api>")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Bearer credential (if already known)
    pub auth_token: Option<String>,
}

impl Default for ApiEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 30000,
            auth_token: None,
        }
    }
}

/// Roster reconciliation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Students reconciled concurrently during a roster pass
    pub max_concurrent_students: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_students: 8,
        }
    }
}

impl ClientConfig {
    /// Load configuration from defaults, config file, and environment
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables (`ENROLLMENT_API__BASE_URL`, ...)
    /// 2. Config file (`$ENROLLMENT_CONFIG` or `./enrollment-client.toml`)
    /// 3. Default values
    pub fn load() -> EnrollmentResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        debug!(path = %path.display(), "Loading client configuration");

        let builder = Self::defaults()?
            .add_source(File::from(path.as_path()).required(false))
            .add_source(Self::environment());
        Self::finish(builder)
    }

    /// Load configuration from defaults plus one required file (no environment overrides)
    pub fn load_from_file(path: &Path) -> EnrollmentResult<Self> {
        if !path.is_file() {
            return Err(EnrollmentError::config_error(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = Self::defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    /// Reject values that would make the client unusable
    pub fn validate(&self) -> EnrollmentResult<()> {
        Url::parse(&self.api.base_url).map_err(|e| {
            EnrollmentError::config_error(format!("Invalid api.base_url '{}': {}", self.api.base_url, e))
        })?;

        if self.api.timeout_ms == 0 {
            return Err(EnrollmentError::config_error(
                "api.timeout_ms must be greater than zero",
            ));
        }

        if self.reconciliation.max_concurrent_students == 0 {
            return Err(EnrollmentError::config_error(
                "reconciliation.max_concurrent_students must be at least 1",
            ));
        }

        Ok(())
    }

    fn defaults() -> EnrollmentResult<ConfigBuilder<DefaultState>> {
        let defaults = Self::default();
        Ok(Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_ms", defaults.api.timeout_ms as i64)?
            .set_default(
                "reconciliation.max_concurrent_students",
                defaults.reconciliation.max_concurrent_students as i64,
            )?)
    }

    fn environment() -> Environment {
        Environment::with_prefix("ENROLLMENT")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> EnrollmentResult<Self> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!(
            base_url = %config.api.base_url,
            timeout_ms = config.api.timeout_ms,
            max_concurrent_students = config.reconciliation.max_concurrent_students,
            "Loaded client configuration"
        );
        Ok(config)
    }
}
