//! Settings file management

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::deploy::fsm::WizardSettings;
use crate::errors::WizardError;
use crate::filesys::file::File;
use crate::logs::LogLevel;
use crate::models::deployment::DeploymentDefaults;

/// Wizard settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Write JSON log lines instead of text
    #[serde(default)]
    pub json_logs: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Upper bound on one deployment request, in seconds
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_secs: u64,

    /// Number of per-agent wizard sessions kept in memory
    #[serde(default = "default_session_capacity")]
    pub session_capacity: usize,

    /// Overrides for derived deployment defaults
    #[serde(default)]
    pub deployment_defaults: DeploymentDefaults,
}

fn default_submit_timeout() -> u64 {
    30
}

fn default_session_capacity() -> usize {
    16
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            backend: BackendSettings::default(),
            submit_timeout_secs: default_submit_timeout(),
            session_capacity: default_session_capacity(),
            deployment_defaults: DeploymentDefaults::default(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file does not exist
    pub async fn load_or_default(file: &File) -> Result<Self, WizardError> {
        if !file.exists().await {
            info!("No settings at {}, using defaults", file.path().display());
            return Ok(Self::default());
        }
        let settings: Settings = file.read_json().await?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), WizardError> {
        Url::parse(&self.backend.base_url).map_err(|e| {
            WizardError::ConfigError(format!("Invalid backend.base_url {}: {}", self.backend.base_url, e))
        })?;
        if self.submit_timeout_secs == 0 {
            return Err(WizardError::ConfigError(
                "submit_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for a deployment wizard
    pub fn wizard_settings(&self) -> WizardSettings {
        WizardSettings {
            submit_timeout: Duration::from_secs(self.submit_timeout_secs),
            defaults: self.deployment_defaults.clone(),
        }
    }
}

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the marketplace API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Optional bearer token for the API
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_backend_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
            auth_token: None,
        }
    }
}
