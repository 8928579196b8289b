//! Error types for the deployment wizard

use thiserror::Error;

/// Message shown when a deployment fails without a usable server message
pub const GENERIC_DEPLOY_FAILURE: &str = "Failed to deploy agent";

/// Main error type for the deployment wizard
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// A field edit was rejected by the configuration model
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The backend answered the deployment request with a non-2xx status
    #[error("Submission error: {0}")]
    SubmissionError(String),

    /// Transport failure or unreadable response body
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("A submission is already pending")]
    SubmissionPending,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WizardError {
    /// Text to present to the user for a failed operation.
    ///
    /// Server-provided submission messages are used verbatim; transport and
    /// decoding failures collapse to [`GENERIC_DEPLOY_FAILURE`].
    pub fn user_message(&self) -> String {
        match self {
            WizardError::SubmissionError(msg) => msg.clone(),
            WizardError::ValidationError(msg) => msg.clone(),
            WizardError::NotFound(msg) => msg.clone(),
            WizardError::Timeout(after) => {
                format!("Deployment timed out after {}s", after.as_secs())
            }
            WizardError::NetworkError(_)
            | WizardError::HttpError(_)
            | WizardError::JsonError(_) => GENERIC_DEPLOY_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for WizardError {
    fn from(err: anyhow::Error) -> Self {
        WizardError::Internal(err.to_string())
    }
}
