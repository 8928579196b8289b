//! Deployment receipts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use openapi_client::models::{Environment, InstanceType};

use crate::deploy::fsm::{DeploymentWizard, SubmissionStatus};
use crate::errors::WizardError;
use crate::filesys::file::File;

/// Record of a successful deployment, written next to the settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentReceipt {
    pub agent_id: String,
    pub name: String,
    pub environment: Environment,
    pub instance_type: InstanceType,
    pub region: String,
    pub replicas: u8,

    /// Issued credential
    pub api_key: String,

    pub request_token: String,
    pub deployed_at: DateTime<Utc>,
}

impl DeploymentReceipt {
    /// Build a receipt from a deployed wizard; `None` unless the deployment succeeded
    pub fn from_wizard(wizard: &DeploymentWizard) -> Option<Self> {
        if wizard.state().submission_status != SubmissionStatus::Success {
            return None;
        }
        let config = wizard.config();
        let api_key = config.issued_credential()?.to_string();

        Some(Self {
            agent_id: wizard.agent().agent_id.clone(),
            name: config.name().to_string(),
            environment: config.environment(),
            instance_type: config.instance_type(),
            region: config.region().to_string(),
            replicas: config.replicas(),
            api_key,
            request_token: wizard.request_token().to_string(),
            deployed_at: Utc::now(),
        })
    }

    /// Save the receipt readable by the owner only
    pub async fn save(&self, file: &File) -> Result<(), WizardError> {
        file.write_json(self).await?;
        file.set_permissions_600().await?;
        info!("Saved deployment receipt to {}", file.path().display());
        Ok(())
    }

    /// Load a previously saved receipt
    pub async fn load(file: &File) -> Result<Self, WizardError> {
        file.read_json().await
    }
}
