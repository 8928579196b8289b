//! Submission gateway

use async_trait::async_trait;

use openapi_client::models::{DeployRequest, DeployResponse};

use crate::errors::WizardError;

/// The boundary performing the one external deploy call per submission.
///
/// Implemented by [`HttpClient`](crate::http::client::HttpClient); tests
/// substitute scripted gateways.
#[async_trait]
pub trait DeploymentGateway: Send + Sync {
    /// Send one deployment request and translate the response
    async fn deploy(
        &self,
        agent_id: &str,
        request: &DeployRequest,
    ) -> Result<DeployResponse, WizardError>;
}
