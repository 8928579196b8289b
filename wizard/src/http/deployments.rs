//! Deployment API client

use async_trait::async_trait;

use openapi_client::models::{DeployRequest, DeployResponse};

use crate::deploy::gateway::DeploymentGateway;
use crate::errors::{WizardError, GENERIC_DEPLOY_FAILURE};
use crate::http::client::HttpClient;

/// Header carrying the client-generated request token
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

impl HttpClient {
    /// Deploy an agent with the given configuration
    pub async fn deploy_agent(
        &self,
        agent_id: &str,
        request: &DeployRequest,
    ) -> Result<DeployResponse, WizardError> {
        let url = self.endpoint(&["agents", agent_id, "deploy"])?;
        let headers: Vec<(&str, &str)> = request
            .request_token
            .as_deref()
            .map(|token| vec![(IDEMPOTENCY_KEY_HEADER, token)])
            .unwrap_or_default();

        let response: DeployResponse = self
            .post(url, request, &headers, GENERIC_DEPLOY_FAILURE)
            .await?;

        if response.api_key.trim().is_empty() {
            return Err(WizardError::SubmissionError(
                "Deployment response did not include an API key".to_string(),
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl DeploymentGateway for HttpClient {
    async fn deploy(
        &self,
        agent_id: &str,
        request: &DeployRequest,
    ) -> Result<DeployResponse, WizardError> {
        self.deploy_agent(agent_id, request).await
    }
}
