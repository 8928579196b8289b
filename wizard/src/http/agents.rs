//! Agent catalog API client

use tracing::{info, warn};

use openapi_client::models::{AgentRecord, Envelope};

use crate::errors::WizardError;
use crate::http::client::HttpClient;
use crate::models::agent::AgentDetails;

impl HttpClient {
    /// Look up an agent in the catalog.
    ///
    /// Any failure, including transport errors, is reported as `NotFound`:
    /// the caller renders a page-level error and never enters the deploy flow.
    pub async fn get_agent(&self, agent_id: &str) -> Result<AgentDetails, WizardError> {
        let url = self.endpoint(&["agents", agent_id])?;
        let envelope: Envelope<AgentRecord> = self
            .get(url, "Agent not found")
            .await
            .map_err(|e| {
                warn!("Agent lookup for {} failed: {}", agent_id, e);
                WizardError::NotFound(format!("Agent {}: {}", agent_id, lookup_message(e)))
            })?;

        let record = envelope
            .into_result()
            .map_err(|message| WizardError::NotFound(format!("Agent {}: {}", agent_id, message)))?;

        let details = AgentDetails::from_record(agent_id, record);
        info!("Loaded agent {} ({})", details.agent_id, details.name);
        Ok(details)
    }
}

fn lookup_message(err: WizardError) -> String {
    match err {
        WizardError::SubmissionError(message) => message,
        other => other.to_string(),
    }
}
