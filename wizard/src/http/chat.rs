//! Chat demo API client

use openapi_client::models::{ChatReply, ChatRequest, Envelope};

use crate::errors::WizardError;
use crate::http::client::HttpClient;

/// Message shown when a chat request fails without a server message
pub const GENERIC_CHAT_FAILURE: &str = "Failed to get chat response";

impl HttpClient {
    /// Send one chat message to an agent's demo endpoint
    pub async fn send_chat(&self, agent_id: &str, message: &str) -> Result<ChatReply, WizardError> {
        let url = self.endpoint(&["agents", agent_id, "chat"])?;
        let request = ChatRequest {
            message: message.to_string(),
        };

        let envelope: Envelope<ChatReply> = self.post(url, &request, &[], GENERIC_CHAT_FAILURE).await?;
        envelope.into_result().map_err(WizardError::SubmissionError)
    }
}
