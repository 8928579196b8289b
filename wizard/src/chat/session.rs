//! Chat demo session

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use openapi_client::models::ChatReply;

use crate::errors::WizardError;
use crate::http::client::HttpClient;

/// Chat backend trait for testability
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one message and return the agent's reply
    async fn chat(&self, agent_id: &str, message: &str) -> Result<ChatReply, WizardError>;
}

#[async_trait]
impl ChatBackend for HttpClient {
    async fn chat(&self, agent_id: &str, message: &str) -> Result<ChatReply, WizardError> {
        self.send_chat(agent_id, message).await
    }
}

/// Who wrote a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
    /// Errors surfaced to the user
    System,
}

/// A transcript line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Chat demo session against one agent
#[derive(Debug, Clone)]
pub struct ChatSession {
    agent_id: String,
    messages: Vec<ChatMessage>,
    timeout: Duration,
}

impl ChatSession {
    pub fn new(agent_id: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent_id: agent_id.into(),
            messages: Vec::new(),
            timeout,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Transcript so far, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send a message and append the reply.
    ///
    /// Blank messages are rejected before anything is recorded. A failed
    /// request keeps the user's line and appends a `System` line with the
    /// error, which is also what this returns.
    pub async fn send(
        &mut self,
        backend: &dyn ChatBackend,
        message: &str,
    ) -> Result<&ChatMessage, WizardError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(WizardError::ValidationError("Message is empty".to_string()));
        }

        self.messages.push(ChatMessage::new(ChatRole::User, message));
        debug!("Sending chat message to agent {}", self.agent_id);

        let reply = match tokio::time::timeout(self.timeout, backend.chat(&self.agent_id, message)).await {
            Ok(result) => result,
            Err(_) => Err(WizardError::Timeout(self.timeout)),
        };

        let line = match reply {
            Ok(reply) => ChatMessage {
                role: ChatRole::Agent,
                content: reply.response,
                sent_at: reply.timestamp.unwrap_or_else(Utc::now),
            },
            Err(e) => {
                warn!("Chat with agent {} failed: {}", self.agent_id, e);
                ChatMessage::new(ChatRole::System, chat_error_message(&e))
            }
        };
        self.messages.push(line);

        self.messages
            .last()
            .ok_or_else(|| WizardError::Internal("Transcript is empty".to_string()))
    }
}

fn chat_error_message(err: &WizardError) -> String {
    match err {
        WizardError::SubmissionError(message) => message.clone(),
        WizardError::Timeout(after) => format!("No reply after {}s", after.as_secs()),
        _ => crate::http::chat::GENERIC_CHAT_FAILURE.to_string(),
    }
}
