//! Shared test helpers

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use deploy_wizard::deploy::fsm::{DeploymentWizard, WizardEvent, WizardSettings};
use deploy_wizard::deploy::gateway::DeploymentGateway;
use deploy_wizard::errors::WizardError;
use deploy_wizard::models::agent::AgentDetails;
use openapi_client::models::{DeployRequest, DeployResponse};

pub fn test_agent(id: &str, name: &str) -> AgentDetails {
    AgentDetails {
        agent_id: id.to_string(),
        name: name.to_string(),
        description: "test agent".to_string(),
        framework: "LangChain".to_string(),
        min_memory_mb: 1024,
        recommended_memory_mb: 2048,
        requires_gpu: false,
        has_memory: false,
        tags: vec![],
    }
}

/// Wizard for "My Agent" advanced to the review step
pub fn wizard_at_review() -> DeploymentWizard {
    let mut wizard = DeploymentWizard::open(test_agent("agent-1", "My Agent"), WizardSettings::default());
    wizard.process(WizardEvent::Next).unwrap();
    wizard.process(WizardEvent::Next).unwrap();
    wizard
}

/// Gateway replaying a fixed script of outcomes and recording every request
pub struct ScriptedGateway {
    outcomes: Mutex<VecDeque<Result<String, String>>>,
    pub requests: Mutex<Vec<(String, DeployRequest)>>,
    delay: Option<Duration>,
}

impl ScriptedGateway {
    pub fn new(outcomes: Vec<Result<&str, &str>>) -> Self {
        Self {
            outcomes: Mutex::new(
                outcomes
                    .into_iter()
                    .map(|o| o.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn recorded(&self) -> Vec<(String, DeployRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeploymentGateway for ScriptedGateway {
    async fn deploy(
        &self,
        agent_id: &str,
        request: &DeployRequest,
    ) -> Result<DeployResponse, WizardError> {
        self.requests
            .lock()
            .unwrap()
            .push((agent_id.to_string(), request.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("gateway called more often than scripted");

        match outcome {
            Ok(api_key) => Ok(DeployResponse {
                api_key,
                deployment_id: None,
                endpoint: None,
            }),
            Err(message) => Err(WizardError::SubmissionError(message)),
        }
    }
}
