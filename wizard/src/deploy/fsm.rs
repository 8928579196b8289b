//! Finite state machine for the deployment wizard

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use openapi_client::models::DeployRequest;

use crate::deploy::gateway::DeploymentGateway;
use crate::errors::WizardError;
use crate::models::agent::AgentDetails;
use crate::models::deployment::{DeploymentConfiguration, DeploymentDefaults, FieldUpdate};
use crate::utils::generate_uuid;

/// Wizard settings
#[derive(Debug, Clone)]
pub struct WizardSettings {
    /// Upper bound on a single deployment request
    pub submit_timeout: Duration,

    /// Overrides applied when deriving a fresh configuration
    pub defaults: DeploymentDefaults,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            submit_timeout: Duration::from_secs(30),
            defaults: DeploymentDefaults::default(),
        }
    }
}

/// Wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    /// Name, environment, framework and model
    Configuration = 1,

    /// Instance type, region and replicas
    Resources = 2,

    /// Summary and submit
    Review = 3,
}

impl WizardStep {
    /// 1-based step number
    pub fn number(&self) -> u8 {
        *self as u8
    }

    fn next(self) -> Self {
        match self {
            WizardStep::Configuration => WizardStep::Resources,
            WizardStep::Resources | WizardStep::Review => WizardStep::Review,
        }
    }

    fn previous(self) -> Self {
        match self {
            WizardStep::Configuration | WizardStep::Resources => WizardStep::Configuration,
            WizardStep::Review => WizardStep::Resources,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WizardStep::Configuration => "Configuration",
            WizardStep::Resources => "Resources",
            WizardStep::Review => "Review & Deploy",
        };
        f.write_str(label)
    }
}

/// Submission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Nothing submitted yet
    Idle,

    /// Deployment request in flight
    Pending,

    /// Deployed; the configuration holds the issued credential
    Success,

    /// Last request failed; the draft is intact and may be resubmitted
    Error,
}

/// The step/status pair a presentation layer renders from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub current_step: WizardStep,
    pub submission_status: SubmissionStatus,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            current_step: WizardStep::Configuration,
            submission_status: SubmissionStatus::Idle,
        }
    }
}

/// Navigation event
#[derive(Debug, Clone)]
pub enum WizardEvent {
    /// Advance one step
    Next,

    /// Go back one step
    Previous,

    /// (Re-)enter the deploy flow for an agent
    OpenDeployFlow(AgentDetails),
}

/// Proof that a submission was started, consumed by [`DeploymentWizard::complete_submit`]
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    generation: u64,

    /// Agent being deployed
    pub agent_id: String,

    /// Request to send to the gateway
    pub request: DeployRequest,
}

/// Deployment wizard FSM
#[derive(Debug, Clone)]
pub struct DeploymentWizard {
    settings: WizardSettings,
    agent: AgentDetails,
    config: DeploymentConfiguration,
    state: WorkflowState,
    error: Option<String>,
    attempts: u32,
    request_token: String,
    generation: u64,
}

impl DeploymentWizard {
    /// Open a fresh deploy flow for an agent
    pub fn open(agent: AgentDetails, settings: WizardSettings) -> Self {
        let config = DeploymentConfiguration::for_agent(&agent, &settings.defaults);
        info!("Opening deploy flow for agent {}", agent.agent_id);
        Self {
            settings,
            agent,
            config,
            state: WorkflowState::default(),
            error: None,
            attempts: 0,
            request_token: generate_uuid(),
            generation: 0,
        }
    }

    /// Get current step/status
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Get the current draft
    pub fn config(&self) -> &DeploymentConfiguration {
        &self.config
    }

    /// Get the agent this flow deploys
    pub fn agent(&self) -> &AgentDetails {
        &self.agent
    }

    /// Get the last submission error message, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of submissions started for the current draft
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Token sent with the next deployment request
    pub fn request_token(&self) -> &str {
        &self.request_token
    }

    /// Process a navigation event
    pub fn process(&mut self, event: WizardEvent) -> Result<(), WizardError> {
        let status = self.state.submission_status;
        match event {
            WizardEvent::OpenDeployFlow(agent) => {
                if status == SubmissionStatus::Success && agent.agent_id == self.agent.agent_id {
                    info!("Agent {} already deployed, showing result", agent.agent_id);
                    self.state.current_step = WizardStep::Review;
                } else {
                    self.reset(agent);
                }
            }

            WizardEvent::Next | WizardEvent::Previous
                if matches!(status, SubmissionStatus::Pending | SubmissionStatus::Success) =>
            {
                warn!("Ignoring navigation while submission is {:?}", status);
                return Err(WizardError::InvalidTransition(format!(
                    "Cannot change step while submission is {:?}",
                    status
                )));
            }

            WizardEvent::Next => self.move_to(self.state.current_step.next()),
            WizardEvent::Previous => self.move_to(self.state.current_step.previous()),
        }

        Ok(())
    }

    /// Apply a field edit to the draft.
    ///
    /// Rejected edits leave the draft untouched. Accepted edits clear a previous
    /// submission error and issue a new request token.
    pub fn update_field(&mut self, update: FieldUpdate) -> Result<(), WizardError> {
        match self.state.submission_status {
            SubmissionStatus::Pending => return Err(WizardError::SubmissionPending),
            SubmissionStatus::Success => {
                return Err(WizardError::InvalidTransition(
                    "Deployed configuration cannot be edited".to_string(),
                ))
            }
            SubmissionStatus::Idle | SubmissionStatus::Error => {}
        }

        let next = self.config.update(update)?;
        if next != self.config {
            self.config = next;
            self.request_token = generate_uuid();
            self.clear_error();
        }
        Ok(())
    }

    /// Start a submission: mark the flow pending and hand out the request.
    pub fn begin_submit(&mut self) -> Result<SubmissionTicket, WizardError> {
        match (self.state.current_step, self.state.submission_status) {
            (_, SubmissionStatus::Pending) => return Err(WizardError::SubmissionPending),
            (_, SubmissionStatus::Success) => {
                return Err(WizardError::InvalidTransition(
                    "Agent is already deployed".to_string(),
                ))
            }
            (WizardStep::Review, _) => {}
            (step, _) => {
                return Err(WizardError::InvalidTransition(format!(
                    "Submit is only valid at {}, not {}",
                    WizardStep::Review,
                    step
                )))
            }
        }
        self.config.validate_for_submission()?;

        self.state.submission_status = SubmissionStatus::Pending;
        self.error = None;
        self.attempts += 1;
        info!(
            "Submitting deployment {} for agent {} (attempt {})",
            self.config.name(),
            self.agent.agent_id,
            self.attempts
        );

        Ok(SubmissionTicket {
            generation: self.generation,
            agent_id: self.agent.agent_id.clone(),
            request: self.config.to_request(Some(self.request_token.clone())),
        })
    }

    /// Record the outcome of a submission started with [`begin_submit`].
    ///
    /// Tickets from before the flow was reopened are rejected and change nothing.
    ///
    /// [`begin_submit`]: DeploymentWizard::begin_submit
    pub fn complete_submit(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<String, WizardError>,
    ) -> Result<SubmissionStatus, WizardError> {
        if ticket.generation != self.generation
            || self.state.submission_status != SubmissionStatus::Pending
        {
            warn!("Discarding stale submission result for agent {}", ticket.agent_id);
            return Err(WizardError::InvalidTransition(
                "Submission result no longer applies".to_string(),
            ));
        }

        match outcome {
            Ok(credential) => {
                info!("Agent {} deployed as {}", ticket.agent_id, ticket.request.name);
                self.config = self.config.with_credential(credential);
                self.state.submission_status = SubmissionStatus::Success;
            }
            Err(e) => {
                error!("Deployment of agent {} failed: {}", ticket.agent_id, e);
                self.error = Some(e.user_message());
                self.state.submission_status = SubmissionStatus::Error;
            }
        }

        Ok(self.state.submission_status)
    }

    /// Submit the draft through a gateway, bounded by the configured timeout.
    ///
    /// Gateway failures and timeouts end in [`SubmissionStatus::Error`]; only a
    /// rejected transition is returned as `Err`.
    pub async fn submit(
        &mut self,
        gateway: &dyn DeploymentGateway,
    ) -> Result<SubmissionStatus, WizardError> {
        let ticket = self.begin_submit()?;
        let timeout = self.settings.submit_timeout;

        let outcome =
            match tokio::time::timeout(timeout, gateway.deploy(&ticket.agent_id, &ticket.request))
                .await
            {
                Ok(result) => result.map(|response| response.api_key),
                Err(_) => Err(WizardError::Timeout(timeout)),
            };

        self.complete_submit(ticket, outcome)
    }

    fn move_to(&mut self, step: WizardStep) {
        if step != self.state.current_step {
            info!("Wizard step {} -> {}", self.state.current_step, step);
            self.state.current_step = step;
            self.clear_error();
        }
    }

    fn clear_error(&mut self) {
        if self.state.submission_status == SubmissionStatus::Error {
            self.state.submission_status = SubmissionStatus::Idle;
            self.error = None;
        }
    }

    fn reset(&mut self, agent: AgentDetails) {
        info!("Resetting deploy flow for agent {}", agent.agent_id);
        // An in-flight request for the same agent may still land; keep its token
        // so a later submit is deduplicated against it.
        let in_flight = self.state.submission_status == SubmissionStatus::Pending
            && agent.agent_id == self.agent.agent_id;
        if in_flight {
            warn!(
                "Abandoning in-flight deployment for agent {}, keeping request token",
                agent.agent_id
            );
        } else {
            self.request_token = generate_uuid();
        }

        self.config = DeploymentConfiguration::for_agent(&agent, &self.settings.defaults);
        self.agent = agent;
        self.state = WorkflowState::default();
        self.error = None;
        self.attempts = 0;
        self.generation += 1;
    }
}
