//! Wizard FSM tests

use std::time::Duration;

use deploy_wizard::deploy::fsm::{
    DeploymentWizard, SubmissionStatus, WizardEvent, WizardSettings, WizardStep, WorkflowState,
};
use deploy_wizard::errors::WizardError;
use deploy_wizard::models::deployment::FieldUpdate;
use openapi_client::models::Environment;

use crate::support::{test_agent, wizard_at_review, ScriptedGateway};

#[test]
fn test_wizard_initial_state() {
    let wizard = DeploymentWizard::open(test_agent("agent-1", "My Agent"), WizardSettings::default());
    assert_eq!(wizard.state().current_step, WizardStep::Configuration);
    assert_eq!(wizard.state().submission_status, SubmissionStatus::Idle);
    assert_eq!(wizard.config().name(), "my agent-prod");
    assert_eq!(wizard.config().environment(), Environment::Production);
    assert_eq!(wizard.config().replicas(), 1);
    assert!(wizard.error().is_none());
    assert_eq!(wizard.attempts(), 0);
}

#[test]
fn test_step_floor_and_ceiling() {
    let mut wizard = DeploymentWizard::open(test_agent("agent-1", "My Agent"), WizardSettings::default());

    // Configuration has no previous step
    wizard.process(WizardEvent::Previous).unwrap();
    assert_eq!(wizard.state().current_step, WizardStep::Configuration);

    // Review has no next step
    let mut wizard = wizard_at_review();
    wizard.process(WizardEvent::Next).unwrap();
    assert_eq!(wizard.state().current_step, WizardStep::Review);
}

#[test]
fn test_reopen_is_idempotent() {
    let agent = test_agent("agent-1", "My Agent");
    let mut wizard = DeploymentWizard::open(agent.clone(), WizardSettings::default());
    wizard.process(WizardEvent::Next).unwrap();
    wizard.update_field(FieldUpdate::Replicas(4)).unwrap();

    wizard.process(WizardEvent::OpenDeployFlow(agent.clone())).unwrap();
    let first = wizard.state();
    wizard.process(WizardEvent::OpenDeployFlow(agent)).unwrap();
    let second = wizard.state();

    assert_eq!(first, WorkflowState::default());
    assert_eq!(first, second);
    assert_eq!(wizard.config().replicas(), 1);
}

#[tokio::test]
async fn test_submit_success_path() {
    let mut wizard = wizard_at_review();
    let before = wizard.config().clone();
    let gateway = ScriptedGateway::new(vec![Ok("abc123")]);

    assert_eq!(wizard.state().submission_status, SubmissionStatus::Idle);
    let ticket = wizard.begin_submit().unwrap();
    assert_eq!(wizard.state().submission_status, SubmissionStatus::Pending);
    wizard.complete_submit(ticket, Ok("abc123".to_string())).unwrap();

    assert_eq!(wizard.state().submission_status, SubmissionStatus::Success);
    assert_eq!(wizard.state().current_step, WizardStep::Review);
    assert_eq!(wizard.config().issued_credential(), Some("abc123"));
    assert_eq!(wizard.config().name(), before.name());
    assert_eq!(wizard.config().region(), before.region());
    assert_eq!(wizard.config().replicas(), before.replicas());

    // Through the gateway as well
    let mut wizard = wizard_at_review();
    let status = wizard.submit(&gateway).await.unwrap();
    assert_eq!(status, SubmissionStatus::Success);
    assert_eq!(wizard.config().issued_credential(), Some("abc123"));

    let requests = gateway.recorded();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "agent-1");
    assert_eq!(requests[0].1.name, "my agent-prod");
}

#[tokio::test]
async fn test_submit_error_then_retry() {
    let mut wizard = wizard_at_review();
    wizard.update_field(FieldUpdate::Replicas(3)).unwrap();
    wizard.update_field(FieldUpdate::Region("eu-west-1".to_string())).unwrap();
    let draft = wizard.config().clone();
    let gateway = ScriptedGateway::new(vec![Err("Region capacity exhausted"), Ok("key-2")]);

    let status = wizard.submit(&gateway).await.unwrap();
    assert_eq!(status, SubmissionStatus::Error);
    assert_eq!(wizard.state().current_step, WizardStep::Review);
    assert_eq!(wizard.error(), Some("Region capacity exhausted"));
    assert_eq!(wizard.config(), &draft);
    assert!(wizard.config().issued_credential().is_none());

    let status = wizard.submit(&gateway).await.unwrap();
    assert_eq!(status, SubmissionStatus::Success);
    assert!(wizard.error().is_none());
    assert_eq!(wizard.attempts(), 2);
    assert_eq!(wizard.config().replicas(), 3);
    assert_eq!(wizard.config().region(), "eu-west-1");

    // Both attempts describe the same draft and share its request token
    let requests = gateway.recorded();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].1, requests[1].1);
    assert!(requests[0].1.request_token.is_some());
}

#[tokio::test]
async fn test_reopen_after_success_shows_result() {
    let agent = test_agent("agent-1", "My Agent");
    let mut wizard = wizard_at_review();
    let gateway = ScriptedGateway::new(vec![Ok("abc123")]);
    wizard.submit(&gateway).await.unwrap();

    wizard.process(WizardEvent::OpenDeployFlow(agent)).unwrap();
    assert_eq!(wizard.state().current_step, WizardStep::Review);
    assert_eq!(wizard.state().submission_status, SubmissionStatus::Success);
    assert_eq!(wizard.config().issued_credential(), Some("abc123"));

    // A different agent starts over
    wizard
        .process(WizardEvent::OpenDeployFlow(test_agent("agent-2", "Other Agent")))
        .unwrap();
    assert_eq!(wizard.state(), WorkflowState::default());
    assert_eq!(wizard.config().name(), "other agent-prod");
    assert!(wizard.config().issued_credential().is_none());
}

#[tokio::test]
async fn test_deployed_config_is_locked() {
    let mut wizard = wizard_at_review();
    let gateway = ScriptedGateway::new(vec![Ok("abc123")]);
    wizard.submit(&gateway).await.unwrap();

    assert!(wizard.update_field(FieldUpdate::Replicas(2)).is_err());
    assert!(wizard.process(WizardEvent::Previous).is_err());
    assert!(matches!(
        wizard.submit(&gateway).await,
        Err(WizardError::InvalidTransition(_))
    ));
    assert_eq!(gateway.recorded().len(), 1);
}

#[tokio::test]
async fn test_submit_rejects_empty_name() {
    let mut wizard = wizard_at_review();
    wizard.update_field(FieldUpdate::Name(String::new())).unwrap();
    let gateway = ScriptedGateway::new(vec![]);

    assert!(matches!(
        wizard.submit(&gateway).await,
        Err(WizardError::ValidationError(_))
    ));
    assert_eq!(wizard.state().submission_status, SubmissionStatus::Idle);
    assert!(gateway.recorded().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_submit_times_out() {
    let settings = WizardSettings {
        submit_timeout: Duration::from_secs(30),
        ..Default::default()
    };
    let mut wizard = DeploymentWizard::open(test_agent("agent-1", "My Agent"), settings);
    wizard.process(WizardEvent::Next).unwrap();
    wizard.process(WizardEvent::Next).unwrap();
    let gateway = ScriptedGateway::new(vec![Ok("too-late")]).with_delay(Duration::from_secs(60));

    let status = wizard.submit(&gateway).await.unwrap();
    assert_eq!(status, SubmissionStatus::Error);
    assert_eq!(wizard.error(), Some("Deployment timed out after 30s"));
    assert!(wizard.config().issued_credential().is_none());
}

#[test]
fn test_error_cleared_by_edit() {
    let mut wizard = wizard_at_review();
    let ticket = wizard.begin_submit().unwrap();
    wizard
        .complete_submit(ticket, Err(WizardError::NetworkError("reset".to_string())))
        .unwrap();
    assert_eq!(wizard.error(), Some("Failed to deploy agent"));

    let token = wizard.request_token().to_string();
    wizard.update_field(FieldUpdate::Replicas(2)).unwrap();
    assert_eq!(wizard.state().submission_status, SubmissionStatus::Idle);
    assert!(wizard.error().is_none());
    assert_ne!(wizard.request_token(), token);
}
