//! HTTP client tests against an in-process stub backend

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use deploy_wizard::deploy::fsm::{DeploymentWizard, SubmissionStatus, WizardEvent, WizardSettings};
use deploy_wizard::errors::WizardError;
use deploy_wizard::http::client::HttpClient;
use deploy_wizard::models::deployment::FieldUpdate;
use openapi_client::models::{ChatRequest, DeployRequest};

#[derive(Clone, Default)]
struct Backend {
    idempotency_keys: Arc<Mutex<Vec<String>>>,
}

async fn agent_handler(Path(agent_id): Path<String>) -> (StatusCode, Json<Value>) {
    match agent_id.as_str() {
        "writer" => (
            StatusCode::OK,
            Json(json!({
                "Success": {
                    "agent_id": "writer",
                    "name": "Blog Writer",
                    "resource_requirements": { "recommended_memory_mb": 4096 }
                }
            })),
        ),
        "sparse" => (StatusCode::OK, Json(json!({ "Success": {} }))),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Agent not found" })),
        ),
    }
}

async fn deploy_handler(
    State(backend): State<Backend>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<DeployRequest>,
) -> (StatusCode, Json<Value>) {
    if let Some(key) = headers.get("idempotency-key").and_then(|v| v.to_str().ok()) {
        backend.idempotency_keys.lock().unwrap().push(key.to_string());
    }

    if request.replicas > 5 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Replica quota exceeded" })),
        );
    }
    if request.name == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
    }

    (
        StatusCode::OK,
        Json(json!({ "apiKey": format!("key-{}-{}", agent_id, request.name), "deploymentId": "d-1" })),
    )
}

async fn chat_handler(
    Path(agent_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> (StatusCode, Json<Value>) {
    if request.message == "boom" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Chat backend unavailable" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "Success": { "response": format!("{} says hi to {}", agent_id, request.message) } })),
    )
}

async fn spawn_backend(backend: Backend) -> String {
    let router = Router::new()
        .route("/api/agents/{agent_id}", get(agent_handler))
        .route("/api/agents/{agent_id}/deploy", post(deploy_handler))
        .route("/api/agents/{agent_id}/chat", post(chat_handler))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn client(base_url: &str) -> HttpClient {
    HttpClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_get_agent_decodes_envelope() {
    let base_url = spawn_backend(Backend::default()).await;
    let client = client(&base_url);

    let agent = client.get_agent("writer").await.unwrap();
    assert_eq!(agent.name, "Blog Writer");
    assert_eq!(agent.framework, "LangChain");
    assert_eq!(agent.min_memory_mb, 1024);
    assert_eq!(agent.recommended_memory_mb, 4096);

    let agent = client.get_agent("sparse").await.unwrap();
    assert_eq!(agent.agent_id, "sparse");
    assert_eq!(agent.name, "sparse");
}

#[tokio::test]
async fn test_get_agent_not_found() {
    let base_url = spawn_backend(Backend::default()).await;
    let err = client(&base_url).get_agent("ghost").await.unwrap_err();
    match err {
        WizardError::NotFound(message) => assert!(message.contains("Agent not found")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_deploy_through_wizard() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let client = client(&base_url);

    let agent = client.get_agent("writer").await.unwrap();
    let mut wizard = DeploymentWizard::open(agent, WizardSettings::default());
    wizard.process(WizardEvent::Next).unwrap();
    wizard.process(WizardEvent::Next).unwrap();

    let status = wizard.submit(&client).await.unwrap();
    assert_eq!(status, SubmissionStatus::Success);
    assert_eq!(
        wizard.config().issued_credential(),
        Some("key-writer-blog writer-prod")
    );

    let keys = backend.idempotency_keys.lock().unwrap().clone();
    assert_eq!(keys, vec![wizard.request_token().to_string()]);
}

#[tokio::test]
async fn test_deploy_error_messages() {
    let base_url = spawn_backend(Backend::default()).await;
    let client = client(&base_url);

    let agent = client.get_agent("writer").await.unwrap();
    let mut wizard = DeploymentWizard::open(agent, WizardSettings::default());
    wizard.update_field(FieldUpdate::Replicas(8)).unwrap();
    wizard.process(WizardEvent::Next).unwrap();
    wizard.process(WizardEvent::Next).unwrap();

    // Server message is shown verbatim
    assert_eq!(wizard.submit(&client).await.unwrap(), SubmissionStatus::Error);
    assert_eq!(wizard.error(), Some("Replica quota exceeded"));

    // No message in the body falls back to the generic text
    wizard.update_field(FieldUpdate::Replicas(2)).unwrap();
    wizard.update_field(FieldUpdate::Name("broken".to_string())).unwrap();
    assert_eq!(wizard.submit(&client).await.unwrap(), SubmissionStatus::Error);
    assert_eq!(wizard.error(), Some("Failed to deploy agent"));

    // Fixing the draft and retrying succeeds
    wizard.update_field(FieldUpdate::Name("writer-prod".to_string())).unwrap();
    assert_eq!(wizard.submit(&client).await.unwrap(), SubmissionStatus::Success);
}

#[tokio::test]
async fn test_network_failure_is_generic() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client(&format!("http://{}/api", addr));

    assert!(matches!(
        client.get_agent("writer").await,
        Err(WizardError::NotFound(_))
    ));

    let agent = crate::support::test_agent("writer", "Blog Writer");
    let mut wizard = DeploymentWizard::open(agent, WizardSettings::default());
    wizard.process(WizardEvent::Next).unwrap();
    wizard.process(WizardEvent::Next).unwrap();
    assert_eq!(wizard.submit(&client).await.unwrap(), SubmissionStatus::Error);
    assert_eq!(wizard.error(), Some("Failed to deploy agent"));
}

#[tokio::test]
async fn test_chat() {
    let base_url = spawn_backend(Backend::default()).await;
    let client = client(&base_url);

    let reply = client.send_chat("writer", "hello").await.unwrap();
    assert_eq!(reply.response, "writer says hi to hello");

    match client.send_chat("writer", "boom").await {
        Err(WizardError::SubmissionError(message)) => {
            assert_eq!(message, "Chat backend unavailable")
        }
        other => panic!("expected SubmissionError, got {other:?}"),
    }
}
