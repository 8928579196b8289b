//! API models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

/// Response envelope returned by the marketplace API.
///
/// Successful calls wrap their payload as `{ "Success": ... }`, failures as
/// `{ "error": "..." }`. Some error bodies carry `message` instead of
/// `error`; both decode into [`Envelope::Error`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Envelope<T> {
    Success(T),
    #[serde(rename = "error")]
    Error(String),
}

impl<T> Envelope<T> {
    /// Convert the envelope into a `Result`
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Envelope::Success(payload) => Ok(payload),
            Envelope::Error(message) => Err(message),
        }
    }
}

#[derive(Deserialize)]
struct RawEnvelope<T> {
    #[serde(rename = "Success")]
    success: Option<T>,
    error: Option<String>,
    message: Option<String>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Envelope<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawEnvelope::<T>::deserialize(deserializer)?;
        match (raw.success, raw.error, raw.message) {
            (Some(payload), _, _) => Ok(Envelope::Success(payload)),
            (None, Some(error), _) => Ok(Envelope::Error(error)),
            (None, None, Some(message)) => Ok(Envelope::Error(message)),
            (None, None, None) => Err(de::Error::custom(
                "envelope has neither `Success` nor `error`",
            )),
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Development,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Development => "development",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" | "dev" => Ok(Environment::Development),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

/// Compute class the agent is provisioned on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    #[default]
    Serverless,
    Dedicated,
    Gpu,
}

impl InstanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceType::Serverless => "serverless",
            InstanceType::Dedicated => "dedicated",
            InstanceType::Gpu => "gpu",
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InstanceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "serverless" => Ok(InstanceType::Serverless),
            "dedicated" => Ok(InstanceType::Dedicated),
            "gpu" => Ok(InstanceType::Gpu),
            _ => Err(format!("Invalid instance type: {}", s)),
        }
    }
}

/// Agent record from the catalog. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentRecord {
    pub agent_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub framework: Option<String>,
    pub runtime: Option<String>,
    pub tags: Vec<String>,
    pub capabilities: Vec<String>,
    pub resource_requirements: Option<ResourceRequirements>,
    pub has_memory: Option<bool>,
    pub price_per_request: Option<f64>,
}

/// Resource requirements advertised by an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRequirements {
    pub min_vcpus: Option<u32>,
    pub recommended_vcpus: Option<u32>,
    pub min_memory_mb: Option<u64>,
    pub recommended_memory_mb: Option<u64>,
    pub min_disk_gb: Option<u64>,
    pub recommended_disk_gb: Option<u64>,
    pub requires_gpu: Option<bool>,
}

/// Deployment request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub name: String,
    pub environment: Environment,
    pub framework: String,
    pub model: String,
    pub memory: bool,
    pub streaming: bool,
    pub max_tokens: u32,
    pub instance_type: InstanceType,
    pub region: String,
    pub replicas: u8,

    /// Client-generated token identifying this draft; repeated submits of
    /// the same draft carry the same token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_token: Option<String>,
}

/// Deployment success response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub api_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Chat demo request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Chat demo reply payload (inside `Success`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Error body of a non-2xx response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    pub message: Option<String>,
    pub error: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Message to show to the user, preferring `message` over `error`
    pub fn user_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|m| !m.trim().is_empty())
    }
}
