//! Deployment configuration model

use serde::{Deserialize, Serialize};
use tracing::warn;

use openapi_client::models::{DeployRequest, Environment, InstanceType};

use crate::errors::WizardError;
use crate::models::agent::AgentDetails;

pub const DEFAULT_FRAMEWORK: &str = "formation-agent";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const MIN_REPLICAS: u8 = 1;
pub const MAX_REPLICAS: u8 = 10;

/// Regions a deployment may target
pub const REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-2",
    "eu-west-1",
    "eu-central-1",
    "ap-southeast-1",
    "ap-northeast-1",
];

/// Overrides for the built-in deployment defaults, read from settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDefaults {
    #[serde(default)]
    pub framework: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub region: Option<String>,
}

/// A single field edit
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Name(String),
    Environment(Environment),
    Framework(String),
    Model(String),
    MemoryEnabled(bool),
    StreamingEnabled(bool),
    MaxTokens(i64),
    InstanceType(InstanceType),
    Region(String),
    Replicas(i64),
}

impl FieldUpdate {
    /// Field name as shown to users
    pub fn field(&self) -> &'static str {
        match self {
            FieldUpdate::Name(_) => "name",
            FieldUpdate::Environment(_) => "environment",
            FieldUpdate::Framework(_) => "framework",
            FieldUpdate::Model(_) => "model",
            FieldUpdate::MemoryEnabled(_) => "memory",
            FieldUpdate::StreamingEnabled(_) => "streaming",
            FieldUpdate::MaxTokens(_) => "maxTokens",
            FieldUpdate::InstanceType(_) => "instanceType",
            FieldUpdate::Region(_) => "region",
            FieldUpdate::Replicas(_) => "replicas",
        }
    }
}

/// The draft describing how an agent should be provisioned.
///
/// Fields are read through accessors; edits go through [`update`] so the
/// replica and token bounds always hold.
///
/// [`update`]: DeploymentConfiguration::update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfiguration {
    name: String,
    environment: Environment,
    framework: String,
    model: String,
    memory_enabled: bool,
    streaming_enabled: bool,
    max_tokens: u32,
    instance_type: InstanceType,
    region: String,
    replicas: u8,
    issued_credential: Option<String>,
}

impl DeploymentConfiguration {
    /// Create a configuration with all defaults for the given agent name
    pub fn create(agent_name: &str) -> Self {
        Self {
            name: format!("{}-prod", agent_name.to_lowercase()),
            environment: Environment::Production,
            framework: DEFAULT_FRAMEWORK.to_string(),
            model: DEFAULT_MODEL.to_string(),
            memory_enabled: false,
            streaming_enabled: true,
            max_tokens: DEFAULT_MAX_TOKENS,
            instance_type: InstanceType::Serverless,
            region: DEFAULT_REGION.to_string(),
            replicas: MIN_REPLICAS,
            issued_credential: None,
        }
    }

    /// Create a configuration seeded from a catalog agent and settings overrides
    pub fn for_agent(agent: &AgentDetails, defaults: &DeploymentDefaults) -> Self {
        let mut config = Self::create(&agent.name);

        config.framework = defaults
            .framework
            .clone()
            .unwrap_or_else(|| agent.framework.to_lowercase());
        if let Some(model) = &defaults.model {
            config.model = model.clone();
        }
        if let Some(region) = defaults.region.as_deref().filter(|r| REGIONS.contains(r)) {
            config.region = region.to_string();
        }
        config.memory_enabled = agent.has_memory;
        if agent.requires_gpu {
            config.instance_type = InstanceType::Gpu;
        }

        config
    }

    /// Return an updated copy, or a validation error if the value is out of bounds
    pub fn update(&self, update: FieldUpdate) -> Result<Self, WizardError> {
        if self.issued_credential.is_some() {
            return Err(WizardError::ValidationError(
                "Configuration is locked after a successful deployment".to_string(),
            ));
        }

        let field = update.field();
        let mut next = self.clone();
        match update {
            FieldUpdate::Name(name) => next.name = name,
            FieldUpdate::Environment(environment) => next.environment = environment,
            FieldUpdate::Framework(framework) => next.framework = framework,
            FieldUpdate::Model(model) => next.model = model,
            FieldUpdate::MemoryEnabled(enabled) => next.memory_enabled = enabled,
            FieldUpdate::StreamingEnabled(enabled) => next.streaming_enabled = enabled,
            FieldUpdate::MaxTokens(value) => {
                if value <= 0 {
                    return Err(reject(field, value, "must be a positive integer"));
                }
                next.max_tokens = u32::try_from(value).map_err(|_| {
                    reject(field, value, &format!("must be at most {}", u32::MAX))
                })?;
            }
            FieldUpdate::InstanceType(instance_type) => next.instance_type = instance_type,
            FieldUpdate::Region(region) => {
                if !REGIONS.contains(&region.as_str()) {
                    warn!("Rejected {} edit: unknown region {}", field, region);
                    return Err(WizardError::ValidationError(format!(
                        "Unknown region: {}",
                        region
                    )));
                }
                next.region = region;
            }
            FieldUpdate::Replicas(value) => {
                next.replicas = u8::try_from(value)
                    .ok()
                    .filter(|v| (MIN_REPLICAS..=MAX_REPLICAS).contains(v))
                    .ok_or_else(|| {
                        reject(
                            field,
                            value,
                            &format!("must be between {} and {}", MIN_REPLICAS, MAX_REPLICAS),
                        )
                    })?;
            }
        }

        Ok(next)
    }

    /// Check the rules that only apply when the draft is submitted
    pub fn validate_for_submission(&self) -> Result<(), WizardError> {
        if self.name.trim().is_empty() {
            return Err(WizardError::ValidationError(
                "Deployment name is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Assemble the wire request. The issued credential is never sent.
    pub fn to_request(&self, request_token: Option<String>) -> DeployRequest {
        DeployRequest {
            name: self.name.clone(),
            environment: self.environment,
            framework: self.framework.clone(),
            model: self.model.clone(),
            memory: self.memory_enabled,
            streaming: self.streaming_enabled,
            max_tokens: self.max_tokens,
            instance_type: self.instance_type,
            region: self.region.clone(),
            replicas: self.replicas,
            request_token,
        }
    }

    pub(crate) fn with_credential(&self, credential: String) -> Self {
        let mut next = self.clone();
        next.issued_credential = Some(credential);
        next
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn framework(&self) -> &str {
        &self.framework
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn memory_enabled(&self) -> bool {
        self.memory_enabled
    }

    pub fn streaming_enabled(&self) -> bool {
        self.streaming_enabled
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn instance_type(&self) -> InstanceType {
        self.instance_type
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn replicas(&self) -> u8 {
        self.replicas
    }

    /// Credential issued by a successful deployment
    pub fn issued_credential(&self) -> Option<&str> {
        self.issued_credential.as_deref()
    }
}

fn reject(field: &str, value: i64, rule: &str) -> WizardError {
    warn!("Rejected {} edit: {} {}", field, value, rule);
    WizardError::ValidationError(format!("{} {} (got {})", field, rule, value))
}
