//! Agent catalog models

use openapi_client::models::AgentRecord;

/// Framework assumed when the catalog does not name one
pub const FALLBACK_FRAMEWORK: &str = "LangChain";

/// Minimum memory assumed when the catalog omits it
pub const FALLBACK_MIN_MEMORY_MB: u64 = 1024;

/// An agent as seen by the deployment flow, with catalog gaps filled in
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDetails {
    /// Catalog identifier
    pub agent_id: String,

    /// Display name
    pub name: String,

    pub description: String,

    /// Framework the agent is built on
    pub framework: String,

    /// Minimum memory in MB
    pub min_memory_mb: u64,

    /// Recommended memory in MB
    pub recommended_memory_mb: u64,

    /// Whether the agent needs a GPU instance
    pub requires_gpu: bool,

    /// Whether the agent keeps conversational memory
    pub has_memory: bool,

    pub tags: Vec<String>,
}

impl AgentDetails {
    /// Build details from a catalog record.
    ///
    /// `requested_id` is the identifier the lookup was made with; it stands in
    /// for a missing `agent_id`, and the id stands in for a missing name.
    pub fn from_record(requested_id: &str, record: AgentRecord) -> Self {
        let agent_id = non_empty(record.agent_id).unwrap_or_else(|| requested_id.to_string());
        let name = non_empty(record.name).unwrap_or_else(|| agent_id.clone());
        let requirements = record.resource_requirements.unwrap_or_default();
        let min_memory_mb = requirements.min_memory_mb.unwrap_or(FALLBACK_MIN_MEMORY_MB);

        Self {
            agent_id,
            name,
            description: record.description.unwrap_or_default(),
            framework: non_empty(record.framework)
                .unwrap_or_else(|| FALLBACK_FRAMEWORK.to_string()),
            min_memory_mb,
            recommended_memory_mb: requirements
                .recommended_memory_mb
                .unwrap_or(min_memory_mb.saturating_mul(2))
                .max(min_memory_mb),
            requires_gpu: requirements.requires_gpu.unwrap_or(false),
            has_memory: record.has_memory.unwrap_or(false),
            tags: record.tags,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
