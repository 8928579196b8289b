//! Per-agent wizard sessions

use std::collections::HashMap;

use tracing::debug;

use crate::deploy::fsm::{DeploymentWizard, WizardEvent, WizardSettings};
use crate::errors::WizardError;
use crate::models::agent::AgentDetails;

/// Wizard session entry
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub wizard: DeploymentWizard,
    pub touched_at: u64,
}

/// In-memory wizard sessions keyed by agent ID.
///
/// Each agent gets an independent wizard. When full, the least recently
/// opened session is evicted.
pub struct WizardSessions {
    entries: HashMap<String, SessionEntry>,
    capacity: usize,
    settings: WizardSettings,
    clock: u64,
}

impl WizardSessions {
    /// Create a new session registry
    pub fn new(capacity: usize, settings: WizardSettings) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            settings,
            clock: 0,
        }
    }

    /// Open the deploy flow for an agent.
    ///
    /// An existing session receives `OpenDeployFlow`, so a deployed agent
    /// shows its result and any other session starts over.
    pub fn open(&mut self, agent: AgentDetails) -> Result<&mut DeploymentWizard, WizardError> {
        self.clock += 1;
        let agent_id = agent.agent_id.clone();

        if !self.entries.contains_key(&agent_id) && self.entries.len() >= self.capacity {
            if let Some(oldest_id) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.touched_at)
                .map(|(id, _)| id.clone())
            {
                debug!("Evicting wizard session for agent {}", oldest_id);
                self.entries.remove(&oldest_id);
            }
        }

        let clock = self.clock;
        let entry = match self.entries.entry(agent_id) {
            std::collections::hash_map::Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                entry.wizard.process(WizardEvent::OpenDeployFlow(agent))?;
                entry
            }
            std::collections::hash_map::Entry::Vacant(vacant) => vacant.insert(SessionEntry {
                wizard: DeploymentWizard::open(agent, self.settings.clone()),
                touched_at: clock,
            }),
        };
        entry.touched_at = clock;
        Ok(&mut entry.wizard)
    }

    /// Get the session for an agent without reopening it
    pub fn get_mut(&mut self, agent_id: &str) -> Option<&mut DeploymentWizard> {
        self.entries.get_mut(agent_id).map(|e| &mut e.wizard)
    }

    /// Remove an agent's session
    pub fn remove(&mut self, agent_id: &str) -> Option<SessionEntry> {
        self.entries.remove(agent_id)
    }

    /// Get session count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no sessions
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
