//! Storage layout configuration

use std::path::PathBuf;

use crate::errors::WizardError;
use crate::filesys::file::File;

/// On-disk layout for the wizard
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all storage
    pub base_dir: PathBuf,
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the settings file
    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    /// Get the logs directory
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the deployment receipts directory
    pub fn deployments_dir(&self) -> PathBuf {
        self.base_dir.join("deployments")
    }

    /// Get the receipt file for an agent
    pub fn receipt_file(&self, agent_id: &str) -> File {
        let file_name: String = agent_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        File::new(self.deployments_dir().join(format!("{}.json", file_name)))
    }

    /// Create the directories
    pub async fn setup(&self) -> Result<(), WizardError> {
        tokio::fs::create_dir_all(self.logs_dir()).await?;
        tokio::fs::create_dir_all(self.deployments_dir()).await?;
        Ok(())
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(".deploy-wizard"))
    }
}
