//! CLI command implementations

pub mod dataset;
pub mod init;
pub mod workspace;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use pbi_workspace::{Config, Dataset, PowerBiClient, Workspace};

/// How command results are printed
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered =
            serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", rendered);
        Ok(())
    }
}

/// Loaded config plus a client built from it
pub struct Session {
    pub config: Config,
    pub client: PowerBiClient,
}

impl Session {
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_path)?;
        let credentials = config.resolved_credentials()?;
        let client = PowerBiClient::new(&config.settings, credentials);
        Ok(Self { config, client })
    }

    /// Resolve the requested workspace, or the configured default
    pub fn workspace(&self, requested: Option<&str>) -> Result<Workspace> {
        let name_or_id = self.config.workspace_or_default(requested)?;
        Workspace::resolve(&self.client, &self.config.workspaces, name_or_id)
            .with_context(|| format!("Failed to resolve workspace '{}'", name_or_id))
    }

    /// Resolve the workspace, list its datasets and pick one by name
    pub fn dataset(&self, requested_workspace: Option<&str>, name: &str) -> Result<Dataset> {
        let mut workspace = self.workspace(requested_workspace)?;
        let label = workspace.name.clone();
        workspace
            .fetch_datasets(&self.client, &self.config.settings.excluded_datasets)
            .with_context(|| format!("Failed to list datasets of workspace '{}'", label))?;
        Ok(workspace.take_dataset(name)?)
    }
}
