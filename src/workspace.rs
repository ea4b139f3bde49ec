//! Workspace resolution and enumeration

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::PowerBiClient;
use crate::dataset::{Dataset, DatasetEntry};
use crate::error::PbiError;

#[derive(Debug, Deserialize)]
struct Listing<T> {
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    id: String,
    name: String,
}

/// All workspaces visible to the service principal: name -> group id
pub fn list_workspaces(client: &PowerBiClient) -> Result<BTreeMap<String, String>, PbiError> {
    let listing: Listing<GroupEntry> = client.get(&client.url("/groups"))?.into_json()?;
    Ok(listing
        .value
        .into_iter()
        .map(|group| (group.name, group.id))
        .collect())
}

/// A Power BI workspace (group) and the datasets fetched for it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub name: String,
    pub group_id: String,
    pub datasets: BTreeMap<String, Dataset>,
}

impl Workspace {
    /// A workspace handle with no datasets loaded
    pub fn new(name: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group_id: group_id.into(),
            datasets: BTreeMap::new(),
        }
    }

    /// Resolve a workspace from a display name or a group id.
    ///
    /// Names present in `known` resolve without a request. Anything else is
    /// taken as a group id and looked up with a single `GET /groups`.
    pub fn resolve(
        client: &PowerBiClient,
        known: &HashMap<String, String>,
        name_or_id: &str,
    ) -> Result<Self, PbiError> {
        if let Some(group_id) = known.get(name_or_id) {
            debug!("Workspace '{}' found in config ({})", name_or_id, group_id);
            return Ok(Self::new(name_or_id, group_id.clone()));
        }

        let name = list_workspaces(client)?
            .into_iter()
            .find(|(_, id)| id.eq_ignore_ascii_case(name_or_id))
            .map(|(name, _)| name)
            .ok_or_else(|| PbiError::WorkspaceNotFound(name_or_id.to_string()))?;

        debug!("Resolved workspace id {} to '{}'", name_or_id, name);
        Ok(Self::new(name, name_or_id))
    }

    /// Fetch the workspace's datasets, skipping names in `excluded`, and
    /// cache them on the handle. Refresh history is not fetched.
    pub fn fetch_datasets(
        &mut self,
        client: &PowerBiClient,
        excluded: &[String],
    ) -> Result<&BTreeMap<String, Dataset>, PbiError> {
        let url = client.group_url(&self.group_id, "/datasets");
        let listing: Listing<DatasetEntry> = client.get(&url)?.into_json()?;

        self.datasets = listing
            .value
            .into_iter()
            .filter(|entry| !excluded.iter().any(|name| name == &entry.name))
            .map(|entry| (entry.name.clone(), Dataset::from_entry(&self.group_id, entry)))
            .collect();

        debug!(
            "Workspace '{}' has {} dataset(s)",
            self.name,
            self.datasets.len()
        );
        Ok(&self.datasets)
    }

    /// Look up a fetched dataset by name
    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    /// Take a fetched dataset by name, or fail with the known names
    pub fn take_dataset(&mut self, name: &str) -> Result<Dataset, PbiError> {
        self.datasets.remove(name).ok_or_else(|| {
            let known: Vec<&str> = self.datasets.keys().map(String::as_str).collect();
            PbiError::DatasetNotFound {
                workspace: self.name.clone(),
                dataset: name.to_string(),
                available: if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                },
            }
        })
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Workspace: {}", self.name)
    }
}
