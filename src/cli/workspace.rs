//! Workspace and dataset listing commands

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use pbi_workspace::{list_workspaces, Dataset, PbiError};

use super::{Output, Session};

/// List all workspaces visible to the service principal
pub fn workspaces_command(config_path: Option<&Path>, output: Output) -> Result<()> {
    let session = Session::open(config_path)?;
    let workspaces = list_workspaces(&session.client).context("Failed to list workspaces")?;

    if output.is_json() {
        return output.print_json(&workspaces);
    }

    if workspaces.is_empty() {
        println!("No workspaces visible to this service principal.");
        return Ok(());
    }

    println!("Workspaces ({}):\n", workspaces.len());
    for (name, id) in &workspaces {
        let marker = if session.config.workspaces.contains_key(name) {
            " (configured)"
        } else {
            ""
        };
        println!("  {}  {}{}", id, name, marker);
    }

    Ok(())
}

/// A dataset together with the outcome of its refresh history fetch
#[derive(Serialize)]
struct DatasetStatus<'a> {
    #[serde(flatten)]
    dataset: &'a Dataset,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DatasetsReport<'a> {
    name: &'a str,
    group_id: &'a str,
    datasets: BTreeMap<&'a str, DatasetStatus<'a>>,
}

/// List the datasets of a workspace, each with its latest refresh.
///
/// A dataset whose history could not be fetched is reported as failed, never
/// as "never refreshed", and makes the command fail after printing.
pub fn datasets_command(
    config_path: Option<&Path>,
    workspace: Option<&str>,
    output: Output,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let mut workspace = session.workspace(workspace)?;
    let top = session.config.settings.refresh_history_top;

    workspace
        .fetch_datasets(&session.client, &session.config.settings.excluded_datasets)
        .context("Failed to list datasets")?;

    let mut failures: BTreeMap<String, PbiError> = BTreeMap::new();
    for (name, dataset) in workspace.datasets.iter_mut() {
        if let Err(e) = dataset.fetch_refreshes(&session.client, top) {
            warn!("Could not fetch refresh history of '{}': {}", name, e);
            failures.insert(name.clone(), e);
        }
    }

    if output.is_json() {
        let report = DatasetsReport {
            name: &workspace.name,
            group_id: &workspace.group_id,
            datasets: workspace
                .datasets
                .iter()
                .map(|(name, dataset)| {
                    let error = failures.get(name).map(|e| e.to_string());
                    (name.as_str(), DatasetStatus { dataset, error })
                })
                .collect(),
        };
        output.print_json(&report)?;
    } else {
        println!("{}\n", workspace);
        if workspace.datasets.is_empty() {
            println!("  No datasets.");
        }
        for (name, dataset) in &workspace.datasets {
            println!("  {}  {}", dataset.dataset_id, name);
            match (failures.get(name), dataset.latest_refresh()) {
                (Some(e), _) => println!("    Last refresh: error: {}", e),
                (None, Some(record)) => println!("    Last refresh: {}", record),
                (None, None) => println!("    Last refresh: none"),
            }
        }
    }

    if !failures.is_empty() {
        let names: Vec<&str> = failures.keys().map(String::as_str).collect();
        bail!(
            "Could not fetch refresh history of {} dataset(s): {}",
            failures.len(),
            names.join(", ")
        );
    }

    Ok(())
}
