//! Dataset commands: refresh history, refresh trigger, DAX queries, tables

use anyhow::{bail, Context, Result};
use std::path::Path;

use super::{Output, Session};

/// Show the most recent refreshes of a dataset
pub fn refreshes_command(
    config_path: Option<&Path>,
    workspace: Option<&str>,
    dataset: &str,
    top: Option<u32>,
    output: Output,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let dataset = session.dataset(workspace, dataset)?;
    let top = top.unwrap_or(session.config.settings.refresh_history_top);

    let records = dataset
        .refresh_history(&session.client, top)
        .with_context(|| format!("Failed to fetch refresh history of '{}'", dataset.name))?;

    if output.is_json() {
        return output.print_json(&records);
    }

    if records.is_empty() {
        println!("{} has never been refreshed.", dataset);
        return Ok(());
    }

    println!("{} - last {} refresh(es):\n", dataset, records.len());
    for record in &records {
        println!("  {}", record);
    }

    Ok(())
}

/// Trigger a refresh; completion has to be checked with `pbi refreshes`
pub fn refresh_command(
    config_path: Option<&Path>,
    workspace: Option<&str>,
    dataset: &str,
    table: Option<&str>,
    output: Output,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let dataset = session.dataset(workspace, dataset)?;

    let accepted = dataset
        .refresh(&session.client, table)
        .with_context(|| format!("Failed to start refresh of '{}'", dataset.name))?;

    if output.is_json() {
        return output.print_json(&accepted);
    }

    println!("{}", accepted);
    if let Some(request_id) = &accepted.request_id {
        println!("Request id: {}", request_id);
    }

    Ok(())
}

/// Run a DAX query and print the first row
pub fn query_command(
    config_path: Option<&Path>,
    workspace: Option<&str>,
    dataset: &str,
    dax: &str,
    output: Output,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let dataset = session.dataset(workspace, dataset)?;

    let row = dataset
        .execute_query(&session.client, dax)
        .with_context(|| format!("Query against '{}' failed", dataset.name))?;

    if output.is_json() {
        return output.print_json(&row);
    }

    match row {
        Some(row) => {
            for (column, value) in &row {
                println!("{} = {}", column, value);
            }
        }
        None => println!("Query returned no rows."),
    }

    Ok(())
}

/// List the tables of a dataset
pub fn tables_command(
    config_path: Option<&Path>,
    workspace: Option<&str>,
    dataset: &str,
    output: Output,
) -> Result<()> {
    let session = Session::open(config_path)?;
    let dataset = session.dataset(workspace, dataset)?;

    let tables = dataset
        .tables(&session.client)
        .with_context(|| format!("Failed to list tables of '{}'", dataset.name))?;

    if output.is_json() {
        return output.print_json(&tables);
    }

    println!("{} - {} table(s):\n", dataset, tables.len());
    for table in &tables {
        println!("  {}", table);
    }

    Ok(())
}

/// Read a DAX query from disk
pub fn read_query_file(path: &Path) -> Result<String> {
    let dax = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read query file: {}", path.display()))?;
    if dax.trim().is_empty() {
        bail!("Query file is empty: {}", path.display());
    }
    Ok(dax)
}
