//! Dataset handle: refresh history, refresh trigger, DAX queries

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{encode_url_path_segment, PowerBiClient};
use crate::error::PbiError;
use crate::query::{self, ExecuteQueriesRequest, Row, TABLE_STATISTICS_QUERY};
use crate::refresh::{self, RefreshAccepted, RefreshRecord, TableRefreshRequest};

/// A dataset (semantic model) inside a workspace.
///
/// Building one makes no request; refresh history stays empty until
/// [`Dataset::fetch_refreshes`] is called.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub group_id: String,
    pub dataset_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configured_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_refreshable: Option<bool>,
    pub refreshes: Vec<RefreshRecord>,
}

/// Dataset entry of `GET /groups/{groupId}/datasets`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DatasetEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub configured_by: Option<String>,
    #[serde(default)]
    pub is_refreshable: Option<bool>,
}

impl Dataset {
    pub fn new(
        group_id: impl Into<String>,
        dataset_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            dataset_id: dataset_id.into(),
            name: name.into(),
            configured_by: None,
            is_refreshable: None,
            refreshes: Vec::new(),
        }
    }

    pub(crate) fn from_entry(group_id: &str, entry: DatasetEntry) -> Self {
        Self {
            configured_by: entry.configured_by,
            is_refreshable: entry.is_refreshable,
            ..Self::new(group_id, entry.id, entry.name)
        }
    }

    fn url(&self, client: &PowerBiClient, rest: &str) -> String {
        client.group_url(
            &self.group_id,
            &format!("/datasets/{}{}", encode_url_path_segment(&self.dataset_id), rest),
        )
    }

    /// The most recent `top` refreshes, newest first, without caching them
    pub fn refresh_history(
        &self,
        client: &PowerBiClient,
        top: u32,
    ) -> Result<Vec<RefreshRecord>, PbiError> {
        let url = self.url(client, &format!("/refreshes?$top={top}"));
        let response = client.get(&url)?.error_for_status()?;
        refresh::parse_refresh_history(&response.body)
    }

    /// Fetch the most recent `top` refreshes and keep them on the handle
    pub fn fetch_refreshes(
        &mut self,
        client: &PowerBiClient,
        top: u32,
    ) -> Result<&[RefreshRecord], PbiError> {
        self.refreshes = self.refresh_history(client, top)?;
        Ok(&self.refreshes)
    }

    /// Most recent cached refresh, if any was fetched
    pub fn latest_refresh(&self) -> Option<&RefreshRecord> {
        self.refreshes.first()
    }

    /// Run a DAX query and return the first row of the first table.
    ///
    /// `Ok(None)` means the query ran and returned no rows.
    pub fn execute_query(&self, client: &PowerBiClient, dax: &str) -> Result<Option<Row>, PbiError> {
        let response = self.execute(client, dax)?;
        query::first_row(&response)
    }

    /// Start a refresh, optionally limited to one table.
    ///
    /// Selective refresh needs Premium capacity or PPU. Returns once the
    /// service has accepted the request; poll [`Dataset::refresh_history`]
    /// for the outcome.
    pub fn refresh(
        &self,
        client: &PowerBiClient,
        table: Option<&str>,
    ) -> Result<RefreshAccepted, PbiError> {
        let url = self.url(client, "/refreshes");
        let response = match table.filter(|t| !t.is_empty()) {
            Some(table) => client.post_json(&url, &TableRefreshRequest::full(table))?,
            None => client.post_empty(&url)?,
        };

        if response.status != 202 {
            return Err(PbiError::from_response(response.status, &response.body));
        }

        info!(
            dataset = %self.name,
            table = table.unwrap_or("<all>"),
            "Refresh accepted"
        );
        Ok(RefreshAccepted {
            request_id: response.request_id,
        })
    }

    /// Names of all tables in the dataset
    pub fn tables(&self, client: &PowerBiClient) -> Result<Vec<String>, PbiError> {
        let response = self.execute(client, TABLE_STATISTICS_QUERY)?;
        let rows = query::result_rows(&response)?;
        Ok(query::distinct_table_names(&rows))
    }

    fn execute(
        &self,
        client: &PowerBiClient,
        dax: &str,
    ) -> Result<crate::client::ApiResponse, PbiError> {
        let url = self.url(client, "/executeQueries");
        client.post_json(&url, &ExecuteQueriesRequest::single(dax))
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dataset: {}", self.name)
    }
}
