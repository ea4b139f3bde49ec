//! Endpoint and behavior settings

use serde::{Deserialize, Serialize};

/// Name of the usage-metrics model Power BI adds to every workspace
pub const USAGE_METRICS_DATASET: &str = "Report Usage Metrics Model";

/// General settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the Power BI REST API (everything up to and including `/myorg`)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Azure AD authority host; the tenant id is appended to it
    #[serde(default = "default_authority_host")]
    pub authority_host: String,

    /// Resource the access token is requested for
    #[serde(default = "default_resource_url")]
    pub resource_url: String,

    /// How many refresh records to fetch when no count is given
    #[serde(default = "default_refresh_history_top")]
    pub refresh_history_top: u32,

    /// Dataset names hidden from dataset listings
    #[serde(default = "default_excluded_datasets")]
    pub excluded_datasets: Vec<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.powerbi.com/v1.0/myorg".to_string()
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_resource_url() -> String {
    "https://analysis.windows.net/powerbi/api".to_string()
}

fn default_refresh_history_top() -> u32 {
    1
}

fn default_excluded_datasets() -> Vec<String> {
    vec![USAGE_METRICS_DATASET.to_string()]
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    120
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            authority_host: default_authority_host(),
            resource_url: default_resource_url(),
            refresh_history_top: default_refresh_history_top(),
            excluded_datasets: default_excluded_datasets(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}
