//! Configuration loading and management

mod io;
mod settings;
mod template;

pub use settings::{Settings, USAGE_METRICS_DATASET};
pub use template::DEFAULT_CONFIG;

use std::collections::HashMap;
use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding `credentials.tenant_id`
pub const ENV_TENANT_ID: &str = "PBI_TENANT_ID";
/// Environment variable overriding `credentials.client_id`
pub const ENV_CLIENT_ID: &str = "PBI_CLIENT_ID";
/// Environment variable overriding `credentials.client_secret`
pub const ENV_CLIENT_SECRET: &str = "PBI_CLIENT_SECRET";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Workspace used when a command does not name one
    #[serde(default)]
    pub default_workspace: Option<String>,

    /// Service principal credentials
    #[serde(default)]
    pub credentials: Credentials,

    /// Known workspaces: display name -> group id
    #[serde(default)]
    pub workspaces: HashMap<String, String>,

    /// General settings
    #[serde(default)]
    pub settings: Settings,
}

/// Service principal credentials for the client-credentials flow
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &if self.client_secret.is_empty() { "" } else { "<redacted>" },
            )
            .finish()
    }
}

impl Credentials {
    /// Overlay values from a variable lookup (normally the process environment).
    ///
    /// Empty values from the lookup are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let overlay = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = value;
            }
        };
        overlay(&mut self.tenant_id, ENV_TENANT_ID);
        overlay(&mut self.client_id, ENV_CLIENT_ID);
        overlay(&mut self.client_secret, ENV_CLIENT_SECRET);
        self
    }

    /// Fail with the names of all missing fields
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            bail!(
                "Missing credentials: {} (set them in [credentials] or via {}, {}, {})",
                missing.join(", "),
                ENV_TENANT_ID,
                ENV_CLIENT_ID,
                ENV_CLIENT_SECRET
            );
        }
        Ok(())
    }
}

impl Config {
    /// Credentials with environment overrides applied, validated
    pub fn resolved_credentials(&self) -> Result<Credentials> {
        self.resolved_credentials_with(|key| std::env::var(key).ok())
    }

    pub fn resolved_credentials_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Credentials> {
        let credentials = self.credentials.clone().with_overrides(lookup);
        credentials.validate()?;
        Ok(credentials)
    }

    /// Pick the workspace named on the command line, falling back to `default_workspace`
    pub fn workspace_or_default<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str> {
        match requested.or(self.default_workspace.as_deref()) {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => bail!("No workspace given and no default_workspace configured"),
        }
    }
}
