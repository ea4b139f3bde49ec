//! Commented starter configuration written by `pbi init`

use std::path::Path;

use anyhow::{bail, Result};

use super::io::write_locked;
use super::Config;

/// Default configuration content for `pbi init`
pub const DEFAULT_CONFIG: &str = r#"# pbi configuration
# =================
#
# The service principal must be a member (Admin or Member) of every
# workspace you want to use, and "Allow service principals to use Power BI
# APIs" must be enabled in the tenant settings.

# Workspace used when a command is run without --workspace
# default_workspace = "Sales Reports"

# ============================================================================
# CREDENTIALS
# ============================================================================
#
# Prefer environment variables for secrets:
#   PBI_TENANT_ID, PBI_CLIENT_ID, PBI_CLIENT_SECRET
# Values set there override the ones below.

[credentials]
tenant_id = ""
client_id = ""
client_secret = ""

# ============================================================================
# KNOWN WORKSPACES
# ============================================================================
#
# Display name -> group id. Names listed here resolve without an API call;
# anything else passed as a workspace is treated as a group id and looked up.

[workspaces]
# "Sales Reports" = "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"

# ============================================================================
# SETTINGS
# ============================================================================

[settings]
api_base_url = "https://api.powerbi.com/v1.0/myorg"
authority_host = "https://login.microsoftonline.com"
resource_url = "https://analysis.windows.net/powerbi/api"
# Refresh records fetched per dataset when --top is not given
refresh_history_top = 1
# Hidden from dataset listings
excluded_datasets = ["Report Usage Metrics Model"]
connect_timeout_secs = 10
read_timeout_secs = 120
"#;

impl Config {
    /// Write the starter configuration to `path`.
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn init_file(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "Configuration already exists: {}\nUse --force to overwrite.",
                path.display()
            );
        }
        write_locked(path, DEFAULT_CONFIG)
    }
}
