//! Init command implementation

use anyhow::Result;
use std::path::Path;
use tracing::info;

use pbi_workspace::Config;

/// Write the starter config to `config_path` or ~/.pbi/config.toml
pub fn init_command(config_path: Option<&Path>, force: bool) -> Result<()> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::global_config_path);

    Config::init_file(&config_path, force)?;
    info!("Wrote starter configuration");
    println!("Created: {}", config_path.display());
    println!("Fill in [credentials] (or set PBI_TENANT_ID / PBI_CLIENT_ID / PBI_CLIENT_SECRET).");

    Ok(())
}
