//! pbi-workspace - a small client for the Power BI REST API
//!
//! Authenticates a service principal, resolves workspaces, and wraps the
//! dataset calls that matter for day-to-day model operations:
//!
//! - refresh history (`GET .../refreshes`)
//! - triggering a full or single-table refresh (`POST .../refreshes`)
//! - running DAX (`POST .../executeQueries`)
//! - listing a model's tables
//!
//! ```no_run
//! use pbi_workspace::{Config, PowerBiClient, Workspace};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let client = PowerBiClient::new(&config.settings, config.resolved_credentials()?);
//!
//! let mut workspace = Workspace::resolve(&client, &config.workspaces, "Sales Reports")?;
//! workspace.fetch_datasets(&client, &config.settings.excluded_datasets)?;
//!
//! if let Some(dataset) = workspace.dataset("Sales") {
//!     println!("{}", dataset.refresh(&client, None)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod dataset;
pub mod error;
pub mod query;
pub mod refresh;
pub mod workspace;

pub use auth::AccessToken;
pub use client::PowerBiClient;
pub use config::{Config, Credentials, Settings};
pub use dataset::Dataset;
pub use error::PbiError;
pub use query::Row;
pub use refresh::{RefreshAccepted, RefreshRecord};
pub use workspace::{list_workspaces, Workspace};
