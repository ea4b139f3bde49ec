use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "pbi")]
#[command(about = "Power BI workspaces, dataset refreshes and DAX queries from the command line")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.pbi/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter ~/.pbi/config.toml
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// List all workspaces the service principal can see
    Workspaces,

    /// List the datasets of a workspace with their latest refresh
    Datasets {
        /// Workspace name (from config) or group id
        #[arg(short, long)]
        workspace: Option<String>,
    },

    /// Show the refresh history of a dataset
    Refreshes {
        dataset: String,

        #[arg(short, long)]
        workspace: Option<String>,

        /// Number of most recent refreshes to show
        #[arg(long)]
        top: Option<u32>,
    },

    /// Trigger a dataset refresh (returns once accepted)
    Refresh {
        dataset: String,

        #[arg(short, long)]
        workspace: Option<String>,

        /// Refresh only this table (Premium / PPU capacities)
        #[arg(long)]
        table: Option<String>,
    },

    /// Run a DAX query and print the first row
    Query {
        dataset: String,

        /// DAX text, e.g. EVALUATE ROW("x", [Total Sales])
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        dax: Option<String>,

        /// Read the DAX query from a file
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(short, long)]
        workspace: Option<String>,
    },

    /// List the tables of a dataset
    Tables {
        dataset: String,

        #[arg(short, long)]
        workspace: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let output = cli::Output::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => {
            cli::init::init_command(config_path, force)?;
        }
        Commands::Workspaces => {
            cli::workspace::workspaces_command(config_path, output)?;
        }
        Commands::Datasets { workspace } => {
            cli::workspace::datasets_command(config_path, workspace.as_deref(), output)?;
        }
        Commands::Refreshes {
            dataset,
            workspace,
            top,
        } => {
            cli::dataset::refreshes_command(config_path, workspace.as_deref(), &dataset, top, output)?;
        }
        Commands::Refresh {
            dataset,
            workspace,
            table,
        } => {
            cli::dataset::refresh_command(
                config_path,
                workspace.as_deref(),
                &dataset,
                table.as_deref(),
                output,
            )?;
        }
        Commands::Query {
            dataset,
            dax,
            file,
            workspace,
        } => {
            let dax = match (dax, file) {
                (Some(dax), _) => dax,
                (None, Some(path)) => cli::dataset::read_query_file(&path)?,
                (None, None) => anyhow::bail!("Provide a DAX query or --file"),
            };
            cli::dataset::query_command(config_path, workspace.as_deref(), &dataset, &dax, output)?;
        }
        Commands::Tables { dataset, workspace } => {
            cli::dataset::tables_command(config_path, workspace.as_deref(), &dataset, output)?;
        }
    }

    Ok(())
}
