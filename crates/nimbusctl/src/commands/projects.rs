//! Project command handlers.

use crate::output::{write_out, OutputFormat};
use clap::Subcommand;
use nimbusctl_api::Api;

/// Project subcommands.
#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List projects
    List,
}

pub async fn handle_projects(
    command: ProjectCommands,
    api: &Api,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        ProjectCommands::List => {
            let projects = api.list_projects().await?;
            write_out(&projects, format)
        }
    }
}
