//! Branch command handlers.

use crate::output::{write_out, OutputFormat};
use clap::Subcommand;
use nimbusctl_api::Api;

/// Branch subcommands.
#[derive(Subcommand)]
pub enum BranchCommands {
    /// List branches of a project
    List {
        /// Project to list branches for
        #[arg(long)]
        project_id: String,
    },
}

pub async fn handle_branches(
    command: BranchCommands,
    api: &Api,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        BranchCommands::List { project_id } => {
            let branches = api.list_branches(&project_id).await?;
            write_out(&branches, format)
        }
    }
}
