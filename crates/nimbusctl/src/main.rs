//! nimbusctl - CLI client for the Nimbus database control plane.

mod commands;
mod errors;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use commands::auth::AuthCommands;
use commands::branches::BranchCommands;
use commands::projects::ProjectCommands;
use nimbusctl_api::ApiFactory;
use nimbusctl_auth::flow::{ensure_auth, AuthContext, EnsureAuthProps};
use nimbusctl_auth::oauth::OauthClient;
use nimbusctl_auth::store::CredentialStore;
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nimbusctl")]
#[command(author, version, about = "CLI client for the Nimbus database control plane", long_about = None)]
struct Cli {
    /// API key to use instead of stored credentials
    #[arg(long, global = true, env = "NIMBUS_API_KEY")]
    api_key: Option<String>,

    /// Directory holding credentials (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// OAuth authorization server
    #[arg(long, global = true, hide = true, default_value = "https://oauth.nimbus.dev")]
    oauth_host: String,

    /// OAuth client identifier
    #[arg(long, global = true, hide = true, default_value = "nimbusctl")]
    client_id: String,

    /// Control-plane API base URL
    #[arg(long, global = true, default_value = "https://api.nimbus.dev/v1")]
    api_host: String,

    /// Output format
    #[arg(long, short, global = true, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with the Nimbus control plane
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Show the authenticated user
    Me,
    /// Manage projects
    Projects {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Manage branches
    Branches {
        #[command(subcommand)]
        command: BranchCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Auth { .. } => "auth",
            Commands::Me => "me",
            Commands::Projects { .. } => "projects",
            Commands::Branches { .. } => "branches",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{}", errors::render_failure(&format!("{e:#}")));
        std::process::exit(1);
    }
}

/// Initialize tracing to stderr with an env-filter.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        "nimbusctl=debug,nimbusctl_auth=debug,nimbusctl_api=debug"
    } else {
        "nimbusctl=info,nimbusctl_auth=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config_dir = cli
        .config_dir
        .clone()
        .unwrap_or_else(nimbusctl_auth::default_config_dir);
    let store = CredentialStore::new(&config_dir);

    let force_auth = matches!(
        &command,
        Commands::Auth {
            command: AuthCommands::Login { force_auth: true }
        }
    );
    let context = AuthContext::from_env(
        config_dir,
        cli.oauth_host,
        cli.client_id,
        cli.api_host,
        force_auth,
    );

    if let Commands::Auth { command } = command {
        return commands::auth::handle_auth(command, &context, &store).await;
    }

    let props = EnsureAuthProps {
        api_key: cli.api_key,
        help: false,
        args: vec![command.name().to_string()],
        context,
    };
    let primitive = OauthClient::new(&props.context.oauth_host, &props.context.client_id);
    let Some(api) = ensure_auth(&props, &store, &primitive, &ApiFactory).await? else {
        return Ok(());
    };

    match command {
        Commands::Me => commands::me::handle_me(&api, cli.output).await,
        Commands::Projects { command } => {
            commands::projects::handle_projects(command, &api, cli.output).await
        }
        Commands::Branches { command } => {
            commands::branches::handle_branches(command, &api, cli.output).await
        }
        Commands::Auth { .. } => unreachable!("handled above"),
    }
}
