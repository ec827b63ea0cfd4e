use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use granary_core::config::EngineConfig;
use granary_core::logging::LogLevel;

mod commands;
mod workspace;

use commands::admin::{AddAccountArgs, AddGrainArgs, SetAdminArgs};
use commands::query::{CheckArgs, DownstreamArgs};
use commands::share::{RecordUseArgs, ShareArgs, UpdateArgs};
use commands::VertexArgs;
use workspace::Workspace;

/// Granary Command Line Interface
///
/// Queries and edits a grain sharing graph stored in a JSON snapshot.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to the store snapshot
    #[clap(long, global = true, default_value = "granary.json")]
    snapshot: PathBuf,

    /// Path to a TOML configuration file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overriding the configuration file
    #[clap(long, global = true)]
    log_level: Option<LogLevel>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty snapshot
    Init,

    /// Create an account with one identity
    #[clap(name = "add-account")]
    AddAccount(AddAccountArgs),

    /// Create a grain owned by an account
    #[clap(name = "add-grain")]
    AddGrain(AddGrainArgs),

    /// Grant or remove administrator status
    #[clap(name = "set-admin")]
    SetAdmin(SetAdminArgs),

    /// Compute the permissions an identity or token holds on a grain
    Permissions(VertexArgs),

    /// Check whether an identity or token may open a grain
    #[clap(name = "may-open")]
    MayOpen(VertexArgs),

    /// List the tokens derived from a share
    Downstream(DownstreamArgs),

    /// Validate membrane requirements
    Check(CheckArgs),

    /// Share a grain with an identity or as a webkey
    Share(ShareArgs),

    /// Change or revoke a token
    Update(UpdateArgs),

    /// Record that a token was used
    #[clap(name = "record-use")]
    RecordUse(RecordUseArgs),

    /// Delete self-destructing tokens that expired unused
    Cleanup,
}

fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.as_deref()).context("Invalid configuration")?;
    init_logging(cli.log_level.unwrap_or(config.log_level));

    if let Commands::Init = cli.command {
        Workspace::create(&cli.snapshot)?;
        return commands::print_json(&serde_json::json!({
            "snapshot": cli.snapshot.display().to_string(),
        }));
    }

    let workspace = Workspace::open(&cli.snapshot, config)?;

    match &cli.command {
        Commands::Init => Ok(()),
        Commands::AddAccount(args) => commands::admin::execute_add_account(&workspace, args),
        Commands::AddGrain(args) => commands::admin::execute_add_grain(&workspace, args),
        Commands::SetAdmin(args) => commands::admin::execute_set_admin(&workspace, args),
        Commands::Permissions(args) => commands::query::execute_permissions(&workspace, args),
        Commands::MayOpen(args) => commands::query::execute_may_open(&workspace, args),
        Commands::Downstream(args) => commands::query::execute_downstream(&workspace, args),
        Commands::Check(args) => commands::query::execute_check(&workspace, args),
        Commands::Share(args) => commands::share::execute_share(&workspace, args),
        Commands::Update(args) => commands::share::execute_update(&workspace, args),
        Commands::RecordUse(args) => commands::share::execute_record_use(&workspace, args),
        Commands::Cleanup => commands::share::execute_cleanup(&workspace),
    }
}
