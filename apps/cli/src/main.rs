mod commands;
mod config;
mod render;
mod session_adapter;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::TargetArgs;
use commands::config::ConfigCommand;

/// Uploads files and folders to a remote host over SSH.
#[derive(Debug, Parser)]
#[command(name = "pushdeck-cli", version, about)]
struct Cli {
    /// Debug logging for every target.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Uploads one file or directory.
    Upload {
        local: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
        /// List the remote directory afterwards.
        #[arg(long)]
        list: bool,
    },
    /// Archives each folder and uploads the archives.
    Batch {
        #[arg(required = true)]
        folders: Vec<PathBuf>,
        #[command(flatten)]
        target: TargetArgs,
        /// Directory for temporary archives.
        #[arg(long, value_name = "DIR")]
        temp_dir: Option<PathBuf>,
    },
    /// Exits 0 when the local path exists, 1 otherwise.
    Check { path: PathBuf },
    /// Reads or edits the stored configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info,pushdeck=debug" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (mut cfg, cfg_path) = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Upload {
            local,
            target,
            list,
        } => commands::upload::upload(&local, list, &target, &mut cfg, &cfg_path).await,
        Command::Batch {
            folders,
            target,
            temp_dir,
        } => {
            commands::upload::batch(&folders, temp_dir.as_deref(), &target, &mut cfg, &cfg_path)
                .await
        }
        Command::Config(command) => {
            commands::config::run(command, &mut cfg, &cfg_path)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { path } => Ok(commands::check(&path)),
    }
}
