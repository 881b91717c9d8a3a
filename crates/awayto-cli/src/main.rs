//! Awayto CLI - provision and deploy awayto environments.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "awayto")]
#[command(about = "Provision and deploy awayto environments")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to awayto.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new environment and deploy the application into it
    Install(commands::install::InstallArgs),

    /// Archive the API package without deploying it
    Package {
        /// Directory to archive
        #[arg(short, long, default_value = "apipkg")]
        source: PathBuf,

        /// Archive to write
        #[arg(short, long, default_value = "lambda.zip")]
        output: PathBuf,
    },

    /// List the selectable regions and their indices
    Regions,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), anyhow::Error> = match cli.command {
        Commands::Install(args) => commands::install::run(cli.config, args).await,
        Commands::Package { source, output } => commands::package::run(&source, &output)
            .await
            .map_err(Into::into),
        Commands::Regions => commands::regions::run(cli.config).map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
