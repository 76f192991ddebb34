use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod wiring;

#[derive(Parser)]
#[command(
    name = "ciforge",
    about = "ciforge — provision and converge a CI platform on AWS",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Operator settings file
    #[arg(long, env = "CIFORGE_CONFIG", default_value = "ciforge.toml", global = true)]
    config: PathBuf,
    /// Directory holding the config store and provisioner state.
    /// Overrides the settings file and CIFORGE_STATE_DIR.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a deployment, or converge an existing one
    Deploy(commands::deploy::DeployArgs),
    /// Tear down a deployment and forget it
    Destroy {
        project: String,
        /// Region the deployment lives in (defaults to the stored one)
        #[arg(long)]
        region: Option<String>,
    },
    /// Show how to reach a deployment
    Info {
        project: String,
        #[arg(long)]
        region: Option<String>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ciforge=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = wiring::load_settings(&cli.config, cli.state_dir)?;

    match cli.command {
        Commands::Deploy(args) => commands::deploy::run(&settings, args),
        Commands::Destroy { project, region } => {
            commands::destroy::run(&settings, &project, region.as_deref())
        }
        Commands::Info {
            project,
            region,
            json,
        } => commands::info::run(&settings, &project, region.as_deref(), json),
    }
}
