//! Shipkit CLI - fetch application releases and inspect their images

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

use commands::images::ImagesArgs;
use commands::pull::PullArgs;

#[derive(Parser)]
#[command(name = "shipkit")]
#[command(author = "Shipkit Contributors")]
#[command(version)]
#[command(about = "Fetch application releases from a distribution service", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Configuration file (default: ~/.config/shipkit/config.yaml)
    #[arg(long, global = true, env = "SHIPKIT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an upstream release and write its files
    Pull {
        /// Upstream URI (replicated://app[/channel])
        uri: String,

        /// License file
        #[arg(short, long)]
        license: Option<PathBuf>,

        /// Read the release from a local directory instead of the service
        #[arg(long)]
        local_path: Option<PathBuf>,

        /// Output directory (default: ./<application name>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Abort the fetch after this many seconds
        #[arg(long)]
        deadline: Option<u64>,
    },

    /// Report which images need licensed registry access
    Images {
        /// Image references
        images: Vec<String>,

        /// Read image references from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Maximum number of concurrent probes
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Per-image probe deadline in seconds
        #[arg(long)]
        deadline: Option<u64>,

        /// Only list private images
        #[arg(long)]
        private_only: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the application metadata for an upstream
    Metadata {
        /// Upstream URI
        uri: String,
    },

    /// Check whether an upstream can be pulled
    CanPull {
        /// Upstream URI
        uri: String,

        /// License file
        #[arg(short, long)]
        license: Option<PathBuf>,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> error::Result<i32> {
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Pull {
            uri,
            license,
            local_path,
            output,
            deadline,
        } => {
            let args = PullArgs {
                uri: &uri,
                license: license.as_deref(),
                local_path: local_path.as_deref(),
                output: output.as_deref(),
                deadline_secs: deadline,
            };
            commands::pull::run(args, &config).await?;
        }

        Commands::Images {
            images,
            file,
            concurrency,
            deadline,
            private_only,
            json,
        } => {
            let args = ImagesArgs {
                images: &images,
                file: file.as_deref(),
                concurrency,
                deadline_secs: deadline,
                private_only,
                json,
            };
            commands::images::run(args, &config).await?;
        }

        Commands::Metadata { uri } => commands::metadata::run(&uri, &config).await?,

        Commands::CanPull { uri, license } => {
            if !commands::can_pull::run(&uri, license.as_deref())? {
                return Ok(exit_codes::NO);
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            code
        }
    };

    if code != exit_codes::SUCCESS {
        std::process::exit(code);
    }
    Ok(())
}
