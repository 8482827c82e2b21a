use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

mod cli;

use cli::{handle_fetch, handle_files, handle_verify};
use tokfetch::config::{FetchConfig, Overrides};
use tokfetch::logging::init_logging;
use tokfetch::FetchError;

#[derive(Parser)]
#[command(name = "tokfetch")]
#[command(about = "Download a pretrained tokenizer from the Hugging Face Hub into a local directory", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML)
    #[arg(long, env = "TOKFETCH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Hub cache directory (defaults to $HF_HOME/hub or ~/.cache/huggingface/hub)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Hugging Face access token
    #[arg(long, env = "HF_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a tokenizer and save its files (default when no command is given)
    Fetch {
        /// Model identifier on the hub, e.g. sentence-transformers/all-MiniLM-L6-v2
        model_id: Option<String>,

        /// Directory to write the tokenizer files into
        #[arg(short = 'o', long = "dest")]
        destination: Option<PathBuf>,

        /// Branch, tag, or commit to fetch
        #[arg(long)]
        revision: Option<String>,

        /// Only use the local hub cache
        #[arg(long)]
        offline: bool,

        /// Skip loading the saved tokenizer back
        #[arg(long)]
        no_verify: bool,

        /// Show download progress bars
        #[arg(long)]
        progress: bool,
    },

    /// List the tokenizer files a fetch would download
    Files {
        /// Model identifier on the hub
        model_id: Option<String>,

        /// Branch, tag, or commit to inspect
        #[arg(long)]
        revision: Option<String>,

        /// Only use the local hub cache
        #[arg(long)]
        offline: bool,
    },

    /// Check that a directory holds a loadable tokenizer
    Verify {
        /// Directory to check (defaults to the configured destination)
        dir: Option<PathBuf>,
    },
}

fn load_config(cli_args: &Cli, overrides: Overrides) -> Result<FetchConfig> {
    let mut config = FetchConfig::load(cli_args.config.as_deref())?;
    config.apply(Overrides {
        cache_dir: cli_args.cache_dir.clone(),
        token: cli_args.token.clone(),
        ..overrides
    });
    Ok(config)
}

fn run(cli_args: Cli) -> Result<()> {
    match &cli_args.command {
        // Default: behave like a bare fetch with configured values
        None => {
            let config = load_config(&cli_args, Overrides::default())?;
            handle_fetch(&config)?;
        }

        Some(Commands::Fetch {
            model_id,
            destination,
            revision,
            offline,
            no_verify,
            progress,
        }) => {
            let overrides = Overrides {
                model_id: model_id.clone(),
                destination: destination.clone(),
                revision: revision.clone(),
                offline: *offline,
                no_verify: *no_verify,
                progress: *progress,
                ..Overrides::default()
            };
            let config = load_config(&cli_args, overrides)?;
            handle_fetch(&config)?;
        }

        Some(Commands::Files {
            model_id,
            revision,
            offline,
        }) => {
            let overrides = Overrides {
                model_id: model_id.clone(),
                revision: revision.clone(),
                offline: *offline,
                ..Overrides::default()
            };
            let config = load_config(&cli_args, overrides)?;
            handle_files(&config)?;
        }

        Some(Commands::Verify { dir }) => {
            let config = load_config(&cli_args, Overrides::default())?;
            let dir = dir.clone().unwrap_or(config.destination);
            handle_verify(&dir)?;
        }
    }

    Ok(())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<FetchError>()
        .map(FetchError::exit_code)
        .unwrap_or(1)
}

fn main() {
    // Load .env file if it exists (HF_TOKEN and friends)
    let _ = dotenvy::dotenv();

    let cli_args = Cli::parse();
    init_logging(cli_args.verbose, cli_args.quiet);

    if let Err(err) = run(cli_args) {
        eprintln!("{} {:#}", "✗".red(), err);
        std::process::exit(exit_code(&err));
    }
}
