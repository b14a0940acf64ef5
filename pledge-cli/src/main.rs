//! Pledge Command Line Interface

use clap::{Parser, Subcommand};
use pledge_cli::config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Parser)]
#[command(name = "pledge", about = "Stake on your goals", version)]
struct Cli {
    /// Config file (default: ~/.pledge/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Use in-memory storage and ledger instead of the network
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the HTTP gateway URL of an ipfs:// URI
    Gateway {
        uri: String,
    },

    /// Store a payload and print its URI
    Upload {
        /// File to upload
        #[arg(long, conflicts_with = "json", required_unless_present = "json")]
        file: Option<PathBuf>,
        /// JSON document to upload
        #[arg(long)]
        json: Option<String>,
    },

    /// Resolve an ipfs:// URI and print its content
    Fetch {
        uri: String,
    },

    /// Run a subgraph query
    Query {
        /// GraphQL query text
        query: String,
        /// Query variables as JSON
        #[arg(long)]
        vars: Option<String>,
    },

    /// Goal actions (each runs one submission)
    #[command(subcommand)]
    Goal(GoalCommands),
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a goal
    Create {
        /// What you commit to
        description: String,
        /// Deadline (unix seconds)
        #[arg(long)]
        deadline: u64,
        /// Stake in wei
        #[arg(long)]
        stake: u128,
    },

    /// Post a message on a goal
    Message {
        goal_id: u64,
        message: String,
    },

    /// Accept a motivator for your goal
    AcceptMotivator {
        goal_id: u64,
        /// Motivator account
        motivator: String,
    },

    /// Watch a goal
    Watch {
        goal_id: u64,
    },

    /// Attach a proof file to a goal
    Proof {
        goal_id: u64,
        file: PathBuf,
    },

    /// Close a goal as achieved
    Achieve {
        goal_id: u64,
    },

    /// Close a goal as failed
    Fail {
        goal_id: u64,
    },

    /// Edit your public profile
    Profile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        about: Option<String>,
        /// Image URI
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        twitter: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let load = || {
        tracing::debug!("Loading config from {}", config_path.display());
        Config::load(&config_path)
    };

    match cli.command {
        Commands::Init { force } => {
            commands::init(&config_path, force)?;
        }
        Commands::Gateway { uri } => {
            commands::content::gateway(&load()?, &uri)?;
        }
        Commands::Upload { file, json } => {
            commands::content::upload(&load()?, cli.offline, file, json).await?;
        }
        Commands::Fetch { uri } => {
            commands::content::fetch(&load()?, cli.offline, &uri).await?;
        }
        Commands::Query { query, vars } => {
            commands::query::run(&load()?, cli.offline, &query, vars.as_deref()).await?;
        }
        Commands::Goal(goal_cmd) => {
            return commands::goal::run(&load()?, cli.offline, goal_cmd).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}
