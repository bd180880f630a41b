use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use actorbench_engine::{ApifyConnector, EngineConfig, Session};
use actorbench_util::default_config_dir;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "actorbench", version)]
#[command(about = "Browse, inspect and run Apify actors. Starts the TUI when no command is given.")]
struct Cli {
    /// Platform API token.
    #[arg(long, global = true, env = "APIFY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Configuration file; defaults to ACTORBENCH_CONFIG_PATH or the user config directory.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List your actors followed by store actors you do not own.
    Actors {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show an actor's input schema.
    Schema {
        actor_id: String,
        /// Print JSON instead of a tree.
        #[arg(long)]
        json: bool,
    },
    /// Start a run and wait for it to finish.
    Run {
        actor_id: String,
        /// Input as a JSON object, overlaid on the default payload.
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,
        /// File containing the input JSON object.
        #[arg(long, value_name = "PATH")]
        input_file: Option<PathBuf>,
        /// Stop polling after this many seconds.
        #[arg(long, value_name = "SECS")]
        max_wait: Option<u64>,
    },
    /// Run the local CORS forwarding proxy until Ctrl+C.
    Proxy {
        /// Loopback address to listen on.
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = cli.command.is_none();
    init_tracing(interactive)?;

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => EngineConfig::load()?,
    };
    let token = cli.token.map(|token| token.trim().to_string()).filter(|token| !token.is_empty());

    let Some(command) = cli.command else {
        let connector = Arc::new(ApifyConnector::new(config.client_settings()));
        let session = Session::new(connector, config.session_settings());
        return actorbench_tui::run(session, token).await;
    };

    let context = commands::CommandContext { config, token };
    match command {
        Command::Actors { json } => commands::list_actors(&context, json).await,
        Command::Schema { actor_id, json } => commands::show_schema(&context, &actor_id, json).await,
        Command::Run {
            actor_id,
            input,
            input_file,
            max_wait,
        } => {
            let input = commands::parse_input(input.as_deref(), input_file.as_deref())?;
            commands::run_actor(&context, &actor_id, &input, max_wait).await
        }
        Command::Proxy { bind } => commands::serve_proxy(&context, bind.as_deref()).await,
    }
}

/// Logs to stderr for commands; the TUI logs to a file so the screen stays clean.
fn init_tracing(interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if interactive {
        let directory = default_config_dir();
        fs::create_dir_all(&directory).with_context(|| format!("failed to create {}", directory.display()))?;
        let path = directory.join("actorbench.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
    Ok(())
}
