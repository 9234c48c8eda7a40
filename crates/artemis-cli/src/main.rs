//! artemis — interactive command client for Artemis bridge-simulator servers.
//!
//! Starts in a disconnected shell, connects over TCP, then prints server
//! traffic while accepting console commands.

mod config;
mod shell;

use std::path::PathBuf;

use anyhow::{Context, Result};
use artemis_client::{receive, Processor};
use clap::Parser;
use shell::disconnected::{self, Next, Settings};
use shell::{connected, Prompt};
use tracing::{error, warn};

/// artemis — Artemis bridge-simulator client
#[derive(Parser)]
#[command(name = "artemis", version, about = "Interactive command client for Artemis bridge-simulator servers")]
struct Cli {
    /// Server port when the host carries none [default: 2010]
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file path
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Shell command to run first (`connect HOST`, `version`), or a bare
    /// HOST to connect to
    #[arg(trailing_var_arg = true, value_name = "COMMAND|HOST")]
    command: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix into packet output.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("artemis=debug,artemis_cli=debug,artemis_client=debug,artemis_core=debug")
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("artemis=warn,artemis_cli=warn")
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("artemis: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_path);
    let cfg = match config::Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("{:#}; using defaults", e);
            config::Config::default()
        }
    };

    let settings = Settings {
        connect: cfg.connect_config(cli.port),
        default_host: cfg.default_host().map(str::to_string),
    };
    let mut prompt = Prompt::stdin()?;

    let mut next = if cli.command.is_empty() {
        None
    } else {
        disconnected::run_args(&cli.command, &settings).await
    };
    if next.is_none() {
        next = Some(disconnected::run(&mut prompt, &settings).await);
    }

    let Some(Next::Connected {
        host,
        sender,
        inbound,
    }) = next
    else {
        return Ok(());
    };

    let processor = Processor::stdout().context("failed to set up packet handlers")?;
    let mut receive = receive::spawn(inbound, processor);
    connected::run(&mut prompt, &sender, &mut receive, &host).await;
    Ok(())
}
