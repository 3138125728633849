//! CLI binary for tgscout.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tgscout::render::{render_invalid_query, render_result};
use tgscout::{AppConfig, Gateway, GroupSearch, SearchError};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// tgscout: find public Telegram groups and channels.
#[derive(Parser)]
#[command(name = "tgscout", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run one search and print the result.
    Search {
        /// Query words.
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of groups to return.
        #[arg(short, long)]
        max: Option<usize>,

        /// Print the result as JSON instead of messages.
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP gateway until Ctrl-C.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so search output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Search { query, max, json } => run_search(config, &query.join(" "), max, json).await,
        Command::Serve => run_serve(config).await,
    }
}

async fn run_search(
    config: AppConfig,
    query: &str,
    max: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let max = max.unwrap_or(config.search.default_max_results);
    let engine = GroupSearch::new(config.search)?;
    let outcome = engine.search(query, max).await;
    engine.shutdown();

    match outcome {
        Ok(result) if json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Ok(result) => {
            for message in render_result(&result, &config.render) {
                println!("{message}\n");
            }
        }
        Err(SearchError::InvalidQuery(reason)) => {
            eprintln!("{}", render_invalid_query(&reason));
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn run_serve(config: AppConfig) -> anyhow::Result<()> {
    println!("tgscout v{}", env!("CARGO_PKG_VERSION"));

    let engine = Arc::new(GroupSearch::new(config.search)?);
    let gateway = Gateway::start(Arc::clone(&engine), &config.gateway, config.render).await?;
    println!("Listening on http://{}", gateway.addr());

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    gateway.stop().await;
    engine.shutdown();
    info!("tgscout shut down cleanly");
    Ok(())
}
