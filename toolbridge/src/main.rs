//! `toolbridge` command-line entry point.

use std::path::PathBuf;
use std::sync::Arc;

use agent_telemetry::tracing_support::{self, DEFAULT_DIRECTIVES};
use anyhow::{Context, Result};
use clap::Parser;
use toolbridge::app::{self, DEFAULT_TASK, OUTPUT_BANNER};
use tracing::info;

/// Run a ReAct agent against the local fetch and browser services.
#[derive(Debug, Parser)]
#[command(name = "toolbridge", version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Task for the agent; defaults to the example.com scraping task
    #[arg(short, long)]
    task: Option<String>,

    /// Log every thought, action, and observation
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_support::init(DEFAULT_DIRECTIVES)?;

    let mut config = agent_config::load(cli.config.as_deref()).context("loading configuration")?;
    if cli.verbose {
        config.agent.verbose = true;
    }

    let adapter = Arc::new(app::model_adapter(&config)?);
    info!(
        model = %config.model.model,
        base_url = %config.model.base_url,
        "model adapter ready"
    );
    let driver = app::assemble(&config, adapter)?;

    let task = cli.task.as_deref().unwrap_or(DEFAULT_TASK);
    let result = driver.run(task).await.context("agent run failed")?;

    println!("{OUTPUT_BANNER}{result}");
    Ok(())
}
