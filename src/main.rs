//! snowprobe - read-only ServiceNow debugging and AI ROI tools
//!
//! Runs one tool per invocation against a ServiceNow instance and prints
//! its text output to stdout. Logs go to stderr.
//!
//! Exit codes:
//!   0 - A tool produced output (upstream error text included)
//!   1 - Local failure (bad arguments, unreadable config, invalid URL)

mod analysis;
mod cli;
mod client;
mod config;
mod models;
mod report;
mod tools;

use anyhow::{Context, Result};
use cli::{Args, Invocation};
use client::TableClient;
use config::{Config, DEFAULT_CONFIG_FILE};
use std::path::Path;
use tools::{get_tool_definitions, ToolRegistry};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    debug!("snowprobe v{}", env!("CARGO_PKG_VERSION"));

    match run(&args, config).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .snowprobe.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Set [instance] url, or export SERVICENOW_INSTANCE, before running a tool.");
    Ok(())
}

/// Initialize logging on stderr. `--quiet` wins over a verbose config file.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Resolve the command and produce the text to print.
async fn run(args: &Args, config: Config) -> Result<String> {
    let command = args.command.clone().context("No command given")?;

    let (name, tool_args) = match command.invocation()? {
        Invocation::ListTools => {
            return serde_json::to_string_pretty(&get_tool_definitions())
                .context("Failed to encode tool definitions");
        }
        Invocation::Tool { name, args } => (name, args),
    };

    config.validate()?;

    let client = TableClient::new(config.client_config())?;
    info!("Instance: {}", client.instance_url());
    let registry = ToolRegistry::new(client, config.analysis.fetch_limit);

    Ok(registry.execute(&name, &tool_args).await)
}

fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Runs before logging is set up, so a missing file is silent.
    Ok(Config::load_default()?.unwrap_or_default())
}
