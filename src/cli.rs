//! Command-line interface argument parsing.
//!
//! Every tool is available as its own subcommand with flags mirroring the
//! tool parameters, and `call` runs any tool from a JSON argument object the
//! way an agent host would.

use crate::tools::ai::{ExecutionParams, RecentParams};
use crate::tools::roi::RoiParams;
use crate::tools::system::{IncidentParams, SyslogParams};
use crate::tools::workflows::{ExecutingParams, HistoryParams, LogParams};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// snowprobe - read-only ServiceNow debugging and AI ROI tools
///
/// Query AI agent activity, Now Assist usage, workflows, logs and
/// incidents on a ServiceNow instance, and measure how AI assistance
/// changes resolution times.
///
/// Examples:
///   snowprobe syslog --level error --minutes-ago 30
///   snowprobe incidents --number INC0009005
///   snowprobe ai_roi_analysis --table-name change_request --breakdown-by group
///   snowprobe call workflow_logs --args '{"level": "error"}'
///   snowprobe --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Instance base URL, e.g. https://dev12345.service-now.com
    #[arg(long, value_name = "URL", env = "SERVICENOW_INSTANCE", global = true)]
    pub instance: Option<String>,

    /// Username for basic authentication
    #[arg(long, env = "SERVICENOW_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for basic authentication
    #[arg(
        long,
        env = "SERVICENOW_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    pub password: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .snowprobe.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds (default: from config or 30)
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .snowprobe.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
#[command(rename_all = "snake_case")]
pub enum Command {
    /// Query AI Agent execution plans (multi-step agentic AI)
    AiAgentExecutions(ExecutionParams),
    /// Query Now Assist usage metrics, including GenAI errors
    NowAssistMetrics(RecentParams),
    /// Query Now Assist metadata with user feedback and prompts
    NowAssistMetadata(RecentParams),
    /// Compare resolution times of AI-assisted and unassisted records
    AiRoiAnalysis(RoiParams),
    /// Query workflow contexts
    WorkflowContext(RecentParams),
    /// Query currently executing workflows
    WorkflowExecuting(ExecutingParams),
    /// Query workflow execution history
    WorkflowHistory(HistoryParams),
    /// Query workflow logs
    WorkflowLogs(LogParams),
    /// Query application logs
    Syslog(SyslogParams),
    /// Query outbound REST message configurations
    RestMessages(RecentParams),
    /// Query incidents by number or sys_id
    Incidents(IncidentParams),
    /// Run any tool by name with JSON arguments
    Call {
        /// Tool name, as listed by `snowprobe tools`
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}", value_name = "JSON")]
        args: String,
    },
    /// Print every tool definition as JSON
    Tools,
}

/// What a parsed command asks the binary to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Tool { name: String, args: Value },
    ListTools,
}

fn tool<T: Serialize>(name: &str, params: &T) -> Result<Invocation> {
    let args = serde_json::to_value(params)
        .with_context(|| format!("Failed to encode arguments for {}", name))?;
    Ok(Invocation::Tool {
        name: name.to_string(),
        args,
    })
}

impl Command {
    /// Resolve the command into a tool call or a definitions listing.
    pub fn invocation(&self) -> Result<Invocation> {
        match self {
            Command::AiAgentExecutions(p) => tool("ai_agent_executions", p),
            Command::NowAssistMetrics(p) => tool("now_assist_metrics", p),
            Command::NowAssistMetadata(p) => tool("now_assist_metadata", p),
            Command::AiRoiAnalysis(p) => tool("ai_roi_analysis", p),
            Command::WorkflowContext(p) => tool("workflow_context", p),
            Command::WorkflowExecuting(p) => tool("workflow_executing", p),
            Command::WorkflowHistory(p) => tool("workflow_history", p),
            Command::WorkflowLogs(p) => tool("workflow_logs", p),
            Command::Syslog(p) => tool("syslog", p),
            Command::RestMessages(p) => tool("rest_messages", p),
            Command::Incidents(p) => tool("incidents", p),
            Command::Call { tool, args } => {
                let args: Value = serde_json::from_str(args)
                    .with_context(|| format!("--args is not valid JSON: {}", args))?;
                if !args.is_object() {
                    anyhow::bail!("--args must be a JSON object");
                }
                Ok(Invocation::Tool {
                    name: tool.clone(),
                    args,
                })
            }
            Command::Tools => Ok(Invocation::ListTools),
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("No command given. Run with --help to list the tools".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref url) = self.instance {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Instance URL must start with 'http://' or 'https://'".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
