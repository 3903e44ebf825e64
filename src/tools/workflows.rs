//! Classic workflow engine tools.

use super::ai::RecentParams;
use super::{default_history_minutes, default_limit, list_records};
use crate::client::{TableClient, TableQuery};
use crate::models::{field_or_na, field_text};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct ExecutingParams {
    /// Filter by workflow name (partial match)
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub workflow_name: String,

    /// Maximum number of results
    #[arg(long, default_value_t = default_limit())]
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct HistoryParams {
    /// Filter by workflow name (partial match)
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub workflow_name: String,

    /// Maximum number of results
    #[arg(long, default_value_t = default_limit())]
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Look back this many minutes
    #[arg(long, default_value_t = default_history_minutes())]
    #[serde(default = "default_history_minutes")]
    pub minutes_ago: u32,
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct LogParams {
    /// Filter by workflow name (partial match)
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub workflow_name: String,

    /// Filter by log level: error, warn, info or debug
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub level: String,

    /// Maximum number of results
    #[arg(long, default_value_t = default_limit())]
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Look back this many minutes
    #[arg(long, default_value_t = default_history_minutes())]
    #[serde(default = "default_history_minutes")]
    pub minutes_ago: u32,
}

/// Level values stored in `wf_log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowLogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl fmt::Display for WorkflowLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowLogLevel::Error => "error",
            WorkflowLogLevel::Warn => "warn",
            WorkflowLogLevel::Info => "info",
            WorkflowLogLevel::Debug => "debug",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for WorkflowLogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(WorkflowLogLevel::Error),
            "warn" | "warning" => Ok(WorkflowLogLevel::Warn),
            "info" => Ok(WorkflowLogLevel::Info),
            "debug" => Ok(WorkflowLogLevel::Debug),
            _ => Err(format!(
                "Error: Invalid level '{}'. Use error, warn, info or debug.",
                s
            )),
        }
    }
}

/// Workflow contexts created recently.
pub async fn workflow_context(client: &TableClient, params: &RecentParams) -> String {
    let query = TableQuery::new()
        .within_minutes("sys_created_on", params.minutes_ago)
        .order_by_desc("sys_created_on")
        .limit(params.limit);

    list_records(
        client,
        "wf_context",
        &query,
        "No workflow contexts found matching your criteria.",
        |entry| {
            format!(
                "[{}]\n  Workflow: {}\n  State: {}\n  Sys ID: {}",
                field_or_na(entry, "sys_created_on"),
                field_or_na(entry, "workflow"),
                field_or_na(entry, "state"),
                field_or_na(entry, "sys_id")
            )
        },
    )
    .await
}

/// Workflows executing right now. No recency window applies.
pub async fn workflow_executing(client: &TableClient, params: &ExecutingParams) -> String {
    let query = TableQuery::new()
        .like("name", &params.workflow_name)
        .order_by_desc("sys_created_on")
        .limit(params.limit);

    list_records(
        client,
        "wf_executing",
        &query,
        "No currently executing workflows found.",
        |entry| {
            format!(
                "[{}]\n  Workflow: {}\n  Context: {}\n  Activity: {}\n  State: {}",
                field_or_na(entry, "sys_created_on"),
                field_or_na(entry, "name"),
                field_or_na(entry, "context"),
                field_or_na(entry, "activity"),
                field_or_na(entry, "state")
            )
        },
    )
    .await
}

/// Completed and failed workflow activity.
pub async fn workflow_history(client: &TableClient, params: &HistoryParams) -> String {
    let query = TableQuery::new()
        .like("workflow_version", &params.workflow_name)
        .within_minutes("sys_created_on", params.minutes_ago)
        .order_by_desc("sys_created_on")
        .limit(params.limit);

    list_records(
        client,
        "wf_history",
        &query,
        "No workflow history found matching your criteria.",
        |entry| {
            format!(
                "[{}]\n  Workflow: {}\n  Activity: {}\n  Result: {}\n  Duration: {}",
                field_or_na(entry, "sys_created_on"),
                field_or_na(entry, "workflow_version"),
                field_or_na(entry, "activity"),
                field_or_na(entry, "result"),
                field_or_na(entry, "duration")
            )
        },
    )
    .await
}

/// Workflow log lines, optionally restricted to one level.
pub async fn workflow_logs(client: &TableClient, params: &LogParams) -> String {
    let level = if params.level.trim().is_empty() {
        None
    } else {
        match params.level.parse::<WorkflowLogLevel>() {
            Ok(level) => Some(level),
            Err(e) => return e,
        }
    };

    let query = TableQuery::new()
        .like("workflow_version", &params.workflow_name)
        .equals(
            "level",
            &level.map(|l| l.to_string()).unwrap_or_default(),
        )
        .within_minutes("sys_created_on", params.minutes_ago)
        .order_by_desc("sys_created_on")
        .limit(params.limit);

    list_records(
        client,
        "wf_log",
        &query,
        "No workflow logs found matching your criteria.",
        |entry| {
            format!(
                "[{}] {}\n  Workflow: {}\n  Activity: {}\n  Message: {}",
                field_or_na(entry, "sys_created_on"),
                field_text(entry, "level")
                    .unwrap_or_else(|| "INFO".to_string())
                    .to_uppercase(),
                field_or_na(entry, "workflow_version"),
                field_or_na(entry, "activity"),
                field_or_na(entry, "message")
            )
        },
    )
    .await
}
