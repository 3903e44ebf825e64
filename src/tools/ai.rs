//! AI activity tools: agent execution plans and Now Assist usage.

use super::{default_limit, default_recent_minutes, list_records};
use crate::client::{TableClient, TableQuery};
use crate::models::{field_or_na, field_text};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EXECUTION_PLAN_TABLE: &str = "sn_aia_execution_plan";
const METRIC_TABLE: &str = "sys_generative_ai_metric";
const METADATA_TABLE: &str = "sys_gen_ai_log_metadata";

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Filter by status (partial match)
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub status: String,

    /// Maximum number of results
    #[arg(long, default_value_t = default_limit())]
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Look back this many minutes
    #[arg(long, default_value_t = default_recent_minutes())]
    #[serde(default = "default_recent_minutes")]
    pub minutes_ago: u32,
}

/// Parameters shared by the Now Assist tools.
#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct RecentParams {
    /// Maximum number of results
    #[arg(long, default_value_t = default_limit())]
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Look back this many minutes
    #[arg(long, default_value_t = default_recent_minutes())]
    #[serde(default = "default_recent_minutes")]
    pub minutes_ago: u32,
}

fn recent_query(limit: u32, minutes_ago: u32) -> TableQuery {
    TableQuery::new()
        .within_minutes("sys_created_on", minutes_ago)
        .order_by_desc("sys_created_on")
        .limit(limit)
}

/// AI Agent execution plans (multi-step agentic AI), newest first.
pub async fn ai_agent_executions(client: &TableClient, params: &ExecutionParams) -> String {
    let query = TableQuery::new()
        .like("status", &params.status)
        .within_minutes("sys_created_on", params.minutes_ago)
        .order_by_desc("sys_created_on")
        .limit(params.limit);

    list_records(
        client,
        EXECUTION_PLAN_TABLE,
        &query,
        "No AI Agent execution plans found matching your criteria.",
        |entry| {
            format!(
                "[{}] Status: {}\n  Sys ID: {}\n  Updated: {}",
                field_or_na(entry, "sys_created_on"),
                field_or_na(entry, "status"),
                field_or_na(entry, "sys_id"),
                field_or_na(entry, "sys_updated_on")
            )
        },
    )
    .await
}

/// Now Assist skill usage metrics, with any GenAI error surfaced.
pub async fn now_assist_metrics(client: &TableClient, params: &RecentParams) -> String {
    list_records(
        client,
        METRIC_TABLE,
        &recent_query(params.limit, params.minutes_ago),
        "No Now Assist metrics found matching your criteria.",
        format_metric,
    )
    .await
}

/// Now Assist metadata: prompts, responses and user feedback.
pub async fn now_assist_metadata(client: &TableClient, params: &RecentParams) -> String {
    list_records(
        client,
        METADATA_TABLE,
        &recent_query(params.limit, params.minutes_ago),
        "No Now Assist metadata found matching your criteria.",
        |entry| {
            format!(
                "[{}]\n  Feedback: {}\n  Sys ID: {}",
                field_or_na(entry, "sys_created_on"),
                field_or_na(entry, "feedback"),
                field_or_na(entry, "sys_id")
            )
        },
    )
    .await
}

fn format_metric(entry: &Value) -> String {
    let value = field_text(entry, "value").unwrap_or_default();
    let details = MetricDetails::from_value(&value);

    let mut out = format!(
        "[{}]\n  Name: {}\n  Type: {}\n  Source: {}\n",
        field_or_na(entry, "sys_created_on"),
        field_or_na(entry, "name"),
        field_or_na(entry, "type"),
        field_or_na(entry, "source")
    );
    if let Some(activity) = details.activity {
        out.push_str(&format!("  Activity: {}\n", activity));
    }
    if let Some(error) = details.error {
        out.push_str(&format!("  ⚠️ Error: {}\n", error));
    }
    out.push_str(&format!("  Sys ID: {}", field_or_na(entry, "sys_id")));
    out
}

/// What can be read out of a metric's `value` payload.
#[derive(Debug, Default, PartialEq)]
struct MetricDetails {
    activity: Option<String>,
    error: Option<String>,
}

impl MetricDetails {
    fn from_value(value: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(value).ok();

        let error = if value.to_lowercase().contains("error") && value.contains("\"error\":") {
            match parsed.as_ref().and_then(Value::as_object) {
                Some(map) => map
                    .get("error")
                    .or_else(|| map.get("response").and_then(|r| r.get("error")))
                    .map(json_text)
                    .filter(|s| !s.is_empty()),
                None => Some("Error present (see details)".to_string()),
            }
        } else {
            None
        };

        let activity = if value.contains("\"type\":") {
            parsed
                .as_ref()
                .and_then(|json| json.get("type"))
                .map(json_text)
                .filter(|s| !s.is_empty())
        } else {
            None
        };

        Self { activity, error }
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
