//! Platform tools: application log, outbound REST configuration, incidents.

use super::ai::RecentParams;
use super::{default_history_minutes, default_limit, default_recent_minutes, list_records};
use crate::client::{ClientError, TableClient, TableQuery};
use crate::models::{field_or_na, field_text};
use crate::report::{join_sections, truncate};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

const INCIDENT_TABLE: &str = "incident";

const INCIDENT_FIELDS: &[&str] = &[
    "sys_id",
    "number",
    "short_description",
    "description",
    "state",
    "priority",
    "urgency",
    "impact",
    "category",
    "assigned_to",
    "assignment_group",
    "sys_created_on",
    "sys_updated_on",
    "work_notes",
    "close_notes",
];

/// Long free-text incident fields are cut to this many characters.
const NOTE_MAX_CHARS: usize = 200;

const INCIDENT_PERMISSION_HINT: &str = "Error: Permission denied. The integration user may not have read access to the incident table. Grant it the itil role or an incident read ACL.";

fn default_incident_limit() -> u32 {
    10
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct SyslogParams {
    /// Filter by message content (partial match)
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub message_contains: String,

    /// Filter by log source (partial match)
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub source: String,

    /// Filter by log level: 0/error, 1/warning, 2/info, 3/debug
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub level: String,

    /// Maximum number of results
    #[arg(long, default_value_t = default_limit())]
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Look back this many minutes
    #[arg(long, default_value_t = default_recent_minutes())]
    #[serde(default = "default_recent_minutes")]
    pub minutes_ago: u32,
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct IncidentParams {
    /// Incident number, e.g. INC0009005 (partial match)
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub number: String,

    /// Incident sys_id for exact lookup
    #[arg(long, default_value_t)]
    #[serde(default)]
    pub sys_id: String,

    /// Maximum number of results
    #[arg(long, default_value_t = default_incident_limit())]
    #[serde(default = "default_incident_limit")]
    pub limit: u32,

    /// Look back this many minutes (by last update)
    #[arg(long, default_value_t = default_history_minutes())]
    #[serde(default = "default_history_minutes")]
    pub minutes_ago: u32,
}

/// Syslog severity. The table stores it as a digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyslogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl SyslogLevel {
    pub fn code(&self) -> &'static str {
        match self {
            SyslogLevel::Error => "0",
            SyslogLevel::Warning => "1",
            SyslogLevel::Info => "2",
            SyslogLevel::Debug => "3",
        }
    }
}

impl FromStr for SyslogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "error" => Ok(SyslogLevel::Error),
            "1" | "warning" | "warn" => Ok(SyslogLevel::Warning),
            "2" | "info" => Ok(SyslogLevel::Info),
            "3" | "debug" => Ok(SyslogLevel::Debug),
            _ => Err(format!(
                "Error: Invalid level '{}'. Use 0/error, 1/warning, 2/info or 3/debug.",
                s
            )),
        }
    }
}

/// Application log entries, newest first.
pub async fn syslog(client: &TableClient, params: &SyslogParams) -> String {
    let level = if params.level.trim().is_empty() {
        ""
    } else {
        match params.level.parse::<SyslogLevel>() {
            Ok(level) => level.code(),
            Err(e) => return e,
        }
    };

    let query = TableQuery::new()
        .like("message", &params.message_contains)
        .like("source", &params.source)
        .equals("level", level)
        .within_minutes("sys_created_on", params.minutes_ago)
        .order_by_desc("sys_created_on")
        .limit(params.limit)
        .raw_values()
        .fields(&["sys_created_on", "level", "source", "message"]);

    list_records(
        client,
        "syslog",
        &query,
        "No syslog entries found matching your criteria.",
        |entry| {
            format!(
                "[{}] {} | {}\n{}\n",
                field_or_na(entry, "sys_created_on"),
                field_or_na(entry, "level").to_uppercase(),
                field_or_na(entry, "source"),
                field_text(entry, "message").unwrap_or_else(|| "No message".to_string())
            )
        },
    )
    .await
}

/// Outbound REST message definitions created recently.
pub async fn rest_messages(client: &TableClient, params: &RecentParams) -> String {
    let query = TableQuery::new()
        .within_minutes("sys_created_on", params.minutes_ago)
        .order_by_desc("sys_created_on")
        .limit(params.limit);

    list_records(
        client,
        "sys_rest_message",
        &query,
        "No REST messages found matching your criteria.",
        |entry| {
            format!(
                "[{}]\n  Name: {}\n  Endpoint: {}\n  Sys ID: {}",
                field_or_na(entry, "sys_created_on"),
                field_or_na(entry, "name"),
                field_or_na(entry, "endpoint"),
                field_or_na(entry, "sys_id")
            )
        },
    )
    .await
}

/// Incident lookup by sys_id, or a recent-updates listing filtered by number.
pub async fn incidents(client: &TableClient, params: &IncidentParams) -> String {
    if !params.sys_id.is_empty() {
        return incident_by_sys_id(client, &params.sys_id).await;
    }

    let query = TableQuery::new()
        .like("number", &params.number)
        .within_minutes("sys_updated_on", params.minutes_ago)
        .order_by_desc("sys_updated_on")
        .limit(params.limit)
        .fields(INCIDENT_FIELDS);

    match client.fetch_records(INCIDENT_TABLE, &query).await {
        Ok(records) if records.is_empty() => {
            "No incidents found matching your criteria.".to_string()
        }
        Ok(records) => {
            let sections: Vec<String> = records.iter().map(format_incident).collect();
            join_sections(&sections)
        }
        Err(e) => incident_error(e),
    }
}

async fn incident_by_sys_id(client: &TableClient, sys_id: &str) -> String {
    let query = TableQuery::new().fields(INCIDENT_FIELDS);
    let not_found = format!("Incident not found with sys_id: {}", sys_id);

    match client.fetch_record(INCIDENT_TABLE, sys_id, &query).await {
        Ok(Some(record)) => format_incident(&record),
        Ok(None) => not_found,
        Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => not_found,
        Err(e) => incident_error(e),
    }
}

fn incident_error(e: ClientError) -> String {
    warn!("Incident query failed: {}", e);
    if e.status() == Some(StatusCode::FORBIDDEN) {
        INCIDENT_PERMISSION_HINT.to_string()
    } else {
        e.to_string()
    }
}

fn format_incident(entry: &Value) -> String {
    let mut out = format!(
        "[{}] {}\n  State: {}\n  Priority: {} (Urgency: {}, Impact: {})\n  Category: {}\n  Assigned To: {}\n  Assignment Group: {}\n  Created: {}\n  Updated: {}\n  Description: {}\n",
        field_or_na(entry, "number"),
        field_or_na(entry, "short_description"),
        field_or_na(entry, "state"),
        field_or_na(entry, "priority"),
        field_or_na(entry, "urgency"),
        field_or_na(entry, "impact"),
        field_or_na(entry, "category"),
        field_text(entry, "assigned_to").unwrap_or_else(|| "Unassigned".to_string()),
        field_or_na(entry, "assignment_group"),
        field_or_na(entry, "sys_created_on"),
        field_or_na(entry, "sys_updated_on"),
        truncate(&field_or_na(entry, "description"), NOTE_MAX_CHARS),
    );

    if let Some(notes) = field_text(entry, "work_notes") {
        out.push_str(&format!("  Work Notes: {}\n", truncate(&notes, NOTE_MAX_CHARS)));
    }
    if let Some(notes) = field_text(entry, "close_notes") {
        out.push_str(&format!("  Close Notes: {}\n", truncate(&notes, NOTE_MAX_CHARS)));
    }
    out.push_str(&format!("  Sys ID: {}", field_or_na(entry, "sys_id")));
    out
}
