//! AI ROI analysis tool.
//!
//! Reads recent AI agent executions and the chosen task table, attributes
//! executions to task numbers found in their objectives, and compares
//! resolution times of assisted and unassisted records.

use super::ai::EXECUTION_PLAN_TABLE;
use crate::analysis::{analyze, Correlator};
use crate::client::{ClientError, TableClient, TableQuery};
use crate::models::{Breakdown, ExecutionRecord, TaskRecord, TaskType};
use crate::report::render_roi_report;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const EXECUTION_FIELDS: &[&str] = &[
    "sys_id",
    "sys_created_on",
    "agent",
    "objective",
    "state",
    "execution_time_sec",
];

fn default_table_name() -> String {
    TaskType::Incident.table().to_string()
}

fn default_breakdown() -> String {
    "priority".to_string()
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct RoiParams {
    /// Task table: incident, change_request, problem or sn_customerservice_case
    #[arg(long, default_value_t = default_table_name())]
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Breakdown dimension: priority, category, group or none
    #[arg(long, default_value_t = default_breakdown())]
    #[serde(default = "default_breakdown")]
    pub breakdown_by: String,
}

/// Run the ROI comparison for one task table and render the report.
pub async fn ai_roi_analysis(client: &TableClient, params: &RoiParams, fetch_limit: u32) -> String {
    let task_type = match params.table_name.parse::<TaskType>() {
        Ok(t) => t,
        Err(e) => return e,
    };
    let breakdown = match params.breakdown_by.parse::<Breakdown>() {
        Ok(b) => b,
        Err(e) => return e,
    };
    let correlator = match Correlator::standard() {
        Ok(c) => c,
        Err(e) => return format!("Error: invalid record number pattern - {}", e),
    };

    let executions = match fetch_executions(client, fetch_limit).await {
        Ok(executions) => executions,
        Err(e) => return e.to_string(),
    };
    let correlation = correlator.correlate(executions);
    debug!(
        "Correlated AI activity for {} record(s)",
        correlation.record_count()
    );

    let tasks = match fetch_tasks(client, task_type, fetch_limit).await {
        Ok(tasks) => tasks,
        Err(e) => return e.to_string(),
    };

    let activity = correlation.activity(task_type);
    let analysis = analyze(task_type, &activity, &tasks, breakdown);
    info!(
        "ROI analysis for {}: {} record(s), {} resolved",
        task_type,
        analysis.total_records,
        analysis.resolved()
    );

    render_roi_report(&analysis)
}

async fn fetch_executions(
    client: &TableClient,
    fetch_limit: u32,
) -> Result<Vec<ExecutionRecord>, ClientError> {
    let query = TableQuery::new()
        .order_by_desc("sys_created_on")
        .fields(EXECUTION_FIELDS)
        .limit(fetch_limit);

    let records = client.fetch_records(EXECUTION_PLAN_TABLE, &query).await?;
    Ok(records.iter().map(ExecutionRecord::from_json).collect())
}

async fn fetch_tasks(
    client: &TableClient,
    task_type: TaskType,
    fetch_limit: u32,
) -> Result<Vec<TaskRecord>, ClientError> {
    let query = TableQuery::new()
        .order_by_desc("sys_created_on")
        .fields(&task_type.fields())
        .limit(fetch_limit);

    let records = client.fetch_records(task_type.table(), &query).await?;
    Ok(records
        .iter()
        .map(|r| TaskRecord::from_json(task_type, r))
        .collect())
}
