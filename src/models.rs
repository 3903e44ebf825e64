//! Data models for records read from the instance.
//!
//! Table API rows arrive as loose JSON maps. The types here pull out the
//! handful of fields the ROI analysis needs and never fail on missing data.

use crate::analysis::resolution::{resolution_time, Resolution};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Read a field as display text.
///
/// With `sysparm_display_value=true`, reference fields come back as
/// `{"display_value": ..., "link": ...}` objects; those are reduced to the
/// display value. Empty strings and nulls count as absent.
pub fn field_text(record: &Value, key: &str) -> Option<String> {
    let text = match record.get(key)? {
        Value::String(s) => s.clone(),
        Value::Object(map) => map.get("display_value")?.as_str()?.to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Like [`field_text`] but with `N/A` for anything missing.
pub fn field_or_na(record: &Value, key: &str) -> String {
    field_text(record, key).unwrap_or_else(|| "N/A".to_string())
}

/// A task table the ROI analysis knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Incident,
    ChangeRequest,
    Problem,
    Case,
}

impl TaskType {
    /// All task types, in prefix-matching order.
    pub const ALL: [TaskType; 4] = [
        TaskType::Incident,
        TaskType::ChangeRequest,
        TaskType::Problem,
        TaskType::Case,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            TaskType::Incident => "incident",
            TaskType::ChangeRequest => "change_request",
            TaskType::Problem => "problem",
            TaskType::Case => "sn_customerservice_case",
        }
    }

    /// Record number prefix, e.g. `INC` in `INC0010234`.
    pub fn number_prefix(&self) -> &'static str {
        match self {
            TaskType::Incident => "INC",
            TaskType::ChangeRequest => "CHG",
            TaskType::Problem => "PRB",
            TaskType::Case => "CS",
        }
    }

    pub fn created_field(&self) -> &'static str {
        "sys_created_on"
    }

    pub fn resolved_field(&self) -> &'static str {
        match self {
            TaskType::Incident | TaskType::Problem => "resolved_at",
            TaskType::ChangeRequest | TaskType::Case => "closed_at",
        }
    }

    pub fn metric_name(&self) -> &'static str {
        match self {
            TaskType::Incident => "Mean Time to Resolution (MTTR)",
            TaskType::ChangeRequest => "Mean Time to Implementation",
            TaskType::Problem => "Mean Time to Root Cause",
            TaskType::Case => "Mean Time to Closure",
        }
    }

    /// Fields requested when bulk-reading this table.
    pub fn fields(&self) -> [&'static str; 8] {
        [
            "number",
            "sys_id",
            self.created_field(),
            self.resolved_field(),
            "state",
            "priority",
            "category",
            "assignment_group",
        ]
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.table() == s.trim())
            .ok_or_else(|| {
                format!(
                    "Error: Unknown table {}. Supported: incident, change_request, problem, sn_customerservice_case",
                    s
                )
            })
    }
}

/// Optional dimension used to stratify the ROI comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Breakdown {
    #[default]
    Priority,
    Category,
    Group,
    None,
}

impl Breakdown {
    /// Value of this dimension for a task record, or `None` for [`Breakdown::None`].
    pub fn key<'a>(&self, record: &'a TaskRecord) -> Option<&'a str> {
        match self {
            Breakdown::Priority => Some(record.priority.as_str()),
            Breakdown::Category => Some(record.category.as_str()),
            Breakdown::Group => Some(record.group.as_str()),
            Breakdown::None => None,
        }
    }
}

impl fmt::Display for Breakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breakdown::Priority => write!(f, "priority"),
            Breakdown::Category => write!(f, "category"),
            Breakdown::Group => write!(f, "group"),
            Breakdown::None => write!(f, "none"),
        }
    }
}

impl FromStr for Breakdown {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "priority" => Ok(Breakdown::Priority),
            "category" => Ok(Breakdown::Category),
            "group" | "assignment_group" => Ok(Breakdown::Group),
            "" | "none" => Ok(Breakdown::None),
            other => Err(format!(
                "Error: Unknown breakdown {}. Supported: priority, category, group, none",
                other
            )),
        }
    }
}

/// A logged AI agent execution plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub created_on: Option<String>,
    pub agent: Option<String>,
    pub objective: String,
    pub state: Option<String>,
    pub execution_time_sec: Option<String>,
}

impl ExecutionRecord {
    pub fn from_json(record: &Value) -> Self {
        Self {
            created_on: field_text(record, "sys_created_on"),
            agent: field_text(record, "agent"),
            objective: field_text(record, "objective").unwrap_or_default(),
            state: field_text(record, "state"),
            execution_time_sec: field_text(record, "execution_time_sec"),
        }
    }
}

/// A task record with its resolution time already worked out.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub number: String,
    pub resolution: Resolution,
    pub state: String,
    pub priority: String,
    pub category: String,
    pub group: String,
}

impl TaskRecord {
    pub fn from_json(task_type: TaskType, record: &Value) -> Self {
        let text = |key: &str| field_text(record, key).unwrap_or_default();

        let resolution = resolution_time(
            &text(task_type.created_field()),
            &text(task_type.resolved_field()),
        );

        Self {
            number: text("number"),
            resolution,
            state: text("state"),
            priority: text("priority"),
            category: text("category"),
            group: text("assignment_group"),
        }
    }

    pub fn resolution_hours(&self) -> Option<f64> {
        self.resolution.hours()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_text_reference_object() {
        let record = json!({
            "agent": {"display_value": "Triage Agent", "link": "https://x/api/now/table/sn_aia_agent/1"},
            "state": "",
            "count": 3,
            "missing": null,
        });

        assert_eq!(
            field_text(&record, "agent").as_deref(),
            Some("Triage Agent")
        );
        assert_eq!(field_text(&record, "state"), None);
        assert_eq!(field_text(&record, "count").as_deref(), Some("3"));
        assert_eq!(field_text(&record, "missing"), None);
        assert_eq!(field_or_na(&record, "nope"), "N/A");
    }

    #[test]
    fn test_task_type_from_table_name() {
        assert_eq!("incident".parse::<TaskType>(), Ok(TaskType::Incident));
        assert_eq!(
            "sn_customerservice_case".parse::<TaskType>(),
            Ok(TaskType::Case)
        );

        let err = "story".parse::<TaskType>().unwrap_err();
        assert!(err.starts_with("Error: Unknown table story."));
    }

    #[test]
    fn test_task_type_fields() {
        assert_eq!(TaskType::ChangeRequest.resolved_field(), "closed_at");
        assert_eq!(TaskType::Problem.resolved_field(), "resolved_at");
        assert!(TaskType::Case.fields().contains(&"closed_at"));
    }

    #[test]
    fn test_breakdown_parse() {
        assert_eq!("Priority".parse::<Breakdown>(), Ok(Breakdown::Priority));
        assert_eq!("".parse::<Breakdown>(), Ok(Breakdown::None));
        assert_eq!("group".parse::<Breakdown>(), Ok(Breakdown::Group));
        assert!("urgency".parse::<Breakdown>().is_err());
    }

    #[test]
    fn test_task_record_from_json() {
        let record = json!({
            "number": "CHG0030001",
            "sys_created_on": "2024-03-01 08:00:00",
            "closed_at": "2024-03-01 14:30:00",
            "state": "Closed",
            "priority": "2 - High",
            "category": "Software",
            "assignment_group": {"display_value": "Network", "link": "x"},
        });

        let task = TaskRecord::from_json(TaskType::ChangeRequest, &record);
        assert_eq!(task.number, "CHG0030001");
        assert_eq!(task.group, "Network");
        assert_eq!(task.resolution_hours(), Some(6.5));
        assert_eq!(Breakdown::Group.key(&task), Some("Network"));
        assert_eq!(Breakdown::None.key(&task), None);
    }

    #[test]
    fn test_execution_record_tolerates_missing_fields() {
        let exec = ExecutionRecord::from_json(&json!({"objective": "Fix INC0001"}));
        assert_eq!(exec.objective, "Fix INC0001");
        assert!(exec.agent.is_none());
        assert!(exec.created_on.is_none());
    }
}
