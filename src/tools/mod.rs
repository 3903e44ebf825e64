//! Tool definitions and dispatch.
//!
//! Each tool is one read-only query against the instance. Tools always
//! answer with a string: upstream failures, empty result sets and bad
//! arguments are all rendered as text for the caller to read.

pub mod ai;
pub mod roi;
pub mod system;
pub mod workflows;

use crate::client::{TableClient, TableQuery};
use crate::report::join_sections;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Default number of records a listing tool returns.
pub(crate) fn default_limit() -> u32 {
    20
}

/// Default look-back window for recent activity, in minutes.
pub(crate) fn default_recent_minutes() -> u32 {
    60
}

/// Default look-back window for history-style tools (24 hours).
pub(crate) fn default_history_minutes() -> u32 {
    1440
}

/// Tool definition in the function-calling format agent hosts expect.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    fn function(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// Run a listing query and format each record, or return the empty-state text.
pub(crate) async fn list_records<F>(
    client: &TableClient,
    table: &str,
    query: &TableQuery,
    empty_message: &str,
    format: F,
) -> String
where
    F: Fn(&Value) -> String,
{
    match client.fetch_records(table, query).await {
        Err(e) => {
            match e.message() {
                Some(message) => warn!("Query against {} rejected: {}", table, message),
                None => warn!("Query against {} failed: {}", table, e),
            }
            e.to_string()
        }
        Ok(records) if records.is_empty() => empty_message.to_string(),
        Ok(records) => {
            let sections: Vec<String> = records.iter().map(|r| format(r)).collect();
            join_sections(&sections)
        }
    }
}

fn parse_args<T: DeserializeOwned>(name: &str, args: &Value) -> Result<T, String> {
    let args = if args.is_null() {
        json!({})
    } else {
        args.clone()
    };
    serde_json::from_value(args)
        .map_err(|e| format!("Error: invalid arguments for {}: {}", name, e))
}

/// Dispatches tool calls by name against one instance.
pub struct ToolRegistry {
    client: TableClient,
    /// Cap on records read per table by the ROI analysis.
    fetch_limit: u32,
}

impl ToolRegistry {
    pub fn new(client: TableClient, fetch_limit: u32) -> Self {
        Self {
            client,
            fetch_limit,
        }
    }

    /// Execute a tool call and return its text output.
    pub async fn execute(&self, name: &str, args: &Value) -> String {
        debug!("Executing tool: {} with args: {}", name, args);

        match self.dispatch(name, args).await {
            Ok(output) => {
                info!("Tool {} executed", name);
                output
            }
            Err(e) => {
                warn!("Tool {} not executed: {}", name, e);
                e
            }
        }
    }

    /// Run the named tool. `Err` means the call never reached the instance.
    async fn dispatch(&self, name: &str, args: &Value) -> Result<String, String> {
        let client = &self.client;

        let output = match name {
            "ai_agent_executions" => {
                ai::ai_agent_executions(client, &parse_args(name, args)?).await
            }
            "now_assist_metrics" => ai::now_assist_metrics(client, &parse_args(name, args)?).await,
            "now_assist_metadata" => {
                ai::now_assist_metadata(client, &parse_args(name, args)?).await
            }
            "ai_roi_analysis" => {
                roi::ai_roi_analysis(client, &parse_args(name, args)?, self.fetch_limit).await
            }
            "workflow_context" => {
                workflows::workflow_context(client, &parse_args(name, args)?).await
            }
            "workflow_executing" => {
                workflows::workflow_executing(client, &parse_args(name, args)?).await
            }
            "workflow_history" => {
                workflows::workflow_history(client, &parse_args(name, args)?).await
            }
            "workflow_logs" => workflows::workflow_logs(client, &parse_args(name, args)?).await,
            "syslog" => system::syslog(client, &parse_args(name, args)?).await,
            "rest_messages" => system::rest_messages(client, &parse_args(name, args)?).await,
            "incidents" => system::incidents(client, &parse_args(name, args)?).await,
            _ => return Err(format!("Error: Unknown tool: {}", name)),
        };

        Ok(output)
    }
}

fn limit_schema(default: u32) -> Value {
    json!({
        "type": "integer",
        "description": format!("Maximum number of results (default {})", default)
    })
}

fn minutes_schema(default: u32) -> Value {
    json!({
        "type": "integer",
        "description": format!("Look back this many minutes (default {})", default)
    })
}

fn text_schema(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

/// Definitions of every tool, for agent hosts and `snowprobe tools`.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::function(
            "ai_agent_executions",
            "Query AI Agent execution plans (multi-step agentic AI). For Now Assist skills use now_assist_metrics.",
            json!({
                "type": "object",
                "properties": {
                    "status": text_schema("Filter by status (partial match)"),
                    "limit": limit_schema(20),
                    "minutes_ago": minutes_schema(60)
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "now_assist_metrics",
            "Query Now Assist usage metrics (summarization, resolution notes, skills), including GenAI errors.",
            json!({
                "type": "object",
                "properties": {
                    "limit": limit_schema(20),
                    "minutes_ago": minutes_schema(60)
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "now_assist_metadata",
            "Query Now Assist metadata with user feedback and prompts.",
            json!({
                "type": "object",
                "properties": {
                    "limit": limit_schema(20),
                    "minutes_ago": minutes_schema(60)
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "ai_roi_analysis",
            "Compare resolution times of AI-assisted and unassisted task records.",
            json!({
                "type": "object",
                "properties": {
                    "table_name": {
                        "type": "string",
                        "enum": ["incident", "change_request", "problem", "sn_customerservice_case"],
                        "description": "Task table to analyze (default incident)"
                    },
                    "breakdown_by": {
                        "type": "string",
                        "enum": ["priority", "category", "group", "none"],
                        "description": "Dimension to break the comparison down by (default priority)"
                    }
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "workflow_context",
            "Query workflow contexts to see workflow executions.",
            json!({
                "type": "object",
                "properties": {
                    "limit": limit_schema(20),
                    "minutes_ago": minutes_schema(60)
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "workflow_executing",
            "Query currently executing workflows in real-time.",
            json!({
                "type": "object",
                "properties": {
                    "workflow_name": text_schema("Filter by workflow name (partial match)"),
                    "limit": limit_schema(20)
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "workflow_history",
            "Query workflow execution history (completed and failed).",
            json!({
                "type": "object",
                "properties": {
                    "workflow_name": text_schema("Filter by workflow name (partial match)"),
                    "limit": limit_schema(20),
                    "minutes_ago": minutes_schema(1440)
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "workflow_logs",
            "Query detailed workflow logs with error filtering.",
            json!({
                "type": "object",
                "properties": {
                    "workflow_name": text_schema("Filter by workflow name (partial match)"),
                    "level": {
                        "type": "string",
                        "enum": ["error", "warn", "info", "debug"],
                        "description": "Filter by log level"
                    },
                    "limit": limit_schema(20),
                    "minutes_ago": minutes_schema(1440)
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "syslog",
            "Query application logs (syslog).",
            json!({
                "type": "object",
                "properties": {
                    "message_contains": text_schema("Filter by message content (partial match)"),
                    "source": text_schema("Filter by log source (partial match)"),
                    "level": {
                        "type": "string",
                        "description": "Filter by log level: 0/error, 1/warning, 2/info, 3/debug"
                    },
                    "limit": limit_schema(20),
                    "minutes_ago": minutes_schema(60)
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "rest_messages",
            "Query REST message configurations for outbound integrations.",
            json!({
                "type": "object",
                "properties": {
                    "limit": limit_schema(20),
                    "minutes_ago": minutes_schema(60)
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "incidents",
            "Query incident records by number or sys_id for AI activity context.",
            json!({
                "type": "object",
                "properties": {
                    "number": text_schema("Incident number, e.g. INC0009005 (partial match)"),
                    "sys_id": text_schema("Incident sys_id for exact lookup"),
                    "limit": limit_schema(10),
                    "minutes_ago": minutes_schema(1440)
                },
                "required": []
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::mock_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_tool_definitions() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 11);

        let names: Vec<_> = tools.iter().map(|t| t.function.name.as_str()).collect();
        assert!(names.contains(&"syslog"));
        assert!(names.contains(&"incidents"));
        assert!(names.contains(&"ai_roi_analysis"));
        assert!(names.contains(&"workflow_logs"));
        assert!(tools.iter().all(|t| t.tool_type == "function"));
    }

    #[tokio::test]
    async fn test_every_definition_dispatches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": []})),
            )
            .mount(&server)
            .await;

        let registry = ToolRegistry::new(mock_client(&server), 1000);
        for tool in get_tool_definitions() {
            let output = registry.execute(&tool.function.name, &Value::Null).await;
            assert!(
                !output.starts_with("Error:"),
                "{} returned {}",
                tool.function.name,
                output
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = MockServer::start().await;
        let registry = ToolRegistry::new(mock_client(&server), 1000);

        let output = registry.execute("drop_tables", &json!({})).await;
        assert_eq!(output, "Error: Unknown tool: drop_tables");
    }

    #[tokio::test]
    async fn test_invalid_arguments_reported() {
        let server = MockServer::start().await;
        let registry = ToolRegistry::new(mock_client(&server), 1000);

        let output = registry.execute("syslog", &json!({"limit": "lots"})).await;
        assert!(output.starts_with("Error: invalid arguments for syslog"));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_calls_before_querying() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let registry = ToolRegistry::new(mock_client(&server), 1000);

        assert!(registry.dispatch("drop_tables", &json!({})).await.is_err());
        assert!(registry
            .dispatch("syslog", &json!({"limit": "lots"}))
            .await
            .is_err());

        // An upstream failure still counts as an executed tool.
        let output = registry.dispatch("syslog", &json!({})).await;
        assert_eq!(output, Ok("Error: 500 - boom".to_string()));
    }

    #[tokio::test]
    async fn test_upstream_error_is_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/now/table/wf_context"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let registry = ToolRegistry::new(mock_client(&server), 1000);
        let output = registry.execute("workflow_context", &json!({})).await;
        assert_eq!(output, "Error: 500 - boom");
    }
}
