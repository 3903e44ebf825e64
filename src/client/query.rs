//! Typed builder for Table API queries.
//!
//! Conditions are kept as structured values and only serialized into the
//! `sysparm_query` encoded-query string when the request is sent, so a
//! filter value typed by a user can never smuggle in an extra condition.

use std::fmt;

/// Delimiter between encoded-query conditions.
const CONDITION_DELIMITER: char = '^';

/// A single encoded-query condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `<field>LIKE<value>` substring match.
    Like { field: String, value: String },
    /// `<field>=<value>` exact match.
    Equals { field: String, value: String },
    /// `<field>RELATIVEGT@minute@ago@<n>`: field is within the last `n` minutes.
    WithinMinutes { field: String, minutes: u32 },
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Like { field, value } => write!(f, "{}LIKE{}", field, sanitize(value)),
            Condition::Equals { field, value } => write!(f, "{}={}", field, sanitize(value)),
            Condition::WithinMinutes { field, minutes } => {
                write!(f, "{}RELATIVEGT@minute@ago@{}", field, minutes)
            }
        }
    }
}

/// Strip characters that would end the current condition or corrupt the query.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != CONDITION_DELIMITER && !c.is_control())
        .collect()
}

/// Query against one table: conditions, ordering, and result shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    conditions: Vec<Condition>,
    order_by_desc: Option<String>,
    limit: Option<u32>,
    display_value: bool,
    fields: Vec<String>,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            order_by_desc: None,
            limit: None,
            display_value: true,
            fields: Vec::new(),
        }
    }
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a substring filter. Empty values are ignored, matching "no filter".
    pub fn like(mut self, field: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.conditions.push(Condition::Like {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
        self
    }

    /// Add an equality filter. Empty values are ignored.
    pub fn equals(mut self, field: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.conditions.push(Condition::Equals {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
        self
    }

    /// Restrict to records whose `field` falls within the last `minutes` minutes.
    pub fn within_minutes(mut self, field: &str, minutes: u32) -> Self {
        self.conditions.push(Condition::WithinMinutes {
            field: field.to_string(),
            minutes,
        });
        self
    }

    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order_by_desc = Some(field.to_string());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Ask for raw values instead of display values.
    pub fn raw_values(mut self) -> Self {
        self.display_value = false;
        self
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// The serialized `sysparm_query` value, or `None` if there is nothing to send.
    pub fn encoded(&self) -> Option<String> {
        let mut parts: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();

        if let Some(ref field) = self.order_by_desc {
            parts.push(format!("ORDERBYDESC{}", field));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(&CONDITION_DELIMITER.to_string()))
        }
    }

    /// Request parameters for the Table API.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(query) = self.encoded() {
            params.push(("sysparm_query", query));
        }
        if let Some(limit) = self.limit {
            params.push(("sysparm_limit", limit.to_string()));
        }
        if self.display_value {
            params.push(("sysparm_display_value", "true".to_string()));
        }
        if !self.fields.is_empty() {
            params.push(("sysparm_fields", self.fields.join(",")));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_syslog_style_query() {
        let query = TableQuery::new()
            .like("message", "timeout")
            .like("source", "")
            .equals("level", "0")
            .within_minutes("sys_created_on", 60)
            .order_by_desc("sys_created_on")
            .limit(20);

        assert_eq!(
            query.encoded().as_deref(),
            Some("messageLIKEtimeout^level=0^sys_created_onRELATIVEGT@minute@ago@60^ORDERBYDESCsys_created_on")
        );
    }

    #[test]
    fn test_empty_filters_are_skipped() {
        let query = TableQuery::new().like("name", "").equals("level", "");
        assert!(query.conditions.is_empty());
        assert_eq!(query.encoded(), None);
    }

    #[test]
    fn test_order_only_query() {
        let query = TableQuery::new().order_by_desc("sys_created_on");
        assert_eq!(
            query.encoded().as_deref(),
            Some("ORDERBYDESCsys_created_on")
        );
    }

    #[test]
    fn test_delimiter_cannot_inject_condition() {
        let query = TableQuery::new().like("message", "foo^active=false\n");
        assert_eq!(
            query.encoded().as_deref(),
            Some("messageLIKEfooactive=false")
        );
        assert_eq!(query.conditions.len(), 1);
    }

    #[test]
    fn test_params() {
        let query = TableQuery::new()
            .order_by_desc("sys_created_on")
            .limit(5)
            .fields(&["number", "state"]);
        let params = query.to_params();

        assert_eq!(param(&params, "sysparm_limit"), Some("5"));
        assert_eq!(param(&params, "sysparm_display_value"), Some("true"));
        assert_eq!(param(&params, "sysparm_fields"), Some("number,state"));

        let raw = TableQuery::new().raw_values().to_params();
        assert!(param(&raw, "sysparm_display_value").is_none());
        assert!(param(&raw, "sysparm_query").is_none());
    }
}
