//! Correlates AI agent executions with the task records they worked on.
//!
//! An execution's free-text objective usually names its ticket ("Resolve
//! INC0010234 per policy"). Rules are tried in declared order and the first
//! one that matches claims the execution; later rules are not consulted.

use crate::models::{ExecutionRecord, TaskType};
use regex::Regex;
use std::collections::BTreeMap;

/// Executions keyed by the record number they reference, for one task type.
pub type AiActivity = BTreeMap<String, Vec<ExecutionRecord>>;

/// A record-number prefix bound to the task type it identifies.
#[derive(Debug, Clone)]
pub struct PrefixRule {
    pub task_type: TaskType,
    pattern: Regex,
}

impl PrefixRule {
    /// Matches `prefix` followed by one or more digits, ignoring case.
    pub fn new(task_type: TaskType, prefix: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"(?i){}\d+", regex::escape(prefix)))?;
        Ok(Self { task_type, pattern })
    }

    /// The matched record number, upper-cased.
    pub fn find(&self, text: &str) -> Option<String> {
        self.pattern.find(text).map(|m| m.as_str().to_uppercase())
    }
}

/// Execution records grouped by task type, then by record number.
#[derive(Debug, Clone, Default)]
pub struct CorrelationMap {
    by_type: BTreeMap<TaskType, AiActivity>,
}

impl CorrelationMap {
    /// Activity for one task type (empty if none matched).
    pub fn activity(&self, task_type: TaskType) -> AiActivity {
        self.by_type.get(&task_type).cloned().unwrap_or_default()
    }

    /// Number of distinct record numbers across all task types.
    pub fn record_count(&self) -> usize {
        self.by_type.values().map(|m| m.len()).sum()
    }
}

/// Assigns execution records to record numbers.
#[derive(Debug, Clone)]
pub struct Correlator {
    rules: Vec<PrefixRule>,
}

impl Correlator {
    /// Correlator over every known task type, in [`TaskType::ALL`] order.
    pub fn standard() -> Result<Self, regex::Error> {
        let rules = TaskType::ALL
            .into_iter()
            .map(|t| (t, t.number_prefix()))
            .collect::<Vec<_>>();
        Self::with_prefixes(&rules)
    }

    /// Correlator over an explicit, ordered rule list.
    pub fn with_prefixes(prefixes: &[(TaskType, &str)]) -> Result<Self, regex::Error> {
        let rules = prefixes
            .iter()
            .map(|(task_type, prefix)| PrefixRule::new(*task_type, prefix))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// First rule that matches `objective`, with the normalized record number.
    pub fn match_objective(&self, objective: &str) -> Option<(TaskType, String)> {
        self.rules
            .iter()
            .find_map(|rule| Some((rule.task_type, rule.find(objective)?)))
    }

    /// Group `executions` by the record they reference. Unmatched ones are dropped.
    pub fn correlate<I>(&self, executions: I) -> CorrelationMap
    where
        I: IntoIterator<Item = ExecutionRecord>,
    {
        let mut map = CorrelationMap::default();

        for execution in executions {
            if let Some((task_type, number)) = self.match_objective(&execution.objective) {
                map.by_type
                    .entry(task_type)
                    .or_default()
                    .entry(number)
                    .or_default()
                    .push(execution);
            }
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execution(objective: &str, agent: &str) -> ExecutionRecord {
        ExecutionRecord {
            objective: objective.to_string(),
            agent: Some(agent.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_extracts_incident_number() {
        let correlator = Correlator::standard().unwrap();
        assert_eq!(
            correlator.match_objective("Resolve INC0010234 per policy"),
            Some((TaskType::Incident, "INC0010234".to_string()))
        );
    }

    #[test]
    fn test_case_insensitive_and_upper_cased() {
        let correlator = Correlator::standard().unwrap();
        assert_eq!(
            correlator.match_objective("look at chg0030001 rollout"),
            Some((TaskType::ChangeRequest, "CHG0030001".to_string()))
        );
    }

    #[test]
    fn test_prefix_without_digits_does_not_match() {
        let correlator = Correlator::standard().unwrap();
        assert_eq!(correlator.match_objective("Summarize INC backlog"), None);
        assert_eq!(correlator.match_objective(""), None);
    }

    #[test]
    fn test_declared_order_wins_over_text_position() {
        // The change number comes first in the text, but incidents are declared first
        let correlator = Correlator::standard().unwrap();
        assert_eq!(
            correlator.match_objective("CHG0000007 caused INC0000042"),
            Some((TaskType::Incident, "INC0000042".to_string()))
        );
    }

    #[test]
    fn test_overlapping_prefixes_first_declared_wins() {
        let correlator =
            Correlator::with_prefixes(&[(TaskType::Problem, "IN"), (TaskType::Incident, "INC")])
                .unwrap();

        // "IN" needs a digit right after it, so it cannot claim INC numbers
        assert_eq!(
            correlator.match_objective("Resolve INC0010234"),
            Some((TaskType::Incident, "INC0010234".to_string()))
        );
        assert_eq!(
            correlator.match_objective("Resolve IN0010234"),
            Some((TaskType::Problem, "IN0010234".to_string()))
        );

        // Two prefixes that can match the same text: declared order decides
        let correlator =
            Correlator::with_prefixes(&[(TaskType::Case, "CS"), (TaskType::Problem, "S")])
                .unwrap();
        assert_eq!(
            correlator.match_objective("Close CS0001"),
            Some((TaskType::Case, "CS0001".to_string()))
        );

        let reversed =
            Correlator::with_prefixes(&[(TaskType::Problem, "S"), (TaskType::Case, "CS")])
                .unwrap();
        assert_eq!(
            reversed.match_objective("Close CS0001"),
            Some((TaskType::Problem, "S0001".to_string()))
        );
    }

    #[test]
    fn test_correlate_groups_in_fetch_order() {
        let correlator = Correlator::standard().unwrap();
        let map = correlator.correlate(vec![
            execution("Resolve INC0000001", "agent-a"),
            execution("Triage inc0000001 again", "agent-b"),
            execution("Plan CHG0000005", "agent-c"),
            execution("General housekeeping", "agent-d"),
            ExecutionRecord {
                objective: "Close PRB0000009".to_string(),
                ..Default::default()
            },
        ]);

        let incidents = map.activity(TaskType::Incident);
        let agents: Vec<_> = incidents["INC0000001"]
            .iter()
            .map(|e| e.agent.as_deref().unwrap())
            .collect();
        assert_eq!(agents, vec!["agent-a", "agent-b"]);

        assert_eq!(map.activity(TaskType::ChangeRequest).len(), 1);
        assert_eq!(map.activity(TaskType::Problem)["PRB0000009"].len(), 1);
        assert!(map.activity(TaskType::Case).is_empty());
        assert_eq!(map.record_count(), 3);
    }
}
