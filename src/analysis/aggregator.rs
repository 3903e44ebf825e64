//! AI-assisted vs. unassisted resolution time comparison.
//!
//! Resolved task records are split by whether any AI execution referenced
//! them, then compared by mean resolution time, overall and per breakdown
//! group. The result is plain data; `report::render_roi_report` turns it into text.

use crate::analysis::correlator::AiActivity;
use crate::models::{Breakdown, TaskRecord, TaskType};
use std::collections::BTreeMap;

/// Mean resolution time over `count` records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mean {
    pub hours: f64,
    pub count: usize,
}

impl Mean {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            hours: values.iter().sum::<f64>() / values.len() as f64,
            count: values.len(),
        })
    }
}

/// Relative speed-up of AI-assisted records over the unassisted baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Improvement {
    Percent(f64),
    /// The baseline mean is zero, so there is nothing to divide by.
    NotComputable,
}

impl Improvement {
    pub fn between(with_ai: &Mean, without_ai: &Mean) -> Self {
        if without_ai.hours == 0.0 {
            Improvement::NotComputable
        } else {
            let percent = (without_ai.hours - with_ai.hours) / without_ai.hours * 100.0;
            Improvement::Percent(percent)
        }
    }
}

/// One breakdown group. A side with no records in the group is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupComparison {
    pub key: String,
    pub with_ai: Option<Mean>,
    pub without_ai: Option<Mean>,
}

impl GroupComparison {
    pub fn improvement(&self) -> Option<Improvement> {
        match (&self.with_ai, &self.without_ai) {
            (Some(with), Some(without)) => Some(Improvement::between(with, without)),
            _ => None,
        }
    }
}

/// Where an AI-touched record stands, for the one-sided report.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordStatus {
    Resolved(f64),
    NotResolved { state: String },
}

/// Which report branch the data supports.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Both partitions have resolved records.
    Comparison {
        with_ai: Mean,
        without_ai: Mean,
        improvement: Improvement,
        time_saved: f64,
        groups: Vec<GroupComparison>,
    },
    /// No resolved records at all.
    NoResolvedRecords,
    /// Exactly one partition has resolved records.
    OneSided {
        statuses: Vec<(String, RecordStatus)>,
    },
}

/// Everything the ROI report needs, computed from one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiAnalysis {
    pub task_type: TaskType,
    pub breakdown: Breakdown,
    pub total_records: usize,
    pub resolved_with_ai: usize,
    pub resolved_without_ai: usize,
    pub ai_activity: AiActivity,
    pub outcome: Outcome,
}

impl RoiAnalysis {
    pub fn resolved(&self) -> usize {
        self.resolved_with_ai + self.resolved_without_ai
    }
}

/// Compare resolution times of AI-assisted and unassisted records of one task type.
pub fn analyze(
    task_type: TaskType,
    ai_activity: &AiActivity,
    records: &[TaskRecord],
    breakdown: Breakdown,
) -> RoiAnalysis {
    let (with_ai, without_ai): (Vec<&TaskRecord>, Vec<&TaskRecord>) = records
        .iter()
        .filter(|r| r.resolution_hours().is_some())
        .partition(|r| ai_activity.contains_key(&r.number));

    let outcome = match (Mean::of(&hours(&with_ai)), Mean::of(&hours(&without_ai))) {
        (Some(with_mean), Some(without_mean)) => Outcome::Comparison {
            improvement: Improvement::between(&with_mean, &without_mean),
            time_saved: without_mean.hours - with_mean.hours,
            with_ai: with_mean,
            without_ai: without_mean,
            groups: group_comparisons(breakdown, &with_ai, &without_ai),
        },
        (None, None) => Outcome::NoResolvedRecords,
        _ => Outcome::OneSided {
            statuses: ai_record_statuses(ai_activity, records),
        },
    };

    RoiAnalysis {
        task_type,
        breakdown,
        total_records: records.len(),
        resolved_with_ai: with_ai.len(),
        resolved_without_ai: without_ai.len(),
        ai_activity: ai_activity.clone(),
        outcome,
    }
}

fn hours(records: &[&TaskRecord]) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.resolution_hours())
        .collect()
}

/// Per-group means, ordered by group key so output is stable.
fn group_comparisons(
    breakdown: Breakdown,
    with_ai: &[&TaskRecord],
    without_ai: &[&TaskRecord],
) -> Vec<GroupComparison> {
    if breakdown == Breakdown::None {
        return Vec::new();
    }

    let mut groups: BTreeMap<String, (Vec<&TaskRecord>, Vec<&TaskRecord>)> = BTreeMap::new();

    for record in with_ai {
        let key = breakdown.key(record).unwrap_or_default().to_string();
        groups.entry(key).or_default().0.push(record);
    }
    for record in without_ai {
        let key = breakdown.key(record).unwrap_or_default().to_string();
        groups.entry(key).or_default().1.push(record);
    }

    groups
        .into_iter()
        .map(|(key, (with, without))| GroupComparison {
            key,
            with_ai: Mean::of(&hours(&with)),
            without_ai: Mean::of(&hours(&without)),
        })
        .collect()
}

/// Status of each AI-touched record that is present in the task list.
fn ai_record_statuses(
    ai_activity: &AiActivity,
    records: &[TaskRecord],
) -> Vec<(String, RecordStatus)> {
    ai_activity
        .keys()
        .filter_map(|number| {
            let record = records.iter().find(|r| &r.number == number)?;
            let status = match record.resolution_hours() {
                Some(h) => RecordStatus::Resolved(h),
                None => RecordStatus::NotResolved {
                    state: record.state.clone(),
                },
            };
            Some((number.clone(), status))
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::resolution::{Resolution, UnresolvedReason};
    use crate::models::ExecutionRecord;

    pub(crate) fn task(number: &str, hours: Option<f64>, priority: &str) -> TaskRecord {
        TaskRecord {
            number: number.to_string(),
            resolution: match hours {
                Some(h) => Resolution::Hours(h),
                None => Resolution::Unresolved(UnresolvedReason::MissingResolved),
            },
            state: match hours {
                Some(_) => "Resolved".to_string(),
                None => "In Progress".to_string(),
            },
            priority: priority.to_string(),
            category: "Software".to_string(),
            group: "Service Desk".to_string(),
        }
    }

    pub(crate) fn activity(numbers: &[&str]) -> AiActivity {
        numbers
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    vec![ExecutionRecord {
                        created_on: Some("2024-05-01 10:00:00".to_string()),
                        agent: Some("Triage Agent".to_string()),
                        objective: format!("Resolve {}", n),
                        ..Default::default()
                    }],
                )
            })
            .collect()
    }

    #[test]
    fn test_mean() {
        assert_eq!(Mean::of(&[]), None);
        assert_eq!(
            Mean::of(&[8.0, 12.0]),
            Some(Mean {
                hours: 10.0,
                count: 2
            })
        );
    }

    #[test]
    fn test_fifty_percent_improvement() {
        let records = vec![
            task("INC1", Some(5.0), "1"),
            task("INC2", Some(15.0), "1"),
            task("INC3", Some(10.0), "1"),
            task("INC4", Some(20.0), "1"),
            task("INC5", Some(30.0), "1"),
        ];
        let analysis = analyze(
            TaskType::Incident,
            &activity(&["INC1", "INC2"]),
            &records,
            Breakdown::None,
        );

        match analysis.outcome {
            Outcome::Comparison {
                with_ai,
                without_ai,
                improvement,
                time_saved,
                groups,
            } => {
                assert_eq!((with_ai.hours, with_ai.count), (10.0, 2));
                assert_eq!((without_ai.hours, without_ai.count), (20.0, 3));
                assert_eq!(improvement, Improvement::Percent(50.0));
                assert_eq!(time_saved, 10.0);
                assert!(groups.is_empty());
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_baseline_not_computable() {
        let records = vec![task("INC1", Some(3.0), "1"), task("INC2", Some(0.0), "1")];
        let analysis = analyze(
            TaskType::Incident,
            &activity(&["INC1"]),
            &records,
            Breakdown::Priority,
        );

        match analysis.outcome {
            Outcome::Comparison {
                improvement,
                time_saved,
                groups,
                ..
            } => {
                assert_eq!(improvement, Improvement::NotComputable);
                assert_eq!(time_saved, -3.0);
                assert_eq!(groups[0].improvement(), Some(Improvement::NotComputable));
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_groups_sorted_and_one_sided_groups_kept() {
        let records = vec![
            task("INC1", Some(2.0), "3 - Moderate"),
            task("INC2", Some(4.0), "1 - Critical"),
            task("INC3", Some(8.0), "1 - Critical"),
            task("INC4", Some(6.0), "2 - High"),
        ];
        let analysis = analyze(
            TaskType::Incident,
            &activity(&["INC1", "INC2"]),
            &records,
            Breakdown::Priority,
        );

        let Outcome::Comparison { groups, .. } = analysis.outcome else {
            panic!("expected comparison");
        };

        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["1 - Critical", "2 - High", "3 - Moderate"]);

        assert_eq!(groups[0].improvement(), Some(Improvement::Percent(50.0)));
        assert!(groups[1].with_ai.is_none());
        assert_eq!(groups[1].without_ai.map(|m| m.hours), Some(6.0));
        assert_eq!(groups[2].with_ai.map(|m| m.hours), Some(2.0));
        assert!(groups[2].without_ai.is_none());
        assert_eq!(groups[2].improvement(), None);
    }

    #[test]
    fn test_no_data_at_all() {
        let analysis = analyze(
            TaskType::Incident,
            &AiActivity::new(),
            &[],
            Breakdown::Priority,
        );
        assert_eq!(analysis.outcome, Outcome::NoResolvedRecords);
        assert_eq!(analysis.resolved(), 0);
        assert_eq!(analysis.total_records, 0);
    }

    #[test]
    fn test_unresolved_records_excluded() {
        let records = vec![task("INC1", None, "1"), task("INC2", None, "2")];
        let analysis = analyze(
            TaskType::Incident,
            &activity(&["INC1"]),
            &records,
            Breakdown::None,
        );
        assert_eq!(analysis.outcome, Outcome::NoResolvedRecords);
        assert_eq!(analysis.total_records, 2);
    }

    #[test]
    fn test_one_sided_lists_ai_record_status() {
        let records = vec![
            task("INC1", None, "1"),
            task("INC2", Some(0.0), "1"),
            task("INC3", Some(7.0), "1"),
        ];
        // INC9 has AI activity but is not in the fetched task list
        let analysis = analyze(
            TaskType::Incident,
            &activity(&["INC1", "INC2", "INC9"]),
            &records,
            Breakdown::None,
        );

        assert_eq!(analysis.resolved_with_ai, 1);
        assert_eq!(analysis.resolved_without_ai, 1);

        // INC2 resolved in 0h with AI, INC3 without: both sides non-empty
        assert!(matches!(analysis.outcome, Outcome::Comparison { .. }));

        let records = vec![task("INC1", None, "1"), task("INC2", Some(0.0), "1")];
        let analysis = analyze(
            TaskType::Incident,
            &activity(&["INC1", "INC2", "INC9"]),
            &records,
            Breakdown::None,
        );

        assert_eq!(
            analysis.outcome,
            Outcome::OneSided {
                statuses: vec![
                    (
                        "INC1".to_string(),
                        RecordStatus::NotResolved {
                            state: "In Progress".to_string()
                        }
                    ),
                    ("INC2".to_string(), RecordStatus::Resolved(0.0)),
                ]
            }
        );
    }
}
