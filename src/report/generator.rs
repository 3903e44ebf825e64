//! Plain-text report generation.
//!
//! Tool output is meant to be read by a person or an agent, so everything
//! here produces text: record listings separated by a fixed delimiter line,
//! and the multi-section ROI report.

use crate::analysis::{Improvement, Mean, Outcome, RecordStatus, RoiAnalysis};

/// Separator placed between records in a tool listing.
pub const SECTION_DELIMITER: &str = "\n---\n";

/// How many executions to show per record before summarizing the rest.
const MAX_EXECUTIONS_SHOWN: usize = 3;

const RULE_WIDTH: usize = 80;

/// Join formatted records into a single tool response.
pub fn join_sections(sections: &[String]) -> String {
    sections.join(SECTION_DELIMITER)
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Render the ROI analysis as text lines joined by newlines.
pub fn render_roi_report(analysis: &RoiAnalysis) -> String {
    let mut lines = Vec::new();
    let task_type = analysis.task_type;

    lines.push(format!(
        "AI ROI ANALYSIS - {}",
        task_type.table().to_uppercase().replace('_', " ")
    ));
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!("Metric: {}", task_type.metric_name()));
    lines.push(format!("Total records: {}", analysis.total_records));
    lines.push(format!("  - Resolved: {}", analysis.resolved()));
    lines.push(format!(
        "  - With AI: {} resolved ({} total AI activity)",
        analysis.resolved_with_ai,
        analysis.ai_activity.len()
    ));
    lines.push(format!(
        "  - Without AI: {} resolved",
        analysis.resolved_without_ai
    ));
    lines.push(String::new());

    match &analysis.outcome {
        Outcome::Comparison {
            with_ai,
            without_ai,
            improvement,
            time_saved,
            groups,
        } => {
            lines.push(format!("OVERALL {}:", task_type.metric_name().to_uppercase()));
            lines.push("-".repeat(RULE_WIDTH));
            lines.push(format!("  With AI:     {}", mean_text(with_ai)));
            lines.push(format!("  Without AI:  {}", mean_text(without_ai)));
            lines.push(format!("  Improvement: {}", improvement_text(improvement)));
            lines.push(format!("  Time saved:  {:.1} hours per record", time_saved));
            lines.push(String::new());

            if !groups.is_empty() {
                lines.push(format!(
                    "BREAKDOWN BY {}:",
                    analysis.breakdown.to_string().to_uppercase()
                ));
                lines.push("-".repeat(RULE_WIDTH));

                for group in groups {
                    let label = if group.key.is_empty() {
                        "(empty)"
                    } else {
                        group.key.as_str()
                    };
                    lines.push(format!("  {}:", label));
                    lines.push(format!("    With AI:    {}", optional_mean_text(&group.with_ai)));
                    lines.push(format!(
                        "    Without AI: {}",
                        optional_mean_text(&group.without_ai)
                    ));
                    if let Some(improvement) = group.improvement() {
                        lines.push(format!("    Improvement: {}", improvement_text(&improvement)));
                    }
                    lines.push(String::new());
                }
            }

            if !analysis.ai_activity.is_empty() {
                lines.push("AI ACTIVITY DETAILS:".to_string());
                lines.push("-".repeat(RULE_WIDTH));

                for (number, executions) in &analysis.ai_activity {
                    lines.push(format!("  {}: {} AI execution(s)", number, executions.len()));
                    for execution in executions.iter().take(MAX_EXECUTIONS_SHOWN) {
                        lines.push(format!(
                            "    - {}: {}",
                            execution.created_on.as_deref().unwrap_or("N/A"),
                            execution.agent.as_deref().unwrap_or("Unknown")
                        ));
                    }
                    if executions.len() > MAX_EXECUTIONS_SHOWN {
                        lines.push(format!(
                            "    ... and {} more",
                            executions.len() - MAX_EXECUTIONS_SHOWN
                        ));
                    }
                }
            }
        }

        Outcome::NoResolvedRecords => {
            lines.push("INSUFFICIENT DATA:".to_string());
            lines.push("-".repeat(RULE_WIDTH));
            lines.push("  No resolved records found".to_string());
            lines.push(format!(
                "  Total records with AI activity: {}",
                analysis.ai_activity.len()
            ));
            lines.push(String::new());

            if !analysis.ai_activity.is_empty() {
                lines.push("Records with AI activity (not yet resolved):".to_string());
                for (number, executions) in &analysis.ai_activity {
                    lines.push(format!("  {}: {} AI execution(s)", number, executions.len()));
                }
            }
        }

        Outcome::OneSided { statuses } => {
            lines.push("INSUFFICIENT DATA FOR COMPARISON:".to_string());
            lines.push("-".repeat(RULE_WIDTH));
            lines.push(format!("  Resolved with AI: {}", analysis.resolved_with_ai));
            lines.push(format!(
                "  Resolved without AI: {}",
                analysis.resolved_without_ai
            ));
            lines.push(String::new());
            lines.push(
                "Need at least 1 resolved record in each category for comparison".to_string(),
            );
            lines.push(String::new());

            if !statuses.is_empty() {
                lines.push("Records with AI activity:".to_string());
                for (number, status) in statuses {
                    let text = match status {
                        RecordStatus::Resolved(hours) => format!("Resolved in {:.1} hours", hours),
                        RecordStatus::NotResolved { state } => {
                            format!("Not resolved (State: {})", state)
                        }
                    };
                    lines.push(format!("  {}: {}", number, text));
                }
            }
        }
    }

    lines.join("\n")
}

fn mean_text(mean: &Mean) -> String {
    format!("{:.1} hours (n={})", mean.hours, mean.count)
}

fn optional_mean_text(mean: &Option<Mean>) -> String {
    match mean {
        Some(m) => mean_text(m),
        None => "No data".to_string(),
    }
}

/// Same wording for the overall figure and every breakdown group.
fn improvement_text(improvement: &Improvement) -> String {
    match improvement {
        Improvement::Percent(p) if *p > 0.0 => format!("{:.1}% faster", p),
        Improvement::Percent(p) if *p < 0.0 => format!("{:.1}% slower", p.abs()),
        Improvement::Percent(_) => "0.0% (no change)".to_string(),
        Improvement::NotComputable => {
            "no improvement computable (baseline mean is 0.0 hours)".to_string()
        }
    }
}
