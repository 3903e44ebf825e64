//! Resolution time of a task record.
//!
//! Best effort: anything that is not two well-formed timestamps comes back as
//! `Unresolved` with a reason, never as an error.

use chrono::NaiveDateTime;
use std::fmt;
use tracing::debug;

/// Timestamp format of `sys_created_on`, `resolved_at` and `closed_at` display values.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why a record has no resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    MissingCreated,
    MissingResolved,
    UnparseableCreated,
    UnparseableResolved,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::MissingCreated => write!(f, "no creation timestamp"),
            UnresolvedReason::MissingResolved => write!(f, "not resolved"),
            UnresolvedReason::UnparseableCreated => write!(f, "unparseable creation timestamp"),
            UnresolvedReason::UnparseableResolved => {
                write!(f, "unparseable resolution timestamp")
            }
        }
    }
}

/// Outcome of the resolution time calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Hours(f64),
    Unresolved(UnresolvedReason),
}

impl Resolution {
    pub fn hours(&self) -> Option<f64> {
        match self {
            Resolution::Hours(h) => Some(*h),
            Resolution::Unresolved(_) => None,
        }
    }
}

/// Hours between `created` and `resolved`, both in [`TIMESTAMP_FORMAT`].
pub fn resolution_time(created: &str, resolved: &str) -> Resolution {
    if created.is_empty() {
        return Resolution::Unresolved(UnresolvedReason::MissingCreated);
    }
    if resolved.is_empty() {
        return Resolution::Unresolved(UnresolvedReason::MissingResolved);
    }

    let Ok(created_at) = NaiveDateTime::parse_from_str(created, TIMESTAMP_FORMAT) else {
        return unparseable(UnresolvedReason::UnparseableCreated, created);
    };
    let Ok(resolved_at) = NaiveDateTime::parse_from_str(resolved, TIMESTAMP_FORMAT) else {
        return unparseable(UnresolvedReason::UnparseableResolved, resolved);
    };

    let elapsed = resolved_at - created_at;
    Resolution::Hours(elapsed.num_seconds() as f64 / 3600.0)
}

fn unparseable(reason: UnresolvedReason, value: &str) -> Resolution {
    debug!("Skipping record with {}: {:?}", reason, value);
    Resolution::Unresolved(reason)
}
