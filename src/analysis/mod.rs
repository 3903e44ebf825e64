//! AI ROI analysis.
//!
//! Correlates AI agent executions with task records and compares resolution
//! times of AI-assisted and unassisted work.

pub mod aggregator;
pub mod correlator;
pub mod resolution;

pub use aggregator::{analyze, Improvement, Mean, Outcome, RecordStatus, RoiAnalysis};
pub use correlator::Correlator;
