//! Report generation.

pub mod generator;

pub use generator::{join_sections, render_roi_report, truncate};
