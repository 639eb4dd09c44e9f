//! Report generation.

pub mod generator;

pub use generator::{generate_summary_text, write_json_report};
