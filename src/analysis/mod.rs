//! Aggregation of fetched activity into a recap.
//!
//! Pure and single-threaded: the fetch flows own their data and this module
//! only borrows it.

pub mod aggregator;
pub mod calendar;

pub use aggregator::{build_recap, RecapInputs, RecapOptions};
