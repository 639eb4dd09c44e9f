//! Remote API access.
//!
//! A single [`GitHubClient`] is built per run and passed by reference to the
//! fetch flows: the contribution summary and the two searches are fatal to a
//! run when they fail, the language and growth fan-outs are best-effort.

pub mod client;
pub mod contributions;
pub mod fanout;
pub mod growth;
pub mod languages;
pub mod search;

pub use client::{ClientConfig, GitHubClient};
pub use contributions::fetch_contribution_summary;
pub use growth::fetch_growth;
pub use languages::fetch_languages;
pub use search::{pull_requests_created, search_issues_opened_closed, search_pull_requests};
