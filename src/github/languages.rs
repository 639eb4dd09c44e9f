//! Language bytes across every repository touched in the window.

use crate::github::client::GitHubClient;
use crate::github::fanout::{run_bounded, FailureLog, FanOut};
use crate::models::LanguageBytes;
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default number of concurrent language lookups.
pub const DEFAULT_LANGUAGE_CONCURRENCY: usize = 6;

/// Split `owner/name`, rejecting anything else.
pub(crate) fn split_repository(full_name: &str) -> Option<(&str, &str)> {
    let (owner, name) = full_name.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner, name))
}

/// Sum language bytes over `repositories`.
///
/// Repositories are deduplicated before lookup. A failed lookup is recorded
/// and skipped; the bytes of every successful lookup are kept.
pub async fn fetch_languages(
    client: &GitHubClient,
    repositories: &[String],
    concurrency: usize,
    progress: &ProgressBar,
) -> FanOut<LanguageBytes> {
    let mut unique: Vec<&str> = repositories
        .iter()
        .map(String::as_str)
        .filter(|repo| {
            let valid = split_repository(repo).is_some();
            if !valid {
                debug!("Skipping malformed repository identifier: {}", repo);
            }
            valid
        })
        .collect();
    unique.sort_unstable();
    unique.dedup();

    info!(
        "Fetching languages for {} repositories (concurrency={})",
        unique.len(),
        concurrency
    );
    progress.set_length(unique.len() as u64);

    let totals = Mutex::new(LanguageBytes::new());
    let failures = FailureLog::default();
    let (totals_ref, failures_ref) = (&totals, &failures);

    run_bounded(unique, concurrency, |repo| async move {
        let path = format!("/repos/{}/languages", repo);
        match client.get_json::<BTreeMap<String, u64>>(&path).await {
            Ok(languages) => {
                let mut totals = totals_ref.lock().await;
                for (language, bytes) in languages {
                    *totals.entry(language).or_default() += bytes;
                }
            }
            Err(err) => failures_ref.record(repo, err).await,
        }
        progress.inc(1);
    })
    .await;

    progress.finish_and_clear();
    failures.finish(totals.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_split_repository() {
        assert_eq!(split_repository("octo/app"), Some(("octo", "app")));
        assert_eq!(split_repository("octo"), None);
        assert_eq!(split_repository("/app"), None);
        assert_eq!(split_repository("a/b/c"), None);
    }

    #[tokio::test]
    async fn test_one_failure_keeps_other_results() {
        let server = MockServer::start().await;
        for (repo, body) in [
            ("a/one", json!({"Rust": 100, "Shell": 5})),
            ("a/two", json!({"Rust": 50})),
            ("b/three", json!({"Go": 20})),
            ("b/four", json!({"Python": 7, "Shell": 5})),
        ] {
            Mock::given(method("GET"))
                .and(path(format!("/repos/{}/languages", repo)))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .expect(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/repos/c/broken/languages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let repos: Vec<String> = ["a/one", "a/two", "b/three", "b/four", "c/broken", "a/one"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let result = fetch_languages(&client, &repos, 2, &ProgressBar::hidden()).await;

        assert_eq!(result.failed, 1);
        assert!(result.first_error.is_some());
        assert_eq!(result.value.get("Rust"), Some(&150));
        assert_eq!(result.value.get("Shell"), Some(&10));
        assert_eq!(result.value.get("Go"), Some(&20));
        assert_eq!(result.value.get("Python"), Some(&7));
        assert_eq!(result.value.len(), 4);
    }

    #[tokio::test]
    async fn test_no_repositories() {
        let server = MockServer::start().await;
        let client = test_client(&server);
        let result = fetch_languages(&client, &[], DEFAULT_LANGUAGE_CONCURRENCY, &ProgressBar::hidden()).await;
        assert!(result.is_complete());
        assert!(result.value.is_empty());
    }
}
