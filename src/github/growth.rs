//! Stars and forks gained by the user's own repositories.

use crate::error::ApiError;
use crate::github::client::{GitHubClient, REST_ACCEPT};
use crate::github::fanout::{run_bounded, FailureLog, FanOut};
use crate::models::{GrowthMetrics, GrowthRepo, Window};
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default number of concurrent growth lookups.
pub const DEFAULT_GROWTH_CONCURRENCY: usize = 4;

const PER_PAGE: &str = "100";

/// Stargazer listings only carry `starred_at` with this media type.
const STAR_ACCEPT: &str = "application/vnd.github.star+json";

/// A repository owned by the user, as listed by the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnedRepository {
    pub full_name: String,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Deserialize)]
struct Stargazer {
    starred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Fork {
    created_at: Option<DateTime<Utc>>,
}

/// List every repository owned by `login`.
pub async fn list_owned_repositories(
    client: &GitHubClient,
    login: &str,
) -> Result<Vec<OwnedRepository>, ApiError> {
    let path = format!("/users/{}/repos", login);
    let mut repos = Vec::new();
    let mut page = 1u32;

    loop {
        let query = [
            ("type", "owner".to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("page", page.to_string()),
        ];
        let listing = client
            .get_page::<OwnedRepository>(&path, &query, REST_ACCEPT)
            .await?;
        repos.extend(listing.items);
        if !listing.has_next {
            break;
        }
        page += 1;
    }

    debug!("{} owns {} repositories", login, repos.len());
    Ok(repos)
}

/// Count stars given to `full_name` inside the window.
pub async fn count_stars_in_window(
    client: &GitHubClient,
    full_name: &str,
    window: &Window,
) -> Result<u32, ApiError> {
    let path = format!("/repos/{}/stargazers", full_name);
    let mut count = 0;
    let mut page = 1u32;

    loop {
        let query = [
            ("per_page", PER_PAGE.to_string()),
            ("page", page.to_string()),
        ];
        let listing = client
            .get_page::<Stargazer>(&path, &query, STAR_ACCEPT)
            .await?;
        count += listing
            .items
            .iter()
            .filter_map(|star| star.starred_at)
            .filter(|at| window.contains(*at))
            .count() as u32;
        if !listing.has_next {
            break;
        }
        page += 1;
    }

    Ok(count)
}

/// Count forks of `full_name` created inside the window.
///
/// Forks are listed newest first, so the scan stops at the first fork older
/// than the window start. If the listing order ever changes this undercounts.
pub async fn count_forks_in_window(
    client: &GitHubClient,
    full_name: &str,
    window: &Window,
) -> Result<u32, ApiError> {
    let path = format!("/repos/{}/forks", full_name);
    let mut count = 0;
    let mut page = 1u32;

    loop {
        let query = [
            ("sort", "newest".to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("page", page.to_string()),
        ];
        let listing = client.get_page::<Fork>(&path, &query, REST_ACCEPT).await?;
        for created_at in listing.items.iter().filter_map(|fork| fork.created_at) {
            if created_at < window.from {
                return Ok(count);
            }
            if window.contains(created_at) {
                count += 1;
            }
        }
        if !listing.has_next {
            break;
        }
        page += 1;
    }

    Ok(count)
}

/// Growth of every repository owned by `login`.
///
/// Failing to list the repositories is an error. A failure on a single
/// repository is recorded and its record keeps whatever was counted before
/// the failure.
pub async fn fetch_growth(
    client: &GitHubClient,
    login: &str,
    window: &Window,
    concurrency: usize,
    progress: &ProgressBar,
) -> Result<FanOut<GrowthMetrics>, ApiError> {
    let owned = list_owned_repositories(client, login).await?;

    info!(
        "Calculating growth for {} owned repositories (concurrency={})",
        owned.len(),
        concurrency
    );
    progress.set_length(owned.len() as u64);

    let records = Mutex::new(Vec::with_capacity(owned.len()));
    let failures = FailureLog::default();
    let (records_ref, failures_ref) = (&records, &failures);

    run_bounded(owned, concurrency, |repo| async move {
        let mut record = GrowthRepo {
            repo: repo.full_name.clone(),
            stars_gained_in_year: 0,
            forks_gained_in_year: 0,
            stars_now: repo.stargazers_count,
            forks_now: repo.forks_count,
            is_private: repo.private,
        };

        let outcome = async {
            record.stars_gained_in_year =
                count_stars_in_window(client, &repo.full_name, window).await?;
            record.forks_gained_in_year =
                count_forks_in_window(client, &repo.full_name, window).await?;
            Ok::<(), ApiError>(())
        }
        .await;

        if let Err(err) = outcome {
            failures_ref.record(&repo.full_name, err).await;
        }
        records_ref.lock().await.push(record);
        progress.inc(1);
    })
    .await;

    progress.finish_and_clear();
    let metrics = GrowthMetrics::from_repos(window.year(), records.into_inner());
    Ok(failures.finish(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn owned(full_name: &str, stars: u32, forks: u32) -> serde_json::Value {
        json!({
            "full_name": full_name,
            "stargazers_count": stars,
            "forks_count": forks,
            "private": false
        })
    }

    #[tokio::test]
    async fn test_list_owned_repositories_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .and(query_param("type", "owner"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", "<https://api.github.com/users/octo/repos?page=2>; rel=\"next\"")
                    .set_body_json(json!([owned("octo/a", 1, 0)])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([owned("octo/b", 2, 1)])))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let repos = list_owned_repositories(&client, "octo").await.unwrap();
        let names: Vec<&str> = repos.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["octo/a", "octo/b"]);
    }

    #[tokio::test]
    async fn test_count_stars_filters_by_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/a/stargazers"))
            .and(header("accept", STAR_ACCEPT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"starred_at": "2024-12-31T23:59:59Z"},
                {"starred_at": "2025-01-01T00:00:00Z"},
                {"starred_at": "2025-07-04T12:00:00Z"},
                {"starred_at": null},
                {"starred_at": "2026-01-01T00:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let window = Window::for_year(2025).unwrap();
        let stars = count_stars_in_window(&client, "octo/a", &window).await.unwrap();
        assert_eq!(stars, 2);
    }

    #[tokio::test]
    async fn test_count_forks_stops_before_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/a/forks"))
            .and(query_param("sort", "newest"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", "<https://api.github.com/repos/octo/a/forks?page=2>; rel=\"next\"")
                    .set_body_json(json!([
                        {"created_at": "2026-02-01T00:00:00Z"},
                        {"created_at": "2025-09-01T00:00:00Z"},
                        {"created_at": "2025-03-01T00:00:00Z"},
                        {"created_at": "2024-11-01T00:00:00Z"},
                        {"created_at": "2025-05-01T00:00:00Z"}
                    ])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/a/forks"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let window = Window::for_year(2025).unwrap();
        let forks = count_forks_in_window(&client, "octo/a", &window).await.unwrap();
        assert_eq!(forks, 2);
    }

    #[tokio::test]
    async fn test_fetch_growth_keeps_partial_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                owned("octo/good", 10, 3),
                owned("octo/bad", 4, 1)
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/good/stargazers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"starred_at": "2025-02-02T00:00:00Z"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/good/forks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"created_at": "2025-02-03T00:00:00Z"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/bad/stargazers"))
            .respond_with(ResponseTemplate::new(403).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let window = Window::for_year(2025).unwrap();
        let result = fetch_growth(&client, "octo", &window, 2, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert!(matches!(
            result.first_error,
            Some(ApiError::Transport { .. })
        ));
        let metrics = result.value;
        assert_eq!(metrics.year, 2025);
        assert_eq!(metrics.repos.len(), 2);
        assert_eq!(metrics.total_stars_gained, 1);
        assert_eq!(metrics.total_forks_gained, 1);
        assert_eq!(metrics.total_stars_now, 14);
        assert_eq!(metrics.total_forks_now, 4);
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let window = Window::for_year(2025).unwrap();
        let result = fetch_growth(&client, "octo", &window, 4, &ProgressBar::hidden()).await;
        assert!(result.is_err());
    }
}
