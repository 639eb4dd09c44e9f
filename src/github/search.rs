//! Cursor-paginated search for pull requests and issues.

use crate::error::ApiError;
use crate::github::client::GitHubClient;
use crate::github::contributions::RepositoryRef;
use crate::models::{IssueItem, PullRequestItem, Window};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

/// Items requested per search page.
pub const PAGE_SIZE: u32 = 100;

const PULL_REQUEST_SEARCH: &str = r#"
query($q: String!, $first: Int!, $after: String) {
  search(query: $q, type: ISSUE, first: $first, after: $after) {
    issueCount
    pageInfo { hasNextPage endCursor }
    nodes {
      ... on PullRequest {
        number
        title
        url
        createdAt
        merged
        mergedAt
        additions
        deletions
        repository { nameWithOwner isPrivate }
      }
    }
  }
}"#;

const ISSUE_SEARCH: &str = r#"
query($q: String!, $first: Int!, $after: String) {
  search(query: $q, type: ISSUE, first: $first, after: $after) {
    issueCount
    pageInfo { hasNextPage endCursor }
    nodes {
      ... on Issue {
        number
        title
        url
        createdAt
        closedAt
        repository { nameWithOwner isPrivate }
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "N: Deserialize<'de>"))]
struct SearchResponse<N> {
    search: SearchConnection<N>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "N: Deserialize<'de>"))]
struct SearchConnection<N> {
    page_info: PageInfo,
    /// Items the token cannot see arrive as `null`.
    #[serde(default)]
    nodes: Vec<Option<N>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    has_next_page: bool,
    end_cursor: Option<String>,
}

/// Search node for a pull request. Nodes of other kinds arrive as `{}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PullRequestNode {
    number: Option<u64>,
    title: String,
    url: String,
    created_at: Option<DateTime<Utc>>,
    merged: bool,
    merged_at: Option<DateTime<Utc>>,
    additions: u64,
    deletions: u64,
    repository: Option<RepositoryRef>,
}

impl PullRequestNode {
    fn into_item(self) -> Option<PullRequestItem> {
        Some(PullRequestItem {
            repo: self.repository?.name_with_owner,
            number: self.number?,
            title: self.title,
            url: self.url,
            created_at: self.created_at?,
            merged: self.merged,
            merged_at: self.merged_at,
            additions: self.additions,
            deletions: self.deletions,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IssueNode {
    number: Option<u64>,
    title: String,
    url: String,
    created_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    repository: Option<RepositoryRef>,
}

impl IssueNode {
    fn into_item(self) -> Option<IssueItem> {
        Some(IssueItem {
            repo: self.repository?.name_with_owner,
            number: self.number?,
            title: self.title,
            url: self.url,
            created_at: self.created_at?,
            closed_at: self.closed_at,
        })
    }
}

/// Search string for pull requests authored by `login` and created in the window.
pub fn pull_requests_created(login: &str, window: &Window) -> String {
    format!("author:{} is:pr created:{}", login, window.search_range())
}

/// Search string for issues authored by `login` and created in the window.
pub fn issues_created(login: &str, window: &Window) -> String {
    format!("author:{} is:issue created:{}", login, window.search_range())
}

/// Search string for issues authored by `login` and closed in the window.
pub fn issues_closed(login: &str, window: &Window) -> String {
    format!("author:{} is:issue closed:{}", login, window.search_range())
}

/// Search pull requests, stopping after `max_results` items.
pub async fn search_pull_requests(
    client: &GitHubClient,
    search: &str,
    max_results: usize,
) -> Result<Vec<PullRequestItem>, ApiError> {
    info!("Searching pull requests (max={})", max_results);
    paginate(client, PULL_REQUEST_SEARCH, search, max_results, PullRequestNode::into_item).await
}

/// Search issues, stopping after `max_results` items.
pub async fn search_issues(
    client: &GitHubClient,
    search: &str,
    max_results: usize,
) -> Result<Vec<IssueItem>, ApiError> {
    info!("Searching issues (max={})", max_results);
    paginate(client, ISSUE_SEARCH, search, max_results, IssueNode::into_item).await
}

/// Issues opened and issues closed in the window, as two independent lists.
///
/// An issue opened and closed inside the window appears in both.
pub async fn search_issues_opened_closed(
    client: &GitHubClient,
    login: &str,
    window: &Window,
    max_results: usize,
) -> Result<(Vec<IssueItem>, Vec<IssueItem>), ApiError> {
    let opened = search_issues(client, &issues_created(login, window), max_results).await?;
    let closed = search_issues(client, &issues_closed(login, window), max_results).await?;
    Ok((opened, closed))
}

async fn paginate<N, T, F>(
    client: &GitHubClient,
    query: &str,
    search: &str,
    max_results: usize,
    convert: F,
) -> Result<Vec<T>, ApiError>
where
    N: DeserializeOwned,
    F: Fn(N) -> Option<T>,
{
    let mut items = Vec::new();
    let mut after: Option<String> = None;
    let mut page = 0;

    while items.len() < max_results {
        page += 1;
        debug!("Search page {} for {:?}", page, search);

        let variables = json!({ "q": search, "first": PAGE_SIZE, "after": after });
        let response: SearchResponse<N> = client.execute(query, &variables).await?;
        let connection = response.search;

        for node in connection.nodes.into_iter().flatten() {
            if let Some(item) = convert(node) {
                items.push(item);
                if items.len() >= max_results {
                    break;
                }
            }
        }

        // A next flag without a cursor is treated as the last page.
        match (connection.page_info.has_next_page, connection.page_info.end_cursor) {
            (true, Some(cursor)) => after = Some(cursor),
            _ => break,
        }
    }

    debug!("Search returned {} items over {} pages", items.len(), page);
    Ok(items)
}
