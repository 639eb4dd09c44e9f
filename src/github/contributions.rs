//! Contribution-summary fetch: totals, calendar and per-repository counts.

use crate::error::ApiError;
use crate::github::client::GitHubClient;
use crate::models::{ContributionDay, ContributionKind, ContributionSummary, RepoCount, Window};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

const CONTRIBUTIONS_QUERY: &str = r#"
query($login: String!, $from: DateTime!, $to: DateTime!, $maxRepos: Int!) {
  user(login: $login) {
    contributionsCollection(from: $from, to: $to) {
      totalCommitContributions
      totalPullRequestContributions
      totalIssueContributions
      totalPullRequestReviewContributions
      contributionCalendar {
        weeks {
          contributionDays {
            date
            contributionCount
          }
        }
      }
      commitContributionsByRepository(maxRepositories: $maxRepos) {
        repository { nameWithOwner isPrivate }
        contributions { totalCount }
      }
      pullRequestContributionsByRepository(maxRepositories: $maxRepos) {
        repository { nameWithOwner isPrivate }
        contributions { totalCount }
      }
      issueContributionsByRepository(maxRepositories: $maxRepos) {
        repository { nameWithOwner isPrivate }
        contributions { totalCount }
      }
      pullRequestReviewContributionsByRepository(maxRepositories: $maxRepos) {
        repository { nameWithOwner isPrivate }
        contributions { totalCount }
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct ContributionsResponse {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    contributions_collection: CollectionNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionNode {
    total_commit_contributions: u32,
    total_pull_request_contributions: u32,
    total_issue_contributions: u32,
    total_pull_request_review_contributions: u32,
    contribution_calendar: CalendarNode,
    #[serde(default)]
    commit_contributions_by_repository: Vec<RepoContributionNode>,
    #[serde(default)]
    pull_request_contributions_by_repository: Vec<RepoContributionNode>,
    #[serde(default)]
    issue_contributions_by_repository: Vec<RepoContributionNode>,
    #[serde(default)]
    pull_request_review_contributions_by_repository: Vec<RepoContributionNode>,
}

#[derive(Debug, Deserialize)]
struct CalendarNode {
    weeks: Vec<WeekNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeekNode {
    contribution_days: Vec<DayNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayNode {
    date: String,
    contribution_count: u32,
}

#[derive(Debug, Deserialize)]
struct RepoContributionNode {
    repository: RepositoryRef,
    contributions: TotalCount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepositoryRef {
    pub name_with_owner: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: u32,
}

/// Fetch the contribution summary of `login` for `window`.
///
/// Each per-repository map holds at most `max_repositories` entries; the
/// server drops the rest.
pub async fn fetch_contribution_summary(
    client: &GitHubClient,
    login: &str,
    window: &Window,
    max_repositories: u32,
) -> Result<ContributionSummary, ApiError> {
    info!("Fetching contribution summary for {}", login);

    let variables = json!({
        "login": login,
        "from": window.from.to_rfc3339(),
        "to": window.to.to_rfc3339(),
        "maxRepos": max_repositories,
    });
    let response: ContributionsResponse = client.execute(CONTRIBUTIONS_QUERY, &variables).await?;

    let Some(user) = response.user else {
        return Err(ApiError::Query {
            message: format!("user {} not found", login),
            additional: 0,
        });
    };
    let collection = user.contributions_collection;

    let mut summary = ContributionSummary {
        total_commits: collection.total_commit_contributions,
        total_pull_requests: collection.total_pull_request_contributions,
        total_issues: collection.total_issue_contributions,
        total_reviews: collection.total_pull_request_review_contributions,
        calendar: collection
            .contribution_calendar
            .weeks
            .into_iter()
            .flat_map(|week| week.contribution_days)
            .map(|day| ContributionDay::new(day.date, day.contribution_count))
            .collect(),
        ..ContributionSummary::default()
    };

    let by_kind = [
        (
            ContributionKind::Commit,
            collection.commit_contributions_by_repository,
        ),
        (
            ContributionKind::PullRequest,
            collection.pull_request_contributions_by_repository,
        ),
        (
            ContributionKind::Issue,
            collection.issue_contributions_by_repository,
        ),
        (
            ContributionKind::Review,
            collection.pull_request_review_contributions_by_repository,
        ),
    ];
    for (kind, nodes) in by_kind {
        let map = summary.by_repo_mut(kind);
        for node in nodes {
            let repo = node.repository.name_with_owner;
            map.insert(
                repo.clone(),
                RepoCount {
                    repo,
                    count: node.contributions.total_count,
                    is_private: node.repository.is_private,
                },
            );
        }
    }

    debug!(
        "Contribution summary: {} calendar days, {} repositories",
        summary.calendar.len(),
        summary.repositories().len()
    );

    Ok(summary)
}
