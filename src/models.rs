//! Data models for the yearly recap.
//!
//! This module contains the slices returned by each fetch flow and the
//! structures of the final recap document.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Inclusive UTC time range a recap is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Window {
    /// Covers `from` 00:00:00 through `to` 23:59:59. Returns `None` when `from > to`.
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        if from > to {
            return None;
        }
        let start = NaiveTime::from_hms_opt(0, 0, 0)?;
        let end = NaiveTime::from_hms_opt(23, 59, 59)?;
        Some(Self {
            from: from.and_time(start).and_utc(),
            to: to.and_time(end).and_utc(),
        })
    }

    /// The whole calendar year.
    pub fn for_year(year: i32) -> Option<Self> {
        Self::from_dates(
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        )
    }

    pub fn year(&self) -> i32 {
        self.from.year()
    }

    /// Returns true if `at` falls inside the window, both ends included.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at <= self.to
    }

    /// Date range in search qualifier syntax, e.g. `2025-01-01..2025-12-31`.
    pub fn search_range(&self) -> String {
        format!(
            "{}..{}",
            self.from.format("%Y-%m-%d"),
            self.to.format("%Y-%m-%d")
        )
    }
}

/// One day of the activity calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDay {
    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,
    pub count: u32,
}

impl ContributionDay {
    pub fn new(date: impl Into<String>, count: u32) -> Self {
        Self {
            date: date.into(),
            count,
        }
    }

    /// Parses the date, `None` if it is malformed.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// Contribution count for a single repository and activity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCount {
    /// Repository identifier, `owner/name`.
    pub repo: String,
    pub count: u32,
    pub is_private: bool,
}

/// Kind of contribution tracked per repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContributionKind {
    Commit,
    PullRequest,
    Issue,
    Review,
}

impl ContributionKind {
    pub const ALL: [ContributionKind; 4] = [
        ContributionKind::Commit,
        ContributionKind::PullRequest,
        ContributionKind::Issue,
        ContributionKind::Review,
    ];
}

/// Totals, calendar and per-repository counts for one window.
///
/// Produced once per run by the contribution-summary fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionSummary {
    pub total_commits: u32,
    pub total_pull_requests: u32,
    pub total_issues: u32,
    pub total_reviews: u32,
    /// Flattened calendar in source order. Not guaranteed to be sorted.
    pub calendar: Vec<ContributionDay>,
    pub commits_by_repo: BTreeMap<String, RepoCount>,
    pub pull_requests_by_repo: BTreeMap<String, RepoCount>,
    pub issues_by_repo: BTreeMap<String, RepoCount>,
    pub reviews_by_repo: BTreeMap<String, RepoCount>,
}

impl ContributionSummary {
    pub fn by_repo(&self, kind: ContributionKind) -> &BTreeMap<String, RepoCount> {
        match kind {
            ContributionKind::Commit => &self.commits_by_repo,
            ContributionKind::PullRequest => &self.pull_requests_by_repo,
            ContributionKind::Issue => &self.issues_by_repo,
            ContributionKind::Review => &self.reviews_by_repo,
        }
    }

    pub fn by_repo_mut(&mut self, kind: ContributionKind) -> &mut BTreeMap<String, RepoCount> {
        match kind {
            ContributionKind::Commit => &mut self.commits_by_repo,
            ContributionKind::PullRequest => &mut self.pull_requests_by_repo,
            ContributionKind::Issue => &mut self.issues_by_repo,
            ContributionKind::Review => &mut self.reviews_by_repo,
        }
    }

    /// Every repository seen in any of the four maps, deduplicated and sorted.
    pub fn repositories(&self) -> Vec<String> {
        let mut repos: Vec<String> = ContributionKind::ALL
            .iter()
            .flat_map(|kind| self.by_repo(*kind).keys().cloned())
            .collect();
        repos.sort();
        repos.dedup();
        repos
    }
}

/// A pull request returned by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestItem {
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub merged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
    pub additions: u64,
    pub deletions: u64,
}

impl PullRequestItem {
    /// Lines touched, additions plus deletions.
    pub fn churn(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// An issue returned by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueItem {
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

/// Language name to accumulated byte count.
pub type LanguageBytes = BTreeMap<String, u64>;

/// Star and fork movement for one owned repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthRepo {
    pub repo: String,
    pub stars_gained_in_year: u32,
    pub forks_gained_in_year: u32,
    pub stars_now: u32,
    pub forks_now: u32,
    pub is_private: bool,
}

/// Growth of all repositories owned by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub year: i32,
    pub repos: Vec<GrowthRepo>,
    pub total_stars_gained: u32,
    pub total_forks_gained: u32,
    pub total_stars_now: u32,
    pub total_forks_now: u32,
    pub note: String,
}

impl GrowthMetrics {
    pub const NOTE: &'static str = "Stars gained are derived from stargazer timestamps; forks gained from fork creation timestamps. Private repository stars and forks are usually not meaningful. Use --skip-growth to disable.";

    /// Builds the metrics and run-wide totals from per-repository records.
    pub fn from_repos(year: i32, repos: Vec<GrowthRepo>) -> Self {
        let mut metrics = Self {
            year,
            repos: Vec::new(),
            total_stars_gained: 0,
            total_forks_gained: 0,
            total_stars_now: 0,
            total_forks_now: 0,
            note: Self::NOTE.to_string(),
        };
        for repo in &repos {
            metrics.total_stars_gained += repo.stars_gained_in_year;
            metrics.total_forks_gained += repo.forks_gained_in_year;
            metrics.total_stars_now += repo.stars_now;
            metrics.total_forks_now += repo.forks_now;
        }
        metrics.repos = repos;
        metrics
    }
}

/// Per-repository activity merged from the four contribution maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryActivity {
    pub repo: String,
    pub commit_count: u32,
    pub pr_count: u32,
    pub issue_count: u32,
    pub review_count: u32,
    pub is_private: bool,
}

impl RepositoryActivity {
    pub fn new(repo: impl Into<String>, is_private: bool) -> Self {
        Self {
            repo: repo.into(),
            is_private,
            ..Self::default()
        }
    }

    pub fn set_count(&mut self, kind: ContributionKind, count: u32) {
        match kind {
            ContributionKind::Commit => self.commit_count = count,
            ContributionKind::PullRequest => self.pr_count = count,
            ContributionKind::Issue => self.issue_count = count,
            ContributionKind::Review => self.review_count = count,
        }
    }

    /// Sum of the four kind counts.
    pub fn total_activity(&self) -> u32 {
        self.commit_count + self.pr_count + self.issue_count + self.review_count
    }
}

impl Serialize for RepositoryActivity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RepositoryActivity", 7)?;
        state.serialize_field("repo", &self.repo)?;
        state.serialize_field("commit_count", &self.commit_count)?;
        state.serialize_field("pr_count", &self.pr_count)?;
        state.serialize_field("issue_count", &self.issue_count)?;
        state.serialize_field("review_count", &self.review_count)?;
        state.serialize_field("is_private", &self.is_private)?;
        state.serialize_field("total_activity", &self.total_activity())?;
        state.end()
    }
}

/// Who and when the recap was generated for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecapMeta {
    pub user: String,
    pub year: i32,
    pub window: Window,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub commits: u32,
    pub pull_requests: u32,
    pub issues: u32,
    pub reviews: u32,
    pub overall: u32,
}

/// ISO week label (`YYYY-Www`) with its summed activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IsoWeekCount {
    pub iso_week: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalendarStats {
    pub days: Vec<ContributionDay>,
    pub longest_streak: u32,
    pub most_productive_day: ContributionDay,
    pub most_productive_iso_week: IsoWeekCount,
}

/// Hour of day (`"00"`..`"23"`, UTC) to item count.
pub type HourHistogram = BTreeMap<String, u32>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PullRequestStats {
    pub opened: u32,
    pub merged: u32,
    pub merge_rate: f64,
    pub avg_time_to_merge_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biggest_pr: Option<PullRequestItem>,
    pub time_of_day_histogram: HourHistogram,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueStats {
    /// Authored issues created in the window.
    pub opened: u32,
    /// Authored issues closed in the window.
    pub closed: u32,
    pub time_of_day_histogram: HourHistogram,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
    pub total: u32,
    pub by_repo: Vec<RepoCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LanguageStats {
    pub weighted_bytes: LanguageBytes,
    pub top: Vec<LanguageShare>,
    pub note: String,
}

/// The complete yearly recap document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recap {
    pub meta: RecapMeta,
    pub totals: Totals,
    pub calendar: CalendarStats,
    pub top_repos: Vec<RepositoryActivity>,
    pub pr_stats: PullRequestStats,
    pub issue_stats: IssueStats,
    pub reviews: ReviewStats,
    pub languages: LanguageStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth: Option<GrowthMetrics>,
}
