//! Recap construction.
//!
//! Reduces the fetched slices into the final [`Recap`]. Everything here is
//! pure: no I/O, and every ranking has an explicit tie-break so identical
//! inputs always produce identical output.

use crate::analysis::calendar::{longest_streak, most_productive_day, most_productive_iso_week};
use crate::models::{
    CalendarStats, ContributionKind, ContributionSummary, GrowthMetrics, HourHistogram,
    IssueItem, IssueStats, LanguageBytes, LanguageShare, LanguageStats, PullRequestItem,
    PullRequestStats, Recap, RecapMeta, RepoCount, RepositoryActivity, ReviewStats, Totals,
};
use chrono::{DateTime, Timelike, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Length of the top-repositories list.
pub const TOP_REPOSITORIES: usize = 12;

/// Length of the review distribution.
pub const TOP_REVIEW_REPOSITORIES: usize = 8;

/// Default length of the language ranking.
pub const DEFAULT_TOP_LANGUAGES: usize = 10;

const LANGUAGE_NOTE: &str = "Language bytes are aggregated from each repository's current language breakdown (not a time series), weighted by bytes across the repositories contributed to in the window.";

/// Borrowed outputs of the fetch flows.
#[derive(Debug, Clone, Copy)]
pub struct RecapInputs<'a> {
    pub summary: &'a ContributionSummary,
    pub pull_requests: &'a [PullRequestItem],
    pub issues_opened: &'a [IssueItem],
    pub issues_closed: &'a [IssueItem],
    pub languages: &'a LanguageBytes,
    pub growth: Option<&'a GrowthMetrics>,
}

/// Tunables for recap construction.
#[derive(Debug, Clone)]
pub struct RecapOptions {
    pub top_languages: usize,
}

impl Default for RecapOptions {
    fn default() -> Self {
        Self {
            top_languages: DEFAULT_TOP_LANGUAGES,
        }
    }
}

/// Build the recap from the fetched data.
pub fn build_recap(meta: RecapMeta, inputs: &RecapInputs<'_>, options: &RecapOptions) -> Recap {
    let summary = inputs.summary;

    Recap {
        meta,
        totals: totals(summary),
        calendar: CalendarStats {
            days: summary.calendar.clone(),
            longest_streak: longest_streak(&summary.calendar),
            most_productive_day: most_productive_day(&summary.calendar),
            most_productive_iso_week: most_productive_iso_week(&summary.calendar),
        },
        top_repos: top_repositories(summary, TOP_REPOSITORIES),
        pr_stats: pull_request_stats(inputs.pull_requests),
        issue_stats: issue_stats(inputs.issues_opened, inputs.issues_closed),
        reviews: ReviewStats {
            total: summary.total_reviews,
            by_repo: top_reviews(summary, TOP_REVIEW_REPOSITORIES),
        },
        languages: LanguageStats {
            weighted_bytes: inputs.languages.clone(),
            top: top_languages(inputs.languages, options.top_languages),
            note: LANGUAGE_NOTE.to_string(),
        },
        growth: inputs.growth.map(rank_growth),
    }
}

fn totals(summary: &ContributionSummary) -> Totals {
    Totals {
        commits: summary.total_commits,
        pull_requests: summary.total_pull_requests,
        issues: summary.total_issues,
        reviews: summary.total_reviews,
        overall: summary.total_commits
            + summary.total_pull_requests
            + summary.total_issues
            + summary.total_reviews,
    }
}

/// Merge the four per-kind maps and rank by total activity, then identifier.
pub fn top_repositories(summary: &ContributionSummary, limit: usize) -> Vec<RepositoryActivity> {
    let mut merged: BTreeMap<&str, RepositoryActivity> = BTreeMap::new();
    for kind in ContributionKind::ALL {
        for (repo, entry) in summary.by_repo(kind) {
            merged
                .entry(repo.as_str())
                .or_insert_with(|| RepositoryActivity::new(repo.clone(), entry.is_private))
                .set_count(kind, entry.count);
        }
    }

    let mut ranked: Vec<RepositoryActivity> = merged.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_activity()
            .cmp(&a.total_activity())
            .then_with(|| a.repo.cmp(&b.repo))
    });
    ranked.truncate(limit);
    ranked
}

/// Counts per UTC hour, always with all 24 buckets present.
pub fn hour_histogram<I>(timestamps: I) -> HourHistogram
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut histogram: HourHistogram = (0..24).map(|hour| (format!("{:02}", hour), 0)).collect();
    for at in timestamps {
        *histogram.entry(format!("{:02}", at.hour())).or_default() += 1;
    }
    histogram
}

pub fn pull_request_stats(prs: &[PullRequestItem]) -> PullRequestStats {
    let opened = prs.len() as u32;
    let merged = prs.iter().filter(|pr| pr.merged).count() as u32;

    let merge_hours: Vec<f64> = prs
        .iter()
        .filter(|pr| pr.merged)
        .filter_map(|pr| pr.merged_at.map(|at| at - pr.created_at))
        .map(|latency| latency.num_seconds() as f64 / 3600.0)
        .collect();

    let mut biggest: Option<&PullRequestItem> = None;
    for pr in prs {
        if biggest.map_or(true, |b| pr.churn() > b.churn()) {
            biggest = Some(pr);
        }
    }

    PullRequestStats {
        opened,
        merged,
        merge_rate: if opened > 0 {
            f64::from(merged) / f64::from(opened)
        } else {
            0.0
        },
        avg_time_to_merge_hours: if merge_hours.is_empty() {
            0.0
        } else {
            merge_hours.iter().sum::<f64>() / merge_hours.len() as f64
        },
        biggest_pr: biggest.cloned(),
        time_of_day_histogram: hour_histogram(prs.iter().map(|pr| pr.created_at)),
    }
}

/// Issue counts come from two independent lists; the histogram uses the opened list.
pub fn issue_stats(opened: &[IssueItem], closed: &[IssueItem]) -> IssueStats {
    IssueStats {
        opened: opened.len() as u32,
        closed: closed.len() as u32,
        time_of_day_histogram: hour_histogram(opened.iter().map(|issue| issue.created_at)),
    }
}

pub fn top_reviews(summary: &ContributionSummary, limit: usize) -> Vec<RepoCount> {
    let mut reviews: Vec<RepoCount> = summary.reviews_by_repo.values().cloned().collect();
    reviews.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.repo.cmp(&b.repo)));
    reviews.truncate(limit);
    reviews
}

/// Rank languages by bytes, then name. Shares are against all aggregated bytes.
pub fn top_languages(languages: &LanguageBytes, limit: usize) -> Vec<LanguageShare> {
    let total: u64 = languages.values().sum();

    let mut ranked: Vec<(&String, u64)> =
        languages.iter().map(|(name, bytes)| (name, *bytes)).collect();
    ranked.sort_by_key(|(name, bytes)| (Reverse(*bytes), *name));

    ranked
        .into_iter()
        .take(limit)
        .map(|(language, bytes)| LanguageShare {
            language: language.clone(),
            bytes,
            share: if total > 0 {
                bytes as f64 / total as f64
            } else {
                0.0
            },
        })
        .collect()
}

/// Order growth records by stars gained, then current stars, then identifier.
pub fn rank_growth(growth: &GrowthMetrics) -> GrowthMetrics {
    let mut ranked = growth.clone();
    ranked.repos.sort_by(|a, b| {
        b.stars_gained_in_year
            .cmp(&a.stars_gained_in_year)
            .then_with(|| b.stars_now.cmp(&a.stars_now))
            .then_with(|| a.repo.cmp(&b.repo))
    });
    ranked
}
