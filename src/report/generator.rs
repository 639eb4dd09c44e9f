//! Recap output.
//!
//! The recap is serialized to JSON and written in one step: the document goes
//! to a temporary file next to the target, which is then renamed over it.

use crate::models::Recap;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Serialize the recap to JSON.
pub fn generate_json_report(recap: &Recap, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(recap)
    } else {
        serde_json::to_string(recap)
    };
    json.context("Failed to serialize recap")
}

/// Write the recap to `path`, replacing any existing file atomically.
pub fn write_json_report(recap: &Recap, path: &Path, pretty: bool) -> Result<()> {
    let mut content = generate_json_report(recap, pretty)?;
    content.push('\n');

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .context("Failed to write recap")?;
    file.persist(path)
        .with_context(|| format!("Failed to write recap to {}", path.display()))?;

    Ok(())
}

/// Short human-readable summary printed after a run.
pub fn generate_summary_text(recap: &Recap, warnings: usize) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "Recap for {} ({})",
        recap.meta.user, recap.meta.year
    ));
    lines.push(format!(
        "- Contributions: {} ({} commits, {} PRs, {} issues, {} reviews)",
        recap.totals.overall,
        recap.totals.commits,
        recap.totals.pull_requests,
        recap.totals.issues,
        recap.totals.reviews
    ));
    lines.push(format!(
        "- Longest streak: {} days",
        recap.calendar.longest_streak
    ));
    if recap.calendar.most_productive_day.count > 0 {
        lines.push(format!(
            "- Best day: {} ({} contributions)",
            recap.calendar.most_productive_day.date, recap.calendar.most_productive_day.count
        ));
    }
    lines.push(format!(
        "- Pull requests: {} opened, {} merged ({:.0}%)",
        recap.pr_stats.opened,
        recap.pr_stats.merged,
        recap.pr_stats.merge_rate * 100.0
    ));
    lines.push(format!(
        "- Issues: {} opened, {} closed",
        recap.issue_stats.opened, recap.issue_stats.closed
    ));
    if let Some(top) = recap.languages.top.first() {
        lines.push(format!(
            "- Top language: {} ({:.1}%)",
            top.language,
            top.share * 100.0
        ));
    }
    if let Some(growth) = &recap.growth {
        lines.push(format!(
            "- Stars gained: {}, forks gained: {}",
            growth.total_stars_gained, growth.total_forks_gained
        ));
    }
    if warnings > 0 {
        lines.push(format!(
            "- Warnings: {} (languages/growth may be incomplete)",
            warnings
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{build_recap, RecapInputs, RecapOptions};
    use crate::models::{
        ContributionDay, ContributionSummary, GrowthMetrics, LanguageBytes, RecapMeta, Window,
    };
    use chrono::{TimeZone, Utc};

    fn create_test_recap(growth: Option<&GrowthMetrics>) -> Recap {
        let summary = ContributionSummary {
            total_commits: 120,
            total_pull_requests: 14,
            total_issues: 6,
            total_reviews: 9,
            calendar: vec![
                ContributionDay::new("2025-04-01", 5),
                ContributionDay::new("2025-04-02", 2),
            ],
            ..ContributionSummary::default()
        };
        let languages: LanguageBytes = [("Rust".to_string(), 3000), ("Shell".to_string(), 1000)]
            .into_iter()
            .collect();
        let meta = RecapMeta {
            user: "octo".to_string(),
            year: 2025,
            window: Window::for_year(2025).unwrap(),
            generated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };
        let inputs = RecapInputs {
            summary: &summary,
            pull_requests: &[],
            issues_opened: &[],
            issues_closed: &[],
            languages: &languages,
            growth,
        };
        build_recap(meta, &inputs, &RecapOptions::default())
    }

    #[test]
    fn test_generate_json_report() {
        let recap = create_test_recap(None);
        let json = generate_json_report(&recap, true).unwrap();

        assert!(json.contains("\"meta\""));
        assert!(json.contains("\"longest_streak\": 2"));
        assert!(json.contains("\"time_of_day_histogram\""));
        assert!(!json.contains("\"growth\""));
        assert!(!json.contains("\"biggest_pr\""));
    }

    #[test]
    fn test_write_json_report_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("recap.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        let recap = create_test_recap(None);
        write_json_report(&recap, &path, false).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["meta"]["user"], "octo");
        assert_eq!(value["totals"]["overall"], 149);
        assert_eq!(value["languages"]["top"][0]["language"], "Rust");
    }

    #[test]
    fn test_summary_text() {
        let growth = GrowthMetrics::from_repos(2025, Vec::new());
        let recap = create_test_recap(Some(&growth));
        let text = generate_summary_text(&recap, 2);

        assert!(text.contains("Recap for octo (2025)"));
        assert!(text.contains("149"));
        assert!(text.contains("Longest streak: 2 days"));
        assert!(text.contains("Top language: Rust (75.0%)"));
        assert!(text.contains("Stars gained: 0"));
        assert!(text.contains("Warnings: 2"));
    }
}
