//! Calendar statistics: streaks, best day and best ISO week.

use crate::models::{ContributionDay, IsoWeekCount};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Longest run of consecutive calendar days with nonzero activity.
///
/// The calendar arrives in source order, so days are sorted by date first and
/// a gap between two dates breaks the run. Malformed dates are ignored.
pub fn longest_streak(days: &[ContributionDay]) -> u32 {
    let mut dated: Vec<(NaiveDate, u32)> = days
        .iter()
        .filter_map(|day| Some((day.parsed_date()?, day.count)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    let mut best = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;

    for (date, count) in dated {
        if count == 0 {
            current = 0;
        } else if previous.and_then(|p| p.succ_opt()) == Some(date) && current > 0 {
            current += 1;
        } else {
            current = 1;
        }
        best = best.max(current);
        previous = Some(date);
    }

    best
}

/// The day with the highest count. The first day seen wins ties.
///
/// Returns an empty default when the calendar is empty.
pub fn most_productive_day(days: &[ContributionDay]) -> ContributionDay {
    let mut best: Option<&ContributionDay> = None;
    for day in days {
        if best.map_or(true, |b| day.count > b.count) {
            best = Some(day);
        }
    }
    best.cloned().unwrap_or_default()
}

/// ISO week with the highest summed count, labelled `YYYY-Www`.
///
/// Ties go to the earliest week.
pub fn most_productive_iso_week(days: &[ContributionDay]) -> IsoWeekCount {
    let mut weeks: BTreeMap<(i32, u32), u32> = BTreeMap::new();
    for day in days {
        let Some(date) = day.parsed_date() else {
            continue;
        };
        let week = date.iso_week();
        *weeks.entry((week.year(), week.week())).or_default() += day.count;
    }

    let mut best: Option<((i32, u32), u32)> = None;
    for (key, count) in weeks {
        if best.map_or(true, |(_, b)| count > b) {
            best = Some((key, count));
        }
    }

    match best {
        Some(((year, week), count)) => IsoWeekCount {
            iso_week: iso_week_label(year, week),
            count,
        },
        None => IsoWeekCount::default(),
    }
}

fn iso_week_label(year: i32, week: u32) -> String {
    format!("{:04}-W{:02}", year, week)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(entries: &[(&str, u32)]) -> Vec<ContributionDay> {
        entries
            .iter()
            .map(|(date, count)| ContributionDay::new(*date, *count))
            .collect()
    }

    #[test]
    fn test_streak_and_best_day_scenario() {
        let calendar = days(&[
            ("2025-01-01", 1),
            ("2025-01-02", 1),
            ("2025-01-03", 0),
            ("2025-01-04", 2),
        ]);
        assert_eq!(longest_streak(&calendar), 2);
        assert_eq!(
            most_productive_day(&calendar),
            ContributionDay::new("2025-01-04", 2)
        );
    }

    #[test]
    fn test_streak_sorts_unordered_calendar() {
        let calendar = days(&[
            ("2025-01-03", 1),
            ("2025-01-01", 1),
            ("2025-01-02", 1),
            ("2025-01-10", 1),
        ]);
        assert_eq!(longest_streak(&calendar), 3);
    }

    #[test]
    fn test_streak_breaks_on_date_gap() {
        let calendar = days(&[("2025-01-01", 1), ("2025-01-03", 1)]);
        assert_eq!(longest_streak(&calendar), 1);
    }

    #[test]
    fn test_streak_zero_when_inactive() {
        let calendar = days(&[("2025-01-01", 0), ("2025-01-02", 0)]);
        assert_eq!(longest_streak(&calendar), 0);
        assert_eq!(longest_streak(&[]), 0);
    }

    #[test]
    fn test_streak_at_least_one_when_any_activity() {
        let calendar = days(&[("2025-01-01", 0), ("2025-03-02", 5), ("2025-06-01", 0)]);
        assert_eq!(longest_streak(&calendar), 1);
    }

    #[test]
    fn test_best_day_first_seen_wins_ties() {
        let calendar = days(&[("2025-02-01", 3), ("2025-01-01", 3), ("2025-01-05", 1)]);
        assert_eq!(
            most_productive_day(&calendar),
            ContributionDay::new("2025-02-01", 3)
        );
    }

    #[test]
    fn test_best_day_dominates_calendar() {
        let calendar = days(&[("2025-01-01", 4), ("2025-01-02", 9), ("2025-01-03", 7)]);
        let best = most_productive_day(&calendar);
        assert!(calendar.iter().all(|day| best.count >= day.count));
    }

    #[test]
    fn test_best_day_all_zero_or_empty() {
        let calendar = days(&[("2025-01-01", 0), ("2025-01-02", 0)]);
        assert_eq!(most_productive_day(&calendar).count, 0);
        assert_eq!(most_productive_day(&[]), ContributionDay::default());
    }

    #[test]
    fn test_iso_week_sums_per_week() {
        // 2024-12-30 .. 2025-01-05 is 2025-W01; 2025-01-06 starts W02.
        let calendar = days(&[
            ("2024-12-30", 2),
            ("2025-01-05", 3),
            ("2025-01-06", 4),
            ("2025-01-07", 0),
        ]);
        assert_eq!(
            most_productive_iso_week(&calendar),
            IsoWeekCount {
                iso_week: "2025-W01".to_string(),
                count: 5,
            }
        );
    }

    #[test]
    fn test_iso_week_tie_goes_to_earliest() {
        let calendar = days(&[("2025-03-10", 2), ("2025-01-06", 2)]);
        assert_eq!(most_productive_iso_week(&calendar).iso_week, "2025-W02");
        assert_eq!(most_productive_iso_week(&[]), IsoWeekCount::default());
    }
}
