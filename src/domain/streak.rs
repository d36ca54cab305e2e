/// Streak calculation over check-in dates
///
/// Everything here is a pure function of a set of calendar dates and a
/// reference "today". Nothing is cached: statistics are recomputed from the
/// authoritative check-ins on every read, so switching storage backends or
/// serving a new request can never observe a stale value.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::HabitId;

/// Calculated streak statistics for a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    /// Which habit these statistics describe
    pub habit_id: HabitId,
    /// Consecutive days with a check-in, ending today
    pub current_streak: u32,
    /// Best run of consecutive days ever achieved
    pub longest_streak: u32,
    /// Most recent day with a check-in (None if never checked in)
    pub last_checked_in: Option<NaiveDate>,
    /// Number of distinct days with a check-in
    pub total_check_ins: u32,
    /// Share of days since creation with a check-in, as a percentage (0.0 to 100.0)
    pub completion_rate: f64,
}

impl Streak {
    /// Statistics for a habit that has never been checked in
    pub fn new(habit_id: HabitId) -> Self {
        Self {
            habit_id,
            current_streak: 0,
            longest_streak: 0,
            last_checked_in: None,
            total_check_ins: 0,
            completion_rate: 0.0,
        }
    }

    /// Calculate all statistics for one habit's check-in dates
    pub fn calculate<I>(habit_id: HabitId, dates: I, created_on: NaiveDate, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let days: BTreeSet<NaiveDate> = dates.into_iter().collect();
        if days.is_empty() {
            return Self::new(habit_id);
        }

        Self {
            habit_id,
            current_streak: current_streak_in(&days, today),
            longest_streak: longest_streak_in(&days),
            last_checked_in: days.last().copied(),
            total_check_ins: u32::try_from(days.len()).unwrap_or(u32::MAX),
            completion_rate: completion_rate_in(&days, created_on, today),
        }
    }

    /// Whether the habit has been checked in today
    pub fn is_active(&self) -> bool {
        self.current_streak > 0
    }
}

/// Count consecutive days ending at `today` that have a check-in
///
/// Walks backward one day at a time from `today` and stops at the first
/// missing date. A history without a check-in on `today` yields 0, however
/// long the run that ended yesterday.
pub fn current_streak<I>(dates: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    current_streak_in(&dates.into_iter().collect(), today)
}

/// Length of the longest run of consecutive calendar days in the history
pub fn longest_streak<I>(dates: I) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    longest_streak_in(&dates.into_iter().collect())
}

/// Percentage of days from `created_on` through `today` (inclusive) that have a check-in
///
/// Only distinct dates inside that window count. An empty or inverted window
/// yields 0 rather than dividing by zero.
pub fn completion_rate<I>(dates: I, created_on: NaiveDate, today: NaiveDate) -> f64
where
    I: IntoIterator<Item = NaiveDate>,
{
    completion_rate_in(&dates.into_iter().collect(), created_on, today)
}

fn current_streak_in(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut checking_date = today;

    while days.contains(&checking_date) {
        streak += 1;
        match checking_date.pred_opt() {
            Some(previous) => checking_date = previous,
            None => break,
        }
    }

    streak
}

fn longest_streak_in(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut running = 0;
    let mut last_date: Option<NaiveDate> = None;

    // BTreeSet iterates ascending with duplicates already removed
    for &date in days {
        running = match last_date {
            Some(previous) if previous.succ_opt() == Some(date) => running + 1,
            _ => 1,
        };
        longest = longest.max(running);
        last_date = Some(date);
    }

    longest
}

fn completion_rate_in(days: &BTreeSet<NaiveDate>, created_on: NaiveDate, today: NaiveDate) -> f64 {
    if today < created_on {
        return 0.0;
    }

    let span_days = (today - created_on).num_days() + 1;
    let completed = days.range(created_on..=today).count();
    if completed == 0 {
        return 0.0;
    }

    completed as f64 * 100.0 / span_days as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 20).unwrap()
    }

    fn days_ago(offsets: &[i64]) -> Vec<NaiveDate> {
        offsets.iter().map(|&n| today() - Duration::days(n)).collect()
    }

    #[test]
    fn test_empty_history_is_all_zero() {
        assert_eq!(current_streak(Vec::new(), today()), 0);
        assert_eq!(longest_streak(Vec::new()), 0);
        assert_eq!(completion_rate(Vec::new(), today(), today()), 0.0);

        let streak = Streak::calculate(HabitId::new(), Vec::new(), today(), today());
        assert_eq!(streak.current_streak, 0);
        assert_eq!(streak.longest_streak, 0);
        assert_eq!(streak.last_checked_in, None);
    }

    #[test]
    fn test_single_check_in_today() {
        let dates = days_ago(&[0]);
        assert_eq!(current_streak(dates.clone(), today()), 1);
        assert_eq!(longest_streak(dates.clone()), 1);
        assert_eq!(completion_rate(dates, today(), today()), 100.0);
    }

    #[test]
    fn test_yesterday_without_today_breaks_current_streak() {
        let dates = days_ago(&[1, 2, 3]);
        assert_eq!(current_streak(dates.clone(), today()), 0);
        assert_eq!(longest_streak(dates), 3);
    }

    #[test]
    fn test_two_day_run_through_today() {
        let dates = days_ago(&[0, 1, 3]);
        assert_eq!(current_streak(dates.clone(), today()), 2);
        assert_eq!(longest_streak(dates), 2);
    }

    #[test]
    fn test_gap_restarts_run() {
        // missing yesterday: the run through today is only one day long
        let dates = days_ago(&[0, 2, 3]);
        assert_eq!(current_streak(dates.clone(), today()), 1);
        assert_eq!(longest_streak(dates), 2);
    }

    #[test]
    fn test_duplicate_dates_count_once() {
        let dates = days_ago(&[0, 0, 1, 1, 2]);
        assert_eq!(current_streak(dates.clone(), today()), 3);
        assert_eq!(longest_streak(dates.clone()), 3);

        let streak = Streak::calculate(HabitId::new(), dates, today() - Duration::days(2), today());
        assert_eq!(streak.total_check_ins, 3);
        assert_eq!(streak.completion_rate, 100.0);
    }

    #[test]
    fn test_sparse_history_since_creation() {
        let created_on = today() - Duration::days(4);
        let dates = days_ago(&[4, 2]);

        let streak = Streak::calculate(HabitId::new(), dates, created_on, today());
        assert_eq!(streak.completion_rate, 40.0);
        assert_eq!(streak.current_streak, 0);
        assert_eq!(streak.longest_streak, 1);
        assert_eq!(streak.last_checked_in, Some(today() - Duration::days(2)));
        assert!(!streak.is_active());
    }

    #[test]
    fn test_three_consecutive_days_ending_today() {
        let dates = days_ago(&[2, 1, 0]);
        let streak = Streak::calculate(HabitId::new(), dates, today() - Duration::days(2), today());

        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.longest_streak, 3);
        assert!(streak.is_active());
    }

    #[test]
    fn test_completion_rate_ignores_dates_outside_window() {
        let dates = days_ago(&[10, 1]);
        let created_on = today() - Duration::days(3);

        assert_eq!(completion_rate(dates.clone(), created_on, today()), 25.0);
        // habit "created" after today: no window at all
        assert_eq!(completion_rate(dates, today() + Duration::days(1), today()), 0.0);
    }
}
