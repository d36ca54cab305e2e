/// Property tests for the streak functions

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use quest_tracker_mcp::domain::streak;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

/// Check-in dates as day offsets from `start()`, duplicates allowed
fn dates() -> impl Strategy<Value = Vec<NaiveDate>> {
    prop::collection::vec(0u64..60, 0..40)
        .prop_map(|offsets| offsets.into_iter().map(|o| start() + Days::new(o)).collect())
}

proptest! {
    #[test]
    fn longest_is_never_shorter_than_current(history in dates(), today_offset in 0u64..60) {
        let today = start() + Days::new(today_offset);
        let current = streak::current_streak(history.iter().copied(), today);
        let longest = streak::longest_streak(history.iter().copied());
        prop_assert!(longest >= current);
    }

    #[test]
    fn duplicates_do_not_change_streaks(history in dates(), today_offset in 0u64..60) {
        let today = start() + Days::new(today_offset);
        let doubled: Vec<NaiveDate> = history.iter().chain(history.iter()).copied().collect();

        prop_assert_eq!(
            streak::current_streak(history.iter().copied(), today),
            streak::current_streak(doubled.iter().copied(), today)
        );
        prop_assert_eq!(
            streak::longest_streak(history.iter().copied()),
            streak::longest_streak(doubled)
        );
    }

    #[test]
    fn completion_rate_stays_within_bounds(history in dates(), today_offset in 0u64..60) {
        let today = start() + Days::new(today_offset);
        let rate = streak::completion_rate(history, start(), today);
        prop_assert!((0.0..=100.0).contains(&rate));
    }

    #[test]
    fn empty_history_has_no_streaks(today_offset in 0u64..60) {
        let today = start() + Days::new(today_offset);
        prop_assert_eq!(streak::current_streak(Vec::<NaiveDate>::new(), today), 0);
        prop_assert_eq!(streak::longest_streak(Vec::<NaiveDate>::new()), 0);
        prop_assert_eq!(streak::completion_rate(Vec::<NaiveDate>::new(), start(), today), 0.0);
    }
}
