/// The same scenario must produce the same statistics on both backends

use quest_tracker_mcp::*;

use crate::support::*;

/// (current, longest, total, completion rate, last checked in)
type Summary = (u32, u32, u32, f64, Option<chrono::NaiveDate>);

fn summary(streak: &Streak) -> Summary {
    (
        streak.current_streak,
        streak.longest_streak,
        streak.total_check_ins,
        streak.completion_rate,
        streak.last_checked_in,
    )
}

/// Check in on days 1, 2, 3 and 5; day 4 is missed
fn run_scenario(storage: &dyn HabitStorage, clock: &SteppingClock) -> (Summary, Summary) {
    let user = register(storage, "alice");
    let habit = new_habit(storage, &user, "Read 20 pages");

    let mut last_check_in = None;
    for day in 1..=5 {
        if day != 4 {
            let result = storage.create_check_in(habit.id, user.id).unwrap();
            last_check_in = result.into_data();
        }
        if day != 5 {
            clock.advance_days(1);
        }
    }

    let today = clock.today();
    let before_undo = summary(&only_habit(storage, &user).stats(today));

    let last_check_in = last_check_in.expect("day 5 check-in failed");
    assert!(storage.delete_check_in(last_check_in.id, user.id).unwrap().is_success());
    let after_undo = summary(&only_habit(storage, &user).stats(today));

    (before_undo, after_undo)
}

#[test]
fn test_backends_agree_on_streak_statistics() {
    let mut results = Vec::new();

    for kind in [BackendKind::Relational, BackendKind::Local] {
        // each backend replays the same calendar on its own clock
        let clock = SteppingClock::starting(date(2025, 7, 1));
        let storage = open_backend(kind, clock.clone());

        results.push((kind, run_scenario(storage.as_ref(), &clock)));
    }

    let (_, (before, after)) = &results[0];
    assert_eq!(*before, (1, 3, 4, 80.0, Some(date(2025, 7, 5))));
    assert_eq!(*after, (0, 3, 3, 60.0, Some(date(2025, 7, 3))));

    for (name, result) in &results[1..] {
        assert_eq!(result, &results[0].1, "{} backend disagrees", name);
    }
}

#[test]
fn test_backends_agree_on_validation_messages() {
    for (name, storage) in backends(SteppingClock::starting(date(2025, 7, 1))) {
        let user = register(storage.as_ref(), "alice");

        let blank = storage.create_habit("   ", user.id).unwrap();
        assert_eq!(blank.errors(), ["Title can't be blank".to_string()], "{}", name);

        let taken = storage.create_user("alice", "other").unwrap();
        assert_eq!(taken.errors(), ["Username has already been taken".to_string()], "{}", name);

        let no_password = storage.create_user("bob", "").unwrap();
        assert_eq!(no_password.errors(), ["Password can't be blank".to_string()], "{}", name);
    }
}
