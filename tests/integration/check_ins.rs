/// Check-in rules exercised through the storage contract on both backends

use quest_tracker_mcp::*;

use crate::support::*;

const DUPLICATE: &str = "You have already checked in for this habit today";

#[test]
fn test_one_check_in_per_day() {
    for (kind, storage) in backends(SteppingClock::starting(date(2025, 7, 1))) {
        let user = register(storage.as_ref(), "alice");
        let habit = new_habit(storage.as_ref(), &user, "Stretch");

        assert!(storage.create_check_in(habit.id, user.id).unwrap().is_success());
        let again = storage.create_check_in(habit.id, user.id).unwrap();
        assert_eq!(again.errors(), [DUPLICATE.to_string()], "{}", kind);
        assert_eq!(only_habit(storage.as_ref(), &user).check_ins.len(), 1, "{}", kind);
    }
}

#[test]
fn test_check_in_allowed_again_tomorrow_and_after_undo() {
    for kind in [BackendKind::Relational, BackendKind::Local] {
        let clock = SteppingClock::starting(date(2025, 7, 1));
        let storage = open_backend(kind, clock.clone());
        let user = register(storage.as_ref(), "alice");
        let habit = new_habit(storage.as_ref(), &user, "Stretch");

        let first = storage.create_check_in(habit.id, user.id).unwrap().into_data().unwrap();
        assert!(storage.delete_check_in(first.id, user.id).unwrap().is_success());
        assert!(storage.create_check_in(habit.id, user.id).unwrap().is_success(), "{}", kind);

        clock.advance_days(1);
        assert!(storage.create_check_in(habit.id, user.id).unwrap().is_success(), "{}", kind);

        let habit = only_habit(storage.as_ref(), &user);
        assert_eq!(habit.current_streak(clock.today()), 2, "{}", kind);
    }
}

#[test]
fn test_users_cannot_touch_each_others_records() {
    for (kind, storage) in backends(SteppingClock::starting(date(2025, 7, 1))) {
        let alice = register(storage.as_ref(), "alice");
        let bob = register(storage.as_ref(), "bob");
        let habit = new_habit(storage.as_ref(), &alice, "Journal");
        let check_in = storage
            .create_check_in(habit.id, alice.id)
            .unwrap()
            .into_data()
            .unwrap();

        assert!(storage.find_habits_for_user(bob.id).unwrap().is_empty(), "{}", kind);

        let result = storage.create_check_in(habit.id, bob.id).unwrap();
        assert_eq!(result.errors(), ["Habit not found".to_string()], "{}", kind);

        let result = storage.delete_habit(habit.id, bob.id).unwrap();
        assert_eq!(result.errors(), ["Habit not found".to_string()], "{}", kind);

        let result = storage.delete_check_in(check_in.id, bob.id).unwrap();
        assert_eq!(result.errors(), ["Check-in not found".to_string()], "{}", kind);

        assert_eq!(only_habit(storage.as_ref(), &alice).check_ins.len(), 1, "{}", kind);
    }
}

#[test]
fn test_deleting_a_habit_removes_its_check_ins() {
    for (kind, storage) in backends(SteppingClock::starting(date(2025, 7, 1))) {
        let user = register(storage.as_ref(), "alice");
        let habit = new_habit(storage.as_ref(), &user, "Run");
        let check_in = storage
            .create_check_in(habit.id, user.id)
            .unwrap()
            .into_data()
            .unwrap();

        assert!(storage.delete_habit(habit.id, user.id).unwrap().is_success());
        assert!(storage.find_habits_for_user(user.id).unwrap().is_empty(), "{}", kind);

        let result = storage.delete_check_in(check_in.id, user.id).unwrap();
        assert_eq!(result.errors(), ["Check-in not found".to_string()], "{}", kind);
    }
}

#[test]
fn test_deleting_a_user_removes_everything_they_own() {
    for (kind, storage) in backends(SteppingClock::starting(date(2025, 7, 1))) {
        let user = register(storage.as_ref(), "alice");
        let habit = new_habit(storage.as_ref(), &user, "Run");
        assert!(storage.create_check_in(habit.id, user.id).unwrap().is_success());

        assert!(storage.delete_user(user.id).unwrap().is_success(), "{}", kind);
        assert!(storage.authenticate("alice", "password").unwrap().is_none(), "{}", kind);
        assert!(storage.find_habits_for_user(user.id).unwrap().is_empty(), "{}", kind);

        let again = storage.delete_user(user.id).unwrap();
        assert_eq!(again.errors(), ["User not found".to_string()], "{}", kind);
    }
}

#[test]
fn test_habits_are_listed_newest_first() {
    for kind in [BackendKind::Relational, BackendKind::Local] {
        let clock = SteppingClock::starting(date(2025, 7, 1));
        let storage = open_backend(kind, clock.clone());
        let user = register(storage.as_ref(), "alice");

        new_habit(storage.as_ref(), &user, "Older");
        clock.advance_days(1);
        new_habit(storage.as_ref(), &user, "Newer");

        let titles: Vec<String> = storage
            .find_habits_for_user(user.id)
            .unwrap()
            .into_iter()
            .map(|h| h.title)
            .collect();
        assert_eq!(titles, ["Newer", "Older"], "{}", kind);
    }
}

#[test]
fn test_backends_order_same_instant_habits_identically() {
    let clock = SteppingClock::starting(date(2025, 7, 1));
    let mut listings = Vec::new();

    for (kind, storage) in backends(clock) {
        let user = register(storage.as_ref(), "alice");
        for title in ["Walk", "Read", "Write"] {
            new_habit(storage.as_ref(), &user, title);
        }

        let titles: Vec<String> = storage
            .find_habits_for_user(user.id)
            .unwrap()
            .into_iter()
            .map(|h| h.title)
            .collect();
        listings.push((kind, titles));
    }

    assert_eq!(listings[0].1, ["Write", "Read", "Walk"]);
    assert_eq!(listings[0].1, listings[1].1, "{} and {} disagree", listings[0].0, listings[1].0);
}
