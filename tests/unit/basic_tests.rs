/// Basic unit tests to verify core functionality
use chrono::NaiveDate;
use quest_tracker_mcp::*;
use tempfile::NamedTempFile;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
}

#[test]
fn test_habit_creation() {
    let clock = FixedClock::on(day(1));
    let habit = Habit::new("  Test Habit  ", UserId::new(), &clock).expect("valid title");

    assert_eq!(habit.title, "Test Habit");
    assert_eq!(habit.created_on(), day(1));
    assert!(habit.check_ins.is_empty());
}

#[test]
fn test_blank_title_is_rejected() {
    let clock = FixedClock::on(day(1));
    let error = Habit::new("", UserId::new(), &clock).unwrap_err();
    assert_eq!(error.to_string(), "Title can't be blank");
}

#[test]
fn test_check_in_creation() {
    let clock = FixedClock::on(day(3));
    let habit = Habit::new("Read", UserId::new(), &clock).unwrap();
    let check_in = CheckIn::new(habit.user_id, habit.id, &clock);

    assert_eq!(check_in.habit_id, habit.id);
    assert_eq!(check_in.date(), day(3));
    assert!(check_in.is_completed_today(&clock));
}

#[test]
fn test_outcome_serialization() {
    let failure: DeleteResult = DomainError::HabitNotFound.into();
    let json = serde_json::to_value(&failure).unwrap();
    assert_eq!(json, serde_json::json!({"status": "failure", "errors": ["Habit not found"]}));

    let success: DeleteResult = Outcome::success(());
    assert_eq!(serde_json::to_value(&success).unwrap()["status"], "success");
}

#[test]
fn test_password_digest_is_not_serialized() {
    let hasher = Sha256Hasher;
    let user = User::new("alice", hasher.hash("secret"), &SystemClock).unwrap();
    let json = serde_json::to_value(&user).unwrap();

    assert!(json.get("password_digest").is_none());
    assert!(hasher.verify("secret", &user.password_digest));
}

#[test]
fn test_storage_creation() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let storage = SqliteStorage::new(temp_file.path());
    assert!(storage.is_ok());
}

#[test]
fn test_backend_kind_round_trip() {
    for kind in [BackendKind::Relational, BackendKind::Local] {
        assert_eq!(kind.to_string().parse::<BackendKind>(), Ok(kind));
    }
}
