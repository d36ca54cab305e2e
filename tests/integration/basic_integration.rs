/// Server start-up, persistence across reopen, and backend selection

use std::sync::Arc;

use quest_tracker_mcp::*;
use tempfile::{tempdir, NamedTempFile};

use crate::support::*;

#[tokio::test]
async fn test_server_signs_in_registered_user() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = StorageConfig::in_dir(BackendKind::Relational, dir.path().to_path_buf());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(date(2025, 7, 1)));

    let rejected = QuestTrackerServer::new(&config, clock.clone(), "alice", "secret", false);
    assert!(matches!(rejected, Err(ServerError::Authentication(_))));

    let server = QuestTrackerServer::new(&config, clock.clone(), "alice", "secret", true)
        .expect("Failed to register");
    assert_eq!(server.user().username, "alice");
    assert_eq!(server.storage().kind(), BackendKind::Relational);
    drop(server);

    let again = QuestTrackerServer::new(&config, clock.clone(), "alice", "secret", false)
        .expect("Failed to sign in");
    assert_eq!(again.user().username, "alice");

    let wrong = QuestTrackerServer::new(&config, clock, "alice", "not-it", false);
    assert!(matches!(wrong, Err(ServerError::Authentication(_))));
}

#[test]
fn test_database_persistence() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_file.path().to_path_buf();

    let habit_id = {
        let storage = SqliteStorage::new(&db_path).expect("Failed to create storage");
        let user = register(&storage, "alice");
        let habit = new_habit(&storage, &user, "Meditate");
        assert!(storage.create_check_in(habit.id, user.id).unwrap().is_success());
        habit.id
    };

    let storage = SqliteStorage::new(&db_path).expect("Failed to reopen storage");
    let user = storage
        .authenticate("alice", "password")
        .unwrap()
        .expect("user should persist");
    let habit = only_habit(&storage, &user);
    assert_eq!(habit.id, habit_id);
    assert_eq!(habit.check_ins.len(), 1);
}

#[test]
fn test_local_store_persistence() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("local_store.json");

    {
        let storage = LocalStorage::open(&path);
        let user = register(&storage, "alice");
        new_habit(&storage, &user, "Walk");
    }

    let storage = LocalStorage::open(&path);
    let user = storage
        .authenticate("alice", "password")
        .unwrap()
        .expect("user should persist");
    assert_eq!(only_habit(&storage, &user).title, "Walk");
}

#[test]
fn test_demo_user_is_seeded_once() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut config = StorageConfig::in_dir(BackendKind::Local, dir.path().to_path_buf());
    config.seed_demo_user = true;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    StorageBackend::open(&config, clock.clone()).expect("Failed to open backend");
    let backend = StorageBackend::open(&config, clock).expect("Failed to reopen backend");

    assert!(backend.authenticate("demo", "password").unwrap().is_some());
}

#[test]
fn test_storage_interface() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let storage = SqliteStorage::new(temp_file.path()).expect("Failed to create storage");

    let _: &dyn HabitStorage = &storage;
    let _: &dyn CheckInLedger = &storage;
}
