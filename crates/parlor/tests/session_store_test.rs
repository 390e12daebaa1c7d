//! Tests for the SQLite session store.

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::NamedTempFile;

use parlor::{Session, SessionKey, SessionStore, SqliteStore};
use parlor_rules::GameKind;

/// Creates a migrated store in a temporary file. The file handle must stay
/// in scope to keep the database alive.
fn setup_test_db() -> (NamedTempFile, SqliteStore) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let store = SqliteStore::open(db_path).expect("Failed to open store");
    (db_file, store)
}

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid timestamp")
}

#[test]
fn test_get_missing_session() {
    let (_db, store) = setup_test_db();
    let key = SessionKey::pair(GameKind::Chess, "alice", "bob");
    assert!(store.get(&key).expect("Query failed").is_none());
}

#[test]
fn test_upsert_and_get_round_trip() {
    let (_db, store) = setup_test_db();
    let key = SessionKey::pair(GameKind::Connect4, "bob", "alice");
    let session = Session::new(key.clone(), "group-7", "bob").with_board("c4/1|1|000", Some(noon()));
    store.upsert(&session).expect("Upsert failed");

    let loaded = store.get(&key).expect("Query failed").expect("Session missing");
    assert_eq!(loaded, session);
}

#[test]
fn test_pair_key_order_does_not_matter() {
    let (_db, store) = setup_test_db();
    store
        .upsert(&Session::new(SessionKey::pair(GameKind::Reversi, "alice", "bob"), "g1", "alice"))
        .expect("Upsert failed");

    let reversed = SessionKey::pair(GameKind::Reversi, "bob", "alice");
    assert!(store.get(&reversed).expect("Query failed").is_some());
}

#[test]
fn test_upsert_replaces_whole_record() {
    let (_db, store) = setup_test_db();
    let key = SessionKey::pair(GameKind::Checkers, "alice", "bob");
    store
        .upsert(&Session::new(key.clone(), "g1", "alice").with_board("chk/1|", Some(noon())))
        .expect("First upsert failed");
    store
        .upsert(&Session::new(key.clone(), "g1", "bob"))
        .expect("Second upsert failed");

    let loaded = store.get(&key).expect("Query failed").expect("Session missing");
    assert_eq!(loaded.first_mover(), "bob");
    assert!(!loaded.is_running());
    assert!(loaded.started_at().is_none());
    assert_eq!(store.list().expect("List failed").len(), 1);
}

#[test]
fn test_find_by_group() {
    let (_db, store) = setup_test_db();
    let chess = SessionKey::pair(GameKind::Chess, "alice", "bob");
    let sudoku = SessionKey::solo(GameKind::Sudoku, "alice");
    store.upsert(&Session::new(chess.clone(), "g1", "alice")).expect("Upsert failed");
    store.upsert(&Session::new(sudoku.clone(), "g2", "alice")).expect("Upsert failed");

    let found = store.find_by_group("g2").expect("Query failed").expect("Session missing");
    assert_eq!(found.key(), &sudoku);
    assert!(found.key().is_solo());
    assert!(store.find_by_group("g3").expect("Query failed").is_none());
}

#[test]
fn test_delete() {
    let (_db, store) = setup_test_db();
    let key = SessionKey::solo(GameKind::Lines, "carol");
    store.upsert(&Session::new(key.clone(), "g1", "carol")).expect("Upsert failed");

    assert!(store.delete(&key).expect("Delete failed"));
    assert!(!store.delete(&key).expect("Delete failed"));
    assert!(store.list().expect("List failed").is_empty());
}

#[test]
fn test_same_players_different_games() {
    let (_db, store) = setup_test_db();
    for game in [GameKind::Connect4, GameKind::ChainReaction] {
        store
            .upsert(&Session::new(SessionKey::pair(game, "alice", "bob"), game.command_prefix(), "alice"))
            .expect("Upsert failed");
    }
    assert_eq!(store.list().expect("List failed").len(), 2);
}

#[test]
fn test_reopen_keeps_sessions() {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let key = SessionKey::pair(GameKind::Chess, "alice", "bob");

    let store = SqliteStore::open(db_path.clone()).expect("Failed to open store");
    store
        .upsert(&Session::new(key.clone(), "g1", "alice").with_board("chess/1|e4", Some(noon())))
        .expect("Upsert failed");
    drop(store);

    let reopened = SqliteStore::open(db_path).expect("Failed to reopen store");
    let loaded = reopened.get(&key).expect("Query failed").expect("Session missing");
    assert_eq!(loaded.board_state().as_deref(), Some("chess/1|e4"));
    assert_eq!(*loaded.started_at(), Some(noon()));
}

#[test]
fn test_open_failure_names_the_call() {
    let err = SqliteStore::open("/nonexistent-parlor-dir/sessions.db").expect_err("directory is missing");
    assert_eq!(err.operation, Some("open"));
    assert!(err.to_string().starts_with("Storage error in open: "), "{}", err);
}
