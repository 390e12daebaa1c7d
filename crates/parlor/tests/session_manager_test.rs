//! Session manager behaviour across stores and threads.

use std::sync::Arc;
use std::thread;

use tempfile::NamedTempFile;

use parlor::{ErrorClass, MemoryStore, PlainNames, SessionError, SessionKey, SessionManager, SessionStore, SqliteStore};
use parlor_rules::{BoardVariant, ChainReaction, Connect4, GameKind, Seat, Sudoku, grid};

fn connect4(store: Arc<dyn SessionStore>) -> SessionManager<Connect4> {
    SessionManager::new(store, Arc::new(PlainNames))
}

#[test]
fn test_concurrent_submits_apply_once() {
    let store = Arc::new(MemoryStore::new());
    let manager = connect4(store.clone());
    let key = SessionKey::pair(GameKind::Connect4, "alice", "bob");
    manager.create(key.clone(), "g1", "alice").expect("create");

    let results: Vec<Result<String, SessionError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let manager = manager.clone();
                let key = key.clone();
                scope.spawn(move || manager.submit_move(&key, "alice", "4"))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(SessionError::NotYourTurn)))
    );

    let session = store.get(&key).expect("get").expect("present");
    let board = Connect4::from_state(session.board_state().as_deref().expect("running")).expect("decodes");
    assert_eq!(board.token_at(5, 3), Some(Seat::First));
    assert_eq!(board.token_at(4, 3), None);
    assert_eq!(board.turn(), Some(Seat::Second));
}

#[test]
fn test_sessions_survive_a_new_manager() {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let key = SessionKey::pair(GameKind::Connect4, "alice", "bob");

    let first = connect4(Arc::new(SqliteStore::open(db_path.clone()).expect("open")));
    first.create(key.clone(), "g1", "alice").expect("create");
    first.submit_move(&key, "alice", "4").expect("alice moves");
    drop(first);

    let second = connect4(Arc::new(SqliteStore::open(db_path).expect("reopen")));
    assert!(matches!(
        second.submit_move(&key, "alice", "4"),
        Err(SessionError::NotYourTurn)
    ));
    let reply = second.submit_move(&key, "bob", "4").expect("bob moves");
    assert!(reply.contains("🔴 alice it's your turn..."));
}

#[test]
fn test_failure_order() {
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let manager = connect4(store);
    let key = SessionKey::pair(GameKind::Connect4, "alice", "bob");

    let err = manager.submit_move(&key, "alice", "4").expect_err("no session");
    assert!(matches!(err, SessionError::UnknownSession));
    assert_eq!(err.class(), ErrorClass::Validation);

    manager.create(key.clone(), "g1", "alice").expect("create");
    let err = manager.submit_move(&key, "carol", "not even a move").expect_err("outsider");
    assert!(matches!(err, SessionError::NotAParty));

    manager.resign(&key, "bob").expect("resign");
    let err = manager.submit_move(&key, "alice", "4").expect_err("idle");
    assert!(matches!(err, SessionError::NoGame));
    assert_eq!(err.class(), ErrorClass::Precondition);

    assert!(matches!(manager.repeat(&key), Err(SessionError::NoGame)));
}

#[test]
fn test_create_rejects_outsider_first_mover() {
    let manager = connect4(Arc::new(MemoryStore::new()));
    let key = SessionKey::pair(GameKind::Connect4, "alice", "bob");
    assert!(matches!(
        manager.create(key, "g1", "carol"),
        Err(SessionError::NotAParty)
    ));
}

#[test]
fn test_corruption_is_classified_and_reset() {
    let store = Arc::new(MemoryStore::new());
    let manager: SessionManager<ChainReaction> = SessionManager::new(store.clone(), Arc::new(PlainNames));
    let key = SessionKey::pair(GameKind::ChainReaction, "alice", "bob");
    manager.create(key.clone(), "g1", "alice").expect("create");

    let session = store.get(&key).expect("get").expect("present");
    let tampered = session.clone().with_board("rev/1|0|0|", None);
    store.upsert(&tampered).expect("tamper");

    let err = manager.repeat(&key).expect_err("foreign state");
    assert_eq!(err.class(), ErrorClass::Corruption);
    assert!(!store.get(&key).expect("get").expect("present").is_running());
}

#[test]
fn test_dissolve() {
    let store = Arc::new(MemoryStore::new());
    let manager = connect4(store.clone());
    let key = SessionKey::pair(GameKind::Connect4, "alice", "bob");
    manager.create(key.clone(), "g1", "alice").expect("create");

    assert!(manager.dissolve(&key).expect("dissolve"));
    assert!(!manager.dissolve(&key).expect("dissolve again"));
    assert!(matches!(manager.repeat(&key), Err(SessionError::UnknownSession)));
}

#[test]
fn test_solved_sudoku_reports_time() {
    let store = Arc::new(MemoryStore::new());
    let manager: SessionManager<Sudoku> =
        SessionManager::new(store.clone(), Arc::new(PlainNames)).with_board_factory(|| Sudoku::with_seed(11));
    let key = SessionKey::solo(GameKind::Sudoku, "dave");
    manager.create(key.clone(), "g1", "dave").expect("create");

    let puzzle = Sudoku::with_seed(11);
    let solution = puzzle.solution().expect("solvable");
    let open: Vec<(usize, usize)> = (0..9)
        .flat_map(|row| (0..9).map(move |col| (row, col)))
        .filter(|&cell| !puzzle.is_clue(cell))
        .collect();

    let mut last = String::new();
    for (row, col) in open {
        let token = format!("{}{}", grid::cell_name((row, col)), solution[row * 9 + col]);
        last = manager.submit_move(&key, "dave", &token).expect("solution digit");
    }

    assert!(last.starts_with("🏆 Game over. You Win!!!\n⏱️ "), "{}", last);
    assert!(last.ends_with("▶️ Play again? /sudoku_play"));
    assert!(!store.get(&key).expect("get").expect("present").is_running());
}
