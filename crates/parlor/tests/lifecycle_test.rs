//! End-to-end chat lifecycle tests against the in-memory store.

use std::sync::{Arc, Mutex};

use parlor::{
    ChatTransport, Command, MemoryStore, Parlor, ParlorConfig, Session, SessionKey, SessionStore,
};
use parlor_rules::GameKind;

/// Records every posted message.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("transport lock").clone()
    }
}

impl ChatTransport for RecordingTransport {
    fn send_text(&self, group_ref: &str, text: &str) {
        self.sent
            .lock()
            .expect("transport lock")
            .push((group_ref.to_string(), text.to_string()));
    }

    fn display_name(&self, player: &str) -> String {
        player.to_string()
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    transport: Arc<RecordingTransport>,
    parlor: Parlor,
}

fn fixture_with(config: ParlorConfig) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(RecordingTransport::default());
    let parlor = Parlor::new(store.clone(), transport.clone(), &config).expect("valid config");
    Fixture {
        store,
        transport,
        parlor,
    }
}

fn fixture() -> Fixture {
    fixture_with(ParlorConfig::default())
}

fn c4_key() -> SessionKey {
    SessionKey::pair(GameKind::Connect4, "alice", "bob")
}

#[test]
fn test_connect4_game_to_the_end() {
    let f = fixture();
    let invite = f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");
    assert!(invite.starts_with("Hello bob,\nYou have been invited by alice to play Connect4"));
    assert!(invite.contains("🔴 alice it's your turn..."));

    for (player, column) in [("alice", "4"), ("bob", "1"), ("alice", "4"), ("bob", "1"), ("alice", "4"), ("bob", "1")] {
        let reply = f.parlor.on_move_text("g1", player, column).expect("move handled");
        assert!(!reply.contains("Game over"), "{}", reply);
    }
    let last = f.parlor.on_move_text("g1", "alice", "4").expect("move handled");
    assert!(last.starts_with("🏆 Game over.\n🔴 alice Wins!!!"), "{}", last);
    assert!(last.ends_with("▶️ Play again? /c4_new"));

    let session = f.store.get(&c4_key()).expect("get").expect("session kept");
    assert!(!session.is_running());
    assert_eq!(f.parlor.on_move_text("g1", "bob", "2"), None);
    assert_eq!(f.transport.sent().len(), 8);
}

#[test]
fn test_out_of_turn_move_is_refused() {
    let config = ParlorConfig::from_toml("chain_reaction_rows = 2\nchain_reaction_cols = 2\n").expect("valid config");
    let f = fixture_with(config);
    f.parlor.on_invite(GameKind::ChainReaction, "alice", "bob", "g1");
    let key = SessionKey::pair(GameKind::ChainReaction, "alice", "bob");

    f.parlor.on_move_text("g1", "alice", "a1").expect("first move");
    let before = f.store.get(&key).expect("get");
    let reply = f.parlor.on_move_text("g1", "alice", "a1").expect("handled");
    assert_eq!(reply, "⏳ It's not your turn");
    assert_eq!(f.store.get(&key).expect("get"), before);
}

#[test]
fn test_invitation_preconditions() {
    let f = fixture();
    assert_eq!(
        f.parlor.on_invite(GameKind::Reversi, "alice", "alice", "g1"),
        "You can't play with yourself"
    );
    assert_eq!(
        f.parlor.on_invite(GameKind::Reversi, "alice", "parlor-bot", "g1"),
        "Sorry, I don't want to play"
    );
    assert!(f.transport.sent().is_empty());
    assert!(f.store.list().expect("list").is_empty());
}

#[test]
fn test_second_invitation_points_to_existing_group() {
    let f = fixture();
    f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");
    let reply = f.parlor.on_invite(GameKind::Connect4, "bob", "alice", "g2");
    assert_eq!(reply, "You already have a game group with alice");

    let sent = f.transport.sent();
    assert_eq!(sent.last().map(|(group, _)| group.as_str()), Some("g1"));
    let session = f.store.get(&c4_key()).expect("get").expect("present");
    assert_eq!(session.group_ref(), "g1");
}

#[test]
fn test_chat_and_outsiders() {
    let f = fixture();
    f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");
    assert_eq!(f.parlor.on_move_text("g1", "alice", "good luck!"), None);
    assert_eq!(f.parlor.on_move_text("g404", "alice", "4"), None);
    assert_eq!(
        f.parlor.on_move_text("g1", "carol", "4").as_deref(),
        Some("This is not your game group")
    );
}

#[test]
fn test_invalid_move_keeps_board() {
    let f = fixture();
    f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");
    let before = f.store.get(&c4_key()).expect("get");
    let reply = f.parlor.on_move_text("g1", "alice", "9").expect("handled");
    assert!(reply.starts_with("❌ Invalid move!"), "{}", reply);
    assert_eq!(f.store.get(&c4_key()).expect("get"), before);
}

#[test]
fn test_surrender_then_new_game() {
    let f = fixture();
    f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");

    let reply = f.parlor.on_command("g1", "bob", GameKind::Connect4, Command::Surrender);
    assert_eq!(reply, "🏳️ Game Over.\nbob surrenders.\n\n▶️ Play again? /c4_new");

    let repeat = f.parlor.on_command("g1", "alice", GameKind::Connect4, Command::Repeat);
    assert!(repeat.starts_with("There is no game running"));
    assert_eq!(
        f.parlor.on_command("g1", "alice", GameKind::Connect4, Command::Surrender),
        "There is no game running. ▶️ Play again? /c4_new"
    );

    let started = f.parlor.on_command("g1", "bob", GameKind::Connect4, Command::New);
    assert!(started.starts_with("▶️ Game started!\n🔴: bob\n🟡: alice"), "{}", started);
    assert_eq!(
        f.parlor.on_command("g1", "alice", GameKind::Connect4, Command::New),
        "There is a game running already"
    );
    let reply = f.parlor.on_move_text("g1", "bob", "1").expect("bob moves first");
    assert!(reply.contains("🟡 alice it's your turn..."));
}

#[test]
fn test_command_for_other_game_is_refused() {
    let f = fixture();
    f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");
    assert_eq!(
        f.parlor.on_command("g1", "alice", GameKind::Chess, Command::New),
        "This is not your game group"
    );
    assert_eq!(
        f.parlor.on_message("g1", "alice", "/chess_repeat").as_deref(),
        Some("This is not your game group")
    );
}

#[test]
fn test_repeat_shows_board() {
    let f = fixture();
    f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");
    f.parlor.on_move_text("g1", "alice", "4").expect("move");
    let repeat = f.parlor.on_message("g1", "carol", "/c4_repeat").expect("command");
    assert_eq!(repeat, "This is not your game group");
    let repeat = f.parlor.on_message("g1", "bob", "/c4_repeat").expect("command");
    assert!(repeat.starts_with("🟡 bob it's your turn..."));
}

#[test]
fn test_player_leaving_dissolves_session() {
    let f = fixture();
    f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");

    let membership = f.parlor.on_group_membership_changed("g1", "alice", 1, false);
    assert!(membership.deleted);
    assert!(membership.leave_group);
    assert!(f.store.get(&c4_key()).expect("get").is_none());
}

#[test]
fn test_bot_removed_dissolves_without_leaving() {
    let f = fixture();
    f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");

    let membership = f.parlor.on_group_membership_changed("g1", "parlor-bot", 2, true);
    assert!(membership.deleted);
    assert!(!membership.leave_group);
}

#[test]
fn test_spectator_leaving_keeps_session() {
    let f = fixture();
    f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");

    let membership = f.parlor.on_group_membership_changed("g1", "carol", 2, false);
    assert!(!membership.deleted);
    assert!(!membership.leave_group);
    assert!(f.store.get(&c4_key()).expect("get").is_some());
}

#[test]
fn test_solo_replay_stays_in_its_group() {
    let f = fixture();
    let welcome = f.parlor.on_solo_play(GameKind::Sudoku, "dave", "g5");
    assert!(welcome.starts_with("Hello dave, in this group you can play Sudoku."));

    let again = f.parlor.on_solo_play(GameKind::Sudoku, "dave", "g6");
    assert!(again.starts_with("Hello dave"));
    assert_eq!(f.transport.sent().last().map(|(group, _)| group.as_str()), Some("g5"));
    let key = SessionKey::solo(GameKind::Sudoku, "dave");
    let session = f.store.get(&key).expect("get").expect("present");
    assert_eq!(session.group_ref(), "g5");
    assert!(session.is_running());
    assert!(f.store.find_by_group("g6").expect("find").is_none());
}

#[test]
fn test_solo_play_in_occupied_group_is_refused() {
    let f = fixture();
    f.parlor.on_invite(GameKind::Connect4, "alice", "bob", "g1");

    let reply = f.parlor.on_message("g1", "alice", "/sudoku_play").expect("handled");
    assert_eq!(reply, "This group already has a game, start a new one elsewhere");
    assert!(f.store.get(&SessionKey::solo(GameKind::Sudoku, "alice")).expect("get").is_none());

    let repeat = f.parlor.on_message("g1", "bob", "/c4_repeat").expect("command");
    assert!(repeat.starts_with("🔴 alice it's your turn..."), "{}", repeat);
    let reply = f.parlor.on_move_text("g1", "alice", "4").expect("move handled");
    assert!(reply.contains("🟡 bob it's your turn..."), "{}", reply);
}

#[test]
fn test_solo_command_without_invitee() {
    let f = fixture();
    assert_eq!(f.parlor.on_solo_play(GameKind::Chess, "dave", "g1"), "Missing address");
    let reply = f.parlor.on_message("g7", "erin", "/lines_play").expect("solo play");
    assert!(reply.starts_with("Hello erin, in this group you can play Color Lines."));
}

#[test]
fn test_disabled_game() {
    let config = ParlorConfig::from_toml("enabled_games = [\"connect4\"]\n").expect("valid config");
    let f = fixture_with(config);
    assert_eq!(
        f.parlor.on_invite(GameKind::Chess, "alice", "bob", "g1"),
        "Chess is not available here"
    );
}

#[test]
fn test_unreadable_board_is_reset() {
    let f = fixture();
    let session = Session::new(c4_key(), "g9", "alice").with_board("c4/1|broken", None);
    f.store.upsert(&session).expect("seed");

    let reply = f.parlor.on_move_text("g9", "alice", "4").expect("handled");
    assert!(reply.starts_with("⚠️ The saved game could not be read"), "{}", reply);
    let stored = f.store.get(&c4_key()).expect("get").expect("present");
    assert!(!stored.is_running());

    let started = f.parlor.on_command("g9", "bob", GameKind::Connect4, Command::New);
    assert!(started.starts_with("▶️ Game started!"));
}
