//! Session records and the storage seam.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use parlor_rules::{GameKind, Seat};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

use crate::db::StoreError;

/// Chat identity of a player.
pub type PlayerId = String;

/// Opaque id of the chat group a session is played in.
pub type GroupRef = String;

/// Identity of a session: the game plus its players.
///
/// Pair keys are stored in sorted order, so the same two players produce the
/// same key whoever sent the invitation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    game: GameKind,
    a: PlayerId,
    b: Option<PlayerId>,
}

impl SessionKey {
    /// Key for a two-player game, independent of argument order.
    pub fn pair(game: GameKind, x: impl Into<PlayerId>, y: impl Into<PlayerId>) -> Self {
        let (x, y) = (x.into(), y.into());
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        Self { game, a, b: Some(b) }
    }

    /// Key for a single-player game.
    pub fn solo(game: GameKind, player: impl Into<PlayerId>) -> Self {
        Self {
            game,
            a: player.into(),
            b: None,
        }
    }

    /// Game played under this key.
    pub fn game(&self) -> GameKind {
        self.game
    }

    /// Players bound by the key, sorted.
    pub fn players(&self) -> Vec<&str> {
        std::iter::once(self.a.as_str()).chain(self.b.as_deref()).collect()
    }

    /// Returns true if `player` is one of the key's players.
    pub fn contains(&self, player: &str) -> bool {
        self.a == player || self.b.as_deref() == Some(player)
    }

    /// Returns true for single-player keys.
    pub fn is_solo(&self) -> bool {
        self.b.is_none()
    }

    /// Flat primary key. Player ids are length-prefixed so that separators
    /// inside an id cannot make two keys collide.
    pub fn storage_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.game,
            self.a.len(),
            self.a,
            self.b.as_deref().unwrap_or_default()
        )
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.b {
            Some(b) => write!(f, "{}({}, {})", self.game, self.a, b),
            None => write!(f, "{}({})", self.game, self.a),
        }
    }
}

/// A persistent binding of players to a chat group and, between games, no
/// board at all.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Session {
    /// Session identity.
    key: SessionKey,
    /// Chat group the game is played in.
    group_ref: GroupRef,
    /// Player holding [`Seat::First`] in the current or next game.
    first_mover: PlayerId,
    /// Encoded board, `None` while no game is running.
    board_state: Option<String>,
    /// When the running game began.
    started_at: Option<NaiveDateTime>,
}

impl Session {
    /// Creates a session with no game running.
    pub fn new(key: SessionKey, group_ref: impl Into<GroupRef>, first_mover: impl Into<PlayerId>) -> Self {
        Self {
            key,
            group_ref: group_ref.into(),
            first_mover: first_mover.into(),
            board_state: None,
            started_at: None,
        }
    }

    /// Attaches a running board.
    pub fn with_board(mut self, state: impl Into<String>, started_at: Option<NaiveDateTime>) -> Self {
        self.board_state = Some(state.into());
        self.started_at = started_at;
        self
    }

    /// Returns true while a game is in progress.
    pub fn is_running(&self) -> bool {
        self.board_state.is_some()
    }

    /// Seat `player` occupies, `None` for outsiders.
    pub fn seat_of(&self, player: &str) -> Option<Seat> {
        if player == self.first_mover {
            Some(Seat::First)
        } else if self.key.contains(player) && !self.key.is_solo() {
            Some(Seat::Second)
        } else {
            None
        }
    }

    /// Player sitting in `seat`.
    pub fn player_in(&self, seat: Seat) -> Option<&str> {
        match seat {
            Seat::First => Some(self.first_mover.as_str()),
            Seat::Second => self
                .key
                .players()
                .into_iter()
                .find(|p| *p != self.first_mover && !self.key.is_solo()),
        }
    }

    pub(crate) fn begin(&mut self, state: String, now: NaiveDateTime) {
        self.board_state = Some(state);
        self.started_at = Some(now);
    }

    pub(crate) fn update_board(&mut self, state: String) {
        self.board_state = Some(state);
    }

    pub(crate) fn clear_board(&mut self) {
        self.board_state = None;
        self.started_at = None;
    }

    pub(crate) fn set_first_mover(&mut self, player: PlayerId) {
        self.first_mover = player;
    }
}

/// Keyed persistence for sessions.
///
/// Every write replaces the whole record in one step, so readers never see a
/// half-written session.
pub trait SessionStore: Send + Sync {
    /// Loads a session.
    fn get(&self, key: &SessionKey) -> Result<Option<Session>, StoreError>;

    /// Inserts or replaces a session.
    fn upsert(&self, session: &Session) -> Result<(), StoreError>;

    /// Removes a session, returning whether it existed.
    fn delete(&self, key: &SessionKey) -> Result<bool, StoreError>;

    /// Finds the session played in a chat group.
    fn find_by_group(&self, group_ref: &str) -> Result<Option<Session>, StoreError>;

    /// Lists every session.
    fn list(&self) -> Result<Vec<Session>, StoreError>;
}

/// In-memory session store for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<Mutex<HashMap<SessionKey, Session>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, operation: &'static str) -> Result<std::sync::MutexGuard<'_, HashMap<SessionKey, Session>>, StoreError> {
        self.sessions
            .lock()
            .map_err(|_| StoreError::new("Session map lock poisoned").during(operation))
    }
}

impl SessionStore for MemoryStore {
    #[instrument(skip(self), fields(key = %key))]
    fn get(&self, key: &SessionKey) -> Result<Option<Session>, StoreError> {
        Ok(self.map("get")?.get(key).cloned())
    }

    #[instrument(skip(self, session), fields(key = %session.key()))]
    fn upsert(&self, session: &Session) -> Result<(), StoreError> {
        self.map("upsert")?.insert(session.key().clone(), session.clone());
        debug!("Session written");
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    fn delete(&self, key: &SessionKey) -> Result<bool, StoreError> {
        Ok(self.map("delete")?.remove(key).is_some())
    }

    #[instrument(skip(self))]
    fn find_by_group(&self, group_ref: &str) -> Result<Option<Session>, StoreError> {
        Ok(self
            .map("find_by_group")?
            .values()
            .find(|s| s.group_ref() == group_ref)
            .cloned())
    }

    #[instrument(skip(self))]
    fn list(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.map("list")?.values().cloned().collect())
    }
}
