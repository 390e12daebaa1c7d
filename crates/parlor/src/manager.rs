//! Session lifecycle for one board variant.

use chrono::{NaiveDateTime, Utc};
use parlor_rules::{BoardVariant, Outcome};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::locks::{KeyLocks, acquire};
use crate::narration::{self, DisplayNames};
use crate::{Session, SessionError, SessionKey, SessionStore};

/// Builds the starting board of a new game.
pub type BoardFactory<V> = Arc<dyn Fn() -> V + Send + Sync>;

/// Drives sessions of one game through NoGame, InProgress and back.
///
/// Every writing operation holds the key's lock from load to persist, so two
/// requests for the same session never interleave. Requests for different
/// sessions only share the store.
pub struct SessionManager<V: BoardVariant> {
    store: Arc<dyn SessionStore>,
    locks: KeyLocks,
    fresh: BoardFactory<V>,
    names: Arc<dyn DisplayNames>,
}

impl<V: BoardVariant> Clone for SessionManager<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: self.locks.clone(),
            fresh: Arc::clone(&self.fresh),
            names: Arc::clone(&self.names),
        }
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl<V: BoardVariant> SessionManager<V> {
    /// Creates a manager starting games from [`BoardVariant::new`].
    #[instrument(skip_all, fields(game = %V::KIND))]
    pub fn new(store: Arc<dyn SessionStore>, names: Arc<dyn DisplayNames>) -> Self {
        info!("Creating session manager");
        Self {
            store,
            locks: KeyLocks::new(),
            fresh: Arc::new(V::new),
            names,
        }
    }

    /// Replaces the starting-board factory, e.g. for a custom board size.
    pub fn with_board_factory(mut self, fresh: impl Fn() -> V + Send + Sync + 'static) -> Self {
        self.fresh = Arc::new(fresh);
        self
    }

    /// Shares the lock table of another manager on the same store.
    pub fn with_locks(mut self, locks: KeyLocks) -> Self {
        self.locks = locks;
        self
    }

    fn load(&self, key: &SessionKey) -> Result<Session, SessionError> {
        self.store.get(key)?.ok_or(SessionError::UnknownSession)
    }

    /// Decodes the running board. A board that cannot be decoded is dropped
    /// and the session written back with no game running.
    fn board_of(&self, session: &mut Session) -> Result<V, SessionError> {
        let Some(state) = session.board_state() else {
            return Err(SessionError::NoGame);
        };
        match V::from_state(state) {
            Ok(board) => Ok(board),
            Err(e) => {
                warn!(key = %session.key(), error = %e, "Discarding unreadable board");
                session.clear_board();
                self.store.upsert(session)?;
                Err(SessionError::Corrupted(e))
            }
        }
    }

    /// Creates a session and starts its first game.
    ///
    /// Returns the invitation for a pair or the welcome for a solo player.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn create(&self, key: SessionKey, group_ref: &str, first_mover: &str) -> Result<String, SessionError> {
        if !key.contains(first_mover) {
            return Err(SessionError::NotAParty);
        }
        let handle = self.locks.handle(&key);
        let _guard = acquire(&handle);

        if self.store.get(&key)?.is_some() {
            debug!("Session already present");
            return Err(SessionError::SessionExists);
        }

        let board = (self.fresh)();
        let mut session = Session::new(key, group_ref, first_mover);
        session.begin(board.to_state(), now());
        self.store.upsert(&session)?;
        info!(group_ref, first_mover, "Session created");

        let text = match session.player_in(parlor_rules::Seat::Second) {
            Some(invitee) => narration::invitation(&board, &session, invitee, self.names.as_ref()),
            None => narration::solo_welcome(&board, &session, self.names.as_ref()),
        };
        Ok(text)
    }

    /// Starts a new game in an idle session with `player` moving first.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn start(&self, key: &SessionKey, player: &str) -> Result<String, SessionError> {
        let handle = self.locks.handle(key);
        let _guard = acquire(&handle);

        let mut session = self.load(key)?;
        if !key.contains(player) {
            return Err(SessionError::NotAParty);
        }
        if session.is_running() {
            return Err(SessionError::AlreadyRunning);
        }

        let board = (self.fresh)();
        session.set_first_mover(player.to_string());
        session.begin(board.to_state(), now());
        self.store.upsert(&session)?;
        info!(player, "Game started");

        Ok(narration::game_started(&board, &session, self.names.as_ref()))
    }

    /// Throws away any running game of a solo session and deals a new one.
    /// The session stays in its group.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn restart(&self, key: &SessionKey) -> Result<String, SessionError> {
        let handle = self.locks.handle(key);
        let _guard = acquire(&handle);

        let mut session = self.load(key)?;
        let board = (self.fresh)();
        session.begin(board.to_state(), now());
        self.store.upsert(&session)?;
        info!(group_ref = %session.group_ref(), "Game restarted");

        Ok(narration::solo_welcome(&board, &session, self.names.as_ref()))
    }

    /// Applies `token` for `player`.
    ///
    /// Checks, in order: the session exists, the player belongs to it, a
    /// game is running and its board decodes, it is the player's turn, and
    /// finally the move itself. Any failure leaves the stored record as it
    /// was, except for an undecodable board, which is discarded.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn submit_move(&self, key: &SessionKey, player: &str, token: &str) -> Result<String, SessionError> {
        let handle = self.locks.handle(key);
        let _guard = acquire(&handle);

        let mut session = self.load(key)?;
        if !key.contains(player) {
            warn!(player, "Move from outsider");
            return Err(SessionError::NotAParty);
        }
        let mut board = self.board_of(&mut session)?;

        if let Some(seat) = board.turn()
            && session.seat_of(player) != Some(seat)
        {
            debug!(player, expected = %seat, "Move out of turn");
            return Err(SessionError::NotYourTurn);
        }

        board.apply_move(token).inspect_err(|e| {
            debug!(player, token, error = %e, "Move rejected");
        })?;

        let outcome = board.result();
        let names = self.names.as_ref();
        let text = if outcome.is_terminal() {
            let elapsed = match outcome {
                Outcome::Win(_) if key.is_solo() => session.started_at().map(|t| now() - t),
                _ => None,
            };
            let text = narration::game_over(&board, &session, names, elapsed);
            session.clear_board();
            info!(player, outcome = %outcome, "Game finished");
            text
        } else {
            session.update_board(board.to_state());
            debug!(player, token, "Move applied");
            narration::turn_prompt(&board, &session, names)
        };
        self.store.upsert(&session)?;

        Ok(text)
    }

    /// Ends the running game with `player` giving up.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn resign(&self, key: &SessionKey, player: &str) -> Result<String, SessionError> {
        let handle = self.locks.handle(key);
        let _guard = acquire(&handle);

        let mut session = self.load(key)?;
        if !key.contains(player) {
            return Err(SessionError::NotAParty);
        }
        if !session.is_running() {
            return Err(SessionError::NoGame);
        }

        session.clear_board();
        self.store.upsert(&session)?;
        info!(player, "Player resigned");

        Ok(narration::surrender(V::KIND, player, self.names.as_ref()))
    }

    /// Renders the running game again. Takes no lock.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn repeat(&self, key: &SessionKey) -> Result<String, SessionError> {
        let session = self.load(key)?;
        let Some(state) = session.board_state() else {
            return Err(SessionError::NoGame);
        };
        match V::from_state(state) {
            Ok(board) => Ok(narration::turn_prompt(&board, &session, self.names.as_ref())),
            Err(e) => {
                self.discard(key, state)?;
                Err(SessionError::Corrupted(e))
            }
        }
    }

    /// Clears the board if it still holds `state`.
    fn discard(&self, key: &SessionKey, state: &str) -> Result<(), SessionError> {
        let handle = self.locks.handle(key);
        let _guard = acquire(&handle);

        let mut session = self.load(key)?;
        if session.board_state().as_deref() == Some(state) {
            warn!(key = %key, "Discarding unreadable board");
            session.clear_board();
            self.store.upsert(&session)?;
        }
        Ok(())
    }

    /// Deletes the session. Returns whether it existed.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn dissolve(&self, key: &SessionKey) -> Result<bool, SessionError> {
        let existed = {
            let handle = self.locks.handle(key);
            let _guard = acquire(&handle);
            self.store.delete(key)?
        };
        self.locks.release(key);
        info!(existed, "Session dissolved");
        Ok(existed)
    }
}
