//! Database rows for the `sessions` table.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use parlor_rules::GameKind;
use std::str::FromStr;
use tracing::instrument;

use crate::db::{StoreError, schema};
use crate::{Session, SessionKey};

/// A stored session row.
#[derive(Debug, Clone, Queryable, Selectable, Getters)]
#[diesel(table_name = schema::sessions)]
pub struct SessionRow {
    session_key: String,
    game: String,
    player_a: String,
    player_b: Option<String>,
    group_ref: String,
    first_mover: String,
    board_state: Option<String>,
    started_at: Option<NaiveDateTime>,
    updated_at: NaiveDateTime,
}

impl SessionRow {
    /// Rebuilds the domain record, checking that the stored key matches
    /// its columns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for an unknown game name or a key mismatch.
    #[instrument(skip(self), fields(session_key = %self.session_key))]
    pub fn into_session(self) -> Result<Session, StoreError> {
        let game = GameKind::from_str(&self.game)
            .map_err(|_| StoreError::new(format!("Unknown game '{}' in sessions table", self.game)))?;
        let key = match self.player_b {
            Some(b) => SessionKey::pair(game, self.player_a, b),
            None => SessionKey::solo(game, self.player_a),
        };
        if key.storage_key() != self.session_key {
            return Err(StoreError::new(format!(
                "Row key '{}' does not match its players",
                self.session_key
            )));
        }

        let mut session = Session::new(key, self.group_ref, self.first_mover);
        if let Some(state) = self.board_state {
            session = session.with_board(state, self.started_at);
        }
        Ok(session)
    }
}

/// Insertable row; every write replaces the whole record.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::sessions)]
pub struct NewSessionRow {
    session_key: String,
    game: String,
    player_a: String,
    player_b: Option<String>,
    group_ref: String,
    first_mover: String,
    board_state: Option<String>,
    started_at: Option<NaiveDateTime>,
    updated_at: NaiveDateTime,
}

impl NewSessionRow {
    /// Flattens a session for storage, stamped with `updated_at`.
    #[instrument(skip(session), fields(key = %session.key()))]
    pub fn from_session(session: &Session, updated_at: NaiveDateTime) -> Self {
        let key = session.key();
        let mut players = key.players().into_iter().map(str::to_string);
        let player_a = players.next().unwrap_or_default();
        let player_b = players.next();
        Self::new(
            key.storage_key(),
            key.game().to_string(),
            player_a,
            player_b,
            session.group_ref().clone(),
            session.first_mover().clone(),
            session.board_state().clone(),
            *session.started_at(),
            updated_at,
        )
    }
}
