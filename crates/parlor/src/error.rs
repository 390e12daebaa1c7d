//! Session-level errors.

use derive_more::{Display, Error, From};
use parlor_rules::{CodecError, MoveError};

use crate::db::StoreError;

/// How a [`SessionError`] should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorClass {
    /// The request was wrong; nothing changed.
    #[display("validation")]
    Validation,
    /// The session is in the wrong state for the request; nothing changed.
    #[display("precondition")]
    Precondition,
    /// The stored board was unusable and has been discarded.
    #[display("corruption")]
    Corruption,
    /// The store failed.
    #[display("storage")]
    Storage,
}

/// Error returned by session operations.
#[derive(Debug, Display, Error, From)]
pub enum SessionError {
    /// The player is not part of the session.
    #[display("Player is not part of this session")]
    NotAParty,

    /// The player tried to move out of turn.
    #[display("It is not this player's turn")]
    NotYourTurn,

    /// The board rejected the move.
    #[display("{}", _0)]
    #[from]
    Move(MoveError),

    /// No session exists for the key or group.
    #[display("No such session")]
    UnknownSession,

    /// A game is already running.
    #[display("A game is already running")]
    AlreadyRunning,

    /// No game is running.
    #[display("No game is running")]
    NoGame,

    /// The players already share a session for this game.
    #[display("Session already exists")]
    SessionExists,

    /// The group already hosts a different session.
    #[display("Group already hosts another session")]
    GroupTaken,

    /// A player invited themself.
    #[display("Players cannot invite themselves")]
    SelfPlay,

    /// A player invited the bot.
    #[display("The bot does not take part in games")]
    BotInvited,

    /// The stored board could not be decoded; the session was reset.
    #[display("Stored board discarded: {}", _0)]
    #[from]
    Corrupted(CodecError),

    /// The session store failed.
    #[display("{}", _0)]
    #[from]
    Store(StoreError),
}

impl SessionError {
    /// Classifies the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            SessionError::NotAParty
            | SessionError::NotYourTurn
            | SessionError::Move(_)
            | SessionError::UnknownSession => ErrorClass::Validation,
            SessionError::AlreadyRunning
            | SessionError::NoGame
            | SessionError::SessionExists
            | SessionError::GroupTaken
            | SessionError::SelfPlay
            | SessionError::BotInvited => ErrorClass::Precondition,
            SessionError::Corrupted(_) => ErrorClass::Corruption,
            SessionError::Store(_) => ErrorClass::Storage,
        }
    }
}
