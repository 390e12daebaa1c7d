//! The capability set every board game implements.

use crate::{CodecError, MoveError, Outcome, Seat};
use serde::{Deserialize, Serialize};

/// The closed set of games the session layer can host.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameKind {
    /// Orb placement with cascading explosions.
    ChainReaction,
    /// Disc flipping on an 8x8 board.
    Reversi,
    /// Gravity drop, four in a row.
    Connect4,
    /// English draughts.
    Checkers,
    /// Standard chess, rules delegated to `shakmaty`.
    Chess,
    /// Single-seat 9x9 number puzzle.
    Sudoku,
    /// Single-seat tile matching.
    Lines,
}

impl GameKind {
    /// Human readable title used in invitations.
    pub fn title(self) -> &'static str {
        match self {
            GameKind::ChainReaction => "Chain Reaction",
            GameKind::Reversi => "Reversi",
            GameKind::Connect4 => "Connect4",
            GameKind::Checkers => "Checkers",
            GameKind::Chess => "Chess",
            GameKind::Sudoku => "Sudoku",
            GameKind::Lines => "Color Lines",
        }
    }

    /// Prefix of the chat commands for this game (`/c4_new`, ...).
    pub fn command_prefix(self) -> &'static str {
        match self {
            GameKind::ChainReaction => "chr",
            GameKind::Reversi => "reversi",
            GameKind::Connect4 => "c4",
            GameKind::Checkers => "checkers",
            GameKind::Chess => "chess",
            GameKind::Sudoku => "sudoku",
            GameKind::Lines => "lines",
        }
    }

    /// Looks a game up by its command prefix.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        <Self as strum::IntoEnumIterator>::iter().find(|kind| kind.command_prefix() == prefix)
    }

    /// Number of players a session of this game binds.
    pub fn seats(self) -> usize {
        match self {
            GameKind::Sudoku | GameKind::Lines => 1,
            _ => 2,
        }
    }

    /// Emoji used in group titles.
    pub fn badge(self) -> &'static str {
        match self {
            GameKind::ChainReaction => "🧬",
            GameKind::Reversi => "⚫",
            GameKind::Connect4 => "4️⃣",
            GameKind::Checkers => "🔴",
            GameKind::Chess => "♞",
            GameKind::Sudoku => "#️⃣",
            GameKind::Lines => "🟣",
        }
    }
}

/// A self-contained rule implementation for one game.
///
/// Implementations are pure: no I/O, no clock. Randomised games keep their
/// generator seed inside the state so that `render` and the codec stay
/// deterministic.
pub trait BoardVariant: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Tag identifying the game.
    const KIND: GameKind;

    /// Canonical starting position.
    fn new() -> Self;

    /// Rebuilds a board from [`BoardVariant::to_state`] output.
    ///
    /// # Errors
    ///
    /// Any structural defect yields a [`CodecError`]; decoding never panics.
    fn from_state(state: &str) -> Result<Self, CodecError>;

    /// Encodes the board as a flat string.
    fn to_state(&self) -> String;

    /// Applies a move for the side whose turn it is.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] and leaves the board untouched when the token
    /// is malformed or the move is not legal.
    fn apply_move(&mut self, token: &str) -> Result<(), MoveError>;

    /// Seat to move, `None` for single-seat games.
    fn turn(&self) -> Option<Seat>;

    /// Current classification of the board.
    fn result(&self) -> Outcome;

    /// Text/emoji rendering of the board.
    fn render(&self) -> String;

    /// Returns true if `text` is shaped like a move for this game.
    fn looks_like_move(text: &str) -> bool;

    /// Disc or piece symbol used to name a seat in narration.
    fn seat_symbol(seat: Seat) -> &'static str;

    /// Extra line describing the last move, such as a forced pass.
    fn notice(&self) -> Option<String> {
        None
    }
}
