//! Error types for move validation and state decoding.
//!
//! A [`MoveError`] is a player's mistake and is reported back to them. A
//! [`CodecError`] means the stored board is unusable.

use tracing::instrument;

/// Error returned when a move token is rejected.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    /// The token is malformed or the move breaks the rules.
    #[display("Illegal move: {}", _0)]
    Illegal(#[error(not(source))] String),

    /// The token names a cell or column outside the board.
    #[display("Out of bounds: {}", _0)]
    OutOfBounds(#[error(not(source))] String),

    /// The board already reached a terminal outcome.
    #[display("Game is already over")]
    GameOver,
}

impl MoveError {
    /// Shorthand for [`MoveError::Illegal`].
    #[instrument(skip(reason))]
    pub fn illegal(reason: impl Into<String>) -> Self {
        Self::Illegal(reason.into())
    }

    /// Shorthand for [`MoveError::OutOfBounds`].
    #[instrument(skip(reason))]
    pub fn out_of_bounds(reason: impl Into<String>) -> Self {
        Self::OutOfBounds(reason.into())
    }
}

/// Error returned when an encoded board cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CodecError {
    /// Structurally invalid input: wrong field count, width or value.
    #[display("Malformed board state: {}", _0)]
    Malformed(#[error(not(source))] String),

    /// The input belongs to a different game.
    #[display("Board state tagged '{}' where '{}' was expected", found, expected)]
    ForeignTag {
        /// Tag the decoder was built for.
        expected: &'static str,
        /// Tag found in the input.
        found: String,
    },

    /// The input was written by a newer codec.
    #[display("Unsupported board state version {}", _0)]
    UnsupportedVersion(#[error(not(source))] u32),
}

impl CodecError {
    /// Shorthand for [`CodecError::Malformed`].
    #[instrument(skip(reason))]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }
}
