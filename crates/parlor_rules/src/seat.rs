//! Seats and game outcomes shared by every variant.

use serde::{Deserialize, Serialize};

/// One of the two player positions at a board.
///
/// `First` always opens the game. Which chat player sits in which seat is
/// decided by the session layer, never by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum Seat {
    /// The opening seat (black in Reversi and Checkers, white in Chess).
    #[display("first")]
    First,
    /// The responding seat.
    #[display("second")]
    Second,
}

impl Seat {
    /// Returns the other seat.
    pub fn opponent(self) -> Self {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// Digit used by the state codec.
    pub(crate) fn code(self) -> char {
        match self {
            Seat::First => '1',
            Seat::Second => '2',
        }
    }

    /// Inverse of [`Seat::code`].
    pub(crate) fn from_code(c: char) -> Option<Self> {
        match c {
            '1' => Some(Seat::First),
            '2' => Some(Seat::Second),
            _ => None,
        }
    }
}

/// Classification of a board after the latest move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The game continues.
    InProgress,
    /// The given seat won.
    Win(Seat),
    /// Nobody won. Single-seat games that end without being solved also
    /// report `Draw`.
    Draw,
}

impl Outcome {
    /// Returns true once the game can accept no further moves.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// Returns the winning seat, if any.
    pub fn winner(&self) -> Option<Seat> {
        match self {
            Outcome::Win(seat) => Some(*seat),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "In progress"),
            Outcome::Win(seat) => write!(f, "Seat {} wins", seat),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}
