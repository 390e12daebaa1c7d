//! Parlor rules - pure board-game logic for chat-hosted sessions
//!
//! Every game implements [`BoardVariant`]: it validates and applies move
//! tokens, reports whose turn it is and how the game stands, renders an
//! emoji board and round-trips through a flat text encoding.
//!
//! # Games
//!
//! - [`ChainReaction`], [`Reversi`], [`Connect4`], [`Checkers`], [`Chess`]
//!   for two seats
//! - [`Sudoku`] and [`Lines`] for a single seat
//!
//! # Example
//!
//! ```
//! use parlor_rules::{BoardVariant, Connect4, Outcome, Seat};
//!
//! let mut board = Connect4::new();
//! for column in ["4", "1", "4", "1", "4", "1", "4"] {
//!     board.apply_move(column)?;
//! }
//! assert_eq!(board.result(), Outcome::Win(Seat::First));
//!
//! let restored = Connect4::from_state(&board.to_state())?;
//! assert_eq!(restored, board);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod chain_reaction;
mod checkers;
mod chess;
mod connect4;
mod error;
mod lines;
mod reversi;
mod seat;
mod sudoku;
mod variant;

// Public helper modules
pub mod codec;
pub mod grid;

// Crate-level exports - Core types
pub use error::{CodecError, MoveError};
pub use seat::{Outcome, Seat};
pub use variant::{BoardVariant, GameKind};

// Crate-level exports - Games
pub use chain_reaction::{ChainReaction, DEFAULT_COLS, DEFAULT_ROWS, Orbs};
pub use checkers::{Checkers, Piece, QUIET_MOVE_LIMIT, cell_of, square_of};
pub use chess::Chess;
pub use connect4::Connect4;
pub use lines::{Lines, points as lines_points};
pub use reversi::Reversi;
pub use sudoku::{CLUES as SUDOKU_CLUES, Sudoku};
