//! Connect-4: drop tokens into columns, four in a row wins.

use crate::codec::{StateReader, StateWriter, encode_digits};
use crate::grid;
use crate::{BoardVariant, CodecError, GameKind, MoveError, Outcome, Seat};
use tracing::{debug, instrument};

const TAG: &str = "c4";
const VERSION: u32 = 1;

/// Board height.
pub const ROWS: usize = 6;
/// Board width.
pub const COLS: usize = 7;
const RUN: usize = 4;

/// Connect-4 board. Row 0 is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connect4 {
    cells: [Option<Seat>; ROWS * COLS],
    turn: Seat,
}

impl Connect4 {
    /// Token at a cell.
    pub fn token_at(&self, row: usize, col: usize) -> Option<Seat> {
        self.cells[row * COLS + col]
    }

    /// Lowest free row of a column, `None` when the column is full.
    pub fn landing_row(&self, col: usize) -> Option<usize> {
        (0..ROWS).rev().find(|&row| self.token_at(row, col).is_none())
    }

    fn parse_column(token: &str) -> Result<usize, MoveError> {
        let column: usize = token
            .trim()
            .parse()
            .map_err(|_| MoveError::illegal(format!("'{}' is not a column number", token.trim())))?;
        if !(1..=COLS).contains(&column) {
            return Err(MoveError::out_of_bounds(format!("no column {}", column)));
        }
        Ok(column - 1)
    }

    fn winner(&self) -> Option<Seat> {
        const LINES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];
        for row in 0..ROWS {
            for col in 0..COLS {
                let Some(seat) = self.token_at(row, col) else {
                    continue;
                };
                for direction in LINES {
                    let mut cell = (row, col);
                    let mut length = 1;
                    while let Some(next) = grid::step(cell, direction, ROWS, COLS) {
                        if self.token_at(next.0, next.1) != Some(seat) {
                            break;
                        }
                        length += 1;
                        cell = next;
                    }
                    if length >= RUN {
                        return Some(seat);
                    }
                }
            }
        }
        None
    }

    fn count(&self, seat: Seat) -> usize {
        self.cells.iter().filter(|c| **c == Some(seat)).count()
    }
}

impl BoardVariant for Connect4 {
    const KIND: GameKind = GameKind::Connect4;

    fn new() -> Self {
        Self {
            cells: [None; ROWS * COLS],
            turn: Seat::First,
        }
    }

    #[instrument(skip(state))]
    fn from_state(state: &str) -> Result<Self, CodecError> {
        let mut reader = StateReader::open(state, TAG, VERSION)?;
        let turn = reader.seat("turn")?;
        let digits = reader.digits("cells", ROWS * COLS, 2)?;
        reader.finish()?;

        let mut cells = [None; ROWS * COLS];
        for (cell, code) in cells.iter_mut().zip(&digits) {
            *cell = match code {
                1 => Some(Seat::First),
                2 => Some(Seat::Second),
                _ => None,
            };
        }
        let board = Self { cells, turn };

        for col in 0..COLS {
            for row in 1..ROWS {
                if board.token_at(row - 1, col).is_some() && board.token_at(row, col).is_none() {
                    return Err(CodecError::malformed(format!(
                        "floating token in column {}",
                        col + 1
                    )));
                }
            }
        }

        let (first, second) = (board.count(Seat::First), board.count(Seat::Second));
        let expected_turn = match first.checked_sub(second) {
            Some(0) => Seat::First,
            Some(1) => Seat::Second,
            _ => {
                return Err(CodecError::malformed(format!(
                    "token counts {} and {} cannot alternate",
                    first, second
                )));
            }
        };
        if turn != expected_turn {
            return Err(CodecError::malformed("turn does not match token counts"));
        }
        Ok(board)
    }

    fn to_state(&self) -> String {
        let digits: Vec<u8> = self
            .cells
            .iter()
            .map(|c| match c {
                None => 0,
                Some(Seat::First) => 1,
                Some(Seat::Second) => 2,
            })
            .collect();
        StateWriter::new(TAG, VERSION)
            .seat(self.turn)
            .field(encode_digits(&digits))
            .finish()
    }

    #[instrument(skip(self), fields(turn = %self.turn))]
    fn apply_move(&mut self, token: &str) -> Result<(), MoveError> {
        if self.result().is_terminal() {
            return Err(MoveError::GameOver);
        }
        let col = Self::parse_column(token)?;
        let row = self
            .landing_row(col)
            .ok_or_else(|| MoveError::illegal(format!("column {} is full", col + 1)))?;

        self.cells[row * COLS + col] = Some(self.turn);
        debug!(row, column = col + 1, "Token dropped");
        self.turn = self.turn.opponent();
        Ok(())
    }

    fn turn(&self) -> Option<Seat> {
        Some(self.turn)
    }

    fn result(&self) -> Outcome {
        if let Some(seat) = self.winner() {
            Outcome::Win(seat)
        } else if self.cells.iter().all(Option::is_some) {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    fn render(&self) -> String {
        let mut text = grid::COLUMN_LABELS[..COLS].join("");
        text.push('\n');
        for row in 0..ROWS {
            for col in 0..COLS {
                text.push_str(match self.token_at(row, col) {
                    None => "⚪",
                    Some(seat) => Self::seat_symbol(seat),
                });
            }
            text.push('\n');
        }
        text
    }

    fn looks_like_move(text: &str) -> bool {
        let text = text.trim();
        text.len() == 1 && text.chars().all(|c| c.is_ascii_digit())
    }

    fn seat_symbol(seat: Seat) -> &'static str {
        match seat {
            Seat::First => "🔴",
            Seat::Second => "🟡",
        }
    }
}
