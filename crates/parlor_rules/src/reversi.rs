//! Reversi (Othello rules) on an 8x8 board.

use crate::codec::{StateReader, StateWriter, encode_digits};
use crate::grid::{self, Cell};
use crate::{BoardVariant, CodecError, GameKind, MoveError, Outcome, Seat};
use tracing::{debug, info, instrument};

const TAG: &str = "rev";
const VERSION: u32 = 1;
const SIZE: usize = 8;

const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Reversi board. The first seat plays black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reversi {
    cells: [Option<Seat>; SIZE * SIZE],
    turn: Seat,
    /// Seat that had to pass after the last move, if any.
    passed: Option<Seat>,
}

impl Reversi {
    /// Disc at a cell.
    pub fn disc_at(&self, (row, col): Cell) -> Option<Seat> {
        self.cells[row * SIZE + col]
    }

    /// Number of discs a seat has on the board.
    pub fn count(&self, seat: Seat) -> usize {
        self.cells.iter().filter(|c| **c == Some(seat)).count()
    }

    /// Seat that was skipped after the last move.
    pub fn passed(&self) -> Option<Seat> {
        self.passed
    }

    /// Discs that playing `seat` at `cell` would flip, in every direction.
    ///
    /// Empty when the cell is taken or the placement sandwiches nothing.
    pub fn flips(&self, cell: Cell, seat: Seat) -> Vec<Cell> {
        if self.disc_at(cell).is_some() {
            return Vec::new();
        }
        let mut flips = Vec::new();
        for direction in DIRECTIONS {
            let mut run = Vec::new();
            let mut cursor = grid::step(cell, direction, SIZE, SIZE);
            while let Some(at) = cursor {
                match self.disc_at(at) {
                    Some(owner) if owner == seat.opponent() => run.push(at),
                    Some(_) => {
                        flips.append(&mut run);
                        break;
                    }
                    None => break,
                }
                cursor = grid::step(at, direction, SIZE, SIZE);
            }
        }
        flips
    }

    /// Returns true if `seat` has at least one legal placement.
    pub fn has_moves(&self, seat: Seat) -> bool {
        (0..SIZE * SIZE).any(|i| !self.flips((i / SIZE, i % SIZE), seat).is_empty())
    }

    fn symbol(cell: Option<Seat>) -> &'static str {
        match cell {
            None => "🟩",
            Some(seat) => Self::seat_symbol(seat),
        }
    }

    fn cell_code(cell: Option<Seat>) -> u8 {
        match cell {
            None => 0,
            Some(Seat::First) => 1,
            Some(Seat::Second) => 2,
        }
    }

    fn cell_from_code(code: u8) -> Option<Seat> {
        match code {
            1 => Some(Seat::First),
            2 => Some(Seat::Second),
            _ => None,
        }
    }
}

impl BoardVariant for Reversi {
    const KIND: GameKind = GameKind::Reversi;

    fn new() -> Self {
        let mut cells = [None; SIZE * SIZE];
        cells[3 * SIZE + 3] = Some(Seat::Second);
        cells[4 * SIZE + 4] = Some(Seat::Second);
        cells[3 * SIZE + 4] = Some(Seat::First);
        cells[4 * SIZE + 3] = Some(Seat::First);
        Self {
            cells,
            turn: Seat::First,
            passed: None,
        }
    }

    #[instrument(skip(state))]
    fn from_state(state: &str) -> Result<Self, CodecError> {
        let mut reader = StateReader::open(state, TAG, VERSION)?;
        let turn = reader.seat("turn")?;
        let passed = match reader.parse::<u8>("passed")? {
            0 => None,
            code => Some(
                Self::cell_from_code(code)
                    .ok_or_else(|| CodecError::malformed(format!("bad passed seat {}", code)))?,
            ),
        };
        let digits = reader.digits("cells", SIZE * SIZE, 2)?;
        reader.finish()?;

        let mut cells = [None; SIZE * SIZE];
        for (cell, code) in cells.iter_mut().zip(digits) {
            *cell = Self::cell_from_code(code);
        }
        let board = Self { cells, turn, passed };

        if !board.result().is_terminal() && !board.has_moves(turn) {
            return Err(CodecError::malformed("side to move has no legal move"));
        }
        Ok(board)
    }

    fn to_state(&self) -> String {
        let digits: Vec<u8> = self.cells.iter().map(|c| Self::cell_code(*c)).collect();
        StateWriter::new(TAG, VERSION)
            .seat(self.turn)
            .field(Self::cell_code(self.passed))
            .field(encode_digits(&digits))
            .finish()
    }

    #[instrument(skip(self), fields(turn = %self.turn))]
    fn apply_move(&mut self, token: &str) -> Result<(), MoveError> {
        if self.result().is_terminal() {
            return Err(MoveError::GameOver);
        }
        let cell = grid::parse_cell(token.trim(), SIZE, SIZE)?;
        if self.disc_at(cell).is_some() {
            return Err(MoveError::illegal(format!("{} is taken", grid::cell_name(cell))));
        }
        let mover = self.turn;
        let flips = self.flips(cell, mover);
        if flips.is_empty() {
            return Err(MoveError::illegal(format!(
                "{} does not outflank any disc",
                grid::cell_name(cell)
            )));
        }

        self.cells[cell.0 * SIZE + cell.1] = Some(mover);
        for (row, col) in &flips {
            self.cells[row * SIZE + col] = Some(mover);
        }
        debug!(cell = %grid::cell_name(cell), flipped = flips.len(), "Disc placed");

        let opponent = mover.opponent();
        if self.has_moves(opponent) {
            self.turn = opponent;
            self.passed = None;
        } else if self.has_moves(mover) {
            info!(passed = %opponent, "No legal move, turn passes");
            self.turn = mover;
            self.passed = Some(opponent);
        } else {
            self.turn = opponent;
            self.passed = None;
        }
        Ok(())
    }

    fn turn(&self) -> Option<Seat> {
        Some(self.turn)
    }

    fn result(&self) -> Outcome {
        if self.has_moves(Seat::First) || self.has_moves(Seat::Second) {
            return Outcome::InProgress;
        }
        let (first, second) = (self.count(Seat::First), self.count(Seat::Second));
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Outcome::Win(Seat::First),
            std::cmp::Ordering::Less => Outcome::Win(Seat::Second),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    fn render(&self) -> String {
        let mut text = grid::render_grid(SIZE, SIZE, |r, c| Self::symbol(self.disc_at((r, c))));
        text.push_str(&format!(
            "\n{} {} – {} {}",
            Self::seat_symbol(Seat::First),
            self.count(Seat::First),
            self.count(Seat::Second),
            Self::seat_symbol(Seat::Second),
        ));
        text
    }

    fn looks_like_move(text: &str) -> bool {
        grid::looks_like_cells(text, 1)
    }

    fn seat_symbol(seat: Seat) -> &'static str {
        match seat {
            Seat::First => "⚫",
            Seat::Second => "⚪",
        }
    }

    fn notice(&self) -> Option<String> {
        self.passed
            .map(|seat| format!("{} has no legal moves and passes", Self::seat_symbol(seat)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a board from a list of discs, first seat to move.
    fn board_with(discs: &[(&str, Seat)]) -> Reversi {
        let mut cells = [None; SIZE * SIZE];
        for (name, seat) in discs {
            let (r, c) = grid::parse_cell(name, SIZE, SIZE).expect("cell");
            cells[r * SIZE + c] = Some(*seat);
        }
        Reversi {
            cells,
            turn: Seat::First,
            passed: None,
        }
    }

    #[test]
    fn test_opening_moves() {
        let board = Reversi::new();
        assert_eq!(board.count(Seat::First), 2);
        assert_eq!(board.count(Seat::Second), 2);
        for legal in ["d3", "c4", "f5", "e6"] {
            let cell = grid::parse_cell(legal, SIZE, SIZE).expect("cell");
            assert_eq!(board.flips(cell, Seat::First).len(), 1, "{legal}");
        }
    }

    #[test]
    fn test_non_sandwich_rejected() {
        let mut board = Reversi::new();
        let before = board.clone();
        assert!(matches!(board.apply_move("a1"), Err(MoveError::Illegal(_))));
        assert!(matches!(board.apply_move("d4"), Err(MoveError::Illegal(_))));
        assert_eq!(board, before);
    }

    #[test]
    fn test_flips_and_turn_change() {
        let mut board = Reversi::new();
        board.apply_move("d3").expect("legal");
        assert_eq!(board.disc_at((3, 3)), Some(Seat::First));
        assert_eq!(board.count(Seat::First), 4);
        assert_eq!(board.count(Seat::Second), 1);
        assert_eq!(board.turn(), Some(Seat::Second));
    }

    #[test]
    fn test_two_directions_flip() {
        let mut board = board_with(&[
            ("a1", Seat::First),
            ("a2", Seat::Second),
            ("b3", Seat::Second),
            ("c3", Seat::First),
            ("h8", Seat::Second),
            ("g8", Seat::First),
        ]);
        board.apply_move("a3").expect("legal");
        assert_eq!(board.disc_at((0, 1)), Some(Seat::First));
        assert_eq!(board.disc_at((1, 2)), Some(Seat::First));
    }

    #[test]
    fn test_opponent_without_moves_passes() {
        let mut board = board_with(&[
            ("a1", Seat::First),
            ("a2", Seat::Second),
            ("c1", Seat::First),
            ("c2", Seat::Second),
            ("h8", Seat::Second),
        ]);
        board.apply_move("a3").expect("legal");
        assert!(!board.has_moves(Seat::Second));
        assert_eq!(board.turn(), Some(Seat::First));
        assert_eq!(board.passed(), Some(Seat::Second));
        assert!(board.notice().is_some());
        assert_eq!(board.result(), Outcome::InProgress);

        board.apply_move("c3").expect("first moves again");
        assert_eq!(board.result(), Outcome::Win(Seat::First));
    }

    #[test]
    fn test_game_ends_when_nobody_can_move() {
        let mut board = board_with(&[("a1", Seat::First), ("a2", Seat::Second)]);
        board.apply_move("a3").expect("legal");
        assert_eq!(board.result(), Outcome::Win(Seat::First));
        assert!(matches!(board.apply_move("a4"), Err(MoveError::GameOver)));
    }

    #[test]
    fn test_state_round_trip() {
        let mut board = Reversi::new();
        for mv in ["d3", "c3", "c4"] {
            board.apply_move(mv).expect("legal");
        }
        assert_eq!(Reversi::from_state(&board.to_state()), Ok(board));
    }

    #[test]
    fn test_corrupt_state_rejected() {
        let good = Reversi::new().to_state();
        assert!(Reversi::from_state(&good.replace("|0|", "|7|")).is_err());
        assert!(Reversi::from_state(&format!("{}0", good)).is_err());
        assert!(Reversi::from_state("c4/1|1|0").is_err());
    }
}
