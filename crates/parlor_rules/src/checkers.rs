//! English draughts on the 32 dark squares of an 8x8 board.
//!
//! The stored state is the list of steps played, written as pairs of square
//! numbers (`9-14`), and the board is rebuilt by replaying it. A multi-jump
//! is several steps by the same seat.

use crate::codec::{StateReader, StateWriter};
use crate::grid::{self, Cell};
use crate::{BoardVariant, CodecError, GameKind, MoveError, Outcome, Seat};
use tracing::{debug, instrument};

const TAG: &str = "chk";
const VERSION: u32 = 1;
const SIZE: usize = 8;

/// Consecutive steps without a capture after which the game is drawn.
pub const QUIET_MOVE_LIMIT: u32 = 40;

/// A man or king.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// Owning seat.
    pub owner: Seat,
    /// Crowned pieces move in all four diagonal directions.
    pub king: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    from: Cell,
    to: Cell,
    captured: Option<Cell>,
}

/// Checkers board and move log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkers {
    cells: [Option<Piece>; SIZE * SIZE],
    turn: Seat,
    /// Piece in the middle of a multi-jump, which must keep capturing.
    pending: Option<Cell>,
    quiet: u32,
    log: Vec<(u8, u8)>,
}

/// Square number (1-32) of a dark cell.
pub fn square_of((row, col): Cell) -> Option<u8> {
    if row >= SIZE || col >= SIZE || (row + col) % 2 == 0 {
        return None;
    }
    Some((row * 4 + col / 2 + 1) as u8)
}

/// Cell of a square number (1-32).
pub fn cell_of(square: u8) -> Option<Cell> {
    if !(1..=32).contains(&square) {
        return None;
    }
    let index = usize::from(square - 1);
    let row = index / 4;
    let col = 2 * (index % 4) + if row % 2 == 0 { 1 } else { 0 };
    Some((row, col))
}

impl Checkers {
    /// Piece on a cell.
    pub fn piece_at(&self, (row, col): Cell) -> Option<Piece> {
        self.cells[row * SIZE + col]
    }

    /// Number of pieces a seat has left.
    pub fn count(&self, seat: Seat) -> usize {
        self.cells.iter().flatten().filter(|p| p.owner == seat).count()
    }

    /// Returns true while a multi-jump is unfinished.
    pub fn mid_jump(&self) -> bool {
        self.pending.is_some()
    }

    /// Steps played so far, as square number pairs.
    pub fn log(&self) -> &[(u8, u8)] {
        &self.log
    }

    fn set(&mut self, (row, col): Cell, piece: Option<Piece>) {
        self.cells[row * SIZE + col] = piece;
    }

    fn directions(piece: Piece) -> &'static [(isize, isize)] {
        match (piece.king, piece.owner) {
            (true, _) => &[(1, -1), (1, 1), (-1, -1), (-1, 1)],
            (false, Seat::First) => &[(1, -1), (1, 1)],
            (false, Seat::Second) => &[(-1, -1), (-1, 1)],
        }
    }

    fn jumps_from(&self, from: Cell) -> Vec<Step> {
        let Some(piece) = self.piece_at(from) else {
            return Vec::new();
        };
        Self::directions(piece)
            .iter()
            .filter_map(|&dir| {
                let over = grid::step(from, dir, SIZE, SIZE)?;
                let to = grid::step(over, dir, SIZE, SIZE)?;
                let victim = self.piece_at(over)?;
                (victim.owner != piece.owner && self.piece_at(to).is_none()).then_some(Step {
                    from,
                    to,
                    captured: Some(over),
                })
            })
            .collect()
    }

    fn slides_from(&self, from: Cell) -> Vec<Step> {
        let Some(piece) = self.piece_at(from) else {
            return Vec::new();
        };
        Self::directions(piece)
            .iter()
            .filter_map(|&dir| {
                let to = grid::step(from, dir, SIZE, SIZE)?;
                self.piece_at(to).is_none().then_some(Step {
                    from,
                    to,
                    captured: None,
                })
            })
            .collect()
    }

    /// Every legal step for the side to move. Captures are mandatory.
    fn legal_steps(&self) -> Vec<Step> {
        if let Some(cell) = self.pending {
            return self.jumps_from(cell);
        }
        let own: Vec<Cell> = (0..SIZE * SIZE)
            .map(|i| (i / SIZE, i % SIZE))
            .filter(|&cell| self.piece_at(cell).is_some_and(|p| p.owner == self.turn))
            .collect();
        let jumps: Vec<Step> = own.iter().flat_map(|&cell| self.jumps_from(cell)).collect();
        if !jumps.is_empty() {
            return jumps;
        }
        own.iter().flat_map(|&cell| self.slides_from(cell)).collect()
    }

    fn resolve(&self, token: &str) -> Result<Step, MoveError> {
        let legal = self.legal_steps();
        match token.len() {
            2 => {
                let to = grid::parse_cell(token, SIZE, SIZE)?;
                let mut reaching = legal.iter().filter(|s| s.to == to);
                match (reaching.next(), reaching.next()) {
                    (Some(step), None) => Ok(*step),
                    (None, _) => Err(MoveError::illegal(format!(
                        "no piece can move to {}",
                        grid::cell_name(to)
                    ))),
                    (Some(_), Some(_)) => Err(MoveError::illegal(format!(
                        "several pieces can reach {}, name the origin too",
                        grid::cell_name(to)
                    ))),
                }
            }
            _ => {
                let cells = grid::parse_cells(token, 2, SIZE, SIZE)?;
                let (from, to) = (cells[0], cells[1]);
                if let Some(step) = legal.iter().find(|s| s.from == from && s.to == to) {
                    return Ok(*step);
                }
                let reason = match self.piece_at(from) {
                    None => format!("no piece on {}", grid::cell_name(from)),
                    Some(piece) if piece.owner != self.turn => {
                        format!("the piece on {} is not yours", grid::cell_name(from))
                    }
                    Some(_) if legal.iter().any(|s| s.captured.is_some()) => {
                        "a capture is available and must be taken".to_string()
                    }
                    Some(_) => format!(
                        "{} cannot move to {}",
                        grid::cell_name(from),
                        grid::cell_name(to)
                    ),
                };
                Err(MoveError::illegal(reason))
            }
        }
    }

    fn play(&mut self, step: Step) {
        let Some(mut piece) = self.piece_at(step.from) else {
            return;
        };
        self.set(step.from, None);
        if let Some(captured) = step.captured {
            self.set(captured, None);
        }
        let far_row = match piece.owner {
            Seat::First => SIZE - 1,
            Seat::Second => 0,
        };
        let crowned = !piece.king && step.to.0 == far_row;
        piece.king |= crowned;
        self.set(step.to, Some(piece));

        if let (Some(from), Some(to)) = (square_of(step.from), square_of(step.to)) {
            self.log.push((from, to));
        }

        if step.captured.is_some() {
            self.quiet = 0;
        } else {
            self.quiet += 1;
        }

        if step.captured.is_some() && !crowned && !self.jumps_from(step.to).is_empty() {
            debug!(at = %grid::cell_name(step.to), "Jump continues");
            self.pending = Some(step.to);
        } else {
            self.pending = None;
            self.turn = self.turn.opponent();
        }
    }

    fn symbol(&self, cell: Cell) -> &'static str {
        if (cell.0 + cell.1) % 2 == 0 {
            return "⬜";
        }
        match self.piece_at(cell) {
            None => "⬛",
            Some(Piece { owner: Seat::First, king: false }) => "🔴",
            Some(Piece { owner: Seat::First, king: true }) => "🟥",
            Some(Piece { owner: Seat::Second, king: false }) => "🔵",
            Some(Piece { owner: Seat::Second, king: true }) => "🟦",
        }
    }
}

impl BoardVariant for Checkers {
    const KIND: GameKind = GameKind::Checkers;

    fn new() -> Self {
        let mut cells = [None; SIZE * SIZE];
        for square in 1..=32u8 {
            let Some((row, col)) = cell_of(square) else {
                continue;
            };
            let owner = match square {
                1..=12 => Seat::First,
                21..=32 => Seat::Second,
                _ => continue,
            };
            cells[row * SIZE + col] = Some(Piece { owner, king: false });
        }
        Self {
            cells,
            turn: Seat::First,
            pending: None,
            quiet: 0,
            log: Vec::new(),
        }
    }

    #[instrument(skip(state))]
    fn from_state(state: &str) -> Result<Self, CodecError> {
        let mut reader = StateReader::open(state, TAG, VERSION)?;
        let moves = reader.field("moves")?;
        reader.finish()?;

        let mut board = Self::new();
        for entry in moves.split_whitespace() {
            let cells = entry
                .split_once('-')
                .and_then(|(from, to)| Some((from.parse::<u8>().ok()?, to.parse::<u8>().ok()?)))
                .and_then(|(from, to)| Some((cell_of(from)?, cell_of(to)?)))
                .ok_or_else(|| CodecError::malformed(format!("bad logged step '{}'", entry)))?;

            if board.result().is_terminal() {
                return Err(CodecError::malformed("steps logged after the game ended"));
            }
            let step = board
                .legal_steps()
                .into_iter()
                .find(|s| s.from == cells.0 && s.to == cells.1)
                .ok_or_else(|| CodecError::malformed(format!("logged step '{}' is illegal", entry)))?;
            board.play(step);
        }
        Ok(board)
    }

    fn to_state(&self) -> String {
        let moves: Vec<String> = self
            .log
            .iter()
            .map(|(from, to)| format!("{}-{}", from, to))
            .collect();
        StateWriter::new(TAG, VERSION).field(moves.join(" ")).finish()
    }

    #[instrument(skip(self), fields(turn = %self.turn))]
    fn apply_move(&mut self, token: &str) -> Result<(), MoveError> {
        if self.result().is_terminal() {
            return Err(MoveError::GameOver);
        }
        let step = self.resolve(&token.trim().to_ascii_lowercase())?;
        debug!(
            from = %grid::cell_name(step.from),
            to = %grid::cell_name(step.to),
            capture = step.captured.is_some(),
            "Step played"
        );
        self.play(step);
        Ok(())
    }

    fn turn(&self) -> Option<Seat> {
        Some(self.turn)
    }

    fn result(&self) -> Outcome {
        if self.quiet >= QUIET_MOVE_LIMIT {
            Outcome::Draw
        } else if self.legal_steps().is_empty() {
            Outcome::Win(self.turn.opponent())
        } else {
            Outcome::InProgress
        }
    }

    fn render(&self) -> String {
        grid::render_grid(SIZE, SIZE, |r, c| self.symbol((r, c)))
    }

    fn looks_like_move(text: &str) -> bool {
        grid::looks_like_cells(text, 1) || grid::looks_like_cells(text, 2)
    }

    fn seat_symbol(seat: Seat) -> &'static str {
        match seat {
            Seat::First => "🔴",
            Seat::Second => "🔵",
        }
    }

    fn notice(&self) -> Option<String> {
        self.pending.map(|cell| {
            format!(
                "{} must keep jumping with the piece on {}",
                Self::seat_symbol(self.turn),
                grid::cell_name(cell)
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn man(owner: Seat) -> Option<Piece> {
        Some(Piece { owner, king: false })
    }

    fn king(owner: Seat) -> Option<Piece> {
        Some(Piece { owner, king: true })
    }

    fn board_with(pieces: &[(&str, Option<Piece>)]) -> Checkers {
        let mut board = Checkers {
            cells: [None; SIZE * SIZE],
            turn: Seat::First,
            pending: None,
            quiet: 0,
            log: Vec::new(),
        };
        for (name, piece) in pieces {
            let cell = grid::parse_cell(name, SIZE, SIZE).expect("cell");
            board.set(cell, *piece);
        }
        board
    }

    #[test]
    fn test_square_numbering() {
        assert_eq!(cell_of(1), Some((0, 1)));
        assert_eq!(cell_of(5), Some((1, 0)));
        assert_eq!(cell_of(32), Some((7, 6)));
        assert_eq!(cell_of(0), None);
        for square in 1..=32 {
            assert_eq!(cell_of(square).and_then(square_of), Some(square));
        }
        assert_eq!(square_of((0, 0)), None);
    }

    #[test]
    fn test_opening_has_seven_moves() {
        let board = Checkers::new();
        assert_eq!(board.count(Seat::First), 12);
        assert_eq!(board.count(Seat::Second), 12);
        assert_eq!(board.legal_steps().len(), 7);
    }

    #[test]
    fn test_destination_shorthand() {
        let mut board = Checkers::new();
        assert!(matches!(board.apply_move("d3"), Err(MoveError::Illegal(_))));
        board.apply_move("d1").expect("only c2 reaches d1");
        assert_eq!(board.piece_at((3, 0)), man(Seat::First));
        assert_eq!(board.turn(), Some(Seat::Second));
    }

    #[test]
    fn test_capture_is_forced() {
        let mut board = Checkers::new();
        board.apply_move("c4d5").expect("legal");
        board.apply_move("f3e4").expect("legal");

        let before = board.clone();
        assert!(matches!(board.apply_move("c2d1"), Err(MoveError::Illegal(_))));
        assert_eq!(board, before);

        board.apply_move("d5f3").expect("capture");
        assert_eq!(board.count(Seat::Second), 11);
        assert_eq!(board.turn(), Some(Seat::Second));

        board.apply_move("g2e4").expect("recapture");
        assert_eq!(board.count(Seat::First), 11);
        assert_eq!(board.log(), &[(10, 15), (22, 18), (15, 22), (25, 18)]);
    }

    #[test]
    fn test_multi_jump_keeps_turn() {
        let mut board = board_with(&[
            ("a2", man(Seat::First)),
            ("c2", man(Seat::First)),
            ("d3", man(Seat::Second)),
            ("f3", man(Seat::Second)),
            ("h7", man(Seat::Second)),
        ]);
        board.apply_move("c2e4").expect("first jump");
        assert!(board.mid_jump());
        assert_eq!(board.turn(), Some(Seat::First));
        assert!(board.notice().is_some());
        assert!(matches!(board.apply_move("a2b1"), Err(MoveError::Illegal(_))));

        board.apply_move("e4g2").expect("second jump");
        assert!(!board.mid_jump());
        assert_eq!(board.count(Seat::Second), 1);
        assert_eq!(board.turn(), Some(Seat::Second));
        assert_eq!(board.result(), Outcome::InProgress);
    }

    #[test]
    fn test_crowning_ends_move() {
        let mut board = board_with(&[("g2", man(Seat::First)), ("a2", man(Seat::Second))]);
        board.apply_move("g2h1").expect("legal");
        assert_eq!(board.piece_at((7, 0)), king(Seat::First));
        assert_eq!(board.turn(), Some(Seat::Second));
    }

    #[test]
    fn test_capturing_last_piece_wins() {
        let mut board = board_with(&[("c2", man(Seat::First)), ("d3", man(Seat::Second))]);
        board.apply_move("c2e4").expect("capture");
        assert_eq!(board.result(), Outcome::Win(Seat::First));
        assert!(matches!(board.apply_move("e4f5"), Err(MoveError::GameOver)));
    }

    #[test]
    fn test_quiet_moves_draw() {
        let mut board = board_with(&[("a2", king(Seat::First)), ("h7", king(Seat::Second))]);
        let shuffle = ["a2b1", "h7g8", "b1a2", "g8h7"];
        for step in shuffle.iter().cycle().take(QUIET_MOVE_LIMIT as usize) {
            board.apply_move(step).expect("legal");
        }
        assert_eq!(board.result(), Outcome::Draw);
    }

    #[test]
    fn test_state_replays_log() {
        let mut board = Checkers::new();
        for step in ["c4d5", "f3e4", "d5f3", "g2e4"] {
            board.apply_move(step).expect("legal");
        }
        let state = board.to_state();
        assert_eq!(state, "chk/1|10-15 22-18 15-22 25-18");
        assert_eq!(Checkers::from_state(&state), Ok(board));
        assert_eq!(Checkers::from_state("chk/1|"), Ok(Checkers::new()));
    }

    #[test]
    fn test_illegal_log_rejected() {
        assert!(Checkers::from_state("chk/1|9-10").is_err());
        assert!(Checkers::from_state("chk/1|9-x").is_err());
        assert!(Checkers::from_state("chk/1|33-29").is_err());
        assert!(Checkers::from_state("chk/1|9-13|").is_err());
    }
}
