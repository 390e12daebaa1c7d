//! Single-seat 9x9 Sudoku with generated puzzles.

use crate::codec::{StateReader, StateWriter, encode_digits};
use crate::grid::{self, Cell};
use crate::{BoardVariant, CodecError, GameKind, MoveError, Outcome, Seat};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{debug, instrument};

const TAG: &str = "sdk";
const VERSION: u32 = 1;
const SIZE: usize = 9;
const BOX: usize = 3;

/// Number of given digits left in a generated puzzle.
pub const CLUES: usize = 36;

const DIGIT_GLYPHS: [&str; 10] = ["⬜", "１", "２", "３", "４", "５", "６", "７", "８", "９"];

/// A Sudoku grid. Zero marks an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sudoku {
    clues: [u8; SIZE * SIZE],
    cells: [u8; SIZE * SIZE],
}

/// Returns true if `digit` at `index` repeats in its row, column or box.
fn conflicts(cells: &[u8; SIZE * SIZE], index: usize, digit: u8) -> bool {
    let (row, col) = (index / SIZE, index % SIZE);
    let (box_row, box_col) = (row / BOX * BOX, col / BOX * BOX);
    (0..SIZE).any(|i| {
        let peers = [
            row * SIZE + i,
            i * SIZE + col,
            (box_row + i / BOX) * SIZE + box_col + i % BOX,
        ];
        peers.iter().any(|&peer| peer != index && cells[peer] == digit)
    })
}

/// Fills every empty cell by backtracking over shuffled candidates.
fn fill(cells: &mut [u8; SIZE * SIZE], rng: &mut Xoshiro256PlusPlus) -> bool {
    let Some(index) = cells.iter().position(|&d| d == 0) else {
        return true;
    };
    let mut candidates: Vec<u8> = (1..=9).collect();
    candidates.shuffle(rng);
    for digit in candidates {
        if !conflicts(cells, index, digit) {
            cells[index] = digit;
            if fill(cells, rng) {
                return true;
            }
        }
    }
    cells[index] = 0;
    false
}

impl Sudoku {
    /// Generates a puzzle deterministically from `seed`.
    #[instrument]
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut solution = [0u8; SIZE * SIZE];
        fill(&mut solution, &mut rng);

        let mut order: Vec<usize> = (0..SIZE * SIZE).collect();
        order.shuffle(&mut rng);
        let mut clues = solution;
        for &index in &order[..SIZE * SIZE - CLUES] {
            clues[index] = 0;
        }
        debug!(clues = CLUES, "Sudoku puzzle generated");
        Self { clues, cells: clues }
    }

    /// Digit at a cell, zero when empty.
    pub fn digit_at(&self, (row, col): Cell) -> u8 {
        self.cells[row * SIZE + col]
    }

    /// Returns true for cells given by the puzzle.
    pub fn is_clue(&self, (row, col): Cell) -> bool {
        self.clues[row * SIZE + col] != 0
    }

    /// A full solution consistent with the clues, if one exists.
    pub fn solution(&self) -> Option<[u8; SIZE * SIZE]> {
        let mut cells = self.clues;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        fill(&mut cells, &mut rng).then_some(cells)
    }

    fn parse(token: &str) -> Result<(Cell, u8), MoveError> {
        let token = token.trim();
        if token.len() != 3 || !token.is_ascii() {
            return Err(MoveError::illegal(format!(
                "'{}' should be a cell followed by a digit",
                token
            )));
        }
        let cell = grid::parse_cell(&token[..2], SIZE, SIZE)?;
        let digit = token[2..]
            .parse::<u8>()
            .map_err(|_| MoveError::illegal(format!("'{}' is not a digit", &token[2..])))?;
        Ok((cell, digit))
    }
}

impl BoardVariant for Sudoku {
    const KIND: GameKind = GameKind::Sudoku;

    fn new() -> Self {
        Self::with_seed(rand::random())
    }

    #[instrument(skip(state))]
    fn from_state(state: &str) -> Result<Self, CodecError> {
        let mut reader = StateReader::open(state, TAG, VERSION)?;
        let clues = reader.digits("clues", SIZE * SIZE, 9)?;
        let cells = reader.digits("cells", SIZE * SIZE, 9)?;
        reader.finish()?;

        let mut board = Self {
            clues: [0; SIZE * SIZE],
            cells: [0; SIZE * SIZE],
        };
        board.clues.copy_from_slice(&clues);
        board.cells.copy_from_slice(&cells);

        for index in 0..SIZE * SIZE {
            let (clue, digit) = (board.clues[index], board.cells[index]);
            if clue != 0 && clue != digit {
                return Err(CodecError::malformed(format!("clue {} was overwritten", index)));
            }
            if digit != 0 && conflicts(&board.cells, index, digit) {
                return Err(CodecError::malformed(format!("conflicting digit at {}", index)));
            }
        }
        Ok(board)
    }

    fn to_state(&self) -> String {
        StateWriter::new(TAG, VERSION)
            .field(encode_digits(&self.clues))
            .field(encode_digits(&self.cells))
            .finish()
    }

    #[instrument(skip(self))]
    fn apply_move(&mut self, token: &str) -> Result<(), MoveError> {
        if self.result().is_terminal() {
            return Err(MoveError::GameOver);
        }
        let (cell, digit) = Self::parse(token)?;
        if self.is_clue(cell) {
            return Err(MoveError::illegal(format!(
                "{} is part of the puzzle",
                grid::cell_name(cell)
            )));
        }
        let index = cell.0 * SIZE + cell.1;
        if digit != 0 && conflicts(&self.cells, index, digit) {
            return Err(MoveError::illegal(format!(
                "{} conflicts at {}",
                digit,
                grid::cell_name(cell)
            )));
        }
        self.cells[index] = digit;
        debug!(cell = %grid::cell_name(cell), digit, "Digit written");
        Ok(())
    }

    fn turn(&self) -> Option<Seat> {
        None
    }

    fn result(&self) -> Outcome {
        let solved = (0..SIZE * SIZE)
            .all(|i| self.cells[i] != 0 && !conflicts(&self.cells, i, self.cells[i]));
        if solved {
            Outcome::Win(Seat::First)
        } else {
            Outcome::InProgress
        }
    }

    fn render(&self) -> String {
        grid::render_grid(SIZE, SIZE, |r, c| {
            let digit = usize::from(self.digit_at((r, c)));
            if self.is_clue((r, c)) {
                grid::COLUMN_LABELS[digit - 1]
            } else {
                DIGIT_GLYPHS[digit]
            }
        })
    }

    fn looks_like_move(text: &str) -> bool {
        let text = text.trim();
        text.len() == 3
            && text.is_ascii()
            && grid::looks_like_cells(&text[..2], 1)
            && text.as_bytes()[2].is_ascii_digit()
    }

    fn seat_symbol(_seat: Seat) -> &'static str {
        "#️⃣"
    }
}
