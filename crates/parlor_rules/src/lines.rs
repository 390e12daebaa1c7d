//! Color Lines: move tiles along free paths to form runs of one colour.
//!
//! All sizes derive from the board dimension: for 9x9 a run needs five
//! tiles, there are seven colours and three tiles spawn per turn.

use crate::codec::{StateReader, StateWriter, encode_digits};
use crate::grid::{self, Cell};
use crate::{BoardVariant, CodecError, GameKind, MoveError, Outcome, Seat};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, info, instrument};

const TAG: &str = "lines";
const VERSION: u32 = 1;

/// Board dimension.
pub const SIZE: usize = 9;
/// Minimum run length that gets removed.
pub const RUN: usize = SIZE / 3 + 2;
/// Number of tile colours.
pub const COLOURS: u8 = (SIZE / 2 + 3) as u8;
/// Tiles spawned after a move that removes nothing.
pub const SPAWN: usize = SIZE / 4 + 1;

const TILES: [&str; 8] = ["⬜", "🔴", "🟢", "🟡", "🔵", "🟣", "🟠", "🟤"];
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Color Lines board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lines {
    cells: [u8; SIZE * SIZE],
    next: [u8; SPAWN],
    score: u32,
    /// Seed for the next random draw, replaced after every draw.
    seed: u64,
}

/// Points for removing `len` tiles at once.
pub fn points(len: usize) -> u32 {
    (10 * len * (len + 1 - RUN)) as u32
}

impl Lines {
    /// Starts a game from a fixed seed.
    #[instrument]
    pub fn with_seed(seed: u64) -> Self {
        let mut board = Self {
            cells: [0; SIZE * SIZE],
            next: [0; SPAWN],
            score: 0,
            seed,
        };
        board.draw_next();
        board.spawn();
        board
    }

    /// Colour at a cell, zero when empty.
    pub fn tile_at(&self, (row, col): Cell) -> u8 {
        self.cells[row * SIZE + col]
    }

    /// Points scored so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Colours that spawn after the next move without a match.
    pub fn next_tiles(&self) -> &[u8] {
        &self.next
    }

    fn empty_cells(&self) -> Vec<Cell> {
        (0..SIZE * SIZE)
            .filter(|&i| self.cells[i] == 0)
            .map(|i| (i / SIZE, i % SIZE))
            .collect()
    }

    fn rng(&self) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(self.seed)
    }

    fn draw_next(&mut self) {
        let mut rng = self.rng();
        for slot in self.next.iter_mut() {
            *slot = rng.random_range(1..=COLOURS);
        }
        self.seed = rng.random();
    }

    /// Places the queued tiles on random empty cells, clears any runs they
    /// complete, then draws a new queue.
    fn spawn(&mut self) {
        let mut rng = self.rng();
        let mut placed = Vec::with_capacity(SPAWN);
        for colour in self.next {
            let empty = self.empty_cells();
            if empty.is_empty() {
                break;
            }
            let cell = empty[rng.random_range(0..empty.len())];
            self.cells[cell.0 * SIZE + cell.1] = colour;
            placed.push(cell);
        }
        self.seed = rng.random();
        debug!(spawned = placed.len(), "Tiles spawned");

        for cell in placed {
            self.clear_runs(cell);
        }
        self.draw_next();
    }

    /// Cells in runs of at least [`RUN`] through `cell`, origin included.
    pub fn runs_through(&self, cell: Cell) -> BTreeSet<Cell> {
        let colour = self.tile_at(cell);
        let mut found = BTreeSet::new();
        if colour == 0 {
            return found;
        }
        for (dr, dc) in AXES {
            let mut line = vec![cell];
            for direction in [(dr, dc), (-dr, -dc)] {
                let mut cursor = grid::step(cell, direction, SIZE, SIZE);
                while let Some(at) = cursor {
                    if self.tile_at(at) != colour {
                        break;
                    }
                    line.push(at);
                    cursor = grid::step(at, direction, SIZE, SIZE);
                }
            }
            if line.len() >= RUN {
                found.extend(line);
            }
        }
        found
    }

    fn clear_runs(&mut self, cell: Cell) -> bool {
        let run = self.runs_through(cell);
        if run.is_empty() {
            return false;
        }
        let gained = points(run.len());
        for (row, col) in &run {
            self.cells[row * SIZE + col] = 0;
        }
        self.score = self.score.saturating_add(gained);
        info!(removed = run.len(), gained, score = self.score, "Run cleared");
        true
    }

    /// Returns true if an empty-cell path joins `from` to `to`.
    fn path_exists(&self, from: Cell, to: Cell) -> bool {
        let mut seen = [false; SIZE * SIZE];
        let mut queue = VecDeque::from([from]);
        seen[from.0 * SIZE + from.1] = true;
        while let Some(cell) = queue.pop_front() {
            if cell == to {
                return true;
            }
            for next in grid::orthogonal_neighbours(cell, SIZE, SIZE) {
                let index = next.0 * SIZE + next.1;
                if !seen[index] && self.cells[index] == 0 {
                    seen[index] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

impl BoardVariant for Lines {
    const KIND: GameKind = GameKind::Lines;

    fn new() -> Self {
        Self::with_seed(rand::random())
    }

    #[instrument(skip(state))]
    fn from_state(state: &str) -> Result<Self, CodecError> {
        let mut reader = StateReader::open(state, TAG, VERSION)?;
        let seed = reader.parse::<u64>("seed")?;
        let score = reader.parse::<u32>("score")?;
        let next = reader.digits("next", SPAWN, COLOURS)?;
        let cells = reader.digits("cells", SIZE * SIZE, COLOURS)?;
        reader.finish()?;

        if next.contains(&0) {
            return Err(CodecError::malformed("empty tile in the spawn queue"));
        }
        let mut board = Self {
            cells: [0; SIZE * SIZE],
            next: [0; SPAWN],
            score,
            seed,
        };
        board.cells.copy_from_slice(&cells);
        board.next.copy_from_slice(&next);

        let unresolved = (0..SIZE * SIZE)
            .map(|i| (i / SIZE, i % SIZE))
            .find(|&cell| !board.runs_through(cell).is_empty());
        if let Some(cell) = unresolved {
            return Err(CodecError::malformed(format!(
                "uncleared run at {}",
                grid::cell_name(cell)
            )));
        }
        Ok(board)
    }

    fn to_state(&self) -> String {
        StateWriter::new(TAG, VERSION)
            .field(self.seed)
            .field(self.score)
            .field(encode_digits(&self.next))
            .field(encode_digits(&self.cells))
            .finish()
    }

    #[instrument(skip(self), fields(score = self.score))]
    fn apply_move(&mut self, token: &str) -> Result<(), MoveError> {
        if self.result().is_terminal() {
            return Err(MoveError::GameOver);
        }
        let cells = grid::parse_cells(token.trim(), 2, SIZE, SIZE)?;
        let (from, to) = (cells[0], cells[1]);
        let colour = self.tile_at(from);
        if colour == 0 {
            return Err(MoveError::illegal(format!("no tile on {}", grid::cell_name(from))));
        }
        if self.tile_at(to) != 0 {
            return Err(MoveError::illegal(format!("{} is taken", grid::cell_name(to))));
        }
        if !self.path_exists(from, to) {
            return Err(MoveError::illegal(format!(
                "no free path from {} to {}",
                grid::cell_name(from),
                grid::cell_name(to)
            )));
        }

        self.cells[from.0 * SIZE + from.1] = 0;
        self.cells[to.0 * SIZE + to.1] = colour;
        if !self.clear_runs(to) {
            self.spawn();
        }
        Ok(())
    }

    fn turn(&self) -> Option<Seat> {
        None
    }

    fn result(&self) -> Outcome {
        if self.cells.contains(&0) {
            Outcome::InProgress
        } else {
            Outcome::Draw
        }
    }

    fn render(&self) -> String {
        let mut text = grid::render_grid(SIZE, SIZE, |r, c| TILES[usize::from(self.tile_at((r, c)))]);
        let next: String = self.next.iter().map(|&c| TILES[usize::from(c)]).collect();
        text.push_str(&format!("\nNext: {}\nScore: {}", next, self.score));
        text
    }

    fn looks_like_move(text: &str) -> bool {
        grid::looks_like_cells(text, 2)
    }

    fn seat_symbol(_seat: Seat) -> &'static str {
        "🟣"
    }
}
