//! Chain Reaction: orbs pile up until a cell reaches critical mass and
//! bursts into its neighbours, capturing them.

use crate::codec::{StateReader, StateWriter};
use crate::grid::{self, Cell, MAX_DIMENSION};
use crate::{BoardVariant, CodecError, GameKind, MoveError, Outcome, Seat};
use std::collections::VecDeque;
use tracing::{debug, instrument, trace};

const TAG: &str = "chr";
const VERSION: u32 = 1;

/// Default board height.
pub const DEFAULT_ROWS: usize = 9;
/// Default board width.
pub const DEFAULT_COLS: usize = 6;

/// Orbs sitting in one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orbs {
    /// Seat that owns every orb in the cell.
    pub owner: Seat,
    /// Number of orbs, at least one.
    pub count: u16,
}

/// Chain Reaction board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReaction {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Orbs>>,
    turn: Seat,
    first_round: bool,
}

impl ChainReaction {
    /// Creates an empty board of the given size.
    ///
    /// Returns `None` unless both dimensions are in `2..=9`.
    #[instrument]
    pub fn with_size(rows: usize, cols: usize) -> Option<Self> {
        let valid = (2..=MAX_DIMENSION).contains(&rows) && (2..=MAX_DIMENSION).contains(&cols);
        valid.then(|| Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
            turn: Seat::First,
            first_round: true,
        })
    }

    /// Board height.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Board width.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Orbs at a cell, if any.
    pub fn orbs_at(&self, (row, col): Cell) -> Option<Orbs> {
        self.cells.get(row * self.cols + col).copied().flatten()
    }

    /// True until both seats have placed their first orb.
    pub fn is_first_round(&self) -> bool {
        self.first_round
    }

    /// Total orbs owned by a seat.
    pub fn orbs_of(&self, seat: Seat) -> u32 {
        self.cells
            .iter()
            .flatten()
            .filter(|o| o.owner == seat)
            .map(|o| u32::from(o.count))
            .sum()
    }

    /// Total orbs on the board.
    pub fn total_orbs(&self) -> u32 {
        self.cells.iter().flatten().map(|o| u32::from(o.count)).sum()
    }

    /// Number of orbs that makes a cell burst: its neighbour count.
    fn critical_mass(&self, index: usize) -> u16 {
        let cell = (index / self.cols, index % self.cols);
        grid::orthogonal_neighbours(cell, self.rows, self.cols).count() as u16
    }

    /// Most orbs the board holds without any cell bursting.
    fn capacity(&self) -> u32 {
        (0..self.cells.len())
            .map(|i| u32::from(self.critical_mass(i)) - 1)
            .sum()
    }

    fn neighbour_indices(&self, index: usize) -> Vec<usize> {
        let cell = (index / self.cols, index % self.cols);
        grid::orthogonal_neighbours(cell, self.rows, self.cols)
            .map(|(r, c)| r * self.cols + c)
            .collect()
    }

    /// Resolves bursts breadth-first starting at `start`.
    ///
    /// Each burst removes exactly `critical_mass` orbs from the cell and
    /// hands one to every neighbour, so the orb total never changes. Once
    /// the opponent is wiped out (outside the first round) the board is won
    /// and the cascade stops.
    fn cascade(&mut self, start: usize, mover: Seat, can_win: bool) {
        let mut queue = VecDeque::from([start]);
        let mut bursts = 0usize;
        let saturated = self.total_orbs() > self.capacity();

        while let Some(index) = queue.pop_front() {
            let mass = self.critical_mass(index);
            let Some(orbs) = self.cells[index] else {
                continue;
            };
            if orbs.count < mass {
                continue;
            }

            let times = orbs.count / mass;
            let remaining = orbs.count % mass;
            self.cells[index] = (remaining > 0).then_some(Orbs {
                owner: mover,
                count: remaining,
            });
            bursts += 1;

            for neighbour in self.neighbour_indices(index) {
                let entry = self.cells[neighbour].get_or_insert(Orbs {
                    owner: mover,
                    count: 0,
                });
                entry.owner = mover;
                entry.count += times;
                queue.push_back(neighbour);
            }
            trace!(index, times, "Cell burst");

            if self.orbs_of(mover.opponent()) == 0 {
                if can_win {
                    debug!(bursts, "Opponent eliminated, cascade stopped");
                    return;
                }
                if saturated {
                    // Nothing left to capture and the board can never settle.
                    debug!(bursts, "Saturated board, cascade stopped");
                    return;
                }
            }
        }

        if bursts > 0 {
            debug!(bursts, "Cascade settled");
        }
    }

    fn symbol(orbs: Option<Orbs>) -> &'static str {
        const FIRST: [&str; 3] = ["🔴", "🟥", "🛑"];
        const SECOND: [&str; 3] = ["🔵", "🟦", "💠"];
        match orbs {
            None => "⬜",
            Some(o) => {
                let level = (o.count as usize).clamp(1, 3) - 1;
                match o.owner {
                    Seat::First => FIRST[level],
                    Seat::Second => SECOND[level],
                }
            }
        }
    }

    fn encode_cell(orbs: Option<Orbs>) -> String {
        match orbs {
            None => "0".to_string(),
            Some(o) => format!("{}{}", o.owner.code(), o.count),
        }
    }

    fn decode_cell(raw: &str) -> Result<Option<Orbs>, CodecError> {
        if raw == "0" {
            return Ok(None);
        }
        let mut chars = raw.chars();
        let owner = chars
            .next()
            .and_then(Seat::from_code)
            .ok_or_else(|| CodecError::malformed(format!("bad orb owner in '{}'", raw)))?;
        let count: u16 = chars
            .as_str()
            .parse()
            .map_err(|_| CodecError::malformed(format!("bad orb count in '{}'", raw)))?;
        if count == 0 {
            return Err(CodecError::malformed(format!("owned cell '{}' without orbs", raw)));
        }
        Ok(Some(Orbs { owner, count }))
    }
}

impl BoardVariant for ChainReaction {
    const KIND: GameKind = GameKind::ChainReaction;

    fn new() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            cells: vec![None; DEFAULT_ROWS * DEFAULT_COLS],
            turn: Seat::First,
            first_round: true,
        }
    }

    #[instrument(skip(state))]
    fn from_state(state: &str) -> Result<Self, CodecError> {
        let mut reader = StateReader::open(state, TAG, VERSION)?;
        let rows: usize = reader.parse("rows")?;
        let cols: usize = reader.parse("cols")?;
        let turn = reader.seat("turn")?;
        let first_round = reader.flag("first_round")?;
        let raw_cells = reader.field("cells")?;
        reader.finish()?;

        let mut board = Self::with_size(rows, cols)
            .ok_or_else(|| CodecError::malformed(format!("bad board size {}x{}", rows, cols)))?;
        let cells = raw_cells
            .split(',')
            .map(Self::decode_cell)
            .collect::<Result<Vec<_>, _>>()?;
        if cells.len() != rows * cols {
            return Err(CodecError::malformed(format!(
                "expected {} cells, found {}",
                rows * cols,
                cells.len()
            )));
        }
        board.cells = cells;
        board.turn = turn;
        board.first_round = first_round;

        // Unstable cells only survive on a board that was already won.
        let unstable = (0..board.cells.len()).any(|i| {
            board.cells[i].is_some_and(|o| o.count >= board.critical_mass(i))
        });
        if unstable && !board.result().is_terminal() {
            return Err(CodecError::malformed("cell above critical mass on a live board"));
        }
        if first_round {
            if board.orbs_of(Seat::Second) > 0 {
                return Err(CodecError::malformed("second seat has orbs before its first move"));
            }
            let expected = match turn {
                Seat::First => 0,
                Seat::Second => 1,
            };
            if board.orbs_of(Seat::First) != expected {
                return Err(CodecError::malformed(format!(
                    "first round with {} to move must hold {} orbs",
                    turn, expected
                )));
            }
        }
        Ok(board)
    }

    fn to_state(&self) -> String {
        let cells: Vec<String> = self.cells.iter().map(|c| Self::encode_cell(*c)).collect();
        StateWriter::new(TAG, VERSION)
            .field(self.rows)
            .field(self.cols)
            .seat(self.turn)
            .flag(self.first_round)
            .field(cells.join(","))
            .finish()
    }

    #[instrument(skip(self), fields(turn = %self.turn))]
    fn apply_move(&mut self, token: &str) -> Result<(), MoveError> {
        if self.result().is_terminal() {
            return Err(MoveError::GameOver);
        }
        let (row, col) = grid::parse_cell(token.trim(), self.rows, self.cols)?;
        let index = row * self.cols + col;
        let mover = self.turn;

        if let Some(orbs) = self.cells[index]
            && orbs.owner != mover
        {
            return Err(MoveError::illegal(format!("{} belongs to the opponent", grid::cell_name((row, col)))));
        }

        // The round completes with the second seat's first placement.
        let can_win = !self.first_round || mover == Seat::Second;

        let entry = self.cells[index].get_or_insert(Orbs {
            owner: mover,
            count: 0,
        });
        entry.count += 1;
        self.cascade(index, mover, can_win);

        if mover == Seat::Second {
            self.first_round = false;
        }
        self.turn = mover.opponent();
        debug!(cell = %grid::cell_name((row, col)), total = self.total_orbs(), "Orb placed");
        Ok(())
    }

    fn turn(&self) -> Option<Seat> {
        Some(self.turn)
    }

    fn result(&self) -> Outcome {
        if self.first_round {
            return Outcome::InProgress;
        }
        match (self.orbs_of(Seat::First), self.orbs_of(Seat::Second)) {
            (0, 0) => Outcome::InProgress,
            (_, 0) => Outcome::Win(Seat::First),
            (0, _) => Outcome::Win(Seat::Second),
            _ => Outcome::InProgress,
        }
    }

    fn render(&self) -> String {
        let mut text = grid::render_grid(self.rows, self.cols, |r, c| Self::symbol(self.orbs_at((r, c))));
        text.push_str(&format!(
            "\n{} {} – {} {}",
            Self::seat_symbol(Seat::First),
            self.orbs_of(Seat::First),
            self.orbs_of(Seat::Second),
            Self::seat_symbol(Seat::Second),
        ));
        text
    }

    fn looks_like_move(text: &str) -> bool {
        grid::looks_like_cells(text, 1)
    }

    fn seat_symbol(seat: Seat) -> &'static str {
        match seat {
            Seat::First => "🔴",
            Seat::Second => "🔵",
        }
    }
}
