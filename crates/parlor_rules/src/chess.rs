//! Chess, with move legality delegated to `shakmaty`.
//!
//! The board is stored as the SAN move list and rebuilt by replaying it.

use crate::codec::{StateReader, StateWriter};
use crate::{BoardVariant, CodecError, GameKind, MoveError, Outcome, Seat};
use shakmaty::san::{San, SanPlus};
use shakmaty::{CastlingMode, Color, File, Move, Position, Rank, Role, Square};
use tracing::{debug, instrument};

const TAG: &str = "chess";
const VERSION: u32 = 1;

/// A chess game. White is the first seat.
#[derive(Debug, Clone)]
pub struct Chess {
    position: shakmaty::Chess,
    moves: Vec<String>,
}

impl PartialEq for Chess {
    fn eq(&self, other: &Self) -> bool {
        self.moves == other.moves
    }
}

impl Chess {
    /// Current position.
    pub fn position(&self) -> &shakmaty::Chess {
        &self.position
    }

    /// Moves played so far, in SAN.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    fn seat_of(color: Color) -> Seat {
        match color {
            Color::White => Seat::First,
            Color::Black => Seat::Second,
        }
    }

    /// Finds the legal move named by a SAN or long algebraic token.
    fn resolve(&self, token: &str) -> Result<Move, MoveError> {
        let token = match token {
            "0-0" => "O-O",
            "0-0-0" => "O-O-O",
            other => other,
        };

        let lower = token.to_ascii_lowercase();
        if let Some(m) = self
            .position
            .legal_moves()
            .into_iter()
            .find(|m| m.to_uci(CastlingMode::Standard).to_string() == lower)
        {
            return Ok(m);
        }

        let san: SanPlus = token
            .parse()
            .map_err(|_| MoveError::illegal(format!("'{}' is not a chess move", token)))?;
        san.san
            .to_move(&self.position)
            .map_err(|_| MoveError::illegal(format!("{} is not legal here", token)))
    }

    fn glyph(&self, square: Square) -> &'static str {
        let Some(piece) = self.position.board().piece_at(square) else {
            return if square.is_light() { "⬜" } else { "⬛" };
        };
        match (piece.color, piece.role) {
            (Color::White, Role::King) => "♔",
            (Color::White, Role::Queen) => "♕",
            (Color::White, Role::Rook) => "♖",
            (Color::White, Role::Bishop) => "♗",
            (Color::White, Role::Knight) => "♘",
            (Color::White, Role::Pawn) => "♙",
            (Color::Black, Role::King) => "♚",
            (Color::Black, Role::Queen) => "♛",
            (Color::Black, Role::Rook) => "♜",
            (Color::Black, Role::Bishop) => "♝",
            (Color::Black, Role::Knight) => "♞",
            (Color::Black, Role::Pawn) => "♟",
        }
    }
}

impl BoardVariant for Chess {
    const KIND: GameKind = GameKind::Chess;

    fn new() -> Self {
        Self {
            position: shakmaty::Chess::default(),
            moves: Vec::new(),
        }
    }

    #[instrument(skip(state))]
    fn from_state(state: &str) -> Result<Self, CodecError> {
        let mut reader = StateReader::open(state, TAG, VERSION)?;
        let moves = reader.field("moves")?;
        reader.finish()?;

        let mut board = Self::new();
        for entry in moves.split_whitespace() {
            if board.position.is_game_over() {
                return Err(CodecError::malformed("moves logged after the game ended"));
            }
            let m = entry
                .parse::<SanPlus>()
                .ok()
                .and_then(|san| san.san.to_move(&board.position).ok())
                .ok_or_else(|| CodecError::malformed(format!("logged move '{}' is illegal", entry)))?;
            board.position.play_unchecked(&m);
            board.moves.push(entry.to_string());
        }
        Ok(board)
    }

    fn to_state(&self) -> String {
        StateWriter::new(TAG, VERSION)
            .field(self.moves.join(" "))
            .finish()
    }

    #[instrument(skip(self))]
    fn apply_move(&mut self, token: &str) -> Result<(), MoveError> {
        if self.position.is_game_over() {
            return Err(MoveError::GameOver);
        }
        let m = self.resolve(token.trim())?;
        let san = San::from_move(&self.position, &m).to_string();
        debug!(san = %san, "Chess move played");
        self.position.play_unchecked(&m);
        self.moves.push(san);
        Ok(())
    }

    fn turn(&self) -> Option<Seat> {
        Some(Self::seat_of(self.position.turn()))
    }

    fn result(&self) -> Outcome {
        match self.position.outcome() {
            None => Outcome::InProgress,
            Some(shakmaty::Outcome::Decisive { winner }) => Outcome::Win(Self::seat_of(winner)),
            Some(shakmaty::Outcome::Draw) => Outcome::Draw,
        }
    }

    fn render(&self) -> String {
        let mut text = String::new();
        for rank in (0..8u32).rev() {
            for file in 0..8u32 {
                text.push_str(self.glyph(Square::from_coords(File::new(file), Rank::new(rank))));
            }
            text.push_str(crate::grid::COLUMN_LABELS[rank as usize]);
            text.push('\n');
        }
        text.push_str("🇦🇧🇨🇩🇪🇫🇬🇭");
        text.push('\n');
        text
    }

    fn looks_like_move(text: &str) -> bool {
        let text = text.trim();
        if matches!(text, "O-O" | "O-O-O" | "0-0" | "0-0-0") {
            return true;
        }
        (2..=7).contains(&text.len())
            && text.chars().any(|c| ('1'..='8').contains(&c))
            && text.chars().all(|c| "KQRBNabcdefgh12345678xqrbn=+#".contains(c))
    }

    fn seat_symbol(seat: Seat) -> &'static str {
        match seat {
            Seat::First => "♔",
            Seat::Second => "♚",
        }
    }

    fn notice(&self) -> Option<String> {
        (self.position.is_check() && !self.position.is_game_over()).then(|| "Check!".to_string())
    }
}
