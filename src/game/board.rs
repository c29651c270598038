use chess::{Board, BoardBuilder, CastleRights, ChessMove, Color, File, Piece, Square};
use std::convert::TryFrom;
use thiserror::Error;

/// Errors raised by the chess engine adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid promotion piece: {0}")]
    InvalidPromotion(String),

    #[error("Illegal move.")]
    IllegalMove,

    /// The position can no longer be played, usually because a king was lost to a mine.
    #[error("The game is over.")]
    Unplayable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    /// File the rook lands on after castling.
    pub fn rook_file(self) -> File {
        match self {
            CastleSide::King => File::F,
            CastleSide::Queen => File::D,
        }
    }
}

/// A move accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    pub source: Square,
    pub dest: Square,
    pub piece: Piece,
    pub color: Color,
    pub castle: Option<CastleSide>,
}

/// Chess position with a ply counter.
///
/// The position is stored as a `BoardBuilder` so that pieces can be blown off
/// the board by mines even when the result is something `chess::Board` would
/// refuse, such as a side without a king. Legality is checked against a strict
/// `Board` built on demand; a position that fails that conversion accepts no
/// further moves.
pub struct ChessBoard {
    position: BoardBuilder,
    ply: u32,
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessBoard {
    pub fn new() -> Self {
        Self {
            position: BoardBuilder::from(Board::default()),
            ply: 0,
        }
    }

    #[cfg(test)]
    pub fn from_fen(fen: &str) -> Option<Self> {
        use std::str::FromStr;
        BoardBuilder::from_str(fen).ok().map(|position| Self { position, ply: 0 })
    }

    /// Number of half-moves pushed since the start, null moves included.
    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn turn(&self) -> Color {
        self.position.get_side_to_move()
    }

    #[cfg(test)]
    pub fn piece_on(&self, square: Square) -> Option<(Piece, Color)> {
        self.position[square]
    }

    /// False once a king is gone or the side not to move is left in check.
    pub fn is_playable(&self) -> bool {
        Board::try_from(&self.position).is_ok()
    }

    /// FEN of the current position. The fullmove number follows the ply counter.
    pub fn fen(&self) -> String {
        let text = self.position.to_string();
        let mut fields: Vec<String> = text.split_whitespace().take(4).map(str::to_owned).collect();
        fields.push("0".to_string());
        fields.push((self.ply / 2 + 1).to_string());
        fields.join(" ")
    }

    pub fn push_move(
        &mut self,
        source: Square,
        dest: Square,
        promotion: Option<Piece>,
    ) -> Result<AppliedMove, EngineError> {
        let board = Board::try_from(&self.position).map_err(|_| EngineError::Unplayable)?;
        let chess_move = ChessMove::new(source, dest, promotion);
        if !board.legal(chess_move) {
            return Err(EngineError::IllegalMove);
        }

        let piece = board.piece_on(source).ok_or(EngineError::IllegalMove)?;
        let color = board.side_to_move();
        let castle = if piece == Piece::King && source.get_file() == File::E {
            match dest.get_file() {
                File::G => Some(CastleSide::King),
                File::C => Some(CastleSide::Queen),
                _ => None,
            }
        } else {
            None
        };

        self.position = BoardBuilder::from(board.make_move_new(chess_move));
        self.ply += 1;

        Ok(AppliedMove {
            source,
            dest,
            piece,
            color,
            castle,
        })
    }

    /// Pass the turn without moving.
    pub fn push_null(&mut self) {
        let side = self.position.get_side_to_move();
        self.position.side_to_move(!side).en_passant(None);
        self.ply += 1;
    }

    /// Take whatever stands on `square` off the board.
    pub fn remove_piece(&mut self, square: Square) -> Option<(Piece, Color)> {
        let removed = self.position[square];
        if removed.is_some() {
            self.position.clear_square(square);
            // Only a pawn that just advanced two squares can be an en passant
            // target, and it is the piece being removed here.
            self.position.en_passant(None);
            self.revoke_lost_castle_rights();
        }
        removed
    }

    fn revoke_lost_castle_rights(&mut self) {
        for color in [Color::White, Color::Black] {
            let rank = color.to_my_backrank();
            let home = |file| self.position[Square::make_square(rank, file)];
            let rights = self.position.get_castle_rights(color);
            let king_home = home(File::E) == Some((Piece::King, color));
            let rook_on = |file| home(file) == Some((Piece::Rook, color));

            let kingside = king_home && rights.has_kingside() && rook_on(File::H);
            let queenside = king_home && rights.has_queenside() && rook_on(File::A);
            let kept = match (kingside, queenside) {
                (true, true) => CastleRights::Both,
                (true, false) => CastleRights::KingSide,
                (false, true) => CastleRights::QueenSide,
                (false, false) => CastleRights::NoRights,
            };
            self.position.castle_rights(color, kept);
        }
    }
}
