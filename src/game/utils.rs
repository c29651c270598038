use chess::{Color, File, Piece, Rank, Square};
use std::str::FromStr;

use crate::game::board::EngineError;

/// Lowercase color name, as used on the wire
pub fn color_name(color: &Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// Capitalized color name used in player-facing messages
pub fn color_title(color: &Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Square for an index in `0..64`, where a1 is 0 and h8 is 63
pub fn square_at(index: usize) -> Square {
    Square::make_square(Rank::from_index(index / 8), File::from_index(index % 8))
}

/// Parse an algebraic square such as `e4`
pub fn parse_square(text: &str) -> Result<Square, EngineError> {
    Square::from_str(&text.trim().to_lowercase()).map_err(|_| EngineError::InvalidSquare(text.to_string()))
}

/// Parse a promotion letter (`q`, `r`, `b`, `n`)
pub fn parse_promotion(text: &str) -> Result<Piece, EngineError> {
    match text.trim().to_lowercase().as_str() {
        "q" => Ok(Piece::Queen),
        "r" => Ok(Piece::Rook),
        "b" => Ok(Piece::Bishop),
        "n" => Ok(Piece::Knight),
        _ => Err(EngineError::InvalidPromotion(text.to_string())),
    }
}
