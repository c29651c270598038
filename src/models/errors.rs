use chess::Color;
use thiserror::Error;

use crate::game::board::EngineError;
use crate::game::utils::{color_name, color_title};

/// Envelope-level failures, answered with a top-level `{error}`.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

/// Rejections of a recognised action, answered as `{action, args: {error}}`.
///
/// The `Display` text is what the client sees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Not in a lobby")]
    NotInLobby,

    #[error("Can't invoke built-in functions.")]
    BuiltIn,

    #[error("Bad shape of command.")]
    BadShape,

    #[error("Lobby does not exist")]
    LobbyNotFound,

    #[error("{} is already being played by another player.", color_title(.0))]
    ColorTaken(Color),

    #[error("You are already playing {}.", color_name(.0))]
    AlreadyPlaying(Color),

    /// Carries the verb phrase of the restricted action, e.g. "reset the game".
    #[error("Only black or white can {0}.")]
    NotAPlayer(&'static str),

    #[error("It is not your turn.")]
    NotYourTurn,

    #[error("{field} must be {requirement}.")]
    InvalidSetting {
        field: &'static str,
        requirement: &'static str,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}
