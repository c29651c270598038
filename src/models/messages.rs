use actix::Message;
use chess::Square;
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::game::board::EngineError;
use crate::game::utils::{parse_square, square_at};
use crate::models::errors::ActionError;
use crate::models::ClientId;

/// Message sent from client to server
#[derive(Deserialize, Debug, Clone)]
pub struct ClientEnvelope {
    pub action: String,
    #[serde(default)]
    pub args: Option<Value>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinLobbyArgs {
    pub lobby_code: String,
}

/// Clock readings in seconds, as reported by the client.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Timers {
    pub white: f64,
    pub black: f64,
}

/// A move as the client describes it. Stored and echoed back verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveRecord {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    pub color: String,
    #[serde(default)]
    pub flags: String,
    pub piece: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MoveArgs {
    #[serde(default, rename = "move")]
    pub chess_move: Option<MoveRecord>,
    #[serde(default)]
    pub skip: Option<bool>,
    pub timers: Timers,
}

/// A square given either as an index (`0` = a1) or in algebraic form.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum SquareArg {
    Index(usize),
    Name(String),
}

impl SquareArg {
    pub fn to_square(&self) -> Result<Square, EngineError> {
        match self {
            SquareArg::Index(index) if *index < 64 => Ok(square_at(*index)),
            SquareArg::Index(index) => Err(EngineError::InvalidSquare(index.to_string())),
            SquareArg::Name(name) => parse_square(name),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SinkArgs {
    pub position: SquareArg,
    pub timers: Timers,
}

/// Settings arrive as integer strings; raw values are validated by the lobby.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsArgs {
    #[serde(default)]
    pub starting_time: Option<Value>,
    #[serde(default)]
    pub increment: Option<Value>,
    #[serde(default)]
    pub mine_count_per_side: Option<Value>,
    #[serde(default)]
    pub moves_until_reset: Option<Value>,
}

/// Actions handled by a lobby once the client is a member.
#[derive(Debug, Clone)]
pub enum LobbyCommand {
    ClaimWhite,
    ClaimBlack,
    ResetBoard,
    Move(MoveArgs),
    Sink(SinkArgs),
    UpdateSettings(SettingsArgs),
}

impl LobbyCommand {
    /// Returns `Ok(None)` when `action` names no lobby action.
    pub fn parse(action: &str, args: Option<Value>) -> Result<Option<Self>, ActionError> {
        let command = match action {
            "claimWhite" => LobbyCommand::ClaimWhite,
            "claimBlack" => LobbyCommand::ClaimBlack,
            "resetBoard" => LobbyCommand::ResetBoard,
            "move" => LobbyCommand::Move(parse_args(args)?),
            "sink" => LobbyCommand::Sink(parse_args(args)?),
            "updateSettings" => LobbyCommand::UpdateSettings(parse_args(args)?),
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

pub fn parse_args<T: DeserializeOwned>(args: Option<Value>) -> Result<T, ActionError> {
    let args = args.unwrap_or_else(|| json!({}));
    serde_json::from_value(args).map_err(|_| ActionError::BadShape)
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LobbyJoined {
    pub lobby_code: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn new() -> Self {
        Self { success: true }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Empty {}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimNotice {
    pub taken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mine_count: Option<u32>,
}

/// Everything a client needs to draw a lobby from scratch. Mines stay hidden.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub fen: String,
    pub mine_count: u32,
    pub previous_move: Option<MoveRecord>,
    pub time_controls: (u32, u32),
    pub moves_until_reset: u32,
    pub timers: Timers,
    pub white_player: bool,
    pub black_player: bool,
}

/// Side effects of a move or skip.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExtraInfo {
    /// The moved piece landed on a mine and was removed.
    pub mine: bool,
    /// The castling rook landed on a mine and was removed.
    pub rook_mine: bool,
    /// The ply cadence was reached: mines were regenerated and free sinks restored.
    pub mines_reset: bool,
    /// The position can no longer be played; the side to move has won.
    pub game_over: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoveResult {
    #[serde(rename = "move", skip_serializing_if = "Option::is_none")]
    pub chess_move: Option<MoveRecord>,
    pub extra_info: ExtraInfo,
    pub timers: Timers,
    pub fen: String,
}

/// What a sink uncovered on one square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    Count(u8),
    Mine,
}

impl Serialize for Reveal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reveal::Count(count) => serializer.serialize_u8(*count),
            Reveal::Mine => serializer.serialize_str("mine"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SinkResult {
    pub success: bool,
    /// Keyed by algebraic square name.
    pub squares: BTreeMap<String, Reveal>,
    /// False when the mine layout changed underneath this result.
    pub reveal: bool,
    /// The sink cost the player their turn.
    pub forfeited: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResult {
    pub success: bool,
    pub time_controls: (u32, u32),
    pub mine_count: u32,
    pub moves_until_reset: u32,
}

/// Message sent from server to client
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ServerMessage {
    Action { action: String, args: Value },
    Error { error: String },
}

impl ServerMessage {
    pub fn new<T: Serialize>(action: &str, args: &T) -> Self {
        match serde_json::to_value(args) {
            Ok(args) => ServerMessage::Action {
                action: action.to_string(),
                args,
            },
            Err(e) => {
                warn!("Failed to serialize {} payload: {}", action, e);
                ServerMessage::error("Internal server error")
            }
        }
    }

    pub fn action_error(action: &str, error: &ActionError) -> Self {
        ServerMessage::Action {
            action: action.to_string(),
            args: json!({ "error": error.to_string() }),
        }
    }

    pub fn error(error: impl ToString) -> Self {
        ServerMessage::Error {
            error: error.to_string(),
        }
    }

    #[cfg(test)]
    pub fn action(&self) -> Option<&str> {
        match self {
            ServerMessage::Action { action, .. } => Some(action),
            ServerMessage::Error { .. } => None,
        }
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| "{\"error\": \"Internal server error\"}".to_string())
    }
}

/// Message type for WebSocket communication
#[derive(Message)]
#[rtype(result = "()")]
pub struct ClientText(pub String);

/// One outbound message addressed to one client.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ClientId,
    pub message: ServerMessage,
}

/// Messages produced while handling one inbound frame, in send order.
#[derive(Debug, Default)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl Outbox {
    pub fn send(&mut self, to: ClientId, message: ServerMessage) {
        self.deliveries.push(Delivery { to, message });
    }

    pub fn broadcast<'a>(
        &mut self,
        members: impl IntoIterator<Item = &'a ClientId>,
        except: Option<ClientId>,
        message: &ServerMessage,
    ) {
        for member in members {
            if Some(*member) != except {
                self.send(*member, message.clone());
            }
        }
    }

    #[cfg(test)]
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    pub fn into_deliveries(self) -> Vec<Delivery> {
        self.deliveries
    }
}
