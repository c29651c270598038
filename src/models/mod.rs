pub mod app_state;
pub mod errors;
pub mod game_state;
pub mod messages;

/// Identity of one WebSocket connection.
pub type ClientId = uuid::Uuid;

// Re-export important types
pub use app_state::*;
pub use errors::*;
pub use game_state::*;
pub use messages::*;
