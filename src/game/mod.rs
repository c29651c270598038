pub mod board;
pub mod lobby;
pub mod mines;
pub mod registry;
pub mod utils;
