pub mod game;
pub mod geom;
pub mod protocol;

pub use game::{Game, GameError, GameState, Owner};
pub use geom::{Line, Point};
pub use protocol::{ClientMessage, ServerMessage, StateSnapshot};
