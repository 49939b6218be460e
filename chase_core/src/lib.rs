pub mod config;
pub mod gameplay;
pub mod input;
pub mod time;

pub use config::{ConfigError, GameConfig};
pub use gameplay::session::{FrameOutput, GameSession, MatchState};
pub use gameplay::{SessionMode, Side};
