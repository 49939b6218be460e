pub mod judge;
pub mod progress;
pub mod score;
pub mod session;

use serde::{Deserialize, Serialize};

use crate::input::events::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    SinglePlayer,
    CompetitiveDifferential,
    CompetitiveFixedRate,
}

/// The two roles of the chase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Bear,
    Man,
}

impl Side {
    /// Owner of judgments on `track`. Single player puts everything on the bear.
    pub fn owning(track: Track, mode: SessionMode) -> Self {
        match (mode, track) {
            (SessionMode::SinglePlayer, _) => Side::Bear,
            (_, Track::Guitar) => Side::Bear,
            (_, Track::Drums) => Side::Man,
        }
    }
}
