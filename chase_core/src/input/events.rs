use serde::{Deserialize, Serialize};

/// Lanes 0-4 are frets/pads, 5 is the open lane.
pub const MAX_LANE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    #[default]
    Guitar,
    Drums,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Playback position (ms) at which the event occurred
    pub timestamp_ms: f64,
    pub lane: u8,
    #[serde(default)]
    pub track: Track,
    pub kind: InputKind,
}

impl InputEvent {
    pub fn press(track: Track, lane: u8, timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            lane,
            track,
            kind: InputKind::Press,
        }
    }

    pub fn release(track: Track, lane: u8, timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            lane,
            track,
            kind: InputKind::Release,
        }
    }
}
