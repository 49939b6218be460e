use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gameplay::judge::JudgmentKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Timing windows are inclusive half-widths in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeWindows {
    pub perfect_ms: f64,
    pub great_ms: f64,
    pub good_ms: f64,
    /// A pending note this far behind the clock is missed automatically.
    pub miss_tolerance_ms: f64,
    pub perfect_score: u32,
    pub great_score: u32,
    pub good_score: u32,
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self {
            perfect_ms: 25.0,
            great_ms: 55.0,
            good_ms: 140.0,
            miss_tolerance_ms: 2000.0 / 3.0,
            perfect_score: 100,
            great_score: 70,
            good_score: 40,
        }
    }
}

impl JudgeWindows {
    pub fn classify(&self, delta_ms: f64) -> JudgmentKind {
        let delta = delta_ms.abs();
        if delta <= self.perfect_ms {
            JudgmentKind::Perfect
        } else if delta <= self.great_ms {
            JudgmentKind::Great
        } else if delta <= self.good_ms {
            JudgmentKind::Good
        } else {
            JudgmentKind::Miss
        }
    }

    pub fn score_for(&self, kind: JudgmentKind) -> u32 {
        match kind {
            JudgmentKind::Perfect => self.perfect_score,
            JudgmentKind::Great => self.great_score,
            JudgmentKind::Good => self.good_score,
            JudgmentKind::Miss => 0,
        }
    }
}

/// Chase progress constants, all in percent of the track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseTuning {
    pub bear_start: f64,
    pub man_start: f64,
    pub man_speed_per_sec: f64,
    pub bear_hit_boost: f64,
    pub boost_scale: f64,
    /// Applied while the boost input is held.
    pub boost_multiplier: f64,
    pub bear_miss_penalty: f64,
    pub differential_base: f64,
    pub differential_swing: f64,
}

impl Default for ChaseTuning {
    fn default() -> Self {
        Self {
            bear_start: 10.0,
            man_start: 0.0,
            man_speed_per_sec: 0.2,
            bear_hit_boost: 2.0,
            boost_scale: 1.0,
            boost_multiplier: 2.0,
            bear_miss_penalty: 0.5,
            differential_base: 10.0,
            differential_swing: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthTuning {
    pub start: f64,
    pub miss_penalty: f64,
}

impl Default for HealthTuning {
    fn default() -> Self {
        Self {
            start: 100.0,
            miss_penalty: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub judge: JudgeWindows,
    pub chase: ChaseTuning,
    pub health: HealthTuning,
}

impl GameConfig {
    /// Fields missing from `json` keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}
