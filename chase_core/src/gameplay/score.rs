use serde::{Deserialize, Serialize};

use crate::config::HealthTuning;
use crate::gameplay::judge::{JudgmentKind, JudgmentResult};

/// Running totals for one side of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideStats {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    /// Every recorded miss, including tail misses and presses with no note.
    pub miss: u32,
    pub tail_misses: u32,
    pub ghost_presses: u32,
    pub health: f64,
}

impl SideStats {
    pub fn new(health: &HealthTuning) -> Self {
        Self {
            score: 0,
            combo: 0,
            max_combo: 0,
            perfect: 0,
            great: 0,
            good: 0,
            miss: 0,
            tail_misses: 0,
            ghost_presses: 0,
            health: health.start.clamp(0.0, 100.0),
        }
    }

    pub(crate) fn record(&mut self, result: &JudgmentResult, health: &HealthTuning) {
        self.score += u64::from(result.score_delta);
        match result.kind {
            JudgmentKind::Perfect => self.perfect += 1,
            JudgmentKind::Great => self.great += 1,
            JudgmentKind::Good => self.good += 1,
            JudgmentKind::Miss => {
                self.miss += 1;
                if result.tail {
                    self.tail_misses += 1;
                }
                if result.note.is_none() {
                    self.ghost_presses += 1;
                }
            }
        }

        if result.kind.is_hit() {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        } else {
            self.combo = 0;
        }

        if result.is_note_miss() {
            self.health = (self.health - health.miss_penalty).clamp(0.0, 100.0);
        }
    }

    pub fn judged(&self) -> u32 {
        self.perfect + self.great + self.good + self.miss
    }

    /// Weighted hit percentage; 100 before anything is judged.
    pub fn accuracy(&self) -> f64 {
        let judged = self.judged();
        if judged == 0 {
            return 100.0;
        }
        let weighted = f64::from(self.perfect) * 100.0
            + f64::from(self.great) * 90.0
            + f64::from(self.good) * 75.0;
        (weighted / f64::from(judged)).clamp(0.0, 100.0)
    }
}

impl Default for SideStats {
    fn default() -> Self {
        Self::new(&HealthTuning::default())
    }
}
