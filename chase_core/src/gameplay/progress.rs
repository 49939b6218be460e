use serde::{Deserialize, Serialize};

use crate::config::ChaseTuning;
use crate::gameplay::judge::JudgmentKind;
use crate::gameplay::{SessionMode, Side};

const MAX_PROGRESS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    BearEscaped,
    ManCaught,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPolicy {
    /// Positions follow the score difference between the two sides.
    Differential,
    /// The man runs at a constant speed; bear hits push forward, misses pull back.
    FixedRate,
}

impl ProgressPolicy {
    pub fn for_mode(mode: SessionMode) -> Self {
        match mode {
            SessionMode::CompetitiveDifferential => ProgressPolicy::Differential,
            SessionMode::SinglePlayer | SessionMode::CompetitiveFixedRate => ProgressPolicy::FixedRate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaseState {
    pub bear_progress: f64,
    pub man_progress: f64,
    pub game_over: bool,
    pub outcome: Option<Outcome>,
}

/// Two-sided chase. Frozen once an outcome is reached.
#[derive(Debug, Clone)]
pub struct ChaseProgress {
    policy: ProgressPolicy,
    tuning: ChaseTuning,
    state: ChaseState,
    boost_active: bool,
}

impl ChaseProgress {
    pub fn new(policy: ProgressPolicy, tuning: ChaseTuning) -> Self {
        Self {
            policy,
            tuning,
            state: ChaseState {
                bear_progress: clamp(tuning.bear_start),
                man_progress: clamp(tuning.man_start),
                game_over: false,
                outcome: None,
            },
            boost_active: false,
        }
    }

    pub fn policy(&self) -> ProgressPolicy {
        self.policy
    }

    pub fn state(&self) -> ChaseState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        self.state.game_over
    }

    pub fn boost_active(&self) -> bool {
        self.boost_active
    }

    pub fn set_boost(&mut self, active: bool) {
        self.boost_active = active;
    }

    /// Fixed-rate only: the man's steady advance over `elapsed_ms` of play.
    pub fn advance(&mut self, elapsed_ms: f64) {
        if self.is_over() || self.policy != ProgressPolicy::FixedRate || elapsed_ms <= 0.0 {
            return;
        }
        self.state.man_progress =
            clamp(self.state.man_progress + self.tuning.man_speed_per_sec * elapsed_ms / 1000.0);
        self.check_terminal();
    }

    /// Fixed-rate only: bear-side Perfect/Great boosts, any bear-side miss costs.
    pub fn on_judgment(&mut self, kind: JudgmentKind, owner: Side) {
        if self.is_over() || self.policy != ProgressPolicy::FixedRate || owner != Side::Bear {
            return;
        }
        let delta = match kind {
            JudgmentKind::Perfect | JudgmentKind::Great => {
                let boost = if self.boost_active {
                    self.tuning.boost_multiplier
                } else {
                    1.0
                };
                self.tuning.bear_hit_boost * self.tuning.boost_scale * boost
            }
            JudgmentKind::Good => 0.0,
            JudgmentKind::Miss => -self.tuning.bear_miss_penalty,
        };
        self.state.bear_progress = clamp(self.state.bear_progress + delta);
        self.check_terminal();
    }

    /// Differential only: recompute both positions from the two scores.
    pub fn apply_scores(&mut self, bear_score: u64, man_score: u64) {
        if self.is_over() || self.policy != ProgressPolicy::Differential {
            return;
        }
        let diff = bear_score as f64 - man_score as f64;
        let total = (bear_score + man_score).max(1) as f64;
        let swing = self.tuning.differential_swing * diff / total;
        self.state.bear_progress = clamp(self.tuning.differential_base + swing);
        self.state.man_progress = clamp(self.tuning.differential_base - swing);
        self.check_terminal();
    }

    fn check_terminal(&mut self) {
        let outcome = if self.state.bear_progress >= MAX_PROGRESS {
            Outcome::BearEscaped
        } else if self.state.man_progress >= self.state.bear_progress {
            Outcome::ManCaught
        } else {
            return;
        };
        self.state.game_over = true;
        self.state.outcome = Some(outcome);
    }
}

fn clamp(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_PROGRESS)
    }
}
