use chart_schema::Note;
use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use log::{info, trace};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::gameplay::judge::{JudgeMachine, JudgmentResult, RuntimeNote};
use crate::gameplay::progress::{ChaseProgress, ChaseState, ProgressPolicy};
use crate::gameplay::score::SideStats;
use crate::gameplay::{SessionMode, Side};
use crate::input::events::{InputEvent, InputKind, Track, MAX_LANE};
use crate::input::InputQueue;
use crate::time::PlaybackClock;

/// Everything an observer needs to render or mirror a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub mode: SessionMode,
    pub clock_ms: f64,
    pub bear: SideStats,
    pub man: SideStats,
    /// Peer score fed in for differential play; replaces `man.score` in the formula.
    pub remote_score: Option<u64>,
    pub chase: ChaseState,
    pub boost_active: bool,
}

#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub judgments: Vec<JudgmentResult>,
    pub state: MatchState,
}

/// One play session: a judge machine, both sides' stats and the chase.
///
/// Drive it by calling [`tick`](Self::tick) once per frame with the
/// playback clock, or [`update`](Self::update) with a position already read. Inputs queued since the previous frame are applied in
/// arrival order.
pub struct GameSession {
    mode: SessionMode,
    config: GameConfig,
    judge: JudgeMachine,
    inputs: InputQueue,
    chase: ChaseProgress,
    bear: SideStats,
    man: SideStats,
    remote_score: Option<u64>,
    remote_dirty: bool,
    clock_ms: f64,
    subscribers: Vec<Sender<MatchState>>,
}

impl GameSession {
    pub fn new(mode: SessionMode, config: &GameConfig) -> Self {
        Self {
            mode,
            config: *config,
            judge: JudgeMachine::new(mode, config.judge),
            inputs: InputQueue::new(),
            chase: ChaseProgress::new(ProgressPolicy::for_mode(mode), config.chase),
            bear: SideStats::new(&config.health),
            man: SideStats::new(&config.health),
            remote_score: None,
            remote_dirty: false,
            clock_ms: 0.0,
            subscribers: Vec::new(),
        }
    }

    pub fn with_track(mut self, track: Track, notes: &[Note]) -> Self {
        self.load_track(track, notes);
        self
    }

    pub fn load_track(&mut self, track: Track, notes: &[Note]) {
        self.judge.load_track(track, notes);
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn notes(&self) -> &[RuntimeNote] {
        self.judge.notes()
    }

    pub fn input_sender(&self) -> Sender<InputEvent> {
        self.inputs.sender()
    }

    pub fn push_input(&self, event: InputEvent) {
        self.inputs.push(event);
    }

    pub fn set_boost(&mut self, active: bool) {
        self.chase.set_boost(active);
    }

    pub fn set_remote_score(&mut self, score: u64) {
        if self.remote_score != Some(score) {
            self.remote_score = Some(score);
            self.remote_dirty = true;
        }
    }

    /// Receives a snapshot after every frame. Dropped receivers are pruned.
    pub fn subscribe(&mut self) -> Receiver<MatchState> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn snapshot(&self) -> MatchState {
        MatchState {
            mode: self.mode,
            clock_ms: self.clock_ms,
            bear: self.bear.clone(),
            man: self.man.clone(),
            remote_score: self.remote_score,
            chase: self.chase.state(),
            boost_active: self.chase.boost_active(),
        }
    }

    pub fn stats(&self, side: Side) -> &SideStats {
        match side {
            Side::Bear => &self.bear,
            Side::Man => &self.man,
        }
    }

    /// The chase reached an outcome, or every note has been resolved.
    pub fn is_finished(&self) -> bool {
        self.chase.is_over() || self.judge.is_exhausted()
    }

    /// Polls `clock` once and runs the frame at its position.
    pub fn tick(&mut self, clock: &impl PlaybackClock) -> FrameOutput {
        self.update(clock.position_ms())
    }

    /// Runs one frame at `clock_ms`. A clock earlier than the previous frame
    /// is treated as no time passing.
    pub fn update(&mut self, clock_ms: f64) -> FrameOutput {
        let now = if clock_ms.is_nan() {
            self.clock_ms
        } else {
            clock_ms.max(self.clock_ms)
        };
        let elapsed_ms = now - self.clock_ms;
        self.clock_ms = now;
        let was_over = self.chase.is_over();

        let mut judgments = self.judge.sweep_misses(now);
        for event in self.inputs.drain() {
            if event.lane > MAX_LANE {
                trace!("ignoring input on lane {}", event.lane);
                continue;
            }
            match event.kind {
                InputKind::Press => {
                    judgments.push(self.judge.press(event.track, event.lane, event.timestamp_ms))
                }
                InputKind::Release => {
                    if let Some(tail) =
                        self.judge.release(event.track, event.lane, event.timestamp_ms)
                    {
                        judgments.push(tail);
                    }
                }
            }
        }
        self.judge.complete_holds(now);

        for result in &judgments {
            self.record(result);
        }

        match self.chase.policy() {
            ProgressPolicy::FixedRate => self.chase.advance(elapsed_ms),
            ProgressPolicy::Differential if self.remote_dirty => self.apply_score_gap(),
            ProgressPolicy::Differential => {}
        }
        self.remote_dirty = false;

        if !was_over {
            if let Some(outcome) = self.chase.state().outcome {
                info!("chase over at {now:.1}ms: {outcome:?}");
            }
        }

        let state = self.snapshot();
        self.publish(&state);
        FrameOutput { judgments, state }
    }

    fn record(&mut self, result: &JudgmentResult) {
        let health = self.config.health;
        match result.owner {
            Side::Bear => self.bear.record(result, &health),
            Side::Man => self.man.record(result, &health),
        }
        match self.chase.policy() {
            ProgressPolicy::FixedRate => self.chase.on_judgment(result.kind, result.owner),
            ProgressPolicy::Differential => self.apply_score_gap(),
        }
    }

    fn apply_score_gap(&mut self) {
        let man_score = self.remote_score.unwrap_or(self.man.score);
        self.chase.apply_scores(self.bear.score, man_score);
    }

    fn publish(&mut self, state: &MatchState) {
        self.subscribers
            .retain(|tx| match tx.try_send(state.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
    }
}
