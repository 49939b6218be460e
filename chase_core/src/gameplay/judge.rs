use std::collections::HashMap;

use chart_schema::{Note, NoteClassification};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::JudgeWindows;
use crate::gameplay::{SessionMode, Side};
use crate::input::events::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentKind {
    Perfect,
    Great,
    Good,
    Miss,
}

impl JudgmentKind {
    pub fn is_hit(self) -> bool {
        !matches!(self, JudgmentKind::Miss)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum NoteState {
    Pending,
    Hit,
    HoldActive { started_at_ms: f64 },
    HoldComplete,
    HoldReleasedEarly { started_at_ms: f64 },
    Missed,
}

/// One lane of one chart note, as tracked during a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeNote {
    /// Index of the source note in its track's note list.
    pub chart_index: usize,
    pub track: Track,
    pub lane: u8,
    pub ms: f64,
    pub sustain_ms: f64,
    pub classification: NoteClassification,
    pub powered: bool,
    state: NoteState,
}

impl RuntimeNote {
    pub fn state(&self) -> NoteState {
        self.state
    }

    /// The head has been consumed by a press (whatever happened to the tail).
    pub fn hit(&self) -> bool {
        matches!(
            self.state,
            NoteState::Hit
                | NoteState::HoldActive { .. }
                | NoteState::HoldComplete
                | NoteState::HoldReleasedEarly { .. }
        )
    }

    pub fn hold_started_at_ms(&self) -> Option<f64> {
        match self.state {
            NoteState::HoldActive { started_at_ms }
            | NoteState::HoldReleasedEarly { started_at_ms } => Some(started_at_ms),
            _ => None,
        }
    }

    pub fn released_early(&self) -> bool {
        matches!(self.state, NoteState::HoldReleasedEarly { .. })
    }

    pub fn is_pending(&self) -> bool {
        self.state == NoteState::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgmentResult {
    pub kind: JudgmentKind,
    pub score_delta: u32,
    /// Absolute timing error; for a tail miss, the hold time still owed.
    pub delta_ms: f64,
    pub lane: u8,
    pub track: Track,
    pub owner: Side,
    /// Index into the machine's runtime notes; `None` for a press with no candidate.
    pub note: Option<usize>,
    pub tail: bool,
}

impl JudgmentResult {
    /// Whether this miss is charged against a note (and therefore health).
    pub fn is_note_miss(&self) -> bool {
        self.kind == JudgmentKind::Miss && self.note.is_some()
    }
}

/// Per-session judgment state over every playable lane of the loaded tracks.
pub struct JudgeMachine {
    mode: SessionMode,
    windows: JudgeWindows,
    /// Sorted by `ms`.
    notes: Vec<RuntimeNote>,
    /// Runtime note indices per (track, lane), ascending by time.
    by_lane: HashMap<(Track, u8), Vec<usize>>,
    /// Everything before this index is no longer pending.
    sweep_cursor: usize,
    active_holds: Vec<usize>,
}

impl JudgeMachine {
    pub fn new(mode: SessionMode, windows: JudgeWindows) -> Self {
        Self {
            mode,
            windows,
            notes: Vec::new(),
            by_lane: HashMap::new(),
            sweep_cursor: 0,
            active_holds: Vec::new(),
        }
    }

    /// Adds every lane of `notes` as an independently judged runtime note.
    pub fn load_track(&mut self, track: Track, notes: &[Note]) {
        for (chart_index, note) in notes.iter().enumerate() {
            for lane in note.active_lanes() {
                self.notes.push(RuntimeNote {
                    chart_index,
                    track,
                    lane: lane as u8,
                    ms: note.ms,
                    sustain_ms: note.sustain_ms[lane],
                    classification: note.classification,
                    powered: note.powered,
                    state: NoteState::Pending,
                });
            }
        }
        self.notes.sort_by(|a, b| a.ms.total_cmp(&b.ms));
        self.reindex();
    }

    fn reindex(&mut self) {
        self.by_lane.clear();
        for (idx, note) in self.notes.iter().enumerate() {
            self.by_lane
                .entry((note.track, note.lane))
                .or_default()
                .push(idx);
        }
        self.sweep_cursor = self
            .notes
            .iter()
            .position(RuntimeNote::is_pending)
            .unwrap_or(self.notes.len());
        self.active_holds = self
            .notes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n.state, NoteState::HoldActive { .. }))
            .map(|(i, _)| i)
            .collect();
    }

    pub fn notes(&self) -> &[RuntimeNote] {
        &self.notes
    }

    pub fn windows(&self) -> &JudgeWindows {
        &self.windows
    }

    pub fn pending_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_pending()).count()
    }

    /// No note is pending and no hold is running.
    pub fn is_exhausted(&self) -> bool {
        self.sweep_cursor >= self.notes.len()
            && self.active_holds.is_empty()
            && self.pending_count() == 0
    }

    /// Misses every pending note more than the tolerance behind `clock_ms`.
    pub fn sweep_misses(&mut self, clock_ms: f64) -> Vec<JudgmentResult> {
        let mut results = Vec::new();
        let deadline = clock_ms - self.windows.miss_tolerance_ms;

        while self.sweep_cursor < self.notes.len() {
            let idx = self.sweep_cursor;
            let note = &mut self.notes[idx];
            if note.ms >= deadline {
                break;
            }
            if note.is_pending() {
                note.state = NoteState::Missed;
                debug!(
                    "NoteMiss track={:?} lane={} ms={:.1} (auto)",
                    note.track, note.lane, note.ms
                );
                results.push(JudgmentResult {
                    kind: JudgmentKind::Miss,
                    score_delta: 0,
                    delta_ms: clock_ms - note.ms,
                    lane: note.lane,
                    track: note.track,
                    owner: Side::owning(note.track, self.mode),
                    note: Some(idx),
                    tail: false,
                });
            }
            self.sweep_cursor += 1;
        }

        results
    }

    /// Judges a press against the nearest pending note in its lane.
    pub fn press(&mut self, track: Track, lane: u8, timestamp_ms: f64) -> JudgmentResult {
        let owner = Side::owning(track, self.mode);
        let Some(idx) = self.nearest_pending(track, lane, timestamp_ms) else {
            debug!("NoteMiss track={track:?} lane={lane} t={timestamp_ms:.1} (no candidate)");
            return JudgmentResult {
                kind: JudgmentKind::Miss,
                score_delta: 0,
                delta_ms: 0.0,
                lane,
                track,
                owner,
                note: None,
                tail: false,
            };
        };

        let note = &mut self.notes[idx];
        let delta_ms = (note.ms - timestamp_ms).abs();
        let kind = self.windows.classify(delta_ms);

        note.state = if !kind.is_hit() {
            debug!("NoteMiss track={track:?} lane={lane} delta={delta_ms:.1}");
            NoteState::Missed
        } else if note.sustain_ms > 0.0 {
            self.active_holds.push(idx);
            NoteState::HoldActive {
                started_at_ms: timestamp_ms,
            }
        } else {
            NoteState::Hit
        };
        self.advance_cursor();

        JudgmentResult {
            kind,
            score_delta: self.windows.score_for(kind),
            delta_ms,
            lane,
            track,
            owner,
            note: Some(idx),
            tail: false,
        }
    }

    /// Ends the running hold in the lane. Returns a tail miss when released early.
    pub fn release(&mut self, track: Track, lane: u8, timestamp_ms: f64) -> Option<JudgmentResult> {
        let pos = self.active_holds.iter().position(|&i| {
            let n = &self.notes[i];
            n.track == track && n.lane == lane
        })?;
        let idx = self.active_holds.remove(pos);
        let note = &mut self.notes[idx];
        let NoteState::HoldActive { started_at_ms } = note.state else {
            return None;
        };

        let held = timestamp_ms - started_at_ms;
        if held >= note.sustain_ms {
            note.state = NoteState::HoldComplete;
            return None;
        }

        note.state = NoteState::HoldReleasedEarly { started_at_ms };
        debug!("HoldReleasedEarly track={track:?} lane={lane} held={held:.1}/{:.1}", note.sustain_ms);
        Some(JudgmentResult {
            kind: JudgmentKind::Miss,
            score_delta: 0,
            delta_ms: note.sustain_ms - held,
            lane,
            track,
            owner: Side::owning(track, self.mode),
            note: Some(idx),
            tail: true,
        })
    }

    /// Finishes holds that reached their length by `clock_ms`. No score is involved.
    pub fn complete_holds(&mut self, clock_ms: f64) -> usize {
        let notes = &mut self.notes;
        let before = self.active_holds.len();
        self.active_holds.retain(|&i| {
            let note = &mut notes[i];
            let state = note.state;
            match state {
                NoteState::HoldActive { started_at_ms }
                    if clock_ms - started_at_ms >= note.sustain_ms =>
                {
                    note.state = NoteState::HoldComplete;
                    false
                }
                NoteState::HoldActive { .. } => true,
                _ => false,
            }
        });
        before - self.active_holds.len()
    }

    fn nearest_pending(&self, track: Track, lane: u8, timestamp_ms: f64) -> Option<usize> {
        let candidates = self.by_lane.get(&(track, lane))?;
        let mut best: Option<(usize, f64)> = None;
        for &idx in candidates {
            let note = &self.notes[idx];
            if !note.is_pending() {
                continue;
            }
            let distance = (note.ms - timestamp_ms).abs();
            match best {
                Some((_, d)) if d <= distance => {
                    // Lane lists are time-ordered: once distance grows past a later note, stop.
                    if note.ms > timestamp_ms {
                        break;
                    }
                }
                _ => best = Some((idx, distance)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn advance_cursor(&mut self) {
        while self.sweep_cursor < self.notes.len() && !self.notes[self.sweep_cursor].is_pending() {
            self.sweep_cursor += 1;
        }
    }
}
