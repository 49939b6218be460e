use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Tick = u64;
pub type Millis = f64;

/// Ticks per quarter note. Fixed for this chart dialect; declared resolutions are ignored.
pub const RESOLUTION: Tick = 192;

/// Lanes 0-4 are frets/pads, lane 5 is the open lane.
pub const LANE_COUNT: usize = 6;
pub const OPEN_LANE: usize = 5;

pub const EXPERT_SINGLE: &str = "ExpertSingle";
pub const HARD_SINGLE: &str = "HardSingle";
pub const NORMAL_SINGLE: &str = "NormalSingle";
pub const EASY_SINGLE: &str = "EasySingle";

pub const DEFAULT_DIFFICULTIES: [&str; 4] = [EXPERT_SINGLE, HARD_SINGLE, NORMAL_SINGLE, EASY_SINGLE];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TempoCheckpoint {
    pub tick: Tick,
    pub ms: Millis,
    pub measure_length_ms: Millis,
}

impl TempoCheckpoint {
    /// Tempo implied by the measure length under the fixed four-beat measure.
    pub fn bpm(&self) -> f64 {
        if self.measure_length_ms > 0.0 {
            240_000.0 / self.measure_length_ms
        } else {
            0.0
        }
    }
}

/// Piecewise-constant tempo map. Always holds a checkpoint at tick 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "Vec<TempoCheckpoint>", into = "Vec<TempoCheckpoint>")]
pub struct TempoTimeline {
    checkpoints: Vec<TempoCheckpoint>,
}

impl Default for TempoTimeline {
    fn default() -> Self {
        Self::from_checkpoints(Vec::new())
    }
}

impl From<Vec<TempoCheckpoint>> for TempoTimeline {
    fn from(checkpoints: Vec<TempoCheckpoint>) -> Self {
        Self::from_checkpoints(checkpoints)
    }
}

impl From<TempoTimeline> for Vec<TempoCheckpoint> {
    fn from(timeline: TempoTimeline) -> Self {
        timeline.checkpoints
    }
}

impl TempoTimeline {
    /// Sorts by tick, keeps the first checkpoint per tick and inserts the
    /// synthetic tick-0 checkpoint (zero measure length) when none is given.
    pub fn from_checkpoints(mut checkpoints: Vec<TempoCheckpoint>) -> Self {
        checkpoints.sort_by_key(|c| c.tick);
        checkpoints.dedup_by_key(|c| c.tick);
        if checkpoints.first().map_or(true, |c| c.tick != 0) {
            checkpoints.insert(
                0,
                TempoCheckpoint {
                    tick: 0,
                    ms: 0.0,
                    measure_length_ms: 0.0,
                },
            );
        }
        Self { checkpoints }
    }

    pub fn checkpoints(&self) -> &[TempoCheckpoint] {
        &self.checkpoints
    }

    /// Last checkpoint with `checkpoint.tick <= tick`.
    pub fn checkpoint_at(&self, tick: Tick) -> &TempoCheckpoint {
        let idx = self.checkpoints.partition_point(|c| c.tick <= tick);
        // idx >= 1 because checkpoints[0].tick == 0
        &self.checkpoints[idx.saturating_sub(1)]
    }

    /// Absolute position of `tick` in milliseconds.
    pub fn tick_to_ms(&self, tick: Tick) -> Millis {
        let cp = self.checkpoint_at(tick);
        cp.ms + cp.measure_length_ms * measures(tick - cp.tick)
    }

    /// Length in milliseconds of a `duration` starting at `tick`.
    ///
    /// Uses only the tempo in effect at `tick`; the checkpoint's absolute
    /// offset is never added.
    pub fn sustain_to_ms(&self, tick: Tick, duration: Tick) -> Millis {
        let cp = self.checkpoint_at(tick);
        cp.measure_length_ms * measures(duration)
    }

    /// Inverse of [`tick_to_ms`](Self::tick_to_ms). Returns fractional ticks.
    ///
    /// Positions inside a zero-length stretch resolve to the start of that stretch.
    pub fn ms_to_tick(&self, ms: Millis) -> f64 {
        let idx = self.checkpoints.partition_point(|c| c.ms <= ms);
        let cp = &self.checkpoints[idx.saturating_sub(1)];
        if cp.measure_length_ms <= 0.0 || ms <= cp.ms {
            return cp.tick as f64;
        }
        cp.tick as f64 + (ms - cp.ms) / cp.measure_length_ms * (RESOLUTION * 4) as f64
    }

    pub fn bpm_at(&self, tick: Tick) -> f64 {
        self.checkpoint_at(tick).bpm()
    }
}

fn measures(ticks: Tick) -> f64 {
    ticks as f64 / (RESOLUTION * 4) as f64
}

/// Informational only; measure math always assumes four beats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeSignature {
    pub tick: Tick,
    pub ms: Millis,
    pub numerator: u32,
    pub denominator_power: u32,
}

impl TimeSignature {
    pub fn denominator(&self) -> u32 {
        1u32.checked_shl(self.denominator_power).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartEvent {
    pub tick: Tick,
    pub ms: Millis,
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NoteClassification {
    Strum,
    HammerOn,
    Tap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub tick: Tick,
    pub ms: Millis,
    pub lanes: [bool; LANE_COUNT],
    pub sustain_ms: [Millis; LANE_COUNT],
    pub classification: NoteClassification,
    pub powered: bool,
}

impl Note {
    pub fn lane_mask(&self) -> u8 {
        self.lanes
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(0u8, |mask, (i, _)| mask | (1 << i))
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.iter().filter(|on| **on).count()
    }

    pub fn active_lanes(&self) -> impl Iterator<Item = usize> + '_ {
        self.lanes
            .iter()
            .enumerate()
            .filter_map(|(i, on)| on.then_some(i))
    }

    pub fn is_open(&self) -> bool {
        self.lanes[OPEN_LANE]
    }

    pub fn longest_sustain_ms(&self) -> Millis {
        self.sustain_ms.iter().copied().fold(0.0, f64::max)
    }
}

/// Half-open tick interval `[start_tick, end_tick)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PowerPhrase {
    pub start_tick: Tick,
    pub end_tick: Tick,
}

impl PowerPhrase {
    pub fn contains(&self, tick: Tick) -> bool {
        self.start_tick <= tick && tick < self.end_tick
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub notes: Vec<Note>,
    pub phrases: Vec<PowerPhrase>,
}

/// Contents of the `[Song]` section, first value per key with quotes stripped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SongMetadata {
    fields: BTreeMap<String, String>,
}

impl SongMetadata {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("Name")
    }

    pub fn artist(&self) -> Option<&str> {
        self.get("Artist")
    }

    pub fn charter(&self) -> Option<&str> {
        self.get("Charter")
    }

    /// Audio offset in seconds, if declared and numeric.
    pub fn offset_sec(&self) -> Option<f64> {
        self.get("Offset").and_then(|v| v.trim().parse().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A fully interpreted chart. Read-only once built.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Chart {
    metadata: SongMetadata,
    tempo: TempoTimeline,
    time_signatures: Vec<TimeSignature>,
    events: Vec<ChartEvent>,
    tracks: BTreeMap<String, Track>,
}

impl Chart {
    pub fn new(
        metadata: SongMetadata,
        tempo: TempoTimeline,
        time_signatures: Vec<TimeSignature>,
        events: Vec<ChartEvent>,
        tracks: BTreeMap<String, Track>,
    ) -> Self {
        Self {
            metadata,
            tempo,
            time_signatures,
            events,
            tracks,
        }
    }

    pub fn metadata(&self) -> &SongMetadata {
        &self.metadata
    }

    pub fn tempo(&self) -> &TempoTimeline {
        &self.tempo
    }

    pub fn time_signatures(&self) -> &[TimeSignature] {
        &self.time_signatures
    }

    pub fn events(&self) -> &[ChartEvent] {
        &self.events
    }

    pub fn track(&self, difficulty: &str) -> Option<&Track> {
        self.tracks.get(difficulty)
    }

    /// Notes of `difficulty`; empty when the section is absent.
    pub fn notes(&self, difficulty: &str) -> &[Note] {
        self.tracks
            .get(difficulty)
            .map(|t| t.notes.as_slice())
            .unwrap_or(&[])
    }

    pub fn difficulties(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }
}
