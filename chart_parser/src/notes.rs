use chart_schema::{
    Note, NoteClassification, PowerPhrase, TempoTimeline, Tick, Track, LANE_COUNT, OPEN_LANE,
    RESOLUTION,
};
use log::debug;

use crate::parser::Section;

/// Maximum tick gap for a natural hammer-on/pull-off.
pub(crate) const HOPO_THRESHOLD: Tick = RESOLUTION / 3 + 1;

const FORCE_FLIP_CODE: u32 = 5;
const TAP_CODE: u32 = 6;
const OPEN_CODE: u32 = 7;

/// The note emitted just before the one being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PreviousNote {
    pub(crate) tick: Tick,
    pub(crate) lane_mask: u8,
}

impl PreviousNote {
    /// Stands in for the predecessor of a track's first note: an empty row at tick 0.
    pub(crate) const START: Self = Self {
        tick: 0,
        lane_mask: 0,
    };
}

#[derive(Debug, Default)]
struct Row {
    lanes: [bool; LANE_COUNT],
    sustain_ms: [f64; LANE_COUNT],
    tap: bool,
    forced: bool,
}

impl Row {
    fn lane_count(&self) -> usize {
        self.lanes.iter().filter(|on| **on).count()
    }

    fn lane_mask(&self) -> u8 {
        self.lanes
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(0u8, |mask, (i, _)| mask | (1 << i))
    }

    fn set_lane(&mut self, lane: usize, sustain_ms: f64) {
        self.lanes[lane] = true;
        self.sustain_ms[lane] = if sustain_ms > 0.0 { sustain_ms } else { 0.0 };
    }
}

/// Builds one difficulty track: typed notes plus the power phrases seen.
pub(crate) fn build_track(section: &Section, timeline: &TempoTimeline) -> Track {
    let mut notes = Vec::new();
    let mut phrases = Vec::new();
    let mut active_phrase: Option<PowerPhrase> = None;
    let mut previous = PreviousNote::START;

    for (tick, values) in section.rows_by_tick() {
        let mut row = Row::default();

        for value in values {
            let mut parts = value.split_whitespace();
            match parts.next() {
                Some("N") => {
                    let (Some(code), Some(duration)) = (
                        parts.next().and_then(|v| v.parse::<u32>().ok()),
                        parts.next().and_then(|v| v.parse::<Tick>().ok()),
                    ) else {
                        debug!("[{}] tick {tick}: malformed note row {value:?}", section.name);
                        continue;
                    };
                    let sustain = || timeline.sustain_to_ms(tick, duration);
                    match code {
                        0..=4 => row.set_lane(code as usize, sustain()),
                        FORCE_FLIP_CODE => row.forced = true,
                        TAP_CODE => row.tap = true,
                        OPEN_CODE => row.set_lane(OPEN_LANE, sustain()),
                        _ => debug!("[{}] tick {tick}: unknown lane code {code}", section.name),
                    }
                }
                Some("S") => {
                    let (Some(_phrase_id), Some(duration)) = (
                        parts.next().and_then(|v| v.parse::<u32>().ok()),
                        parts.next().and_then(|v| v.parse::<Tick>().ok()),
                    ) else {
                        debug!("[{}] tick {tick}: malformed phrase row {value:?}", section.name);
                        continue;
                    };
                    let phrase = PowerPhrase {
                        start_tick: tick,
                        end_tick: tick.saturating_add(duration),
                    };
                    phrases.push(phrase);
                    active_phrase = Some(phrase);
                }
                // Track-local events (solo markers etc.) carry nothing playable.
                Some("E") => {}
                _ => debug!("[{}] tick {tick}: unknown row {value:?}", section.name),
            }
        }

        if row.lane_count() == 0 {
            continue;
        }

        let lane_mask = row.lane_mask();
        let classification = classify(
            tick,
            lane_mask,
            row.lane_count(),
            previous,
            row.tap,
            row.forced,
        );
        notes.push(Note {
            tick,
            ms: timeline.tick_to_ms(tick),
            lanes: row.lanes,
            sustain_ms: row.sustain_ms,
            classification,
            powered: active_phrase.is_some_and(|p| p.contains(tick)),
        });
        previous = PreviousNote { tick, lane_mask };
    }

    Track { notes, phrases }
}

/// Strum vs hammer-on with the forced flip applied; tap rows are always taps.
pub(crate) fn classify(
    tick: Tick,
    lane_mask: u8,
    lane_count: usize,
    previous: PreviousNote,
    tap: bool,
    forced: bool,
) -> NoteClassification {
    if tap {
        return NoteClassification::Tap;
    }

    let natural_hopo = lane_count == 1
        && tick.saturating_sub(previous.tick) <= HOPO_THRESHOLD
        && lane_mask != previous.lane_mask;

    if natural_hopo != forced {
        NoteClassification::HammerOn
    } else {
        NoteClassification::Strum
    }
}
