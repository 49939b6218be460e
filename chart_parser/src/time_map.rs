use chart_schema::{TempoCheckpoint, TempoTimeline, Tick, TimeSignature, RESOLUTION};
use log::debug;

use crate::parser::Section;

/// Denominator exponent used when a `TS` row omits it (quarter-note based).
const DEFAULT_DENOMINATOR_POWER: u32 = 2;

pub(crate) struct SyncTrack {
    pub(crate) timeline: TempoTimeline,
    pub(crate) time_signatures: Vec<TimeSignature>,
}

/// Walks `[SyncTrack]` rows in tick order and accumulates tempo checkpoints.
pub(crate) fn build_sync_track(section: &Section) -> SyncTrack {
    let rows = section.rows_by_tick();

    let mut last = TempoCheckpoint {
        tick: 0,
        ms: 0.0,
        measure_length_ms: 0.0,
    };
    let mut checkpoints: Vec<TempoCheckpoint> = Vec::new();
    let mut signatures: Vec<(Tick, u32, u32)> = Vec::new();

    for (&tick, values) in &rows {
        for value in values {
            let mut parts = value.split_whitespace();
            match parts.next() {
                Some("B") => {
                    let Some(raw_bpm) = parts.next().and_then(|v| v.parse::<u64>().ok()) else {
                        debug!("[SyncTrack] tick {tick}: malformed tempo row {value:?}");
                        continue;
                    };
                    if raw_bpm == 0 {
                        debug!("[SyncTrack] tick {tick}: zero tempo ignored");
                        continue;
                    }
                    let checkpoint = TempoCheckpoint {
                        tick,
                        ms: position_ms(&last, tick),
                        measure_length_ms: measure_length_ms(raw_bpm),
                    };
                    // A second tempo at the same tick replaces the first.
                    if checkpoints.last().is_some_and(|c| c.tick == tick) {
                        checkpoints.pop();
                    }
                    checkpoints.push(checkpoint);
                    last = checkpoint;
                }
                Some("TS") => {
                    let Some(numerator) = parts.next().and_then(|v| v.parse::<u32>().ok()) else {
                        debug!("[SyncTrack] tick {tick}: malformed time signature {value:?}");
                        continue;
                    };
                    let power = parts
                        .next()
                        .and_then(|v| v.parse::<u32>().ok())
                        .unwrap_or(DEFAULT_DENOMINATOR_POWER);
                    signatures.push((tick, numerator, power));
                }
                _ => debug!("[SyncTrack] tick {tick}: unknown row {value:?}"),
            }
        }
    }

    let timeline = TempoTimeline::from_checkpoints(checkpoints);
    let time_signatures = signatures
        .into_iter()
        .map(|(tick, numerator, denominator_power)| TimeSignature {
            tick,
            ms: timeline.tick_to_ms(tick),
            numerator,
            denominator_power,
        })
        .collect();

    SyncTrack {
        timeline,
        time_signatures,
    }
}

/// Milliseconds per measure for a `B` value (BPM x 1000).
///
/// Always four quarter notes per measure, whatever the time signature says.
pub(crate) fn measure_length_ms(raw_bpm: u64) -> f64 {
    (60_000.0 / raw_bpm as f64) * 4_000.0
}

fn position_ms(previous: &TempoCheckpoint, tick: Tick) -> f64 {
    let measures = (tick - previous.tick) as f64 / (RESOLUTION * 4) as f64;
    previous.ms + previous.measure_length_ms * measures
}
