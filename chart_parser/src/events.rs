use chart_schema::{ChartEvent, TempoTimeline};
use log::debug;

use crate::parser::{unquote, Section};

/// `E "<kind> <value>"` rows of `[Events]`. Identical events on one tick are
/// kept once.
pub(crate) fn collect_events(section: &Section, timeline: &TempoTimeline) -> Vec<ChartEvent> {
    let mut out: Vec<ChartEvent> = Vec::new();

    for (tick, values) in section.rows_by_tick() {
        for value in values {
            let Some(body) = value.strip_prefix("E ") else {
                debug!("[Events] tick {tick}: unknown row {value:?}");
                continue;
            };
            let text = unquote(body);
            let (kind, rest) = text.split_once(' ').unwrap_or((text, ""));
            let event = ChartEvent {
                tick,
                ms: timeline.tick_to_ms(tick),
                kind: kind.to_string(),
                value: rest.trim().to_string(),
            };

            let duplicate = out
                .iter()
                .rev()
                .take_while(|e| e.tick == tick)
                .any(|e| e.kind == event.kind && e.value == event.value);
            if !duplicate {
                out.push(event);
            }
        }
    }

    out
}
