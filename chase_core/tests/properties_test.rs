use chase_core::config::{ChaseTuning, JudgeWindows};
use chase_core::gameplay::judge::{JudgeMachine, JudgmentKind};
use chase_core::gameplay::progress::{ChaseProgress, ProgressPolicy};
use chase_core::gameplay::{SessionMode, Side};
use chase_core::input::events::Track;
use chart_schema::{Note, NoteClassification, LANE_COUNT};
use proptest::prelude::*;
use std::collections::HashSet;

fn kind() -> impl Strategy<Value = JudgmentKind> {
    prop_oneof![
        Just(JudgmentKind::Perfect),
        Just(JudgmentKind::Great),
        Just(JudgmentKind::Good),
        Just(JudgmentKind::Miss),
    ]
}

fn lane_note(ms: f64, lane: usize) -> Note {
    let mut lanes = [false; LANE_COUNT];
    lanes[lane] = true;
    Note {
        tick: 0,
        ms,
        lanes,
        sustain_ms: [0.0; LANE_COUNT],
        classification: NoteClassification::Strum,
        powered: false,
    }
}

proptest! {
    #[test]
    fn fixed_rate_progress_stays_in_bounds(
        steps in prop::collection::vec((kind(), any::<bool>(), 0.0f64..5_000.0, any::<bool>()), 0..400)
    ) {
        let mut chase = ChaseProgress::new(ProgressPolicy::FixedRate, ChaseTuning::default());
        for (kind, bear, elapsed, boost) in steps {
            chase.set_boost(boost);
            chase.on_judgment(kind, if bear { Side::Bear } else { Side::Man });
            chase.advance(elapsed);
            let s = chase.state();
            prop_assert!((0.0..=100.0).contains(&s.bear_progress));
            prop_assert!((0.0..=100.0).contains(&s.man_progress));
            prop_assert_eq!(s.game_over, s.outcome.is_some());
        }
    }

    #[test]
    fn differential_progress_stays_in_bounds(
        scores in prop::collection::vec((0u64..1_000_000, 0u64..1_000_000), 1..50)
    ) {
        let mut chase = ChaseProgress::new(ProgressPolicy::Differential, ChaseTuning::default());
        for (a, b) in scores {
            chase.apply_scores(a, b);
            let s = chase.state();
            prop_assert!((0.0..=100.0).contains(&s.bear_progress));
            prop_assert!((0.0..=100.0).contains(&s.man_progress));
        }
    }

    #[test]
    fn a_note_is_judged_at_most_once(
        note_times in prop::collection::vec((0.0f64..10_000.0, 0usize..5), 1..40),
        presses in prop::collection::vec((0.0f64..10_000.0, 0u8..5), 0..80),
        sweep_at in 0.0f64..12_000.0,
    ) {
        let notes: Vec<Note> = note_times.iter().map(|&(ms, lane)| lane_note(ms, lane)).collect();
        let mut judge = JudgeMachine::new(SessionMode::SinglePlayer, JudgeWindows::default());
        judge.load_track(Track::Guitar, &notes);

        let mut seen = HashSet::new();
        for (t, lane) in presses {
            let result = judge.press(Track::Guitar, lane, t);
            if let Some(idx) = result.note {
                prop_assert!(seen.insert(idx), "note {} judged twice", idx);
            }
        }
        for result in judge.sweep_misses(sweep_at) {
            let idx = result.note.expect("sweep always names a note");
            prop_assert!(seen.insert(idx), "note {} judged twice", idx);
        }
        prop_assert!(seen.len() <= notes.len());
    }
}
