use super::*;
use crate::notes::{classify, PreviousNote, HOPO_THRESHOLD};
use chart_schema::{NoteClassification, EXPERT_SINGLE, HARD_SINGLE, OPEN_LANE};
use proptest::prelude::*;

fn chart_src(sync: &str, expert: &str) -> String {
    format!(
        "[Song]\n{{\n  Name = \"Test Song\"\n  Artist = \"Tester\"\n  Resolution = 192\n}}\n\
         [SyncTrack]\n{{\n{sync}}}\n\
         [ExpertSingle]\n{{\n{expert}}}\n"
    )
}

fn expert(chart: &Chart) -> &[chart_schema::Note] {
    chart.notes(EXPERT_SINGLE)
}

#[test]
fn single_tempo_notes_map_to_half_second_steps() {
    let src = chart_src(
        "  0 = TS 4\n  0 = B 120000\n",
        "  0 = N 0 0\n  192 = N 0 0\n  384 = N 0 0\n",
    );
    let chart = parse_str(&src).unwrap();
    let ms: Vec<f64> = expert(&chart).iter().map(|n| n.ms).collect();
    assert_eq!(ms, vec![0.0, 500.0, 1000.0]);
    assert_eq!(chart.tempo().tick_to_ms(192), 500.0);
}

#[test]
fn tempo_change_offsets_later_ticks() {
    let src = chart_src(
        "  0 = B 120000\n  768 = B 240000\n",
        "  768 = N 1 0\n  960 = N 2 0\n",
    );
    let chart = parse_str(&src).unwrap();
    let notes = expert(&chart);
    assert_eq!(notes[0].ms, 2000.0);
    assert_eq!(notes[1].ms, 2250.0);
    assert_eq!(chart.tempo().checkpoints().len(), 2);
    assert_eq!(chart.tempo().bpm_at(800), 240.0);
}

#[test]
fn ticks_before_first_tempo_row_collapse_to_zero() {
    let src = chart_src("  384 = B 120000\n", "  192 = N 0 0\n  576 = N 0 0\n");
    let chart = parse_str(&src).unwrap();
    let notes = expert(&chart);
    assert_eq!(notes[0].ms, 0.0);
    assert_eq!(notes[1].ms, 500.0);
}

#[test]
fn zero_and_malformed_tempo_rows_are_ignored() {
    let src = chart_src(
        "  0 = B 120000\n  192 = B 0\n  384 = B fast\n",
        "  768 = N 0 0\n",
    );
    let chart = parse_str(&src).unwrap();
    assert_eq!(chart.tempo().checkpoints().len(), 1);
    assert_eq!(expert(&chart)[0].ms, 2000.0);
}

#[test]
fn missing_song_section_fails_validation() {
    let src = "[SyncTrack]\n{\n  0 = B 120000\n}\n[ExpertSingle]\n{\n  0 = N 0 0\n}\n";
    let err = parse_str(src).unwrap_err();
    assert_eq!(err.code, "C1001");
    assert_eq!(err.kind, ChartErrorKind::Validation);
    assert!(err.is_validation_failure());
    assert_eq!(err.section.as_deref(), Some("Song"));
}

#[test]
fn missing_sync_track_fails_validation() {
    let src = "[Song]\n{\n  Name = \"x\"\n}\n[ExpertSingle]\n{\n  0 = N 0 0\n}\n";
    let err = parse_str(src).unwrap_err();
    assert_eq!(err.code, "C1002");
    assert!(err.to_string().contains("missing [SyncTrack] section"));
}

#[test]
fn missing_file_is_io_error() {
    let path = std::env::temp_dir().join(format!(
        "chart_parser_missing_{}.chart",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    let err = parse_file(&path).unwrap_err();
    assert_eq!(err.code, "C2001");
    assert_eq!(err.kind, ChartErrorKind::Io);
    assert!(err.file.is_some());
}

#[test]
fn garbage_lines_and_unknown_sections_are_skipped() {
    let src = "\u{feff}stray = line\r\n[Song]\r\n{\r\n  Name = \"x\"\r\n}\r\n\
               [SyncTrack]\r\n{\r\n  0 = B 120000\r\n  this is not a row\r\n}\r\n\
               [Mystery]\r\n{\r\n  0 = Q 1 2\r\n}\r\n\
               [ExpertSingle]\r\n{\r\n  0 = N 0 0\r\n  192 = N 9 0\r\n  abc = N 1 0\r\n  384 = N 2\r\n  576 = X 1 1\r\n}\r\n";
    let chart = parse_str(src).unwrap();
    let notes = expert(&chart);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].tick, 0);
}

#[test]
fn empty_or_absent_difficulty_is_valid() {
    let src = chart_src("  0 = B 120000\n", "");
    let chart = parse_str(&src).unwrap();
    assert!(expert(&chart).is_empty());
    assert!(chart.track(EXPERT_SINGLE).is_some());
    assert!(chart.notes(HARD_SINGLE).is_empty());
    assert!(chart.track(HARD_SINGLE).is_none());
}

#[test]
fn extra_sections_are_parsed_on_request() {
    let src = format!(
        "{}[ExpertDrums]\n{{\n  0 = N 0 0\n  96 = N 1 0\n}}\n",
        chart_src("  0 = B 120000\n", "")
    );
    let plain = parse_str(&src).unwrap();
    assert!(plain.track("ExpertDrums").is_none());

    let chart =
        parse_str_with_options(&src, &ParseOptions::default().with_section("ExpertDrums")).unwrap();
    assert_eq!(chart.notes("ExpertDrums").len(), 2);
    assert_eq!(chart.notes("ExpertDrums")[1].ms, 250.0);
}

#[test]
fn sustain_uses_tempo_at_note_tick() {
    let src = chart_src("  0 = B 120000\n", "  0 = N 0 768\n  768 = N 1 96\n");
    let chart = parse_str(&src).unwrap();
    let notes = expert(&chart);
    assert_eq!(notes[0].sustain_ms[0], 2000.0);
    assert_eq!(notes[1].sustain_ms[1], 250.0);
    assert_eq!(notes[1].sustain_ms[0], 0.0);
}

#[test]
fn sustain_is_independent_of_earlier_checkpoint_offsets() {
    let slow_intro = chart_src(
        "  0 = B 60000\n  768 = B 120000\n",
        "  1536 = N 0 384\n",
    );
    let fast_intro = chart_src(
        "  0 = B 240000\n  768 = B 120000\n",
        "  1536 = N 0 384\n",
    );
    let a = parse_str(&slow_intro).unwrap();
    let b = parse_str(&fast_intro).unwrap();
    assert_ne!(expert(&a)[0].ms, expert(&b)[0].ms);
    assert_eq!(expert(&a)[0].sustain_ms[0], 1000.0);
    assert_eq!(expert(&a)[0].sustain_ms[0], expert(&b)[0].sustain_ms[0]);
}

#[test]
fn open_and_tap_codes() {
    let src = chart_src(
        "  0 = B 120000\n",
        "  0 = N 7 192\n  384 = N 1 0\n  384 = N 6 0\n",
    );
    let chart = parse_str(&src).unwrap();
    let notes = expert(&chart);
    assert!(notes[0].is_open());
    assert_eq!(notes[0].lane_count(), 1);
    assert_eq!(notes[0].sustain_ms[OPEN_LANE], 500.0);
    assert_eq!(notes[1].classification, NoteClassification::Tap);
}

#[test]
fn rows_without_lanes_emit_no_note() {
    let src = chart_src(
        "  0 = B 120000\n",
        "  0 = N 0 0\n  96 = N 5 0\n  150 = N 6 0\n  192 = S 2 96\n  384 = N 1 0\n",
    );
    let chart = parse_str(&src).unwrap();
    let ticks: Vec<u64> = expert(&chart).iter().map(|n| n.tick).collect();
    assert_eq!(ticks, vec![0, 384]);
}

#[test]
fn natural_hammer_on_needs_single_new_lane_within_threshold() {
    let src = chart_src(
        "  0 = B 120000\n",
        "  0 = N 0 0\n  64 = N 1 0\n  128 = N 1 0\n  192 = N 2 0\n  192 = N 3 0\n  \
         257 = N 4 0\n  400 = N 0 0\n",
    );
    let chart = parse_str(&src).unwrap();
    let kinds: Vec<NoteClassification> = expert(&chart).iter().map(|n| n.classification).collect();
    assert_eq!(
        kinds,
        vec![
            NoteClassification::HammerOn, // first note, new lane near tick 0
            NoteClassification::HammerOn, // 64 ticks, new lane
            NoteClassification::Strum,    // same lane
            NoteClassification::Strum,    // chord
            NoteClassification::HammerOn, // 65 ticks, exactly the threshold
            NoteClassification::Strum,    // too far
        ]
    );
    assert_eq!(HOPO_THRESHOLD, 65);
}

#[test]
fn first_note_is_measured_from_an_empty_row_at_tick_zero() {
    let src = chart_src("  0 = B 120000\n", "  0 = N 0 0\n  48 = N 1 0\n");
    let chart = parse_str(&src).unwrap();
    let kinds: Vec<NoteClassification> = expert(&chart).iter().map(|n| n.classification).collect();
    assert_eq!(kinds, vec![NoteClassification::HammerOn, NoteClassification::HammerOn]);

    let late = chart_src("  0 = B 120000\n", "  66 = N 0 0\n");
    let chart = parse_str(&late).unwrap();
    assert_eq!(expert(&chart)[0].classification, NoteClassification::Strum);

    let chord = chart_src("  0 = B 120000\n", "  0 = N 0 0\n  0 = N 1 0\n");
    let chart = parse_str(&chord).unwrap();
    assert_eq!(expert(&chart)[0].classification, NoteClassification::Strum);
}

#[test]
fn forced_flip_inverts_natural_classification() {
    let src = chart_src(
        "  0 = B 120000\n",
        "  0 = N 0 0\n  64 = N 1 0\n  64 = N 5 0\n  400 = N 2 0\n  400 = N 5 0\n",
    );
    let chart = parse_str(&src).unwrap();
    let notes = expert(&chart);
    assert_eq!(notes[1].classification, NoteClassification::Strum);
    assert_eq!(notes[2].classification, NoteClassification::HammerOn);
}

#[test]
fn classification_is_deterministic() {
    let prev = PreviousNote { tick: 0, lane_mask: 0b1 };
    for forced in [false, true] {
        let first = classify(48, 0b10, 1, prev, false, forced);
        for _ in 0..8 {
            assert_eq!(classify(48, 0b10, 1, prev, false, forced), first);
        }
    }
    assert_eq!(classify(48, 0b10, 1, prev, true, true), NoteClassification::Tap);
    assert_eq!(
        classify(48, 0b10, 1, PreviousNote::START, false, false),
        NoteClassification::HammerOn
    );
    assert_eq!(
        classify(200, 0b10, 1, PreviousNote::START, false, false),
        NoteClassification::Strum
    );
}

#[test]
fn power_phrase_marks_half_open_interval() {
    let src = chart_src(
        "  0 = B 120000\n",
        "  0 = N 0 0\n  192 = S 2 384\n  192 = N 1 0\n  384 = N 2 0\n  576 = N 3 0\n",
    );
    let chart = parse_str(&src).unwrap();
    let powered: Vec<bool> = expert(&chart).iter().map(|n| n.powered).collect();
    assert_eq!(powered, vec![false, true, true, false]);

    let track = chart.track(EXPERT_SINGLE).unwrap();
    assert_eq!(track.phrases.len(), 1);
    assert_eq!(track.phrases[0].end_tick, 576);
}

#[test]
fn later_phrase_replaces_active_one() {
    let src = chart_src(
        "  0 = B 120000\n",
        "  0 = S 2 768\n  0 = N 0 0\n  192 = S 2 96\n  384 = N 1 0\n",
    );
    let chart = parse_str(&src).unwrap();
    let notes = expert(&chart);
    assert!(notes[0].powered);
    assert!(!notes[1].powered);
}

#[test]
fn events_split_kind_and_value_and_collapse_duplicates() {
    let src = format!(
        "{}[Events]\n{{\n  768 = E \"section Verse 1\"\n  768 = E \"section Verse 1\"\n  \
         768 = E \"lighting (flare)\"\n  0 = E \"end\"\n  10 = junk\n}}\n",
        chart_src("  0 = B 120000\n", "")
    );
    let chart = parse_str(&src).unwrap();
    let events = chart.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].kind, "end");
    assert_eq!(events[0].value, "");
    assert_eq!(events[1].kind, "section");
    assert_eq!(events[1].value, "Verse 1");
    assert_eq!(events[1].ms, 2000.0);
    assert_eq!(events[2].kind, "lighting");
}

#[test]
fn time_signatures_default_to_quarter_note_denominator() {
    let src = chart_src(
        "  0 = TS 4\n  0 = B 120000\n  768 = TS 6 3\n",
        "",
    );
    let chart = parse_str(&src).unwrap();
    let sigs = chart.time_signatures();
    assert_eq!(sigs.len(), 2);
    assert_eq!(sigs[0].denominator_power, 2);
    assert_eq!(sigs[0].denominator(), 4);
    assert_eq!(sigs[1].numerator, 6);
    assert_eq!(sigs[1].denominator(), 8);
    assert_eq!(sigs[1].ms, 2000.0);
}

#[test]
fn metadata_strips_quotes_and_keeps_first_value() {
    let src = "[Song]\n{\n  Name = \"Bear Run\"\n  Artist = \"Nobody\"\n  Name = \"Other\"\n  Offset = 0.25\n}\n";
    let meta = parse_metadata(src);
    assert_eq!(meta.name(), Some("Bear Run"));
    assert_eq!(meta.artist(), Some("Nobody"));
    assert_eq!(meta.offset_sec(), Some(0.25));
    assert_eq!(meta.charter(), None);

    assert_eq!(parse_metadata("no sections here").iter().count(), 0);
}

proptest! {
    #[test]
    fn tick_to_ms_is_monotonic(
        tempos in proptest::collection::vec((0u64..20_000, 30_000u64..400_000), 1..8),
        a in 0u64..40_000,
        b in 0u64..40_000,
    ) {
        let sync: String = tempos
            .iter()
            .map(|(tick, bpm)| format!("  {tick} = B {bpm}\n"))
            .collect();
        let chart = parse_str(&chart_src(&sync, "")).unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(chart.tempo().tick_to_ms(lo) <= chart.tempo().tick_to_ms(hi));
    }
}
