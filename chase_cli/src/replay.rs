use std::{fmt::Write as _, fs, path::PathBuf};

use anyhow::{bail, Context};
use chart_schema::Chart;
use chase_core::config::GameConfig;
use chase_core::gameplay::judge::JudgmentResult;
use chase_core::gameplay::SessionMode;
use chase_core::input::events::{InputEvent, Track};
use chase_core::time::ManualClock;
use chase_core::GameSession;

use crate::ModeArg;

pub(crate) struct ReplayArgs {
    pub chart: PathBuf,
    pub inputs: PathBuf,
    pub difficulty: String,
    pub mode: ModeArg,
    pub config: Option<PathBuf>,
}

impl From<ModeArg> for SessionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => SessionMode::SinglePlayer,
            ModeArg::Differential => SessionMode::CompetitiveDifferential,
            ModeArg::FixedRate => SessionMode::CompetitiveFixedRate,
        }
    }
}

pub(crate) fn run(args: &ReplayArgs) -> anyhow::Result<()> {
    let chart = chart_parser::parse_file(&args.chart)
        .with_context(|| format!("parse failed: {}", args.chart.display()))?;
    let Some(track) = chart.track(&args.difficulty) else {
        bail!(
            "difficulty {} not found in {} (available: {})",
            args.difficulty,
            args.chart.display(),
            chart.difficulties().collect::<Vec<_>>().join(", ")
        );
    };

    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("config load failed: {}", path.display()))?,
        None => GameConfig::default(),
    };

    let text = fs::read_to_string(&args.inputs)
        .with_context(|| format!("failed to read: {}", args.inputs.display()))?;
    let mut inputs: Vec<InputEvent> = serde_json::from_str(&text)
        .with_context(|| format!("invalid input recording: {}", args.inputs.display()))?;
    inputs.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));

    // Both competitive sides play the same difficulty.
    let mode = SessionMode::from(args.mode);
    let mut session = GameSession::new(mode, &config).with_track(Track::Guitar, &track.notes);
    if mode != SessionMode::SinglePlayer {
        session.load_track(Track::Drums, &track.notes);
    }

    let clock = ManualClock::new(0.0);
    for event in inputs {
        session.push_input(event);
        clock.advance_to(event.timestamp_ms);
        for judgment in session.tick(&clock).judgments {
            println!("{}", format_judgment(&judgment));
        }
    }

    let end_ms = track
        .notes
        .iter()
        .map(|n| n.ms + n.longest_sustain_ms())
        .fold(0.0, f64::max)
        + config.judge.miss_tolerance_ms
        + 1.0;
    clock.advance_to(end_ms);
    let frame = session.tick(&clock);
    for judgment in &frame.judgments {
        println!("{}", format_judgment(judgment));
    }

    let json = serde_json::to_string_pretty(&frame.state).context("failed to serialize state")?;
    println!("{json}");
    Ok(())
}

fn format_judgment(j: &JudgmentResult) -> String {
    let track = match j.track {
        Track::Guitar => "guitar",
        Track::Drums => "drums",
    };
    format!(
        "{track} lane={} {:?}{} +{} delta={:.1}ms",
        j.lane,
        j.kind,
        if j.tail { " (tail)" } else { "" },
        j.score_delta,
        j.delta_ms
    )
}

pub(crate) fn describe(chart: &Chart) -> String {
    let mut out = String::new();
    let meta = chart.metadata();
    let _ = writeln!(out, "name: {}", meta.name().unwrap_or("-"));
    let _ = writeln!(out, "artist: {}", meta.artist().unwrap_or("-"));
    let _ = writeln!(out, "charter: {}", meta.charter().unwrap_or("-"));

    let checkpoints = chart.tempo().checkpoints();
    let bpms = checkpoints
        .iter()
        .filter(|c| c.measure_length_ms > 0.0)
        .map(|c| c.bpm());
    let (min, max) = bpms.fold((f64::INFINITY, 0.0f64), |(lo, hi), b| (lo.min(b), hi.max(b)));
    if max > 0.0 {
        let _ = writeln!(
            out,
            "tempo: {} checkpoints, {min:.3}-{max:.3} bpm",
            checkpoints.len()
        );
    } else {
        let _ = writeln!(out, "tempo: none");
    }
    let _ = writeln!(out, "events: {}", chart.events().len());

    for name in chart.difficulties() {
        let Some(track) = chart.track(name) else {
            continue;
        };
        let hopos = track
            .notes
            .iter()
            .filter(|n| n.classification == chart_schema::NoteClassification::HammerOn)
            .count();
        let _ = writeln!(
            out,
            "{name}: {} notes ({hopos} hopo), {} power phrases",
            track.notes.len(),
            track.phrases.len()
        );
    }
    out
}
