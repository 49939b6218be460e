//! Interpreter for the sectioned `.chart` text format.
//!
//! Parsing is lenient: malformed rows, unknown sections and unknown lane codes
//! are skipped. The only hard failure is a chart without `[Song]` or
//! `[SyncTrack]`.

use std::{collections::BTreeMap, fs, path::Path};

use chart_schema::{Chart, SongMetadata, Track, DEFAULT_DIFFICULTIES};
use log::{info, warn};

mod error;
mod events;
mod notes;
mod parser;
mod time_map;

pub use error::{ChartError, ChartErrorKind};

use crate::{
    events::collect_events,
    notes::build_track,
    parser::{scan_sections, unquote, RawChart, Section},
    time_map::build_sync_track,
};

pub const SONG_SECTION: &str = "Song";
pub const SYNC_TRACK_SECTION: &str = "SyncTrack";
pub const EVENTS_SECTION: &str = "Events";

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Instrument/difficulty sections to interpret besides the four `*Single` ones.
    pub extra_sections: Vec<String>,
}

impl ParseOptions {
    pub fn with_section(mut self, name: impl Into<String>) -> Self {
        self.extra_sections.push(name.into());
        self
    }
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Chart, ChartError> {
    parse_file_with_options(path, &ParseOptions::default())
}

pub fn parse_file_with_options(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> Result<Chart, ChartError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        ChartError::new("C2001", format!("failed to read chart: {e}"))
            .with_file(path.display().to_string())
    })?;
    let src = String::from_utf8(bytes).map_err(|e| {
        ChartError::new("C2002", format!("chart is not valid UTF-8: {e}"))
            .with_file(path.display().to_string())
    })?;
    parse_str_with_options(&src, options).map_err(|e| e.with_file(path.display().to_string()))
}

pub fn parse_str(src: &str) -> Result<Chart, ChartError> {
    parse_str_with_options(src, &ParseOptions::default())
}

pub fn parse_str_with_options(src: &str, options: &ParseOptions) -> Result<Chart, ChartError> {
    let raw = scan_sections(src);
    let song = metadata_of(required(&raw, "C1001", SONG_SECTION)?);
    let sync = build_sync_track(required(&raw, "C1002", SYNC_TRACK_SECTION)?);

    let events = raw
        .section(EVENTS_SECTION)
        .map(|s| collect_events(s, &sync.timeline))
        .unwrap_or_default();

    let mut tracks: BTreeMap<String, Track> = BTreeMap::new();
    let requested = DEFAULT_DIFFICULTIES
        .iter()
        .copied()
        .chain(options.extra_sections.iter().map(String::as_str));
    for name in requested {
        if tracks.contains_key(name) {
            continue;
        }
        if let Some(section) = raw.section(name) {
            tracks.insert(name.to_string(), build_track(section, &sync.timeline));
        }
    }

    info!(
        "chart parsed: {} tempo checkpoints, {} events, tracks [{}]",
        sync.timeline.checkpoints().len(),
        events.len(),
        tracks
            .iter()
            .map(|(name, t)| format!("{name}: {} notes", t.notes.len()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(Chart::new(
        song,
        sync.timeline,
        sync.time_signatures,
        events,
        tracks,
    ))
}

/// Reads only the `[Song]` section. Never fails; a missing section yields empty metadata.
pub fn parse_metadata(src: &str) -> SongMetadata {
    scan_sections(src)
        .section(SONG_SECTION)
        .map(metadata_of)
        .unwrap_or_default()
}

fn required<'a>(
    raw: &'a RawChart,
    code: &'static str,
    name: &str,
) -> Result<&'a Section, ChartError> {
    raw.section(name).ok_or_else(|| {
        warn!("ChartValidationFailed: missing [{name}] section");
        ChartError::missing_section(code, name)
    })
}

fn metadata_of(section: &Section) -> SongMetadata {
    let mut fields = BTreeMap::new();
    for (key, value) in &section.entries {
        fields
            .entry(key.clone())
            .or_insert_with(|| unquote(value).to_string());
    }
    SongMetadata::new(fields)
}

#[cfg(test)]
mod tests;
