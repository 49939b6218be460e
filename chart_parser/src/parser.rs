use std::collections::BTreeMap;

use chart_schema::Tick;
use log::debug;

/// One `[Name]` block: its `key = value` lines in file order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Section {
    pub(crate) name: String,
    pub(crate) entries: Vec<(String, String)>,
}

impl Section {
    /// Values grouped by integer key, ascending. Non-numeric keys are dropped.
    pub(crate) fn rows_by_tick(&self) -> BTreeMap<Tick, Vec<&str>> {
        let mut rows: BTreeMap<Tick, Vec<&str>> = BTreeMap::new();
        for (key, value) in &self.entries {
            match key.trim().parse::<Tick>() {
                Ok(tick) => rows.entry(tick).or_default().push(value.as_str()),
                Err(_) => debug!("[{}] skipping non-tick key {key:?}", self.name),
            }
        }
        rows
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RawChart {
    sections: Vec<Section>,
}

impl RawChart {
    pub(crate) fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    fn section_mut(&mut self, name: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section {
                    name: name.to_string(),
                    entries: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }
}

/// Splits chart text into sections. Never fails: anything that is neither a
/// section header nor a `key = value` line inside a section is skipped.
pub(crate) fn scan_sections(src: &str) -> RawChart {
    let mut raw = RawChart::default();
    let mut current: Option<String> = None;

    for (i, raw_line) in src.trim_start_matches('\u{feff}').lines().enumerate() {
        let line_no = i + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        if let Some(name) = section_header(trimmed) {
            raw.section_mut(name);
            current = Some(name.to_string());
            continue;
        }

        let Some((key, value)) = trimmed.split_once(" = ") else {
            if trimmed != "{" && trimmed != "}" {
                debug!("line {line_no}: not a key/value line, skipped");
            }
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            debug!("line {line_no}: empty key, skipped");
            continue;
        }

        let Some(section) = current.as_deref() else {
            debug!("line {line_no}: key/value outside any section, skipped");
            continue;
        };
        raw.section_mut(section)
            .entries
            .push((key.to_string(), value.trim().to_string()));
    }

    raw
}

fn section_header(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    (!inner.is_empty()).then_some(inner)
}

pub(crate) fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
