use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartErrorKind {
    Io,
    Validation,
}

impl ChartErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            "C1001" | "C1002" => Self::Validation,
            "C2001" | "C2002" => Self::Io,
            _ => Self::Validation,
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message}")]
pub struct ChartError {
    pub code: &'static str,
    pub kind: ChartErrorKind,
    pub message: String,

    pub file: Option<String>,
    pub section: Option<String>,
}

impl ChartError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: ChartErrorKind::from_code(code),
            message: message.into(),
            file: None,
            section: None,
        }
    }

    pub(crate) fn missing_section(code: &'static str, name: &str) -> Self {
        Self::new(code, format!("chart validation failed: missing [{name}] section"))
            .with_section(name)
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// The chart lacks a required top-level section and must not be played.
    pub fn is_validation_failure(&self) -> bool {
        self.kind == ChartErrorKind::Validation
    }
}
