//! Terminal report extraction.
//!
//! The scan agent wraps its final report in mode-specific markers inside
//! ordinary text output. [`ReportExtractor`] accumulates every text part
//! of the session and captures the first complete marker pair.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

static WHITEBOX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)===WHITEBOX_REPORT_START===(.*?)===WHITEBOX_REPORT_END===")
        .expect("whitebox report pattern is valid")
});

static BLACKBOX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)===BLACKBOX_REPORT_START===(.*?)===BLACKBOX_REPORT_END===")
        .expect("blackbox report pattern is valid")
});

/// Which assessment flavour the session is watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Source-code assessment
    Whitebox,
    /// External assessment
    #[default]
    Blackbox,
}

impl ReportMode {
    fn pattern(&self) -> &'static Regex {
        match self {
            ReportMode::Whitebox => &WHITEBOX_RE,
            ReportMode::Blackbox => &BLACKBOX_RE,
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportMode::Whitebox => write!(f, "whitebox"),
            ReportMode::Blackbox => write!(f, "blackbox"),
        }
    }
}

impl FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whitebox" | "white" => Ok(ReportMode::Whitebox),
            "blackbox" | "black" => Ok(ReportMode::Blackbox),
            other => Err(format!("unknown report mode: {}", other)),
        }
    }
}

/// Search `text` for a report delimited by `mode`'s markers.
pub fn extract_report(mode: ReportMode, text: &str) -> Option<String> {
    mode.pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Accumulates text parts and captures the report once.
///
/// Two views of the text are kept. `transcript` appends a newline after
/// every part and is matched first, so a report streamed one line per
/// part keeps its line breaks. `raw` is the verbatim concatenation and
/// is the fallback for markers cut in the middle of a token.
#[derive(Debug, Clone, Default)]
pub struct ReportExtractor {
    mode: ReportMode,
    raw: String,
    transcript: String,
    report: Option<String>,
}

impl ReportExtractor {
    pub fn new(mode: ReportMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Append one text part. Returns the report if this part completed it.
    pub fn push_text(&mut self, text: &str) -> Option<&str> {
        self.raw.push_str(text);
        self.transcript.push_str(text);
        self.transcript.push('\n');

        if self.report.is_some() {
            return None;
        }
        self.report = self.search();
        self.report.as_deref()
    }

    /// Final attempt at natural end-of-stream.
    pub fn finish(&mut self) -> Option<&str> {
        if self.report.is_none() {
            self.report = self.search();
        }
        self.report.as_deref()
    }

    fn search(&self) -> Option<String> {
        extract_report(self.mode, &self.transcript)
            .or_else(|| extract_report(self.mode, &self.raw))
    }

    /// The extracted report, if any.
    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    /// Forget all accumulated text, e.g. for a fresh session.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.transcript.clear();
        self.report = None;
    }
}
