//! Compiler output post-processing.
//!
//! Filters only change what is echoed to the terminal. Success or failure of
//! a unit is decided by exit status alone.

use regex::Regex;
use serde::Deserialize;

pub trait DiagnosticFilter: Send + Sync {
    fn filter(&self, raw: &str) -> String;
}

/// Echo compiler output untouched (minus trailing whitespace).
#[derive(Debug, Default, Clone, Copy)]
pub struct RawOutput;

impl DiagnosticFilter for RawOutput {
    fn filter(&self, raw: &str) -> String {
        raw.trim_end().to_string()
    }
}

/// Line-based filter: blank lines and lines matching any `drop` pattern are
/// removed, and everything from the first line matching a `stop_at` pattern
/// onward is discarded.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    drop: Vec<Regex>,
    stop_at: Vec<Regex>,
}

impl PatternFilter {
    pub fn new<S: AsRef<str>>(drop: &[S], stop_at: &[S]) -> Result<Self, regex::Error> {
        Ok(Self {
            drop: compile_all(drop)?,
            stop_at: compile_all(stop_at)?,
        })
    }

    /// Noise reduction for GCC: `-H` include-tree lines (leading dots),
    /// `note:` annotations, and the trailing include-guard report.
    pub fn gcc() -> Self {
        Self::new(&[r"^\s*\.", r": note:"], &[r"^Multiple include guards"])
            .unwrap_or_else(|_| Self {
                drop: Vec::new(),
                stop_at: Vec::new(),
            })
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p.as_ref())).collect()
}

impl DiagnosticFilter for PatternFilter {
    fn filter(&self, raw: &str) -> String {
        let mut kept = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() || self.drop.iter().any(|re| re.is_match(line)) {
                continue;
            }
            if self.stop_at.iter().any(|re| re.is_match(line)) {
                break;
            }
            kept.push(line);
        }
        kept.join("\n")
    }
}

/// Which built-in filter to use when none is configured explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsMode {
    #[default]
    Gcc,
    Raw,
}

impl DiagnosticsMode {
    pub fn into_filter(self) -> Box<dyn DiagnosticFilter> {
        match self {
            DiagnosticsMode::Gcc => Box::new(PatternFilter::gcc()),
            DiagnosticsMode::Raw => Box::new(RawOutput),
        }
    }
}
