//! Data model for one merge run: located pairs, per-pair outcomes, and the aggregate.
//!
//! Everything here is created and consumed within a single `run_all` call. Outcomes
//! serialize to JSON for `--json`.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A source file and the counterpart path its content is appended to.
///
/// `source_path` is a regular file unless it could not be stat'ed, in which case merging it
/// reports the error. `counterpart_path` may not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePair {
    pub source_path: PathBuf,
    pub counterpart_path: PathBuf,
}

impl FilePair {
    /// Base name of the source file, as written into the separator.
    pub fn source_name(&self) -> String {
        file_name_lossy(&self.source_path)
    }
}

pub(crate) fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Result classification for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    Merged,
    CounterpartMissing,
    IoError,
    /// Merged, but at least one side needed the lossy fallback decoding.
    DecodeFallback,
}

impl MergeStatus {
    /// Whether this status fails the aggregate. `DecodeFallback` is a warning only.
    pub fn is_failure(self) -> bool {
        matches!(self, MergeStatus::CounterpartMissing | MergeStatus::IoError)
    }

    fn label(self) -> &'static str {
        match self {
            MergeStatus::Merged => "Merged",
            MergeStatus::CounterpartMissing => "Missing",
            MergeStatus::IoError => "Error",
            MergeStatus::DecodeFallback => "Warning",
        }
    }
}

/// Outcome of merging one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub pair: FilePair,
    pub status: MergeStatus,
    pub detail: String,
}

impl fmt::Display for MergeOutcome {
    /// One report line, e.g. `Merged: foo.cpp -> foo.h (source UTF-8, counterpart UTF-8)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({})",
            self.status.label(),
            self.pair.source_path.display(),
            self.pair.counterpart_path.display(),
            self.detail
        )
    }
}

/// All outcomes of one run, in locator order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateResult {
    pub outcomes: Vec<MergeOutcome>,
    /// True only if no outcome is `CounterpartMissing` or `IoError` and the root was valid.
    pub all_succeeded: bool,
    /// Set when the root directory could not be used; `outcomes` is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_error: Option<String>,
}

impl AggregateResult {
    pub fn from_outcomes(outcomes: Vec<MergeOutcome>) -> Self {
        let all_succeeded = outcomes.iter().all(|o| !o.status.is_failure());
        Self {
            outcomes,
            all_succeeded,
            root_error: None,
        }
    }

    pub fn root_failure(message: String) -> Self {
        Self {
            outcomes: Vec::new(),
            all_succeeded: false,
            root_error: Some(message),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.status.is_failure())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_failure()).count()
    }

    pub fn warnings(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == MergeStatus::DecodeFallback)
            .count()
    }

    /// One line per outcome, in processing order.
    pub fn report_lines(&self) -> Vec<String> {
        self.outcomes.iter().map(|o| o.to_string()).collect()
    }

    /// Final count line printed after the per-pair report.
    pub fn summary(&self) -> String {
        match &self.root_error {
            Some(e) => format!("No files merged: {}", e),
            None => format!(
                "Merged {} of {} pair(s): {} failed, {} with encoding warnings.",
                self.succeeded(),
                self.outcomes.len(),
                self.failed(),
                self.warnings()
            ),
        }
    }
}
