//! Result types: per-document diagnostics, export records, and the batch
//! report.
//!
//! Everything here is `Serialize` so the CLI `--json` mode can emit the full
//! report for downstream tooling.

use serde::{Deserialize, Serialize};

/// Outcome of validating or normalizing a single document.
///
/// Invariant: `valid == errors.is_empty()`, maintained by construction -
/// only [`Diagnostics::push_error`] flips `valid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// False iff at least one fatal error was recorded.
    pub valid: bool,
    /// Fatal findings; the document is excluded from further stages.
    pub errors: Vec<String>,
    /// Informational findings; the document proceeds.
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record a fatal finding and mark the diagnostics invalid.
    pub fn push_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
        self.valid = false;
    }

    /// Record a non-fatal finding.
    pub fn push_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-document outcome of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    /// All stages completed with no findings.
    Success,
    /// All stages completed; non-fatal findings were accumulated.
    Warning,
    /// A stage failed; remaining stages were skipped.
    Error,
}

/// One record per document processed by the batch, produced exactly once
/// regardless of how many stages ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Document identity: the file stem of the source document.
    pub document: String,
    pub status: ExportStatus,
    /// Accumulated warnings, or the failure reason.
    pub message: String,
}

/// Aggregate counts for one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub warned: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// The batch report: always produced at the end of a run, even if every
/// document failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub records: Vec<ExportRecord>,
    /// Host restore failures. These never fail a document's record but are
    /// surfaced distinctly because a wrong active document can affect
    /// subsequent runs.
    pub host_state_warnings: Vec<String>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// True when every processed document failed.
    pub fn all_failed(&self) -> bool {
        self.stats.total > 0 && self.stats.failed == self.stats.total
    }
}
