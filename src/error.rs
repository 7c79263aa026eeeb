//! Error types for the modelport library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ModelPortError`] - **Fatal**: the batch cannot run at all (no working
//!   directory, invalid configuration). Returned as `Err(ModelPortError)`
//!   from the top-level entry points.
//!
//! * [`DocumentError`] - **Non-fatal**: a single document failed (parse
//!   error, invalid anchor, missing texture, renderer glitch) but the rest
//!   of the batch is fine. Stored inside [`crate::report::ExportRecord`] so
//!   callers get a complete per-document status list rather than losing the
//!   whole batch to one bad document.
//!
//! Collaborator services ([`crate::services`]) report failures through the
//! uniform [`ServiceError`]; the pipeline converts those into the right
//! [`DocumentError`] variant at each stage boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::batch::Stage;

/// All fatal errors returned by the modelport library.
///
/// Document-level failures use [`DocumentError`] and are recorded in the
/// batch report rather than propagated here.
#[derive(Debug, Error)]
pub enum ModelPortError {
    /// No open document has a save or export path to derive a directory from.
    #[error(
        "no working directory could be determined\n\
         Save the active document first, or pass a directory explicitly."
    )]
    NoWorkingDirectory,

    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not list or read the directory being exported.
    #[error("failed to scan directory '{path}': {detail}")]
    DirectoryScanFailed { path: PathBuf, detail: String },
}

/// A non-fatal error for a single document.
///
/// Produced by the stage that failed and converted into the document's
/// `error` outcome; the batch continues with the next document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// Document bytes are not well-formed JSON. The document is excluded
    /// with no partial processing.
    #[error("failed to parse model document '{path}': {detail}")]
    Parse { path: PathBuf, detail: String },

    /// A structural invariant was violated (missing elements, bad anchor).
    #[error("validation failed: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    /// A texture asset could not be resolved or read during inlining.
    #[error("normalization failed: {}", .errors.join("; "))]
    Normalization { errors: Vec<String> },

    /// The renderer did not acknowledge pending updates within the bounded
    /// wait, so no capture was attempted.
    #[error("renderer did not acknowledge pending updates within {ms}ms")]
    RenderTimeout { ms: u64 },

    /// The encoder produced zero bytes. An empty payload is never a valid
    /// encoding and is never written to storage.
    #[error("encoder returned an empty payload")]
    EmptyPayload,

    /// A collaborator service failed during the named stage.
    #[error("{stage} stage failed: {detail}")]
    Service { stage: Stage, detail: String },

    /// The host's active document could not be restored afterwards. Logged
    /// and surfaced distinctly since it can affect subsequent documents,
    /// but never blocks the batch.
    #[error("failed to restore host state: {detail}")]
    HostState { detail: String },
}

/// Uniform error returned by the collaborator service traits.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
