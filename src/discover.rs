//! Document discovery: derive the working directory from the host and find
//! model documents in it.
//!
//! The working directory is not configured anywhere; it is wherever the user
//! is actually working, which the host knows as the save location of the
//! active document. A host with no saved document anywhere cannot anchor a
//! batch run, and the caller is expected to tell the user to save first.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ModelPortError;
use crate::services::{DocumentHost, Storage};

/// Derive the directory in which documents are discovered.
///
/// Preference order: the active document's storage path, then the first open
/// document that has one. Returns [`ModelPortError::NoWorkingDirectory`]
/// when no open document has a path at all.
pub async fn working_directory(host: &dyn DocumentHost) -> Result<PathBuf, ModelPortError> {
    let open = host.open_documents().await;

    if let Some(active) = host.active_document().await {
        let active_path = open
            .iter()
            .find(|(id, _)| *id == active)
            .and_then(|(_, path)| path.as_deref());
        if let Some(dir) = active_path.and_then(Path::parent) {
            debug!("working directory from active document: {}", dir.display());
            return Ok(dir.to_path_buf());
        }
    }

    for (_, path) in &open {
        if let Some(dir) = path.as_deref().and_then(Path::parent) {
            debug!("working directory from open document: {}", dir.display());
            return Ok(dir.to_path_buf());
        }
    }

    Err(ModelPortError::NoWorkingDirectory)
}

/// Find all model documents in `dir` with the given extension (no dot),
/// sorted by path.
pub async fn find_documents(
    storage: &dyn Storage,
    dir: &Path,
    extension: &str,
) -> Result<Vec<PathBuf>, ModelPortError> {
    let suffix = format!(".{extension}");
    storage
        .list_with_suffix(dir, &suffix)
        .await
        .map_err(|e| ModelPortError::DirectoryScanFailed {
            path: dir.to_path_buf(),
            detail: e.to_string(),
        })
}
