//! Collaborator service traits.
//!
//! The pipeline drives four external collaborators: durable storage, the
//! document host (the application that owns the "currently active document"
//! concept), its scene renderer, and its interchange encoder. Each is
//! consumed behind a trait and injected into the batch pipeline at
//! construction time, so tests can substitute fast deterministic fakes and
//! host integrations can bridge to the real application. There is no global
//! registry; whoever builds the [`crate::batch::ExportServices`] bundle
//! decides what runs.
//!
//! All trait methods report failures through the uniform
//! [`ServiceError`]; the pipeline maps those into stage-specific
//! [`crate::error::DocumentError`] variants.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{EncodeOptions, ViewConfig};
use crate::document::ModelDocument;
use crate::error::ServiceError;

/// Identifier for a document loaded in the host.
///
/// Opaque to the pipeline; only ever handed back to the host that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostDocId(pub u64);

/// Durable storage: file reads and writes by path.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, ServiceError>;

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), ServiceError>;

    /// Create a directory and all missing parents. Idempotent.
    async fn create_dir_all(&self, path: &Path) -> Result<(), ServiceError>;

    async fn copy(&self, from: &Path, to: &Path) -> Result<(), ServiceError>;

    async fn exists(&self, path: &Path) -> bool;

    /// List files in `dir` whose names end with `suffix`. Non-recursive.
    async fn list_with_suffix(&self, dir: &Path, suffix: &str)
        -> Result<Vec<PathBuf>, ServiceError>;
}

/// The application instance that owns the "currently active document"
/// concept.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// The currently active document, if any.
    async fn active_document(&self) -> Option<HostDocId>;

    /// Persist the active document if it has unsaved changes. A no-op when
    /// nothing is active or nothing changed.
    async fn save_active_if_modified(&self) -> Result<(), ServiceError>;

    /// Load parsed document data as the new active document. `path` is the
    /// document's storage identity.
    async fn load_document(
        &self,
        doc: &ModelDocument,
        path: &Path,
    ) -> Result<HostDocId, ServiceError>;

    /// Make a previously loaded document active again.
    async fn select_document(&self, id: HostDocId) -> Result<(), ServiceError>;

    /// All loaded documents with their storage paths, when known.
    async fn open_documents(&self) -> Vec<(HostDocId, Option<PathBuf>)>;
}

/// The host's scene renderer.
#[async_trait]
pub trait RendererService: Send + Sync {
    /// Flush pending scene updates. Resolves once the view reflects the
    /// active document; the pipeline bounds the wait with a timeout.
    async fn flush_updates(&self) -> Result<(), ServiceError>;

    /// Capture the active document's viewport as encoded image bytes.
    async fn capture_viewport(&self, view: &ViewConfig) -> Result<Vec<u8>, ServiceError>;
}

/// The host's interchange-format encoder.
#[async_trait]
pub trait EncoderService: Send + Sync {
    /// Compile the active document into interchange-format bytes.
    async fn encode(&self, options: &EncodeOptions) -> Result<Vec<u8>, ServiceError>;
}

/// [`Storage`] backed by the local filesystem via `tokio::fs`.
#[derive(Debug, Default, Clone)]
pub struct LocalStorage;

fn io_err(op: &str, path: &Path, e: std::io::Error) -> ServiceError {
    ServiceError::new(format!("{op} '{}': {e}", path.display()))
}

#[async_trait]
impl Storage for LocalStorage {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, ServiceError> {
        tokio::fs::read(path).await.map_err(|e| io_err("read", path, e))
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), ServiceError> {
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| io_err("write", path, e))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), ServiceError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| io_err("create directory", path, e))
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<(), ServiceError> {
        tokio::fs::copy(from, to)
            .await
            .map(|_| ())
            .map_err(|e| io_err("copy", from, e))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn list_with_suffix(
        &self,
        dir: &Path,
        suffix: &str,
    ) -> Result<Vec<PathBuf>, ServiceError> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| io_err("read directory", dir, e))?;

        let mut out = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_err("read directory", dir, e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(suffix));
            if matches {
                out.push(path);
            }
        }

        // Directory iteration order is platform-defined; sort for
        // deterministic batches.
        out.sort();
        debug!("found {} '{}' files in {}", out.len(), suffix, dir.display());
        Ok(out)
    }
}
