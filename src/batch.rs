//! The batch export pipeline.
//!
//! Per document the pipeline runs `Pending -> Loaded -> Validated ->
//! Normalized -> Rendered -> Encoded -> Persisted -> Done`, with a terminal
//! `Failed(stage, reason)` reachable from any non-terminal state. Documents
//! are processed strictly sequentially: the Render and Encode stages operate
//! on the host's single "active document" pointer, which cannot be held for
//! two documents at once. One document's failure is recorded and the batch
//! moves on; the batch itself never aborts early.
//!
//! The host's active-document pointer is owned by the pipeline for the
//! duration of one document's processing and restored to its pre-run value
//! as the final, unconditional step, even after a failure, so a bad document
//! never leaves the host pointed at the wrong document for the next one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::discover;
use crate::document::ModelDocument;
use crate::error::{DocumentError, ModelPortError, ServiceError};
use crate::pipeline::{encode, normalize, render, validate};
use crate::report::{BatchReport, BatchStats, ExportRecord, ExportStatus};
use crate::services::{DocumentHost, EncoderService, RendererService, Storage};

/// Pipeline stages a document passes through, in order.
///
/// Used to name the failing stage in [`DocumentError::Service`] and in the
/// batch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Validate,
    Normalize,
    Render,
    Encode,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Validate => "validate",
            Stage::Normalize => "normalize",
            Stage::Render => "render",
            Stage::Encode => "encode",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// The collaborator bundle injected into the pipeline.
///
/// Constructed by whoever embeds the library - a host integration bridges
/// these to the real application, tests inject deterministic fakes.
#[derive(Clone)]
pub struct ExportServices {
    pub storage: Arc<dyn Storage>,
    pub host: Arc<dyn DocumentHost>,
    pub renderer: Arc<dyn RendererService>,
    pub encoder: Arc<dyn EncoderService>,
}

/// What one document's trip through the pipeline produced.
struct DocumentOutcome {
    /// Accumulated warnings on completion, or the failure.
    result: Result<Vec<String>, DocumentError>,
    /// Set when the host's active document could not be restored.
    host_state_warning: Option<String>,
}

/// Export every model document discovered in the host's working directory.
///
/// The working directory is derived from the active document's save
/// location (see [`crate::discover::working_directory`]); this is the
/// whole-directory equivalent of [`export_batch`].
pub async fn export_directory(
    services: &ExportServices,
    config: &ExportConfig,
) -> Result<BatchReport, ModelPortError> {
    let dir = discover::working_directory(services.host.as_ref()).await?;
    let documents = discover::find_documents(
        services.storage.as_ref(),
        &dir,
        &config.document_extension,
    )
    .await?;
    info!(
        "discovered {} '.{}' documents in {}",
        documents.len(),
        config.document_extension,
        dir.display()
    );
    Ok(export_batch(&documents, services, config).await)
}

/// Run the full export pipeline over the given documents.
///
/// Returns a report with exactly one record per document. This function has
/// no failure mode of its own: when a required service is down entirely,
/// every document fails identically and the report says so.
pub async fn export_batch(
    documents: &[PathBuf],
    services: &ExportServices,
    config: &ExportConfig,
) -> BatchReport {
    let start = Instant::now();
    let total = documents.len();
    info!("starting batch export of {total} documents");
    if let Some(cb) = &config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut records = Vec::with_capacity(total);
    let mut host_state_warnings = Vec::new();

    for (i, path) in documents.iter().enumerate() {
        let name = document_stem(path);
        if let Some(cb) = &config.progress_callback {
            cb.on_document_start(i + 1, total, &name);
        }
        info!("processing {}/{}: {}", i + 1, total, path.display());

        let outcome = export_document(path, services, config).await;
        if let Some(w) = outcome.host_state_warning {
            host_state_warnings.push(w);
        }

        let record = record_for(&name, outcome.result, "Exported successfully");
        if let Some(cb) = &config.progress_callback {
            match record.status {
                ExportStatus::Error => cb.on_document_error(i + 1, total, &name, &record.message),
                status => cb.on_document_complete(i + 1, total, &name, status),
            }
        }
        records.push(record);
    }

    finalize(records, host_state_warnings, start, config)
}

/// Validate and normalize documents without driving a host: no render, no
/// encode, no outputs.
///
/// The standalone counterpart to [`export_batch`] for environments where
/// only storage is available - the same Load, Validate and Normalize stages
/// run, so a clean check here means the document will pass those stages in
/// a full export too.
pub async fn check_batch(
    documents: &[PathBuf],
    storage: &dyn Storage,
    config: &ExportConfig,
) -> BatchReport {
    let start = Instant::now();
    let total = documents.len();
    info!("starting batch check of {total} documents");
    if let Some(cb) = &config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut records = Vec::with_capacity(total);
    for (i, path) in documents.iter().enumerate() {
        let name = document_stem(path);
        if let Some(cb) = &config.progress_callback {
            cb.on_document_start(i + 1, total, &name);
        }

        let mut warnings = Vec::new();
        let result = load_and_normalize(path, storage, &mut warnings)
            .await
            .map(|_| warnings);

        let record = record_for(&name, result, "Document is valid");
        if let Some(cb) = &config.progress_callback {
            match record.status {
                ExportStatus::Error => cb.on_document_error(i + 1, total, &name, &record.message),
                status => cb.on_document_complete(i + 1, total, &name, status),
            }
        }
        records.push(record);
    }

    finalize(records, Vec::new(), start, config)
}

/// Drive one document through the full stage sequence, then restore the
/// host's active document no matter how far it got.
async fn export_document(
    path: &Path,
    services: &ExportServices,
    config: &ExportConfig,
) -> DocumentOutcome {
    let prior = services.host.active_document().await;
    let mut warnings = Vec::new();
    let mut host_touched = false;

    let result = run_stages(path, services, config, &mut warnings, &mut host_touched).await;
    if let Err(ref e) = result {
        warn!("document '{}' failed: {e}", path.display());
    }

    // Unconditional cleanup: once this document replaced the host's active
    // document, put the prior one back - including after a failure in
    // Render, Encode or Persist.
    let mut host_state_warning = None;
    if host_touched {
        match prior {
            Some(prior_id) => {
                if let Err(e) = services.host.select_document(prior_id).await {
                    let err = DocumentError::HostState {
                        detail: e.to_string(),
                    };
                    warn!("{err}");
                    host_state_warning = Some(format!("{}: {err}", document_stem(path)));
                }
            }
            None => debug!("no prior active document to restore"),
        }
    }

    DocumentOutcome {
        result: result.map(|()| warnings),
        host_state_warning,
    }
}

async fn run_stages(
    path: &Path,
    services: &ExportServices,
    config: &ExportConfig,
    warnings: &mut Vec<String>,
    host_touched: &mut bool,
) -> Result<(), DocumentError> {
    let doc = load_and_normalize(path, services.storage.as_ref(), warnings).await?;

    // The host's active-document pointer is ours from here until the
    // restore step. Save whatever the user had open before replacing it.
    services
        .host
        .save_active_if_modified()
        .await
        .map_err(|e| DocumentError::Service {
            stage: Stage::Render,
            detail: format!("host save: {e}"),
        })?;

    *host_touched = true;
    services
        .host
        .load_document(&doc, path)
        .await
        .map_err(|e| DocumentError::Service {
            stage: Stage::Render,
            detail: format!("host load: {e}"),
        })?;

    let preview =
        render::render_preview(services.renderer.as_ref(), &config.view, config.render_timeout_ms)
            .await?;

    let payload = encode::encode_interchange(services.encoder.as_ref(), &config.encode).await?;

    persist_outputs(path, &preview, &payload, services, config).await
}

/// The host-free front half of the pipeline: Load, Validate, Normalize.
///
/// Warnings accumulate into `warnings`; fatal findings become the
/// document's failure.
async fn load_and_normalize(
    path: &Path,
    storage: &dyn Storage,
    warnings: &mut Vec<String>,
) -> Result<ModelDocument, DocumentError> {
    // Load
    let bytes = storage.read(path).await.map_err(|e| DocumentError::Service {
        stage: Stage::Load,
        detail: e.to_string(),
    })?;
    let mut doc = ModelDocument::from_slice(path, &bytes)?;
    debug!("loaded '{}', {} bytes", path.display(), bytes.len());

    // Validate
    let diag = validate::validate(&doc);
    if !diag.valid {
        return Err(DocumentError::Validation {
            errors: diag.errors,
        });
    }
    warnings.extend(diag.warnings);

    // Normalize: grounding before inlining. The two are independent in
    // practice but the order is fixed for determinism.
    warnings.extend(normalize::ground(&mut doc).warnings);

    let inline = normalize::inline_textures(&mut doc, path, storage).await;
    warnings.extend(inline.warnings);
    if !inline.valid {
        return Err(DocumentError::Normalization {
            errors: inline.errors,
        });
    }

    Ok(doc)
}

/// Write the preview image, the interchange payload, and a copy of the
/// source document into the per-document output directory.
async fn persist_outputs(
    path: &Path,
    preview: &[u8],
    payload: &[u8],
    services: &ExportServices,
    config: &ExportConfig,
) -> Result<(), DocumentError> {
    let stem = document_stem(path);
    let out_root = match &config.output_root {
        Some(root) => root.clone(),
        None => path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&config.output_dir_name),
    };
    let doc_dir = out_root.join(&stem);

    let persist_err = |e: ServiceError| DocumentError::Service {
        stage: Stage::Persist,
        detail: e.to_string(),
    };

    services
        .storage
        .create_dir_all(&doc_dir)
        .await
        .map_err(persist_err)?;
    services
        .storage
        .write(&doc_dir.join(format!("{stem}.png")), preview)
        .await
        .map_err(persist_err)?;
    services
        .storage
        .write(&doc_dir.join(format!("{stem}.gltf")), payload)
        .await
        .map_err(persist_err)?;

    // The source document travels with its derived outputs.
    let file_name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{stem}.{}", config.document_extension)));
    services
        .storage
        .copy(path, &doc_dir.join(file_name))
        .await
        .map_err(persist_err)?;

    info!("persisted outputs for '{stem}' to {}", doc_dir.display());
    Ok(())
}

/// Map a document's pipeline result onto its report record.
fn record_for(
    name: &str,
    result: Result<Vec<String>, DocumentError>,
    success_message: &str,
) -> ExportRecord {
    match result {
        Ok(warnings) if warnings.is_empty() => ExportRecord {
            document: name.to_string(),
            status: ExportStatus::Success,
            message: success_message.to_string(),
        },
        Ok(warnings) => ExportRecord {
            document: name.to_string(),
            status: ExportStatus::Warning,
            message: warnings.join("; "),
        },
        Err(e) => ExportRecord {
            document: name.to_string(),
            status: ExportStatus::Error,
            message: e.to_string(),
        },
    }
}

fn finalize(
    records: Vec<ExportRecord>,
    host_state_warnings: Vec<String>,
    start: Instant,
    config: &ExportConfig,
) -> BatchReport {
    let stats = BatchStats {
        total: records.len(),
        succeeded: count(&records, ExportStatus::Success),
        warned: count(&records, ExportStatus::Warning),
        failed: count(&records, ExportStatus::Error),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "batch complete: {}/{} ok ({} warnings, {} failed) in {}ms",
        stats.succeeded + stats.warned,
        stats.total,
        stats.warned,
        stats.failed,
        stats.duration_ms
    );
    if let Some(cb) = &config.progress_callback {
        cb.on_batch_complete(stats.total, stats.succeeded + stats.warned);
    }

    BatchReport {
        records,
        host_state_warnings,
        stats,
    }
}

fn count(records: &[ExportRecord], status: ExportStatus) -> usize {
    records.iter().filter(|r| r.status == status).count()
}

/// Document identity for records and output directories: the file stem.
fn document_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}
