//! Render stage: synchronize with the external renderer and capture the
//! preview image.
//!
//! The renderer's update cycle runs independently of this pipeline's call
//! sequence, so a capture taken immediately after loading a document can
//! show the previous scene. The stage therefore waits for the renderer's
//! explicit flush acknowledgment before reading pixels, bounded by a
//! timeout so an unresponsive renderer degrades to a per-document failure
//! instead of stalling the batch.

use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::batch::Stage;
use crate::config::ViewConfig;
use crate::error::DocumentError;
use crate::services::RendererService;

/// Capture a preview image of the currently active document.
pub async fn render_preview(
    renderer: &dyn RendererService,
    view: &ViewConfig,
    timeout_ms: u64,
) -> Result<Vec<u8>, DocumentError> {
    match timeout(Duration::from_millis(timeout_ms), renderer.flush_updates()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return Err(DocumentError::Service {
                stage: Stage::Render,
                detail: e.to_string(),
            })
        }
        Err(_) => return Err(DocumentError::RenderTimeout { ms: timeout_ms }),
    }

    let bytes = renderer
        .capture_viewport(view)
        .await
        .map_err(|e| DocumentError::Service {
            stage: Stage::Render,
            detail: e.to_string(),
        })?;

    debug!(
        "captured {}x{} preview, {} bytes",
        view.width,
        view.height,
        bytes.len()
    );
    Ok(bytes)
}
