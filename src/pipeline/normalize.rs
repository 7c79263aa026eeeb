//! Normalization: vertical grounding and texture inlining.
//!
//! Both operations are destructive rewrites of the in-memory document, not
//! copies. The file on storage is never touched; only what the host loads
//! (and therefore what gets rendered and encoded) sees the normalized form.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::document::ModelDocument;
use crate::report::Diagnostics;
use crate::services::Storage;

/// Translate the whole document vertically so its lowest point sits at Y=0.
///
/// Scans every element's `from`, `to` and `origin`, takes the minimum Y, and
/// subtracts it from all of them. Warnings-only: grounding never fails a
/// document. Idempotent by construction - after one pass the minimum Y is 0
/// and the next pass is a no-op.
pub fn ground(doc: &mut ModelDocument) -> Diagnostics {
    let mut diag = Diagnostics::new();
    let Some(elements) = doc.elements.as_mut() else {
        return diag;
    };

    let lowest = elements
        .iter()
        .flat_map(|e| [e.from, e.to, e.origin])
        .flatten()
        .map(|triple| triple[1])
        .fold(f64::INFINITY, f64::min);

    if lowest == f64::INFINITY {
        debug!("no eligible Y coordinates, grounding skipped");
        return diag;
    }
    if lowest == 0.0 {
        debug!("model already grounded (lowest Y = 0)");
        return diag;
    }

    for element in elements.iter_mut() {
        for triple in [&mut element.from, &mut element.to, &mut element.origin] {
            if let Some(v) = triple {
                v[1] -= lowest;
            }
        }
    }

    diag.push_warning(format!(
        "Model has been grounded - lowest point adjusted from Y={lowest} to Y=0"
    ));
    diag
}

/// Inline external texture assets as base64 image data URIs.
///
/// Textures whose `source` is already a `data:image` URI are left untouched.
/// For the rest, an absolute `path` is preferred; otherwise `relative_path`
/// is resolved against the directory containing `doc_path`. Each texture is
/// processed independently: a missing file or unreadable asset records an
/// error naming the texture and moves on to the next one, so one report
/// lists every broken texture rather than just the first.
pub async fn inline_textures(
    doc: &mut ModelDocument,
    doc_path: &Path,
    storage: &dyn Storage,
) -> Diagnostics {
    let mut diag = Diagnostics::new();
    let Some(textures) = doc.textures.as_mut() else {
        return diag;
    };
    let doc_dir = doc_path.parent().unwrap_or_else(|| Path::new(""));

    for texture in textures.iter_mut() {
        if texture.is_inline() {
            continue;
        }
        let name = texture.name.clone();

        let resolved: PathBuf = if let Some(abs) = texture.path.as_deref() {
            PathBuf::from(abs)
        } else if let Some(rel) = texture.relative_path.as_deref() {
            doc_dir.join(rel)
        } else {
            diag.push_error(format!("Texture \"{name}\" has no valid path"));
            continue;
        };

        if !storage.exists(&resolved).await {
            diag.push_error(format!(
                "Texture file not found for \"{name}\": {}",
                resolved.display()
            ));
            continue;
        }

        match storage.read(&resolved).await {
            Ok(bytes) => {
                let subtype = resolved
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("png")
                    .to_ascii_lowercase();
                texture.source = Some(format!(
                    "data:image/{subtype};base64,{}",
                    STANDARD.encode(&bytes)
                ));
                debug!("inlined texture '{name}' ({} bytes)", bytes.len());
                diag.push_warning(format!("Encoded texture \"{name}\" and saved to the model"));
            }
            Err(e) => {
                diag.push_error(format!("Failed to encode texture \"{name}\": {e}"));
            }
        }
    }

    diag
}
