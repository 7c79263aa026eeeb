//! Structural validation of a model document.
//!
//! Pure and synchronous: no storage access, no mutation. The returned
//! [`Diagnostics`] decides whether the document continues through the
//! pipeline (fatal errors exclude it; warnings travel with it into the
//! final record).

use tracing::debug;

use crate::document::{Element, ModelDocument, ANCHOR_PREFIX};
use crate::report::Diagnostics;

/// Validate a parsed model document.
///
/// * Missing or empty `elements` is fatal and short-circuits the remaining
///   checks; there is nothing meaningful to export.
/// * Every anchor element (name prefixed `anchor_`) must have `from`, `to`
///   and `origin` present and identical; each violation is a separate error
///   naming the anchor, and one bad anchor does not stop the others from
///   being checked.
/// * Zero anchors and zero textures are warnings, not errors.
pub fn validate(doc: &ModelDocument) -> Diagnostics {
    let mut diag = Diagnostics::new();

    let has_elements = doc.elements.as_deref().is_some_and(|els| !els.is_empty());
    if !has_elements {
        diag.push_error("Model has no elements");
        return diag;
    }

    validate_anchors(doc, &mut diag);
    check_texture_presence(doc, &mut diag);

    debug!(
        "validation complete: valid={}, {} errors, {} warnings",
        diag.valid,
        diag.errors.len(),
        diag.warnings.len()
    );
    diag
}

/// Anchors mark attachment points for downstream consumption; an anchor
/// whose three positional triples disagree is semantically meaningless.
fn validate_anchors(doc: &ModelDocument, diag: &mut Diagnostics) {
    let anchors: Vec<&Element> = doc.anchors().collect();
    debug!("found {} anchor elements", anchors.len());

    if anchors.is_empty() {
        diag.push_warning(format!(
            "No anchor elements found (elements starting with \"{ANCHOR_PREFIX}\")"
        ));
        return;
    }

    for anchor in anchors {
        let name = anchor.display_name();

        let (Some(from), Some(to), Some(origin)) = (anchor.from, anchor.to, anchor.origin) else {
            diag.push_error(format!(
                "Anchor \"{name}\" is missing required properties (from, to, or origin)"
            ));
            continue;
        };

        if from != to || from != origin {
            // Echo all three triples so the author can see which one drifted.
            diag.push_error(format!(
                "Anchor \"{name}\" has mismatched coordinates. \
                 From: {from:?}, To: {to:?}, Origin: {origin:?}. \
                 All coordinates must be identical."
            ));
        }
    }
}

fn check_texture_presence(doc: &ModelDocument, diag: &mut Diagnostics) {
    let has_textures = doc.textures.as_deref().is_some_and(|t| !t.is_empty());
    if !has_textures {
        diag.push_warning("Model has no textures");
    }
}
