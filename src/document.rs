//! Typed document model for 3D model documents.
//!
//! Model documents are open-ended JSON: besides `elements` and `textures`
//! they carry format metadata, animations, display settings and whatever else
//! the authoring tool wrote. The pipeline only interprets the fields it
//! validates and rewrites; everything else is preserved verbatim through a
//! flattened extras map, so a normalized document re-serializes without data
//! loss. Parsing happens once, at the load boundary - downstream stages never
//! see raw untyped JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DocumentError;

/// Reserved element-name prefix marking an anchor point.
pub const ANCHOR_PREFIX: &str = "anchor_";

/// Prefix of an already-inlined texture source (image data URI).
pub const DATA_URI_PREFIX: &str = "data:image";

/// A coordinate triple `[x, y, z]`. Y is the vertical axis.
pub type Vec3 = [f64; 3];

/// One cuboid element of a model document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Vec3>,
    /// Fields the pipeline does not interpret (faces, rotation, uv, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Element {
    /// Whether this element marks an attachment point (name starts with
    /// [`ANCHOR_PREFIX`]).
    pub fn is_anchor(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.starts_with(ANCHOR_PREFIX))
    }

    /// The element name for diagnostics, or a placeholder when unnamed.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// One texture entry of a model document.
///
/// A texture carries its image either inline (`source`, a `data:image/...`
/// URI) or as a reference to durable storage: an absolute `path`, or a
/// `relative_path` resolved against the directory containing the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    #[serde(default)]
    pub name: String,
    /// Inline image data URI, when the texture is already embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Absolute path to the image file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Path relative to the document's own directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Texture {
    /// Whether the texture already carries an inline image data URI.
    pub fn is_inline(&self) -> bool {
        self.source
            .as_deref()
            .is_some_and(|s| s.starts_with(DATA_URI_PREFIX))
    }
}

/// The in-memory representation of one model document.
///
/// `elements` and `textures` are optional at the type level because their
/// absence is a *validation* outcome (fatal error and warning respectively),
/// not a parse failure - see [`crate::pipeline::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<Element>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textures: Option<Vec<Texture>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ModelDocument {
    /// Parse document bytes. This is the one place raw JSON enters the
    /// pipeline; a failure here excludes the document with no partial
    /// processing.
    pub fn from_slice(path: &Path, bytes: &[u8]) -> Result<Self, DocumentError> {
        serde_json::from_slice(bytes).map_err(|e| DocumentError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// Iterate over anchor elements.
    pub fn anchors(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().flatten().filter(|e| e.is_anchor())
    }
}
