//! Configuration for a batch export run.
//!
//! All behaviour is controlled through [`ExportConfig`], built via its
//! [`ExportConfigBuilder`]. Keeping every knob in one struct makes it easy
//! to share a config across a batch, serialise the interesting parts for
//! logging, and diff two runs to understand why their outputs differ.

use crate::document::Vec3;
use crate::error::ModelPortError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Camera and viewport settings handed to the renderer for the preview
/// capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Camera position in model space.
    pub camera_position: Vec3,
    pub projection: Projection,
    /// Camera zoom factor. 1.0 frames the whole model.
    pub zoom: f64,
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            camera_position: [40.0, 24.0, 40.0],
            projection: Projection::Perspective,
            zoom: 1.0,
            width: 1280,
            height: 720,
        }
    }
}

/// Renderer projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

/// Flags handed to the encoder service when compiling the interchange
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Embed textures in the payload.
    pub textures: bool,
    /// Package the payload as a binary archive instead of plain text.
    pub archive: bool,
    /// Include animation data.
    pub animation: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            textures: true,
            archive: false,
            animation: true,
        }
    }
}

/// Configuration for a batch export.
///
/// Built via [`ExportConfig::builder()`] or [`ExportConfig::default()`].
///
/// # Example
/// ```rust
/// use modelport::ExportConfig;
///
/// let config = ExportConfig::builder()
///     .viewport(1920, 1080)
///     .render_timeout_ms(5000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Preview capture settings.
    pub view: ViewConfig,

    /// Interchange encoding flags.
    pub encode: EncodeOptions,

    /// Upper bound on waiting for the renderer's flush acknowledgment, in
    /// milliseconds. Default: 2000.
    ///
    /// The renderer's update cycle runs independently of the pipeline; a
    /// renderer that never acknowledges would otherwise stall the whole
    /// batch. On expiry the document fails with a render timeout and the
    /// batch moves on.
    pub render_timeout_ms: u64,

    /// Name of the output directory created next to the documents.
    /// Default: "output".
    pub output_dir_name: String,

    /// Absolute output root overriding `output_dir_name` placement. When
    /// set, per-document output directories are created under this path
    /// instead of next to each source document.
    pub output_root: Option<PathBuf>,

    /// File extension (without dot) of the documents to discover.
    /// Default: "bbmodel".
    pub document_extension: String,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            view: ViewConfig::default(),
            encode: EncodeOptions::default(),
            render_timeout_ms: 2000,
            output_dir_name: "output".to_string(),
            output_root: None,
            document_extension: "bbmodel".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("view", &self.view)
            .field("encode", &self.encode)
            .field("render_timeout_ms", &self.render_timeout_ms)
            .field("output_dir_name", &self.output_dir_name)
            .field("output_root", &self.output_root)
            .field("document_extension", &self.document_extension)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn camera_position(mut self, position: Vec3) -> Self {
        self.config.view.camera_position = position;
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.config.view.projection = projection;
        self
    }

    pub fn zoom(mut self, zoom: f64) -> Self {
        self.config.view.zoom = zoom;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.view.width = width;
        self.config.view.height = height;
        self
    }

    pub fn encode_textures(mut self, v: bool) -> Self {
        self.config.encode.textures = v;
        self
    }

    pub fn encode_archive(mut self, v: bool) -> Self {
        self.config.encode.archive = v;
        self
    }

    pub fn encode_animation(mut self, v: bool) -> Self {
        self.config.encode.animation = v;
        self
    }

    pub fn render_timeout_ms(mut self, ms: u64) -> Self {
        self.config.render_timeout_ms = ms.max(1);
        self
    }

    pub fn output_dir_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_dir_name = name.into();
        self
    }

    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_root = Some(root.into());
        self
    }

    /// Document file extension; a leading dot is stripped.
    pub fn document_extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.config.document_extension = ext.trim_start_matches('.').to_string();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, ModelPortError> {
        let c = &self.config;
        if c.view.width == 0 || c.view.height == 0 {
            return Err(ModelPortError::InvalidConfig(format!(
                "viewport must be nonzero, got {}x{}",
                c.view.width, c.view.height
            )));
        }
        if !(c.view.zoom.is_finite() && c.view.zoom > 0.0) {
            return Err(ModelPortError::InvalidConfig(format!(
                "zoom must be a positive number, got {}",
                c.view.zoom
            )));
        }
        if c.document_extension.is_empty() {
            return Err(ModelPortError::InvalidConfig(
                "document extension must not be empty".into(),
            ));
        }
        if c.output_dir_name.is_empty() {
            return Err(ModelPortError::InvalidConfig(
                "output directory name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
