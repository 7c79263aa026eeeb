//! # modelport
//!
//! Batch-export 3D model documents: validate anchor invariants, normalize
//! geometry, and drive each document through a host application's render
//! and encode services.
//!
//! ## Why this crate?
//!
//! Exporting a directory of models by hand means opening each one, checking
//! its attachment anchors, grounding it, re-linking its textures, taking a
//! screenshot and running the interchange exporter, then putting the editor
//! back how it was. Doing that for fifty models is tedious and error-prone;
//! one mis-placed anchor silently ships a broken asset. This crate runs the
//! whole sequence per document, records exactly what happened to each, and
//! guarantees the host ends up on the document it started on.
//!
//! ## Pipeline Overview
//!
//! ```text
//! *.bbmodel
//!  |
//!  |- 1. Load       read bytes, parse JSON (unknown fields preserved)
//!  |- 2. Validate   anchor invariants, element/texture presence
//!  |- 3. Normalize  ground to Y=0, inline textures as base64 data URIs
//!  |- 4. Render     hand to host, await renderer flush, capture preview
//!  |- 5. Encode     compile interchange payload (glTF)
//!  |- 6. Persist    output/<stem>/ png + gltf + source copy
//!  |
//!  `- restore host's prior active document, unconditionally
//! ```
//!
//! A failure in any stage fails that document only; the batch continues and
//! the final [`BatchReport`] carries one record per document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modelport::{export_directory, ExportConfig, ExportServices};
//!
//! # async fn run(services: ExportServices) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExportConfig::builder()
//!     .viewport(1920, 1080)
//!     .render_timeout_ms(5000)
//!     .build()?;
//!
//! // `services` bridges storage, host, renderer and encoder; see
//! // the `services` module for the traits to implement.
//! let report = export_directory(&services, &config).await?;
//! for record in &report.records {
//!     println!("{}: {:?} - {}", record.document, record.status, record.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Without a host application, [`check_batch`] runs the Load, Validate and
//! Normalize stages alone; the `modelport` binary (feature `cli`, on by
//! default) wraps it for the command line.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `modelport` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! modelport = { version = "0.3", default-features = false }
//! ```

pub mod batch;
pub mod config;
pub mod discover;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod services;

pub use batch::{check_batch, export_batch, export_directory, ExportServices, Stage};
pub use config::{EncodeOptions, ExportConfig, ExportConfigBuilder, Projection, ViewConfig};
pub use document::{Element, ModelDocument, Texture, Vec3};
pub use error::{DocumentError, ModelPortError, ServiceError};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{BatchReport, BatchStats, Diagnostics, ExportRecord, ExportStatus};
pub use services::{DocumentHost, EncoderService, HostDocId, LocalStorage, RendererService, Storage};
