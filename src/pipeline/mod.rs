//! Pipeline stages for model-document export.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets the batch driver
//! compose them without any stage knowing about the next.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ normalize ──▶ render ──▶ encode
//! (anchors)    (ground +     (preview   (interchange
//!               inline)       capture)   payload)
//! ```
//!
//! 1. [`validate`]  - pure invariant checks over the parsed document
//! 2. [`normalize`] - destructive in-memory rewrites: vertical grounding,
//!    then texture inlining (order fixed for determinism)
//! 3. [`render`]    - synchronize with the external renderer's update cycle
//!    and capture the preview image
//! 4. [`encode`]    - compile the interchange payload via the external
//!    encoder, rejecting empty results
//!
//! Loading and persistence bracket these stages in [`crate::batch`].

pub mod encode;
pub mod normalize;
pub mod render;
pub mod validate;
