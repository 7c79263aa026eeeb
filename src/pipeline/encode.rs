//! Encode stage: compile the active document into the interchange format.
//!
//! The encoder is an opaque service; this stage only adds the defensive
//! checks around it. An empty payload is rejected explicitly because it is
//! never a valid encoding and must not reach storage, where it would look
//! like a successful export.

use tracing::debug;

use crate::batch::Stage;
use crate::config::EncodeOptions;
use crate::error::DocumentError;
use crate::services::EncoderService;

/// Compile the active document into interchange-format bytes.
pub async fn encode_interchange(
    encoder: &dyn EncoderService,
    options: &EncodeOptions,
) -> Result<Vec<u8>, DocumentError> {
    let payload = encoder
        .encode(options)
        .await
        .map_err(|e| DocumentError::Service {
            stage: Stage::Encode,
            detail: e.to_string(),
        })?;

    if payload.is_empty() {
        return Err(DocumentError::EmptyPayload);
    }

    debug!("encoded interchange payload, {} bytes", payload.len());
    Ok(payload)
}
