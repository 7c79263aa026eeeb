//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ExportConfigBuilder::progress_callback`] to receive
//! events as the batch works through each document. The callback approach is
//! the least-invasive integration point: callers can forward events to a
//! channel, a status dialog, or a terminal progress bar without the library
//! knowing how the host application communicates.

use crate::report::ExportStatus;
use std::sync::Arc;

/// Called by the batch pipeline as it processes each document.
///
/// Documents are processed strictly sequentially, so the events for one
/// document always complete before the next document's begin. All methods
/// have default no-op implementations so callers only override what they
/// care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any document is processed.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document enters the pipeline.
    ///
    /// `index` is 1-based.
    fn on_document_start(&self, index: usize, total: usize, document: &str) {
        let _ = (index, total, document);
    }

    /// Called when a document completes all stages, with or without
    /// warnings.
    fn on_document_complete(&self, index: usize, total: usize, document: &str, status: ExportStatus) {
        let _ = (index, total, document, status);
    }

    /// Called when a document fails at some stage.
    fn on_document_error(&self, index: usize, total: usize, document: &str, error: &str) {
        let _ = (index, total, document, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in
/// [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        batch_total: AtomicUsize,
        batch_succeeded: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total: usize) {
            self.batch_total.store(total, Ordering::SeqCst);
        }

        fn on_document_start(&self, _index: usize, _total: usize, _document: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(
            &self,
            _index: usize,
            _total: usize,
            _document: &str,
            _status: ExportStatus,
        ) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _index: usize, _total: usize, _document: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total: usize, succeeded: usize) {
            self.batch_succeeded.store(succeeded, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(3);
        cb.on_document_start(1, 3, "chair");
        cb.on_document_complete(1, 3, "chair", ExportStatus::Success);
        cb.on_document_error(2, 3, "table", "boom");
        cb.on_batch_complete(3, 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            batch_total: AtomicUsize::new(0),
            batch_succeeded: AtomicUsize::new(0),
        };

        tracker.on_batch_start(2);
        tracker.on_document_start(1, 2, "chair");
        tracker.on_document_complete(1, 2, "chair", ExportStatus::Warning);
        tracker.on_document_start(2, 2, "table");
        tracker.on_document_error(2, 2, "table", "validation failed");
        tracker.on_batch_complete(2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.batch_succeeded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn BatchProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_document_start(1, 10, "doc");
    }
}
