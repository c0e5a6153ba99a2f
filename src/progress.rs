//! Progress-callback trait for per-document extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the batch runner works through a directory.
//!
//! # Example
//!
//! ```rust
//! use degree_layout::{ExtractionProgressCallback, ExtractionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, name: &str, subjects: usize, _issues: usize) {
//!         let n = self.done.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("#{n} {name}: {subjects} subjects");
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch runner as it processes each document.
///
/// Documents are extracted on several worker threads at once, so every
/// method may be called concurrently. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once, after the input directory has been listed.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a worker picks up a document.
    fn on_document_start(&self, name: &str) {
        let _ = name;
    }

    /// Called when a record was produced.
    ///
    /// # Arguments
    /// * `name`: input file name
    /// * `subjects`: subjects found in the study plan
    /// * `issues`: data-quality issues attached to the record
    fn on_document_complete(&self, name: &str, subjects: usize, issues: usize) {
        let _ = (name, subjects, issues);
    }

    /// Called when a document was skipped or failed.
    fn on_document_error(&self, name: &str, error: &str) {
        let _ = (name, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, extracted: usize) {
        let _ = (total_documents, extracted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
