//! Progress-callback trait for per-file processing events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ProcessorConfigBuilder::progress_callback`] to receive
//! events as the processor works through a batch. Files are handled one at a
//! time, so events for a given file always arrive in
//! start → complete/error order before the next file starts.
//!
//! # Example
//!
//! ```rust
//! use vlm_docproc::{BatchProgressCallback, ProcessorConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, file_name: &str) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} done", index, total, file_name);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ProcessorConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the processor as it handles each file of a batch.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first file.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is normalised and sent to the VLM.
    fn on_file_start(&self, index: usize, total_files: usize, file_name: &str) {
        let _ = (index, total_files, file_name);
    }

    /// Called when a file produced a structured result.
    fn on_file_complete(&self, index: usize, total_files: usize, file_name: &str) {
        let _ = (index, total_files, file_name);
    }

    /// Called when a file failed.
    ///
    /// * `error` — human-readable error description
    fn on_file_error(&self, index: usize, total_files: usize, file_name: &str, error: &str) {
        let _ = (index, total_files, file_name, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ProcessorConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        batch_total: AtomicUsize,
        batch_success: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_files: usize) {
            self.batch_total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _name: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _index: usize, _total: usize, _name: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total_files: usize, success_count: usize) {
            self.batch_success.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_file_start(1, 2, "a.png");
        cb.on_file_complete(1, 2, "a.png");
        cb.on_file_error(2, 2, "b.pdf", "Conversion failed");
        cb.on_batch_complete(2, 1);
    }

    #[tokio::test]
    async fn batch_reports_every_file_to_the_callback() {
        use crate::config::ProcessorConfig;
        use crate::output::UploadedFile;
        use crate::process::DocumentProcessor;

        // No API key and no network: both files fail before any request.
        let tracker = Arc::new(TrackingCallback::default());
        let config = ProcessorConfig::builder()
            .progress_callback(tracker.clone())
            .build()
            .unwrap();
        let processor = DocumentProcessor::new(config).unwrap();
        let files = vec![
            UploadedFile::new("chat.png", vec![0x89, b'P', b'N', b'G'], "image/png"),
            UploadedFile::new("notes.txt", b"hello".to_vec(), "text/plain"),
        ];

        let output = processor.process_batch(&files).await;

        assert_eq!(output.stats.failed, 2);
        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.batch_success.load(Ordering::SeqCst), 0);
    }
}
