//! Processing entry points: one file, a batch, or a local path.
//!
//! Every file goes through the same steps, and any failure is caught here and
//! stored in its [`FileResult`] so later files still run:
//!
//! ```text
//! bytes + declared type
//!  │
//!  ├─ 1. Normalise  PDF → first page PNG, images unchanged
//!  ├─ 2. Extract    one VLM call with the extraction prompt
//!  └─ 3. Inspect    flag (never fix) deviations from the requested shape
//! ```

use crate::config::ProcessorConfig;
use crate::error::{DocprocError, FileError};
use crate::extraction::shape_warnings;
use crate::output::{BatchOutput, BatchStats, FileResult, UploadedFile};
use crate::pipeline::{intake, normalize, vlm::VlmClient};
use crate::prompts::extraction_prompt;
use serde_json::Value;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Runs uploaded documents through normalisation and the VLM, one at a time.
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    client: VlmClient,
}

impl DocumentProcessor {
    pub fn new(config: ProcessorConfig) -> Result<Self, DocprocError> {
        Ok(Self {
            client: VlmClient::new(config)?,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        self.client.config()
    }

    /// Process one file.
    ///
    /// Never fails as a whole: errors land in [`FileResult::error`]. Use
    /// [`FileResult::into_result`] for a plain `Result`.
    pub async fn process(&self, file_bytes: &[u8], declared_mime: &str, file_name: &str) -> FileResult {
        let start = Instant::now();
        info!("Processing {} ({})", file_name, declared_mime);

        let outcome = self.run(file_bytes, declared_mime).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok((media_type, data)) => {
                let warnings = shape_warnings(&data);
                for w in &warnings {
                    warn!("{}: {}", file_name, w);
                }
                info!("Processed {} in {}ms", file_name, duration_ms);
                FileResult {
                    file_name: file_name.to_string(),
                    media_type,
                    data: Some(data),
                    error: None,
                    warnings,
                    duration_ms,
                }
            }
            Err(e) => {
                warn!("{}: {}", file_name, e);
                failed(file_name, declared_mime, e, duration_ms)
            }
        }
    }

    async fn run(&self, file_bytes: &[u8], declared_mime: &str) -> Result<(String, Value), FileError> {
        let config = self.client.config();
        let image = normalize::normalize(file_bytes, declared_mime, config).await?;
        let data = self.client.extract(&image, extraction_prompt(config)).await?;
        Ok((image.media_type, data))
    }

    /// Process an [`UploadedFile`].
    pub async fn process_upload(&self, file: &UploadedFile) -> FileResult {
        self.process(&file.bytes, &file.media_type, &file.name).await
    }

    /// Read, sniff and process a local file. Unreadable paths become a
    /// failed [`FileResult`].
    pub async fn process_path(&self, path: impl AsRef<Path>) -> FileResult {
        let path = path.as_ref();
        let start = Instant::now();
        match intake::read_upload(path).await {
            Ok(upload) => self.process_upload(&upload).await,
            Err(e) => {
                warn!("{}", e);
                let name = path.display().to_string();
                failed(&name, "application/octet-stream", e, start.elapsed().as_millis() as u64)
            }
        }
    }

    /// Process `files` sequentially in order.
    ///
    /// Each file's VLM call completes before the next file starts. A failure
    /// in one file has no effect on the others.
    pub async fn process_batch(&self, files: &[UploadedFile]) -> BatchOutput {
        let total_start = Instant::now();
        let total = files.len();
        let progress = self.config().progress_callback.clone();

        if let Some(ref cb) = progress {
            cb.on_batch_start(total);
        }

        let mut results = Vec::with_capacity(total);
        for (i, file) in files.iter().enumerate() {
            let index = i + 1;
            if let Some(ref cb) = progress {
                cb.on_file_start(index, total, &file.name);
            }

            let result = self.process_upload(file).await;

            if let Some(ref cb) = progress {
                match &result.error {
                    None => cb.on_file_complete(index, total, &file.name),
                    Some(e) => cb.on_file_error(index, total, &file.name, &e.to_string()),
                }
            }
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let stats = BatchStats {
            total_files: total,
            succeeded,
            failed: total - succeeded,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Batch complete: {}/{} files, {}ms total",
            succeeded, total, stats.total_duration_ms
        );

        if let Some(ref cb) = progress {
            cb.on_batch_complete(total, succeeded);
        }

        BatchOutput {
            files: results,
            stats,
        }
    }
}

fn failed(file_name: &str, media_type: &str, error: FileError, duration_ms: u64) -> FileResult {
    FileResult {
        file_name: file_name.to_string(),
        media_type: media_type.to_string(),
        data: None,
        error: Some(error),
        warnings: Vec::new(),
        duration_ms,
    }
}

/// Synchronous wrapper around [`DocumentProcessor::process_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(config: ProcessorConfig, files: &[UploadedFile]) -> Result<BatchOutput, DocprocError> {
    let processor = DocumentProcessor::new(config)?;
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| DocprocError::Internal(format!("Failed to create tokio runtime: {e}")))?;
    Ok(runtime.block_on(processor.process_batch(files)))
}
