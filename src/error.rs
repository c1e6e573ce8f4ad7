//! Error types for the vlm-docproc library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocprocError`] — **Fatal**: the processor itself cannot be set up
//!   (invalid configuration, HTTP client construction failed). Returned as
//!   `Err(DocprocError)` from constructors and helpers.
//!
//! * [`FileError`] — **Non-fatal**: a single uploaded file failed (bad PDF,
//!   missing API key, API error, unparsable model output). Stored inside
//!   [`crate::output::FileResult`] so the rest of the batch keeps going.

use thiserror::Error;

/// All fatal errors returned by the vlm-docproc library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::FileResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum DocprocError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed (TLS backend, bad timeout).
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file.
///
/// Every variant is caught at the per-file boundary and turned into a
/// user-visible message; none of them stops the remaining files.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileError {
    /// No bearer credential was configured. No request was sent.
    #[error("API key not configured. Set OPENROUTER_API_KEY or pass --api-key.")]
    MissingApiKey,

    /// The input could not be read from disk.
    #[error("Failed to read '{path}': {detail}")]
    ReadFailed { path: String, detail: String },

    /// PDF rasterisation or media-type handling failed.
    #[error("Conversion failed: {detail}")]
    Conversion { detail: String },

    /// Transport failure, non-2xx status, or a malformed response envelope.
    #[error("API call failed{}: {detail}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    ApiCall { status: Option<u16>, detail: String },

    /// The model's reply was not valid JSON after fence stripping.
    ///
    /// `raw` holds the untouched reply so callers can show it.
    #[error("Failed to parse VLM response as JSON: {detail}")]
    ResponseFormat { detail: String, raw: String },

    /// The result could not be serialised or written for export.
    #[error("Failed to export result: {detail}")]
    Serialization { detail: String },
}

impl FileError {
    /// Raw model output preserved for diagnostics, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            FileError::ResponseFormat { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
