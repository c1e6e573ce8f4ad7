//! Input and output types of a processing run.

use crate::error::FileError;
use crate::export::{self, Export};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The structured payload on success, or the per-file error.
pub type VlmResult = Result<Value, FileError>;

/// A file handed over by the caller: name, raw bytes and declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }
}

/// Outcome of processing one file.
///
/// Exactly one of `data` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    /// Name of the uploaded file.
    pub file_name: String,

    /// Media type sent to the VLM, or the declared type if normalisation failed.
    pub media_type: String,

    /// Parsed model reply. `None` when `error` is set.
    pub data: Option<Value>,

    /// Per-file failure. `None` on success.
    pub error: Option<FileError>,

    /// Deviations of `data` from the requested shape. Never fatal.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Wall-clock time spent on this file.
    pub duration_ms: u64,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.data.is_some()
    }

    /// Owned [`VlmResult`].
    pub fn into_result(self) -> VlmResult {
        match (self.data, self.error) {
            (_, Some(e)) => Err(e),
            (Some(v), None) => Ok(v),
            // Not produced by the processor; only a hand-built record gets here.
            (None, None) => Err(FileError::ApiCall {
                status: None,
                detail: "No valid response from VLM".into(),
            }),
        }
    }

    /// Indented-JSON export of a successful result.
    ///
    /// `None` for failed files; `Some(Err(_))` when serialisation fails.
    pub fn export(&self) -> Option<Result<Export, FileError>> {
        let data = self.data.as_ref().filter(|_| self.error.is_none())?;
        Some(export::prepare(&self.file_name, data))
    }
}

/// Summary counts for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

/// All per-file results of a batch, in upload order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    pub files: Vec<FileResult>,
    pub stats: BatchStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_result() -> FileResult {
        FileResult {
            file_name: "invoice.pdf".into(),
            media_type: "image/png".into(),
            data: Some(json!({"category": "invoice", "extracted_content": {}, "description": "x"})),
            error: None,
            warnings: vec![],
            duration_ms: 12,
        }
    }

    #[test]
    fn success_converts_to_ok() {
        let r = ok_result();
        assert!(r.is_success());
        assert_eq!(r.into_result().unwrap()["category"], "invoice");
    }

    #[test]
    fn error_converts_to_err_and_has_no_export() {
        let r = FileResult {
            data: None,
            error: Some(FileError::MissingApiKey),
            ..ok_result()
        };
        assert!(!r.is_success());
        assert!(r.export().is_none());
        assert_eq!(r.into_result(), Err(FileError::MissingApiKey));
    }

    #[test]
    fn success_offers_export() {
        let export = ok_result().export().unwrap().unwrap();
        assert_eq!(export.file_name, "invoice.pdf_output.json");
    }

    #[test]
    fn warnings_omitted_when_empty() {
        let v = serde_json::to_value(ok_result()).unwrap();
        assert!(v.get("warnings").is_none());
    }
}
