//! Export of structured results as downloadable JSON documents.
//!
//! Each successful file can be saved as `<original-file-name>_output.json`
//! containing its reply as indented JSON. Failures here are reported as
//! [`FileError::Serialization`] for that file only.

use crate::error::FileError;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to the original upload name.
pub const EXPORT_SUFFIX: &str = "_output.json";

/// Media type of exported documents.
pub const EXPORT_MEDIA_TYPE: &str = "application/json";

/// A serialised result ready to be offered for download or written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Export {
    pub file_name: String,
    pub contents: String,
    pub media_type: &'static str,
}

/// `"<original>_output.json"`.
pub fn export_file_name(original: &str) -> String {
    format!("{original}{EXPORT_SUFFIX}")
}

/// Serialise `value` as two-space-indented JSON.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, FileError> {
    serde_json::to_string_pretty(value).map_err(|e| FileError::Serialization {
        detail: e.to_string(),
    })
}

/// Build the [`Export`] for a structured result.
pub fn prepare(original_name: &str, data: &Value) -> Result<Export, FileError> {
    Ok(Export {
        file_name: export_file_name(original_name),
        contents: to_pretty_json(data)?,
        media_type: EXPORT_MEDIA_TYPE,
    })
}

/// Write `export` into `dir`, returning the final path.
///
/// The file is written to a temp file in `dir` and then renamed, so readers
/// never see a half-written document.
pub fn write_export(dir: &Path, export: &Export) -> Result<PathBuf, FileError> {
    let fail = |e: std::io::Error| FileError::Serialization {
        detail: format!("could not write '{}': {e}", export.file_name),
    };

    std::fs::create_dir_all(dir).map_err(fail)?;

    // Upload names may carry directory parts; keep only the final component.
    let file_name = Path::new(&export.file_name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(EXPORT_SUFFIX.trim_start_matches('_')));
    let path = dir.join(file_name);

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(export.contents.as_bytes())
        .and_then(|_| tmp.write_all(b"\n"))
        .map_err(fail)?;
    tmp.persist(&path).map_err(|e| fail(e.error))?;

    debug!("Exported {}", path.display());
    Ok(path)
}
