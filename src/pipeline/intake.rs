//! Input intake: work out the declared media type of a local file.
//!
//! An upload widget hands over a media type with each file; a path on disk
//! carries none. Magic bytes are checked first (`%PDF`, then whatever the
//! `image` crate recognises), with the file extension as a fallback, so a
//! mislabelled `scan.pdf` that is really a JPEG still goes down the right path.

use crate::error::FileError;
use crate::output::UploadedFile;
use std::path::Path;
use tracing::debug;

pub const PDF: &str = "application/pdf";
pub const PNG: &str = "image/png";
pub const JPEG: &str = "image/jpeg";

/// Guess the media type of `bytes`, using `file_name`'s extension as fallback.
///
/// Returns `None` when neither the content nor the extension is recognised.
pub fn sniff_media_type(bytes: &[u8], file_name: &str) -> Option<&'static str> {
    if bytes.starts_with(b"%PDF") {
        return Some(PDF);
    }

    if let Ok(format) = image::guess_format(bytes) {
        match format {
            image::ImageFormat::Png => return Some(PNG),
            image::ImageFormat::Jpeg => return Some(JPEG),
            _ => {}
        }
    }

    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)?;

    match ext.as_str() {
        "pdf" => Some(PDF),
        "png" => Some(PNG),
        "jpg" | "jpeg" => Some(JPEG),
        _ => None,
    }
}

/// Read a local file into an [`UploadedFile`], detecting its media type.
///
/// Unknown types are passed on as `application/octet-stream`; the normaliser
/// rejects them per file instead of failing here.
pub async fn read_upload(path: &Path) -> Result<UploadedFile, FileError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FileError::ReadFailed {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let media_type = sniff_media_type(&bytes, &name).unwrap_or("application/octet-stream");
    debug!("Read {} ({} bytes, {})", name, bytes.len(), media_type);

    Ok(UploadedFile::new(name, bytes, media_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_magic_wins_over_extension() {
        assert_eq!(sniff_media_type(b"%PDF-1.7\n...", "scan.png"), Some(PDF));
    }

    #[test]
    fn png_and_jpeg_magic() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(sniff_media_type(png, "noext"), Some(PNG));

        let jpeg = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";
        assert_eq!(sniff_media_type(jpeg, "photo.pdf"), Some(JPEG));
    }

    #[test]
    fn extension_fallback_is_case_insensitive() {
        assert_eq!(sniff_media_type(b"????", "Receipt.JPG"), Some(JPEG));
        assert_eq!(sniff_media_type(b"????", "doc.Pdf"), Some(PDF));
        assert_eq!(sniff_media_type(b"????", "notes.txt"), None);
        assert_eq!(sniff_media_type(b"", "README"), None);
    }

    #[tokio::test]
    async fn read_upload_missing_file_is_a_file_error() {
        let err = read_upload(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::ReadFailed { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn read_upload_detects_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%%EOF").unwrap();

        let upload = read_upload(&path).await.unwrap();
        assert_eq!(upload.name, "tiny.pdf");
        assert_eq!(upload.media_type, PDF);
        assert_eq!(upload.bytes.len(), 14);
    }
}
