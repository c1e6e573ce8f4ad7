//! Format normalisation: turn an upload into image bytes the VLM can read.
//!
//! Images go through untouched. A PDF is rasterised (first page only) with
//! pdfium and re-encoded as PNG.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and not
//! async-aware. Rendering on the blocking pool keeps the Tokio workers free
//! while a large page is rasterised.

use crate::config::ProcessorConfig;
use crate::error::FileError;
use crate::pipeline::intake::{PDF, PNG};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Image bytes plus a concrete `image/*` media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

/// How a declared media type is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Pdf,
    Image,
    Unsupported,
}

/// Classify a declared media type, ignoring case and parameters.
pub fn classify(declared_mime: &str) -> MediaKind {
    let essence = declared_mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == PDF {
        MediaKind::Pdf
    } else if essence.starts_with("image/") {
        MediaKind::Image
    } else {
        MediaKind::Unsupported
    }
}

/// Normalise `bytes` declared as `declared_mime` into an image.
///
/// # Errors
/// [`FileError::Conversion`] when the PDF has no pages or cannot be decoded,
/// when pdfium cannot be loaded, or when the media type is neither a PDF nor
/// an image.
pub async fn normalize(
    bytes: &[u8],
    declared_mime: &str,
    config: &ProcessorConfig,
) -> Result<NormalizedImage, FileError> {
    match classify(declared_mime) {
        MediaKind::Image => Ok(NormalizedImage {
            bytes: bytes.to_vec(),
            media_type: declared_mime.to_string(),
        }),
        MediaKind::Pdf => {
            info!("PDF detected, rasterising first page");
            let png = rasterise_first_page(bytes.to_vec(), config).await?;
            Ok(NormalizedImage {
                bytes: png,
                media_type: PNG.to_string(),
            })
        }
        MediaKind::Unsupported => Err(FileError::Conversion {
            detail: format!(
                "unsupported media type '{declared_mime}' (expected a PDF, PNG or JPEG)"
            ),
        }),
    }
}

/// Render page 1 of `pdf` and return it PNG-encoded.
async fn rasterise_first_page(pdf: Vec<u8>, config: &ProcessorConfig) -> Result<Vec<u8>, FileError> {
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let lib_path = config.pdfium_lib_path.clone();

    tokio::task::spawn_blocking(move || {
        rasterise_first_page_blocking(&pdf, dpi, max_pixels, lib_path.as_deref())
    })
    .await
    .map_err(|e| FileError::Conversion {
        detail: format!("render task panicked: {e}"),
    })?
}

/// Blocking implementation of first-page rendering.
fn rasterise_first_page_blocking(
    pdf: &[u8],
    dpi: u32,
    max_pixels: u32,
    lib_path: Option<&Path>,
) -> Result<Vec<u8>, FileError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| FileError::Conversion {
            detail: format!("could not open PDF: {e:?}"),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    debug!("PDF loaded: {} pages", total_pages);
    if total_pages == 0 {
        return Err(FileError::Conversion {
            detail: "PDF has no pages".into(),
        });
    }

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let page = pages.get(0).map_err(|e| FileError::Conversion {
        detail: format!("could not load page 1: {e:?}"),
    })?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| FileError::Conversion {
            detail: format!("could not render page 1: {e:?}"),
        })?;

    let image = bitmap.as_image();
    debug!("Rendered page 1 → {}x{} px", image.width(), image.height());

    encode_png(&image).map_err(|e| FileError::Conversion {
        detail: format!("PNG encoding failed: {e}"),
    })
}

/// PNG-encode a rendered page.
pub(crate) fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Load pdfium: an explicit path first, then the working directory, then the
/// system library.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, FileError> {
    let bindings = match lib_path {
        Some(path) => Pdfium::bind_to_library(library_file(path)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| FileError::Conversion {
        detail: format!(
            "pdfium library unavailable: {e:?}. Set PDFIUM_LIB_PATH to a libpdfium build."
        ),
    })?;

    Ok(Pdfium::new(bindings))
}

/// Whether pdfium can be loaded from `lib_path` (or the default locations).
///
/// PDF uploads fail with [`FileError::Conversion`] when this is `false`.
pub fn pdfium_available(lib_path: Option<&Path>) -> bool {
    bind_pdfium(lib_path).is_ok()
}

/// Accept either the library file itself or the directory containing it.
fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}
