//! Image encoding: normalised bytes → base64 data URI.
//!
//! Chat-completions APIs accept images inline as
//! `data:<mime>;base64,<data>` in an `image_url` content part, so no upload
//! step or public URL is needed.

use crate::pipeline::normalize::NormalizedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Encode `image` as a data URI using the standard base64 alphabet.
pub fn to_data_uri(image: &NormalizedImage) -> String {
    let b64 = STANDARD.encode(&image.bytes);
    debug!("Encoded image → {} bytes base64", b64.len());
    format!("data:{};base64,{}", image.media_type, b64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_has_mime_prefix_and_valid_payload() {
        let image = NormalizedImage {
            bytes: vec![0x89, b'P', b'N', b'G', 0, 255],
            media_type: "image/png".into(),
        };
        let uri = to_data_uri(&image);
        let payload = uri
            .strip_prefix("data:image/png;base64,")
            .expect("prefix present");
        assert_eq!(STANDARD.decode(payload).expect("valid base64"), image.bytes);
    }

    #[test]
    fn uses_standard_alphabet_with_padding() {
        let image = NormalizedImage {
            bytes: vec![0xFB, 0xFF],
            media_type: "image/jpeg".into(),
        };
        assert_eq!(to_data_uri(&image), "data:image/jpeg;base64,+/8=");
    }
}
