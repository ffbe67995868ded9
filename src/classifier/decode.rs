//! Content-type dispatch into the image codec.

use std::io::Cursor;

use image::{ImageFormat, ImageReader, RgbImage};
use log::debug;

use super::error::ClassifierError;
use super::source::RawImage;

/// Decodes raw bytes into an RGB bitmap, dispatching strictly on the
/// declared content type.
///
/// Only `image/png` and the JPEG family (`image/jpeg`, `image/jpg`) are
/// accepted; any other type is a [`ClassifierError::Decode`] rather than a
/// pass-through to inference with undefined input. The codec reads the
/// buffer through a `Cursor`, so the full payload is available before the
/// decoder finalizes.
pub fn decode_bitmap(raw: &RawImage) -> Result<RgbImage, ClassifierError> {
    let format = match raw.content_type.as_str() {
        "image/png" => ImageFormat::Png,
        "image/jpeg" | "image/jpg" => ImageFormat::Jpeg,
        other => {
            return Err(ClassifierError::Decode(format!(
                "unsupported content type '{}', expected image/png or image/jpeg",
                other
            )))
        }
    };

    let bitmap = ImageReader::with_format(Cursor::new(&raw.bytes), format)
        .decode()
        .map_err(|e| {
            ClassifierError::Decode(format!("{} decode failed: {}", raw.content_type, e))
        })?
        .to_rgb8();

    debug!(
        "decoded {} image: {}x{}",
        raw.content_type,
        bitmap.width(),
        bitmap.height()
    );
    Ok(bitmap)
}
