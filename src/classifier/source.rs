//! Image locator classification and byte resolution.
//!
//! Every input string maps to exactly one locator variant before any I/O
//! happens; anything unclassifiable is rejected up front as invalid input.

use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::debug;
use url::Url;

use super::error::ClassifierError;

/// Where the image bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocator {
    /// A `data:` URL carrying the payload inline, with its declared type.
    Embedded {
        content_type: String,
        payload: String,
    },
    /// A filesystem path, from a `file://` URL.
    LocalPath(PathBuf),
    /// An HTTP(S) URL whose path looks like a PNG or JPEG.
    Remote(Url),
}

/// Raw image bytes plus the content type they claim to carry.
///
/// Transient: created per classification call and discarded after decode.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ImageLocator {
    /// Classifies a locator string into exactly one variant.
    ///
    /// `data:image/...;base64,` payloads become [`ImageLocator::Embedded`],
    /// `file://` URLs become [`ImageLocator::LocalPath`], and HTTP(S) URLs
    /// ending in a known image extension become [`ImageLocator::Remote`].
    /// Everything else is rejected with
    /// [`ClassifierError::InvalidInput`] before any I/O occurs.
    pub fn classify(locator: &str) -> Result<Self, ClassifierError> {
        if locator.is_empty() {
            return Err(ClassifierError::InvalidInput(
                "image locator is empty".to_string(),
            ));
        }

        if let Some(rest) = locator.strip_prefix("data:") {
            return Self::classify_data_url(rest);
        }

        let url = Url::parse(locator).map_err(|e| {
            ClassifierError::InvalidInput(format!("unrecognized image locator '{}': {}", locator, e))
        })?;

        match url.scheme() {
            "file" => {
                let path = url.to_file_path().map_err(|_| {
                    ClassifierError::InvalidInput(format!("invalid file URL: {}", url))
                })?;
                Ok(ImageLocator::LocalPath(path))
            }
            "http" | "https" => {
                if has_image_extension(url.path()) {
                    Ok(ImageLocator::Remote(url))
                } else {
                    Err(ClassifierError::InvalidInput(format!(
                        "remote locator does not look like an image URL: {}",
                        url
                    )))
                }
            }
            other => Err(ClassifierError::InvalidInput(format!(
                "unsupported locator scheme '{}'",
                other
            ))),
        }
    }

    fn classify_data_url(rest: &str) -> Result<Self, ClassifierError> {
        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            ClassifierError::InvalidInput("data URL has no payload separator".to_string())
        })?;
        let content_type = header.strip_suffix(";base64").ok_or_else(|| {
            ClassifierError::InvalidInput("only base64-encoded data URLs are supported".to_string())
        })?;
        if !content_type.starts_with("image/") {
            return Err(ClassifierError::InvalidInput(format!(
                "embedded payload is not an image: '{}'",
                content_type
            )));
        }
        Ok(ImageLocator::Embedded {
            content_type: content_type.to_string(),
            payload: payload.to_string(),
        })
    }
}

/// Resolves a classified locator into raw bytes plus a content type.
///
/// Local files have their type sniffed from the byte content rather than
/// trusted from the extension. Remote responses use the declared
/// `Content-Type` header, falling back to sniffing when the header is
/// missing.
pub async fn resolve(locator: &ImageLocator) -> Result<RawImage, ClassifierError> {
    match locator {
        ImageLocator::Embedded {
            content_type,
            payload,
        } => {
            let bytes = BASE64.decode(payload.as_bytes()).map_err(|e| {
                ClassifierError::InvalidInput(format!("invalid base64 payload: {}", e))
            })?;
            debug!("resolved embedded payload: {} bytes ({})", bytes.len(), content_type);
            Ok(RawImage {
                bytes,
                content_type: content_type.clone(),
            })
        }
        ImageLocator::LocalPath(path) => {
            if !path.exists() {
                return Err(ClassifierError::InvalidInput(format!(
                    "image file not found: {}",
                    path.display()
                )));
            }
            let bytes = fs::read(path).map_err(|e| {
                ClassifierError::InvalidInput(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let content_type = sniff_content_type(&bytes);
            debug!(
                "resolved local file {}: {} bytes, sniffed as {}",
                path.display(),
                bytes.len(),
                content_type
            );
            Ok(RawImage {
                bytes,
                content_type,
            })
        }
        ImageLocator::Remote(url) => {
            let response = reqwest::get(url.clone())
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| {
                    ClassifierError::InvalidInput(format!("failed to fetch {}: {}", url, e))
                })?;
            let declared = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.split(';').next().unwrap_or(value).trim().to_string());
            let bytes = response
                .bytes()
                .await
                .map_err(|e| {
                    ClassifierError::InvalidInput(format!("failed to fetch {}: {}", url, e))
                })?
                .to_vec();
            let content_type = declared.unwrap_or_else(|| sniff_content_type(&bytes));
            debug!(
                "resolved remote image {}: {} bytes ({})",
                url,
                bytes.len(),
                content_type
            );
            Ok(RawImage {
                bytes,
                content_type,
            })
        }
    }
}

fn has_image_extension(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".png") || lower.ends_with(".jpg") || lower.ends_with(".jpeg")
}

/// Guesses a MIME type from magic numbers. Unknown content maps to a type
/// the decoder will reject.
fn sniff_content_type(bytes: &[u8]) -> String {
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => "application/octet-stream".to_string(),
    }
}
