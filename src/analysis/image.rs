//! Image codec — validates an uploaded wound photograph and produces the
//! transport-safe inline representation sent to the vision model.
//!
//! Format detection uses magic bytes, never the file extension. The size and
//! type gate runs before any network activity so an invalid upload cannot
//! waste a paid inference call.

use std::path::Path;

use base64::Engine as _;

use super::ImageError;

/// Largest accepted upload. Matches the inline-payload ceiling of the
/// inference provider's data-URI transport.
pub const MAX_IMAGE_BYTES: u64 = 4 * 1024 * 1024;

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Jpeg,
    Png,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// A validated wound image, ready to be embedded in a request.
///
/// Immutable once created; discarded after the request is built.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    mime_type: ImageMime,
    size_bytes: u64,
}

impl ImagePayload {
    /// Validate raw bytes and build the payload.
    ///
    /// Fails with `SizeExceeded` above [`MAX_IMAGE_BYTES`] and with
    /// `UnsupportedType` for anything that is not JPEG or PNG.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImageError> {
        let size_bytes = bytes.len() as u64;
        if size_bytes > MAX_IMAGE_BYTES {
            return Err(ImageError::SizeExceeded { size_bytes });
        }

        let mime_type = detect_mime(&bytes).ok_or(ImageError::UnsupportedType)?;

        Ok(Self {
            bytes,
            mime_type,
            size_bytes,
        })
    }

    /// Read and validate an image file.
    pub fn from_file(path: &Path) -> Result<Self, ImageError> {
        // Reject on metadata size first so an oversized file is never
        // read into memory.
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::SizeExceeded {
                size_bytes: metadata.len(),
            });
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn mime_type(&self) -> ImageMime {
        self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Inline `data:` URI for the image part of the multimodal request.
    pub fn data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime_type.as_str(), encoded)
    }
}

/// Detect JPEG/PNG from magic bytes. Magic bytes don't lie — extensions
/// and caller-supplied mime strings can be wrong.
fn detect_mime(bytes: &[u8]) -> Option<ImageMime> {
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some(ImageMime::Jpeg),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some(ImageMime::Png),
        _ => None,
    }
}
