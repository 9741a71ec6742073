//! Drawing images at the upload boundary.
//!
//! Only png, jpg and jpeg uploads are accepted. The extension is checked
//! before any bytes are read, then the content is decoded to make sure it
//! really is a PNG or JPEG bitmap. The original encoded bytes are kept as-is
//! for display and for the inference request.

use crate::error::{InputError, IoError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Accepted file extensions (case-insensitive).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Largest accepted upload (20 MiB).
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Encoded image formats a drawing may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG (`.jpg` or `.jpeg`).
    Jpeg,
}

impl DrawingFormat {
    /// Maps a file extension to a format.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = SUPPORTED_EXTENSIONS
            .iter()
            .find(|supported| supported.eq_ignore_ascii_case(ext))?;
        match *ext {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Maps a file name to a format by its extension.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// MIME type sent with the image.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    const fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }

    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            _ => None,
        }
    }
}

/// Checks an upload's file name against the accepted extensions.
///
/// # Errors
///
/// Returns `InputError::UnsupportedType` for any other extension.
pub fn check_file_type(name: &str) -> std::result::Result<DrawingFormat, InputError> {
    DrawingFormat::from_file_name(name).ok_or_else(|| InputError::UnsupportedType {
        name: name.to_string(),
    })
}

/// A decoded engineering drawing.
#[derive(Clone)]
pub struct DrawingImage {
    name: String,
    bytes: Vec<u8>,
    format: DrawingFormat,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for DrawingImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingImage")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl DrawingImage {
    /// Decodes an uploaded file.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedType` if the name has the wrong extension,
    /// `TooLarge` above [`MAX_UPLOAD_BYTES`], and `Undecodable` when the bytes
    /// are not a readable PNG or JPEG.
    pub fn decode(
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> std::result::Result<Self, InputError> {
        let name = name.into();
        check_file_type(&name)?;

        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(InputError::TooLarge {
                name,
                size: bytes.len(),
                max: MAX_UPLOAD_BYTES,
            });
        }

        let undecodable = |reason: String| InputError::Undecodable {
            name: name.clone(),
            reason,
        };

        // Content decides the MIME type; a PNG saved as .jpg is still a PNG.
        let guessed = image::guess_format(&bytes).map_err(|e| undecodable(e.to_string()))?;
        let format = DrawingFormat::from_image_format(guessed)
            .ok_or_else(|| undecodable(format!("content is {guessed:?}, not PNG or JPEG")))?;

        let bitmap = image::load_from_memory_with_format(&bytes, format.image_format())
            .map_err(|e| undecodable(e.to_string()))?;

        debug!(
            name = %name,
            format = ?format,
            width = bitmap.width(),
            height = bitmap.height(),
            "drawing decoded"
        );

        Ok(Self {
            width: bitmap.width(),
            height: bitmap.height(),
            name,
            bytes,
            format,
        })
    }

    /// Reads and decodes a drawing from disk.
    ///
    /// The extension is checked before the file is opened.
    ///
    /// # Errors
    ///
    /// Returns an input error for unsupported or undecodable files and an
    /// I/O error if the file cannot be read.
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        check_file_type(&name)?;

        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let bytes = std::fs::read(path).map_err(|e| IoError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self::decode(name, bytes)?)
    }

    /// Original file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encoded bytes exactly as uploaded.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Detected format.
    #[must_use]
    pub const fn format(&self) -> DrawingFormat {
        self.format
    }

    /// MIME type of the encoded bytes.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Bitmap dimensions as (width, height).
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the encoded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the encoded bytes are empty (never true after decoding).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 of the encoded bytes for inline request payloads.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}
