// ABOUTME: Displayable image artifacts built from binary webhook responses
// ABOUTME: Resolves MIME type and file extension, reads natural dimensions, and saves to disk

use crate::constants::files;
use crate::signature::{sniff_bytes, Signature};
use anyhow::{anyhow, Context, Result};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Raw image bytes plus everything needed to present or save them.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArtifact {
    bytes: Vec<u8>,
    mime: String,
    extension: String,
    dimensions: Option<(u32, u32)>,
}

impl ImageArtifact {
    /// Wrap a binary payload. The declared content type wins when it names an
    /// image; otherwise the magic bytes decide, then `image/jpeg`.
    pub fn from_bytes(bytes: Vec<u8>, content_type: Option<&str>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(anyhow!("image data is empty"));
        }

        let declared = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty());

        let mime = match declared {
            Some(ct) if ct.starts_with("image/") => ct,
            declared => match sniff_bytes(&bytes) {
                Some(sig) if sig.is_image() => sig.mime().to_string(),
                _ => declared.unwrap_or_else(|| files::DEFAULT_MIME.to_string()),
            },
        };

        let extension = file_extension_for(&mime);

        Ok(Self {
            bytes,
            mime,
            extension,
            dimensions: None,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn signature(&self) -> Option<Signature> {
        sniff_bytes(&self.bytes)
    }

    /// Natural size, `None` until [`ImageArtifact::load`] has read the header.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Read the natural pixel size from the image header without decoding
    /// the full bitmap.
    pub fn load(&mut self) -> Result<(u32, u32)> {
        if let Some(dims) = self.dimensions {
            return Ok(dims);
        }

        let reader = image::ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .map_err(|e| anyhow!("Failed to create image reader: {}", e))?;

        if reader.format().is_none() {
            return Err(anyhow!("Could not determine image format"));
        }

        let dims = reader
            .into_dimensions()
            .map_err(|e| anyhow!("Failed to read image dimensions: {}", e))?;

        self.dimensions = Some(dims);
        Ok(dims)
    }

    /// File name used for downloads: `generated-image-<millis>.<ext>`.
    pub fn file_name(&self, millis: i64) -> String {
        format!("{}-{}.{}", files::IMAGE_PREFIX, millis, self.extension)
    }

    /// Write the artifact into `dir`, creating it when needed.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let path = dir.join(self.file_name(chrono::Utc::now().timestamp_millis()));
        std::fs::write(&path, &self.bytes)
            .with_context(|| format!("Failed to write image: {}", path.display()))?;

        log::debug!("Saved {} bytes to {}", self.bytes.len(), path.display());
        Ok(path)
    }

    pub fn dimensions_str(&self) -> String {
        match self.dimensions {
            Some((w, h)) => format!("{}x{}", w, h),
            None => "unknown".to_string(),
        }
    }

    pub fn size_str(&self) -> String {
        let size = self.bytes.len();
        if size < 1024 {
            format!("{} B", size)
        } else if size < 1024 * 1024 {
            format!("{:.1} KB", size as f64 / 1024.0)
        } else {
            format!("{:.1} MB", size as f64 / (1024.0 * 1024.0))
        }
    }
}

/// Map a MIME type to the extension used for saved files.
pub fn file_extension_for(mime: &str) -> String {
    let subtype = mime.split('/').nth(1).unwrap_or("").trim();
    match subtype {
        "jpeg" => "jpg".to_string(),
        "svg+xml" => "svg".to_string(),
        "" => files::DEFAULT_EXTENSION.to_string(),
        other => other.to_string(),
    }
}

/// Visible placeholder carrying an image failure.
pub fn error_placeholder(err: &anyhow::Error) -> String {
    format!("{}{}", crate::constants::messages::IMAGE_ERROR_PREFIX, err)
}

#[cfg(test)]
pub(crate) fn encode_test_image(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format)
        .expect("encode test image");
    buffer
}
