//! PNG export: encoding, data URIs and download sinks.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;

pub const EXPORT_FILE_NAME: &str = "qrcode.png";
pub const EXPORT_MIME: &str = "image/png";

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to encode PNG: {0}")]
    Encode(String),
    #[error("Invalid PNG data URI: {0}")]
    InvalidDataUri(String),
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Encodes an RGBA raster as PNG.
///
/// # Errors
/// Returns [`ExportError::Encode`] if the encoder rejects the buffer.
pub fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    use image::ImageEncoder as _;
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};

    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Fast, FilterType::Adaptive);
    let (w, h) = raster.dimensions();
    encoder
        .write_image(raster.as_raw(), w, h, image::ExtendedColorType::Rgba8)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(buf)
}

pub fn to_data_uri(png: &[u8]) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(png))
}

/// Decodes a `data:image/png;base64,...` URI back into PNG bytes.
///
/// # Errors
/// Returns [`ExportError::InvalidDataUri`] for another media type or bad Base64.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ExportError> {
    let payload = uri
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or_else(|| ExportError::InvalidDataUri("expected an image/png base64 URI".into()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| ExportError::InvalidDataUri(e.to_string()))
}

/// A file handed to a [`DownloadSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    pub data_uri: String,
}

impl ExportedFile {
    pub(crate) fn png(raster: &RgbaImage) -> Result<Self, ExportError> {
        let png = encode_png(raster)?;
        Ok(Self {
            file_name: EXPORT_FILE_NAME.to_string(),
            mime: EXPORT_MIME,
            width: raster.width(),
            height: raster.height(),
            data_uri: to_data_uri(&png),
        })
    }

    /// Raw PNG bytes carried by the data URI.
    ///
    /// # Errors
    /// Returns an error if the data URI is malformed.
    pub fn png_bytes(&self) -> Result<Vec<u8>, ExportError> {
        decode_data_uri(&self.data_uri)
    }
}

/// Destination of an exported file (the "download").
pub trait DownloadSink {
    /// # Errors
    /// Returns an error if the file cannot be delivered.
    fn deliver(&mut self, file: &ExportedFile) -> Result<(), ExportError>;
}

/// Writes exports into a directory under their file name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    last_written: Option<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_written: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the most recent delivery.
    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, file: &ExportedFile) -> Result<(), ExportError> {
        let bytes = file.png_bytes()?;
        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(&file.file_name);
        fs::write(&path, bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "exported QR code");
        self.last_written = Some(path);
        Ok(())
    }
}

/// Keeps every delivered file in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub files: Vec<ExportedFile>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DownloadSink for MemorySink {
    fn deliver(&mut self, file: &ExportedFile) -> Result<(), ExportError> {
        self.files.push(file.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;
    use tempfile::TempDir;

    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn checkerboard(size: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn test_exported_file_decodes_to_same_pixels() {
        let raster = checkerboard(16);
        let file = ExportedFile::png(&raster).unwrap();

        assert_eq!(file.file_name, "qrcode.png");
        assert!(file.data_uri.starts_with("data:image/png;base64,"));

        let bytes = file.png_bytes().unwrap();
        assert_eq!(bytes[..8], PNG_SIGNATURE);
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_decode_rejects_other_media_types() {
        assert!(matches!(
            decode_data_uri("data:image/jpeg;base64,AAAA"),
            Err(ExportError::InvalidDataUri(_))
        ));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,@@@"),
            Err(ExportError::InvalidDataUri(_))
        ));
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = TempDir::new().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("out"));
        let file = ExportedFile::png(&checkerboard(8)).unwrap();

        sink.deliver(&file).unwrap();

        let written = sink.last_written().unwrap();
        assert_eq!(written, dir.path().join("out").join("qrcode.png"));
        assert_eq!(fs::read(written).unwrap(), file.png_bytes().unwrap());
    }
}
