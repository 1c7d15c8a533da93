//! Rendering of a [`QrConfig`](crate::qr::QrConfig) to pixels and export of
//! the result as a PNG file.

pub mod color;
pub mod encoder;
pub mod export;
pub mod pipeline;
pub mod raster;

pub use encoder::{ModuleMatrix, QrcodeEncoder, SymbolEncoder};
pub use export::{
    DirectorySink, DownloadSink, EXPORT_FILE_NAME, EXPORT_MIME, ExportError, ExportedFile,
    MemorySink, decode_data_uri,
};
pub use pipeline::{RenderPipeline, SurfaceRef};
pub use raster::{QUIET_ZONE_MODULES, RasterSurface, render, render_with};

/// Errors produced while turning content into a QR symbol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Content is too long for a QR code at this error-correction level")]
    DataTooLong,
    #[error("Failed to encode QR code: {0}")]
    Encode(String),
}
