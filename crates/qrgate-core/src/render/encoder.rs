//! Symbol encoding seam. The raster painter only sees a [`ModuleMatrix`].

use qrcode::QrCode;
use qrcode::types::{Color, QrError};

use super::RenderError;
use crate::qr::EcLevel;

/// Square grid of QR modules, without quiet zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl ModuleMatrix {
    pub fn from_fn(width: usize, mut is_dark: impl FnMut(usize, usize) -> bool) -> Self {
        let mut dark = Vec::with_capacity(width * width);
        for y in 0..width {
            for x in 0..width {
                dark.push(is_dark(x, y));
            }
        }
        Self { width, dark }
    }

    /// Modules per side.
    pub fn width(&self) -> usize {
        self.width
    }

    /// False outside the grid.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.width {
            return false;
        }
        self.dark[y * self.width + x]
    }
}

/// Turns content into QR modules at an error-correction level.
pub trait SymbolEncoder {
    /// # Errors
    /// Returns [`RenderError::DataTooLong`] when the content does not fit any
    /// symbol version at `level`.
    fn encode(&self, content: &str, level: EcLevel) -> Result<ModuleMatrix, RenderError>;
}

/// Encoder backed by the `qrcode` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrcodeEncoder;

impl SymbolEncoder for QrcodeEncoder {
    fn encode(&self, content: &str, level: EcLevel) -> Result<ModuleMatrix, RenderError> {
        let code = QrCode::with_error_correction_level(content.as_bytes(), level.into())
            .map_err(|err| match err {
                QrError::DataTooLong => RenderError::DataTooLong,
                other => RenderError::Encode(other.to_string()),
            })?;

        Ok(ModuleMatrix {
            width: code.width(),
            dark: code
                .to_colors()
                .into_iter()
                .map(|c| c == Color::Dark)
                .collect(),
        })
    }
}
