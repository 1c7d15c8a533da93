//! Deterministic painting of a QR symbol into a square RGBA raster.

use image::{Rgba, RgbaImage};

use super::RenderError;
use super::color::{self, BACKGROUND_FALLBACK, FOREGROUND_FALLBACK};
use super::encoder::{QrcodeEncoder, SymbolEncoder};
use crate::qr::QrConfig;

/// Quiet-zone width, in modules, painted when the margin is enabled.
pub const QUIET_ZONE_MODULES: usize = 4;

/// A painted `size × size` raster and the configuration that produced it.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    config: QrConfig,
    modules: usize,
    image: RgbaImage,
}

impl RasterSurface {
    pub fn config(&self) -> &QrConfig {
        &self.config
    }

    /// Symbol width in modules (quiet zone excluded).
    pub fn modules(&self) -> usize {
        self.modules
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Renders `config` with the default encoder.
///
/// # Errors
/// Returns an error if the content cannot be encoded at the configured level.
pub fn render(config: &QrConfig) -> Result<RasterSurface, RenderError> {
    render_with(&QrcodeEncoder, config)
}

/// Renders `config` through `encoder`.
///
/// Pixel `(x, y)` takes the color of cell `(x * cells / size, y * cells / size)`
/// where `cells` counts the symbol plus the quiet zone on both sides.
///
/// # Errors
/// Returns the encoder's error.
pub fn render_with<E: SymbolEncoder + ?Sized>(
    encoder: &E,
    config: &QrConfig,
) -> Result<RasterSurface, RenderError> {
    let matrix = encoder.encode(config.content(), config.level())?;
    let margin = if config.include_margin() {
        QUIET_ZONE_MODULES
    } else {
        0
    };
    let cells = (matrix.width() + 2 * margin) as u64;
    let size = config.size();
    let side = u64::from(size);

    let foreground = color::resolve(config.foreground(), FOREGROUND_FALLBACK, "foreground");
    let background = color::resolve(config.background(), BACKGROUND_FALLBACK, "background");

    let cell = |p: u32| usize::try_from(u64::from(p) * cells / side).unwrap_or(usize::MAX);
    let image = RgbaImage::from_fn(size, size, |x, y| {
        let dark = cell(x)
            .checked_sub(margin)
            .zip(cell(y).checked_sub(margin))
            .is_some_and(|(mx, my)| matrix.is_dark(mx, my));
        if dark { foreground } else { background }
    });

    tracing::debug!(
        size,
        modules = matrix.width(),
        margin = config.include_margin(),
        "rendered QR raster"
    );

    Ok(RasterSurface {
        config: config.clone(),
        modules: matrix.width(),
        image,
    })
}
