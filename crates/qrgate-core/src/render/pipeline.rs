//! Keeps a raster in step with the configuration store and exports it.
//!
//! Every re-render starts a new generation. [`SurfaceRef`] names one
//! generation, so an export requested against an older raster is a no-op
//! instead of silently exporting something the user did not see.

use tokio::sync::watch;

use super::RenderError;
use super::encoder::{QrcodeEncoder, SymbolEncoder};
use super::export::{DownloadSink, ExportError, ExportedFile};
use super::raster::{RasterSurface, render_with};
use crate::qr::QrConfig;

/// Handle to one rendered raster generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceRef {
    generation: u64,
}

impl SurfaceRef {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

pub struct RenderPipeline<E = QrcodeEncoder> {
    encoder: E,
    rx: watch::Receiver<QrConfig>,
    surface: Option<RasterSurface>,
    /// Configuration of the last render attempt, failed or not.
    rendered: Option<QrConfig>,
    /// 0 until the first render.
    generation: u64,
}

impl RenderPipeline {
    pub fn new(rx: watch::Receiver<QrConfig>) -> Self {
        Self::with_encoder(QrcodeEncoder, rx)
    }
}

impl<E: SymbolEncoder> RenderPipeline<E> {
    pub fn with_encoder(encoder: E, rx: watch::Receiver<QrConfig>) -> Self {
        Self {
            encoder,
            rx,
            surface: None,
            rendered: None,
            generation: 0,
        }
    }

    /// Re-renders if the configuration changed since the last render (always
    /// on the first call). Returns the current surface, if any.
    ///
    /// # Errors
    /// Returns the render error; the previous surface is dropped.
    pub fn sync(&mut self) -> Result<Option<SurfaceRef>, RenderError> {
        if self.is_stale() {
            self.rerender()?;
        }
        Ok(self.latest())
    }

    /// True when the store holds a configuration the surface does not show.
    pub fn is_stale(&self) -> bool {
        let Some(rendered) = &self.rendered else {
            return true;
        };
        match self.rx.has_changed() {
            Ok(changed) => changed,
            // The store is gone but the channel keeps its final value.
            Err(_) => *rendered != *self.rx.borrow(),
        }
    }

    /// Handle to the current surface without syncing. `None` once the
    /// configuration has moved on.
    pub fn latest(&self) -> Option<SurfaceRef> {
        self.current().map(|_| SurfaceRef {
            generation: self.generation,
        })
    }

    /// The raster named by `surface`, or `None` if it is stale.
    pub fn surface(&self, surface: SurfaceRef) -> Option<&RasterSurface> {
        if surface.generation != self.generation {
            return None;
        }
        self.current()
    }

    pub fn current(&self) -> Option<&RasterSurface> {
        if self.is_stale() {
            return None;
        }
        self.surface.as_ref()
    }

    /// Waits for the next configuration change and re-renders.
    ///
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Result<SurfaceRef, RenderError>> {
        self.rx.changed().await.ok()?;
        Some(self.rerender().map(|()| SurfaceRef {
            generation: self.generation,
        }))
    }

    /// Re-renders on every change until the store is dropped.
    pub async fn run(&mut self) {
        if let Err(err) = self.sync() {
            tracing::warn!(error = %err, "render failed");
        }
        while let Some(result) = self.changed().await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "render failed");
            }
        }
        tracing::debug!("configuration store closed, render loop stopped");
    }

    /// Exports the raster named by `surface` as `qrcode.png` into `sink`.
    ///
    /// Returns `Ok(None)` without touching the sink when there is no raster,
    /// `surface` is stale, or the content is empty.
    ///
    /// # Errors
    /// Returns an error if PNG encoding or delivery fails.
    pub fn export_as_file(
        &mut self,
        surface: SurfaceRef,
        sink: &mut dyn DownloadSink,
    ) -> Result<Option<ExportedFile>, ExportError> {
        if let Err(err) = self.sync() {
            tracing::debug!(error = %err, "export skipped, nothing rendered");
            return Ok(None);
        }

        let Some(raster) = self.surface(surface) else {
            tracing::debug!(
                requested = surface.generation,
                current = self.generation,
                "export skipped, surface is stale or missing"
            );
            return Ok(None);
        };
        if raster.config().is_empty() {
            tracing::debug!("export skipped, content is empty");
            return Ok(None);
        }

        let file = ExportedFile::png(raster.image())?;
        sink.deliver(&file)?;
        Ok(Some(file))
    }

    fn rerender(&mut self) -> Result<(), RenderError> {
        let config = self.rx.borrow_and_update().clone();
        self.generation += 1;
        let result = render_with(&self.encoder, &config);
        self.rendered = Some(config);
        match result {
            Ok(surface) => {
                self.surface = Some(surface);
                Ok(())
            }
            Err(err) => {
                self.surface = None;
                Err(err)
            }
        }
    }
}
