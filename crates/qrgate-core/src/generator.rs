//! The generator view: a configuration store with a pipeline subscribed to it.

use crate::qr::{ConfigStore, ConfigUpdate, QrConfig};
use crate::render::{
    DownloadSink, ExportError, ExportedFile, RasterSurface, RenderError, RenderPipeline,
    SurfaceRef,
};

pub struct Generator {
    store: ConfigStore,
    pipeline: RenderPipeline,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Self::with_config(QrConfig::default())
    }

    pub fn with_config(config: QrConfig) -> Self {
        let store = ConfigStore::with_config(config);
        let pipeline = RenderPipeline::new(store.subscribe());
        Self { store, pipeline }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn config(&self) -> QrConfig {
        self.store.get()
    }

    /// Applies one field update and re-renders the preview. Returns true if
    /// the configuration changed.
    pub fn update(&mut self, update: ConfigUpdate) -> bool {
        let changed = self.store.apply(update);
        if changed {
            self.rerender();
        }
        changed
    }

    /// Brings the preview up to date and returns its handle.
    ///
    /// # Errors
    /// Returns the render error when the content cannot be encoded.
    pub fn preview(&mut self) -> Result<Option<SurfaceRef>, RenderError> {
        self.pipeline.sync()
    }

    /// Handle to the preview shown for the current configuration.
    pub fn latest(&self) -> Option<SurfaceRef> {
        self.pipeline.latest()
    }

    pub fn surface(&self, surface: SurfaceRef) -> Option<&RasterSurface> {
        self.pipeline.surface(surface)
    }

    /// Whether the download action is enabled.
    pub fn can_export(&self) -> bool {
        !self.store.get().is_empty()
    }

    /// Exports the previewed raster. See [`RenderPipeline::export_as_file`].
    ///
    /// # Errors
    /// Returns an error if PNG encoding or delivery fails.
    pub fn export(
        &mut self,
        surface: SurfaceRef,
        sink: &mut dyn DownloadSink,
    ) -> Result<Option<ExportedFile>, ExportError> {
        self.pipeline.export_as_file(surface, sink)
    }

    /// Restores the default configuration (the view was remounted).
    pub fn reset(&mut self) {
        if self.store.reset() {
            self.rerender();
        }
    }

    fn rerender(&mut self) {
        if let Err(err) = self.pipeline.sync() {
            tracing::warn!(error = %err, "preview render failed");
        }
    }
}
