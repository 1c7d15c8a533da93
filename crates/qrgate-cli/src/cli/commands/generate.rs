//! `generate` command: render and save qrcode.png for a signed-in user.

use std::path::PathBuf;

use anyhow::{Context, Result};
use qrgate_core::config::Config;
use qrgate_core::generator::Generator;
use qrgate_core::qr::{EcLevel, QrConfig};
use qrgate_core::render::DirectorySink;
use qrgate_core::session::Route;

use super::open_gate;

pub struct Options {
    pub content: String,
    pub size: i64,
    pub foreground: String,
    pub background: String,
    pub level: EcLevel,
    pub include_margin: bool,
    pub out: Option<PathBuf>,
    pub print_data_uri: bool,
}

impl Options {
    fn qr_config(&self) -> QrConfig {
        QrConfig::default()
            .with_content(self.content.clone())
            .with_size(self.size)
            .with_foreground(self.foreground.clone())
            .with_background(self.background.clone())
            .with_level(self.level)
            .with_include_margin(self.include_margin)
    }
}

pub async fn run(config: &Config, options: Options) -> Result<()> {
    let gate = open_gate(config).await?;
    let denied = gate.route(Route::Generator).is_redirect();
    gate.shutdown();
    if denied {
        anyhow::bail!("Not signed in. Run `qrgate login` first.");
    }

    let mut generator = Generator::with_config(options.qr_config());
    if !generator.can_export() {
        anyhow::bail!("Nothing to encode: content is empty");
    }

    let surface = generator
        .preview()
        .context("Failed to render QR code")?
        .context("No QR code was rendered")?;
    tracing::debug!(generation = surface.generation(), "preview rendered");

    let dir = options.out.unwrap_or_else(|| config.export_dir());
    let mut sink = DirectorySink::new(dir);
    let file = generator
        .export(surface, &mut sink)
        .context("Failed to export QR code")?
        .context("Nothing to export")?;
    tracing::debug!(bytes = file.data_uri.len(), dir = %sink.dir().display(), "exported");

    let written = sink
        .last_written()
        .map_or_else(|| sink.dir().join(&file.file_name), PathBuf::from);
    println!("Saved {} ({}x{})", written.display(), file.width, file.height);
    if options.print_data_uri {
        println!("{}", file.data_uri);
    }
    Ok(())
}
