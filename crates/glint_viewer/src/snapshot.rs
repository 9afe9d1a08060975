use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use glint_core::ResourceLayout;
use glint_renderer::DisplayBuffer;

/// Writes display buffers as numbered PNG files.
pub struct SnapshotWriter {
    layout: ResourceLayout,
    base: String,
}

impl SnapshotWriter {
    pub fn new(layout: ResourceLayout, base: impl Into<String>) -> Self {
        Self {
            layout,
            base: base.into(),
        }
    }

    /// Save `display` as the snapshot for `samples` accumulated samples.
    pub fn write(&self, display: &DisplayBuffer, samples: u32) -> Result<PathBuf> {
        let path = self.layout.snapshot_path(&self.base, samples);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let image = image::RgbImage::from_raw(
            display.width(),
            display.height(),
            display.as_bytes().to_vec(),
        )
        .context("Display buffer does not match its dimensions")?;

        image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        log::info!("Saved {} ({} samples)", path.display(), samples);
        Ok(path)
    }
}
