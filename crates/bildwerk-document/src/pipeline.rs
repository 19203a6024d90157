// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composition pipeline — one export request: registry snapshot, fit,
// watermark, assemble, atomic write.
//
// Runs synchronously on the calling thread. It works only on its own
// snapshot, so the registry may be changed as soon as `export` has taken it.

use std::path::{Path, PathBuf};

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::{ExportConfig, ExportReport};
use image::RgbImage;
use tracing::{debug, info, instrument};

use crate::layout::{available_box, fit_image};
use crate::pdf::PdfAssembler;
use crate::registry::{SelectionRegistry, SnapshotEntry};
use crate::watermark::WatermarkCompositor;

/// Receives export progress. Percentages never decrease.
pub trait ProgressSink {
    fn report(&mut self, percent: u8, phase: &str);
}

impl<F: FnMut(u8, &str)> ProgressSink for F {
    fn report(&mut self, percent: u8, phase: &str) {
        self(percent, phase)
    }
}

/// Clamps reports so a sink never sees progress go backwards.
struct Progress<'a> {
    sink: Option<&'a mut dyn ProgressSink>,
    last: u8,
}

impl<'a> Progress<'a> {
    fn new(sink: Option<&'a mut dyn ProgressSink>) -> Self {
        Self { sink, last: 0 }
    }

    fn report(&mut self, percent: u8, phase: &str) {
        let percent = percent.clamp(self.last, 100);
        self.last = percent;
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.report(percent, phase);
        }
    }
}

pub struct CompositionPipeline {
    compositor: WatermarkCompositor,
}

impl CompositionPipeline {
    pub fn new(compositor: WatermarkCompositor) -> Self {
        Self { compositor }
    }

    /// Build a pipeline whose watermark face is chosen from `fonts`, then the
    /// platform defaults, then the built-in face.
    pub fn with_font_candidates(fonts: &[PathBuf]) -> Self {
        Self::new(WatermarkCompositor::with_font_candidates(fonts))
    }

    pub fn compositor(&self) -> &WatermarkCompositor {
        &self.compositor
    }

    /// Export the registry's included, readable images to `destination`.
    pub fn export(
        &self,
        registry: &SelectionRegistry,
        config: &ExportConfig,
        destination: &Path,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<ExportReport> {
        let snapshot = registry.snapshot_for_export();
        self.export_snapshot(&snapshot, config, destination, progress)
    }

    /// Export an already-taken snapshot.
    #[instrument(skip_all, fields(pages = snapshot.len(), path = %destination.display()))]
    pub fn export_snapshot(
        &self,
        snapshot: &[SnapshotEntry],
        config: &ExportConfig,
        destination: &Path,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<ExportReport> {
        let mut progress = Progress::new(progress);
        progress.report(0, "Preparing");

        let pages = self.render(snapshot, config, &mut progress)?;

        progress.report(90, "Saving PDF");
        let mut assembler = PdfAssembler::new(config);
        if let Some(title) = destination.file_stem() {
            assembler.set_title(title.to_string_lossy());
        }
        let bytes_written = assembler.write(&pages, destination)?;
        progress.report(100, "Done");

        let report = ExportReport {
            output_path: destination.to_path_buf(),
            page_count: pages.len(),
            bytes_written,
            watermarked: config.watermark.effective_text().is_some(),
        };
        info!(
            pages = report.page_count,
            bytes = report.bytes_written,
            watermarked = report.watermarked,
            "Export complete"
        );
        Ok(report)
    }

    /// Produce the finished page rasters for `snapshot` without writing
    /// anything. The same inputs always give identical pixels.
    pub fn render_pages(
        &self,
        snapshot: &[SnapshotEntry],
        config: &ExportConfig,
    ) -> Result<Vec<RgbImage>> {
        self.render(snapshot, config, &mut Progress::new(None))
    }

    fn render(
        &self,
        snapshot: &[SnapshotEntry],
        config: &ExportConfig,
        progress: &mut Progress<'_>,
    ) -> Result<Vec<RgbImage>> {
        config.validate()?;
        if snapshot.is_empty() {
            return Err(BildwerkError::NothingToExport);
        }

        let page = config.page_geometry();
        available_box(&page, config.margin_px)?;

        let total = snapshot.len();
        let mut pages = Vec::with_capacity(total);
        for (position, entry) in snapshot.iter().enumerate() {
            progress.report(
                (5 + 85 * position / total) as u8,
                &format!("Processing image {} of {}", position + 1, total),
            );

            let layout = fit_image(&entry.raster, &page, config.fit_policy, config.margin_px)?;
            debug!(
                path = %entry.path.display(),
                scale = layout.applied_scale,
                cropped = layout.cropped,
                "Page laid out"
            );
            let stamped = self
                .compositor
                .stamp(&layout.target_raster, &config.watermark)
                .into_owned();
            pages.push(stamped);
        }
        Ok(pages)
    }
}

impl Default for CompositionPipeline {
    fn default() -> Self {
        Self::new(WatermarkCompositor::default())
    }
}
