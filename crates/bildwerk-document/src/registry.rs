// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Selection registry — the ordered set of imported images, their inclusion
// flags and their decoded RGB rasters.
//
// Order indices are handed out monotonically and never renumbered, so
// removing an entry never reorders the rest.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bildwerk_core::error::BildwerkError;
use bildwerk_core::types::{ImageState, ImportOutcome, SourceFormat};
use image::{DynamicImage, RgbImage};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;

/// One imported image. Owned by the registry.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub order_index: u64,
    pub included: bool,
    pub format: SourceFormat,
    /// `None` when decoding failed; such records never reach an export.
    raster: Option<Arc<RgbImage>>,
    pub source_dimensions: Option<(u32, u32)>,
    pub file_size: Option<u64>,
}

impl ImageRecord {
    pub fn is_readable(&self) -> bool {
        self.raster.is_some()
    }

    pub fn raster(&self) -> Option<&Arc<RgbImage>> {
        self.raster.as_ref()
    }

    fn state(&self) -> ImageState {
        ImageState {
            path: self.path.clone(),
            order_index: self.order_index,
            included: self.included,
            readable: self.is_readable(),
            dimensions: self.source_dimensions,
            format: self.format,
            file_size: self.file_size,
        }
    }
}

/// One page-to-be, frozen at the moment an export starts.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub path: PathBuf,
    pub order_index: u64,
    pub raster: Arc<RgbImage>,
}

#[derive(Debug, Default)]
pub struct SelectionRegistry {
    /// Kept sorted by `order_index`.
    records: Vec<ImageRecord>,
    next_index: u64,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.find(path).is_some()
    }

    pub fn get(&self, path: &Path) -> Option<&ImageRecord> {
        self.find(path).map(|index| &self.records[index])
    }

    /// Import every path in order, decoding each one.
    #[instrument(skip_all)]
    pub fn add_paths<I, P>(&mut self, paths: I) -> Vec<ImportOutcome>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let outcomes: Vec<ImportOutcome> = paths
            .into_iter()
            .map(|path| self.add_path(path.as_ref()))
            .collect();
        info!(
            requested = outcomes.len(),
            added = outcomes.iter().filter(|outcome| outcome.added).count(),
            total = self.records.len(),
            "Images imported"
        );
        outcomes
    }

    /// Import one file.
    ///
    /// Paths already present are skipped without a warning. An unsupported
    /// extension is rejected. A file that cannot be decoded is kept but
    /// marked unreadable, with an `UnreadableImage` warning.
    pub fn add_path(&mut self, path: &Path) -> ImportOutcome {
        let format = match self.admit(path) {
            Ok(Some(format)) => format,
            Ok(None) => return skipped(path, None),
            Err(err) => return skipped(path, Some(err)),
        };

        let (raster, warning) = match ImageProcessor::open(path) {
            Ok(processor) => (Some(processor.into_rgb()), None),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Image could not be decoded");
                (None, Some(err))
            }
        };
        self.insert(path, format, raster);
        ImportOutcome {
            path: path.to_path_buf(),
            added: true,
            warning,
        }
    }

    /// Register an image that is already decoded, under `path`.
    pub fn add_image(&mut self, path: &Path, image: DynamicImage) -> ImportOutcome {
        match self.admit(path) {
            Ok(Some(format)) => {
                let raster = ImageProcessor::from_dynamic(image).into_rgb();
                self.insert(path, format, Some(raster));
                ImportOutcome {
                    path: path.to_path_buf(),
                    added: true,
                    warning: None,
                }
            }
            Ok(None) => skipped(path, None),
            Err(err) => skipped(path, Some(err)),
        }
    }

    /// Set the inclusion flag. Unknown paths are ignored.
    pub fn set_included(&mut self, path: &Path, included: bool) {
        if let Some(index) = self.find(path) {
            let record = &mut self.records[index];
            if record.included != included {
                debug!(path = %path.display(), included, "Inclusion changed");
                record.included = included;
            }
        }
    }

    /// Drop a record and its raster. Returns whether it was present.
    pub fn remove(&mut self, path: &Path) -> bool {
        match self.find(path) {
            Some(index) => {
                self.records.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every record. Order indices keep counting up.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Pixel-free view of every record, in order.
    pub fn state(&self) -> Vec<ImageState> {
        self.records.iter().map(ImageRecord::state).collect()
    }

    /// Included, readable records in order. May be empty.
    pub fn snapshot_for_export(&self) -> Vec<SnapshotEntry> {
        self.records
            .iter()
            .filter(|record| record.included)
            .filter_map(|record| {
                record.raster.as_ref().map(|raster| SnapshotEntry {
                    path: record.path.clone(),
                    order_index: record.order_index,
                    raster: Arc::clone(raster),
                })
            })
            .collect()
    }

    // -- Helpers --------------------------------------------------------------

    fn find(&self, path: &Path) -> Option<usize> {
        self.records.iter().position(|record| record.path == path)
    }

    /// `Ok(None)` for duplicates, an error for unsupported extensions.
    fn admit(&self, path: &Path) -> Result<Option<SourceFormat>, BildwerkError> {
        if self.contains(path) {
            debug!(path = %path.display(), "Already imported");
            return Ok(None);
        }
        SourceFormat::from_path(path).map(Some).ok_or_else(|| {
            let extension = path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_else(|| "none".into());
            warn!(path = %path.display(), %extension, "Unsupported file type");
            BildwerkError::UnsupportedFormat(extension)
        })
    }

    fn insert(&mut self, path: &Path, format: SourceFormat, raster: Option<RgbImage>) {
        let order_index = self.next_index;
        self.next_index += 1;
        self.records.push(ImageRecord {
            path: path.to_path_buf(),
            order_index,
            included: true,
            format,
            source_dimensions: raster.as_ref().map(RgbImage::dimensions),
            raster: raster.map(Arc::new),
            file_size: fs::metadata(path).ok().map(|meta| meta.len()),
        });
    }
}

fn skipped(path: &Path, warning: Option<BildwerkError>) -> ImportOutcome {
    ImportOutcome {
        path: path.to_path_buf(),
        added: false,
        warning,
    }
}
