// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler — serialise an ordered sequence of page rasters into one PDF
// using `lopdf`, and write it atomically.
//
// Each raster becomes a DCT (JPEG) image XObject drawn by a four-operator
// content stream. Page rasters are at 72 DPI, so one pixel is one point.

use std::io::Write;
use std::path::Path;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::{ExportConfig, PageGeometry, PagePlacement};
use chrono::Utc;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info, instrument};

use crate::image::processor::encode_jpeg;

/// Value of the /Producer entry.
pub const PRODUCER: &str = "Bildwerk";

/// Resource name of the single image on each page.
const IMAGE_NAME: &str = "Im0";

/// Builds one PDF from page rasters.
pub struct PdfAssembler {
    quality: u8,
    placement: PagePlacement,
    page: PageGeometry,
    margin_px: u32,
    title: Option<String>,
}

impl PdfAssembler {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            quality: config.quality,
            placement: config.placement,
            page: config.page_geometry(),
            margin_px: config.margin_px,
            title: None,
        }
    }

    /// Set the /Title metadata entry.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Serialise `pages` in order. An empty slice is `NothingToExport`.
    #[instrument(skip_all, fields(pages = pages.len(), quality = self.quality))]
    pub fn build(&self, pages: &[RgbImage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(BildwerkError::NothingToExport);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

        for (index, raster) in pages.iter().enumerate() {
            let page_id = self.add_page(&mut doc, pages_id, raster)?;
            debug!(
                page = index + 1,
                width = raster.width(),
                height = raster.height(),
                "Page added"
            );
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
            "CreationDate" => Object::string_literal(
                Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()
            ),
        };
        if let Some(title) = &self.title {
            info.set("Title", Object::string_literal(title.as_str()));
        }
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);

        doc.compress();

        let mut output = Vec::new();
        doc.save_to(&mut output).map_err(|err| {
            BildwerkError::WriteFailure(format!("failed to serialise PDF: {}", err))
        })?;

        info!(pages = pages.len(), bytes = output.len(), "PDF assembled");
        Ok(output)
    }

    /// Build the PDF and write it to `destination` atomically. Returns the
    /// number of bytes written.
    pub fn write(&self, pages: &[RgbImage], destination: &Path) -> Result<u64> {
        let bytes = self.build(pages)?;
        write_atomic(destination, &bytes)?;
        Ok(bytes.len() as u64)
    }

    /// MediaBox size and image origin (PDF coordinates, bottom-left) for a
    /// raster of `width` x `height`.
    fn page_frame(&self, width: u32, height: u32) -> ((i64, i64), (i64, i64)) {
        let (w, h) = (i64::from(width), i64::from(height));
        match self.placement {
            PagePlacement::ImageSized => ((w, h), (0, 0)),
            PagePlacement::Centered => {
                let (page_w, page_h) = (
                    i64::from(self.page.width_px),
                    i64::from(self.page.height_px),
                );
                let margin = i64::from(self.margin_px);
                let (avail_w, avail_h) = self.page.available(self.margin_px);
                let x = margin + (avail_w - w).div_euclid(2);
                let top = margin + (avail_h - h).div_euclid(2);
                ((page_w, page_h), (x, page_h - top - h))
            }
        }
    }

    fn add_page(&self, doc: &mut Document, pages_id: ObjectId, raster: &RgbImage) -> Result<ObjectId> {
        let (width, height) = raster.dimensions();
        let jpeg = encode_jpeg(raster, self.quality)?;

        // Already DCT-compressed; keep `compress()` from deflating it again.
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false);
        let image_id = doc.add_object(image);

        let ((page_w, page_h), (x, y)) = self.page_frame(width, height);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(i64::from(width)),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(i64::from(height)),
                        Object::Integer(x),
                        Object::Integer(y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(|err| {
            BildwerkError::PdfError(format!("failed to encode page content: {}", err))
        })?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(page_w),
                Object::Integer(page_h),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
        }))
    }
}

/// Write `bytes` to `destination` through a temporary file in the same
/// directory, renamed into place only after a successful sync. Any existing
/// file is replaced; on failure nothing is left at `destination`.
#[instrument(skip(bytes), fields(path = %destination.display(), bytes = bytes.len()))]
pub fn write_atomic(destination: &Path, bytes: &[u8]) -> Result<()> {
    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let failure = |stage: &str, err: &dyn std::fmt::Display| {
        BildwerkError::WriteFailure(format!(
            "{} {}: {}",
            stage,
            destination.display(),
            err
        ))
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".bildwerk-")
        .suffix(".pdf.part")
        .tempfile_in(directory)
        .map_err(|err| failure("cannot create a temporary file for", &err))?;

    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|err| failure("cannot write", &err))?;

    // The temporary file is removed on drop if the rename fails.
    temp.persist(destination)
        .map_err(|err| failure("cannot replace", &err.error))?;

    info!("PDF written");
    Ok(())
}
