// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-document — Turns a selection of images into one PDF.
//
// Provides the selection registry, the page-fit layout engine, the watermark
// compositor with its font faces, the lopdf-based PDF assembler, and the
// composition pipeline that drives them for one export.

pub mod image;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod registry;
pub mod watermark;

// Re-export the primary structs so callers can use `bildwerk_document::SelectionRegistry` etc.
pub use self::image::processor::ImageProcessor;
pub use layout::{LayoutResult, fit_image};
pub use pdf::PdfAssembler;
pub use pipeline::{CompositionPipeline, ProgressSink};
pub use registry::{ImageRecord, SelectionRegistry, SnapshotEntry};
pub use watermark::{BitmapFace, GlyphFace, OutlineFace, WatermarkCompositor};
