// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermark compositor — stamps a drop-shadowed text label into the
// bottom-right corner of a page raster.
//
// The input raster is never modified. A disabled or blank watermark returns
// the input borrowed, so the page is pixel-identical to the unstamped one.

pub mod bitmap;
pub mod face;

use std::borrow::Cow;
use std::path::PathBuf;

use bildwerk_core::error::BildwerkError;
use bildwerk_core::types::WatermarkSpec;
use image::{Rgb, RgbImage};
use imageproc::pixelops::weighted_sum;
use tracing::{debug, instrument};

pub use bitmap::BitmapFace;
pub use face::{GlyphFace, OutlineFace, default_font_candidates, select_face};

/// Distance from the right and bottom edges to the text box.
pub const INSET_PX: i64 = 20;
/// Shadow displacement, right and down.
pub const SHADOW_OFFSET_PX: i64 = 2;
/// Shadow fill. Page rasters carry no alpha, so both fills are opaque and
/// only glyph coverage blends into the page.
pub const SHADOW_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
/// Face fill.
pub const FACE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

pub struct WatermarkCompositor {
    face: Box<dyn GlyphFace>,
    font_warning: Option<BildwerkError>,
}

impl WatermarkCompositor {
    /// Use a specific face. No font probing happens.
    pub fn new(face: Box<dyn GlyphFace>) -> Self {
        Self {
            face,
            font_warning: None,
        }
    }

    /// Probe `preferred` fonts, then the platform list, falling back to the
    /// built-in face. Any fallback is kept as a warning, see [`Self::font_warning`].
    pub fn with_font_candidates(preferred: &[PathBuf]) -> Self {
        let (face, font_warning) = select_face(preferred);
        Self { face, font_warning }
    }

    /// The `FontUnavailable` warning raised while choosing a face, if any.
    pub fn font_warning(&self) -> Option<&BildwerkError> {
        self.font_warning.as_ref()
    }

    /// Top-left of the text box for a `width` x `height` raster. May be
    /// negative when the text is wider or taller than the raster.
    pub fn anchor(&self, width: u32, height: u32, text: &str) -> (i64, i64) {
        let (text_w, text_h) = self.face.measure(text);
        (
            i64::from(width) - i64::from(text_w) - INSET_PX,
            i64::from(height) - i64::from(text_h) - INSET_PX,
        )
    }

    /// Stamp `spec` onto `raster`. Pixels outside the raster are clipped.
    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    pub fn stamp<'a>(&self, raster: &'a RgbImage, spec: &WatermarkSpec) -> Cow<'a, RgbImage> {
        let Some(text) = spec.effective_text() else {
            return Cow::Borrowed(raster);
        };

        let (x, y) = self.anchor(raster.width(), raster.height(), text);
        debug!(x, y, face = self.face.name(), "Stamping watermark");

        let mut stamped = raster.clone();
        self.draw_layer(
            &mut stamped,
            text,
            x + SHADOW_OFFSET_PX,
            y + SHADOW_OFFSET_PX,
            SHADOW_COLOR,
        );
        self.draw_layer(&mut stamped, text, x, y, FACE_COLOR);
        Cow::Owned(stamped)
    }

    /// Draw one coloured copy of the text over `canvas` with its top-left
    /// at (`x`, `y`). Fully covered pixels take `ink` exactly.
    fn draw_layer(&self, canvas: &mut RgbImage, text: &str, x: i64, y: i64, ink: Rgb<u8>) {
        let (width, height) = (i64::from(canvas.width()), i64::from(canvas.height()));

        self.face.rasterize(text, &mut |dx, dy, coverage| {
            let (px, py) = (x + i64::from(dx), y + i64::from(dy));
            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }
            let weight = coverage.clamp(0.0, 1.0);
            if weight <= 0.0 {
                return;
            }
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            *pixel = weighted_sum(*pixel, ink, 1.0 - weight, weight);
        });
    }
}

impl Default for WatermarkCompositor {
    fn default() -> Self {
        Self::with_font_candidates(&[])
    }
}
