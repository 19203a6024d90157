// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph faces for watermark text — outline fonts via ab_glyph, with a
// fallback chain that ends at the built-in bitmap face.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, GlyphId, OutlinedGlyph, PxScale, Rect, ScaleFont, point};
use bildwerk_core::error::{BildwerkError, Result};
use tracing::{debug, info, warn};

use super::bitmap::BitmapFace;

/// Pixel height watermark text is rendered at.
pub const WATERMARK_FONT_PX: f32 = 24.0;

/// Something that can measure and draw a line of text.
///
/// Coordinates passed to `plot` are relative to the top-left corner of the
/// box returned by `measure`; coverage is in `0.0..=1.0`.
pub trait GlyphFace: Send + Sync {
    fn name(&self) -> &str;

    /// Width and height of the rendered text in pixels.
    fn measure(&self, text: &str) -> (u32, u32);

    fn rasterize(&self, text: &str, plot: &mut dyn FnMut(i32, i32, f32));
}

/// A TrueType/OpenType font at a fixed pixel size.
pub struct OutlineFace {
    name: String,
    font: FontVec,
    scale: PxScale,
}

impl OutlineFace {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|err| {
            BildwerkError::FontUnavailable(format!("{}: {}", path.display(), err))
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(name, data)
    }

    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let font = FontVec::try_from_vec(data).map_err(|err| {
            BildwerkError::FontUnavailable(format!("{name}: {err}"))
        })?;
        Ok(Self {
            name,
            font,
            scale: PxScale::from(WATERMARK_FONT_PX),
        })
    }
}

impl OutlineFace {
    /// Lay `text` out on one line, handing each outlined glyph to `visit`.
    fn layout(&self, text: &str, mut visit: impl FnMut(OutlinedGlyph)) {
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = 0.0f32;
        let mut last: Option<GlyphId> = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            let glyph = id.with_scale_and_position(self.scale, point(caret, scaled.ascent()));
            caret += scaled.h_advance(id);

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                if let Some(last) = last {
                    caret += scaled.kern(id, last);
                }
                last = Some(id);
                visit(outlined);
            }
        }
    }

    /// Union of the glyph pixel boxes, or `None` when nothing has ink.
    fn ink_bounds(&self, text: &str) -> Option<Rect> {
        let mut union: Option<Rect> = None;
        self.layout(text, |outlined| {
            let bounds = outlined.px_bounds();
            union = Some(match union {
                None => bounds,
                Some(acc) => Rect {
                    min: point(acc.min.x.min(bounds.min.x), acc.min.y.min(bounds.min.y)),
                    max: point(acc.max.x.max(bounds.max.x), acc.max.y.max(bounds.max.y)),
                },
            });
        });
        union
    }
}

impl GlyphFace for OutlineFace {
    fn name(&self) -> &str {
        &self.name
    }

    /// Tight ink box, so the inset is measured from the visible text.
    fn measure(&self, text: &str) -> (u32, u32) {
        self.ink_bounds(text).map_or((0, 0), |bounds| {
            (
                bounds.width().ceil() as u32,
                bounds.height().ceil() as u32,
            )
        })
    }

    fn rasterize(&self, text: &str, plot: &mut dyn FnMut(i32, i32, f32)) {
        let Some(origin) = self.ink_bounds(text) else {
            return;
        };
        self.layout(text, |outlined| {
            let bounds = outlined.px_bounds();
            let left = (bounds.min.x - origin.min.x) as i32;
            let top = (bounds.min.y - origin.min.y) as i32;
            outlined.draw(|x, y, coverage| {
                plot(left + x as i32, top + y as i32, coverage);
            });
        });
    }
}

/// Platform font files tried when no configured font loads, in order.
pub fn default_font_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from("arial.ttf")];

    if cfg!(target_os = "windows") {
        candidates.push(PathBuf::from(r"C:\Windows\Fonts\arial.ttf"));
    } else if cfg!(target_os = "macos") {
        candidates.push(PathBuf::from("/Library/Fonts/Arial.ttf"));
        candidates.push(PathBuf::from(
            "/System/Library/Fonts/Supplemental/Arial.ttf",
        ));
    } else {
        candidates.push(PathBuf::from(
            "/usr/share/fonts/truetype/msttcorefonts/Arial.ttf",
        ));
    }

    candidates.push(PathBuf::from("DejaVuSans.ttf"));
    candidates.extend(
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
        ]
        .into_iter()
        .map(PathBuf::from),
    );
    candidates
}

/// Pick the first loadable face from `preferred`, then the platform list,
/// then the built-in bitmap face.
///
/// Falling back is never fatal. When `preferred` was non-empty and none of
/// it loaded, or when no outline font loaded at all, a `FontUnavailable`
/// warning is returned alongside the face.
pub fn select_face(preferred: &[PathBuf]) -> (Box<dyn GlyphFace>, Option<BildwerkError>) {
    let mut failures = Vec::new();

    for (position, path) in preferred
        .iter()
        .cloned()
        .chain(default_font_candidates())
        .enumerate()
    {
        match OutlineFace::load(&path) {
            Ok(face) => {
                info!(font = %face.name(), "Watermark font loaded");
                let warning = (!preferred.is_empty() && position >= preferred.len()).then(|| {
                    BildwerkError::FontUnavailable(format!(
                        "none of the configured fonts loaded, using {}",
                        face.name()
                    ))
                });
                return (Box::new(face), warning);
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Font candidate rejected");
                if position < preferred.len() {
                    failures.push(err.to_string());
                }
            }
        }
    }

    let mut detail = String::from("no outline font found, using the built-in bitmap font");
    if !failures.is_empty() {
        detail.push_str(&format!(" ({})", failures.join("; ")));
    }
    warn!(%detail, "Watermark font fallback");
    (
        Box::new(BitmapFace::default()),
        Some(BildwerkError::FontUnavailable(detail)),
    )
}
