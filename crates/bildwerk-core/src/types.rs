// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Bildwerk: page geometry, fit policy, watermark and
// export settings, and the read-only registry projection handed to callers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BildwerkError, Result};

/// Resolution at which page sizes are expressed as pixels (1 px = 1 pt).
pub const REFERENCE_DPI: u32 = 72;

/// Default margin applied on all four sides of the page, in pixels.
pub const DEFAULT_MARGIN_PX: u32 = 50;

/// Default advisory JPEG quality for embedded page images.
pub const DEFAULT_QUALITY: u8 = 95;

/// Longest watermark text accepted by [`ExportConfig::validate`].
pub const MAX_WATERMARK_CHARS: usize = 100;

/// The two-character sequence `\0`, rejected alongside a real NUL.
const ESCAPED_NUL: &str = r"\0";

/// Named page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageSize {
    A4,
    Letter,
    Legal,
    A3,
    A5,
}

impl PageSize {
    pub const ALL: [PageSize; 5] = [
        PageSize::A4,
        PageSize::Letter,
        PageSize::Legal,
        PageSize::A3,
        PageSize::A5,
    ];

    /// Pixel dimensions (width, height) at [`REFERENCE_DPI`].
    pub fn dimensions_px(&self) -> (u32, u32) {
        match self {
            Self::A4 => (595, 842),
            Self::Letter => (612, 792),
            Self::Legal => (612, 1008),
            Self::A3 => (842, 1191),
            Self::A5 => (420, 595),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Letter => "Letter",
            Self::Legal => "Legal",
            Self::A3 => "A3",
            Self::A5 => "A5",
        }
    }

    /// Resolve to the immutable geometry record.
    pub fn geometry(&self) -> PageGeometry {
        let (width_px, height_px) = self.dimensions_px();
        PageGeometry {
            name: *self,
            width_px,
            height_px,
        }
    }
}

/// A page size resolved to pixels at [`REFERENCE_DPI`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub name: PageSize,
    pub width_px: u32,
    pub height_px: u32,
}

impl PageGeometry {
    /// The box left for the image once `margin_px` is removed from every
    /// side. Either dimension may be zero or negative.
    pub fn available(&self, margin_px: u32) -> (i64, i64) {
        let margin = 2 * i64::from(margin_px);
        (
            i64::from(self.width_px) - margin,
            i64::from(self.height_px) - margin,
        )
    }
}

/// Rule for mapping a source image onto the available page box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FitPolicy {
    /// Scale down to fit entirely inside the box; never upscale.
    #[default]
    FitToPage,
    /// Scale to cover the box, then centre-crop the overflow.
    FillPage,
    /// Keep the source pixels untouched.
    OriginalSize,
}

impl FitPolicy {
    /// One-line explanation suitable for a settings screen.
    pub fn description(&self) -> &'static str {
        match self {
            Self::FitToPage => "shrink to fit inside the margins, never enlarge",
            Self::FillPage => "scale to cover the margins, cropping the overflow",
            Self::OriginalSize => "keep the source pixel size",
        }
    }
}

/// How each page raster is placed in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PagePlacement {
    /// Each PDF page is exactly the size of its raster.
    #[default]
    ImageSized,
    /// Each PDF page has the configured page size, raster centred in the margins.
    Centered,
}

/// Text stamped in the bottom-right corner of every page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WatermarkSpec {
    pub enabled: bool,
    pub text: String,
}

impl WatermarkSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            enabled: true,
            text: text.into(),
        }
    }

    /// The trimmed text to stamp, or `None` when stamping is off for this
    /// export (disabled, or nothing left after trimming).
    pub fn effective_text(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Settings for one export request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub page_size: PageSize,
    pub fit_policy: FitPolicy,
    pub watermark: WatermarkSpec,
    pub margin_px: u32,
    /// Advisory JPEG quality (1-100) for embedded page images.
    pub quality: u8,
    pub placement: PagePlacement,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            fit_policy: FitPolicy::FitToPage,
            watermark: WatermarkSpec::default(),
            margin_px: DEFAULT_MARGIN_PX,
            quality: DEFAULT_QUALITY,
            placement: PagePlacement::ImageSized,
        }
    }
}

impl ExportConfig {
    pub fn page_geometry(&self) -> PageGeometry {
        self.page_size.geometry()
    }

    /// Check value ranges. Blank watermark text is accepted: it only turns
    /// stamping off.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(BildwerkError::InvalidConfig(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }

        // Text is only checked when it will be stamped.
        if !self.watermark.enabled {
            return Ok(());
        }
        let text = self.watermark.text.trim();
        if text.chars().count() > MAX_WATERMARK_CHARS {
            return Err(BildwerkError::InvalidConfig(format!(
                "watermark text is longer than {} characters",
                MAX_WATERMARK_CHARS
            )));
        }
        if text.contains(['<', '>', '|', '\0']) || text.contains(ESCAPED_NUL) {
            return Err(BildwerkError::InvalidConfig(
                "watermark text contains an invalid character".into(),
            ));
        }
        Ok(())
    }
}

/// Raster formats accepted at import time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
}

impl SourceFormat {
    /// Every file extension (lowercase, no dot) we accept.
    pub const EXTENSIONS: [&'static str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff", "tif"];

    /// Infer the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }
}

/// Read-only view of one registry entry. Carries no pixel data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageState {
    pub path: PathBuf,
    pub order_index: u64,
    pub included: bool,
    pub readable: bool,
    pub dimensions: Option<(u32, u32)>,
    pub format: SourceFormat,
    pub file_size: Option<u64>,
}

/// Result of importing one path.
#[derive(Debug)]
pub struct ImportOutcome {
    pub path: PathBuf,
    /// Whether a new registry entry was created.
    pub added: bool,
    pub warning: Option<BildwerkError>,
}

/// Summary of a successful export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub output_path: PathBuf,
    pub page_count: usize,
    pub bytes_written: u64,
    pub watermarked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_table_matches_reference_dpi() {
        assert_eq!(PageSize::A4.dimensions_px(), (595, 842));
        assert_eq!(PageSize::Letter.dimensions_px(), (612, 792));
        assert_eq!(PageSize::Legal.dimensions_px(), (612, 1008));
        assert_eq!(PageSize::A3.dimensions_px(), (842, 1191));
        assert_eq!(PageSize::A5.dimensions_px(), (420, 595));
    }

    #[test]
    fn available_box_can_go_negative() {
        let a5 = PageSize::A5.geometry();
        assert_eq!(a5.available(500), (-580, -405));
        assert_eq!(PageSize::A4.geometry().available(50), (495, 742));
    }

    #[test]
    fn blank_watermark_has_no_effective_text() {
        assert_eq!(WatermarkSpec::new("").effective_text(), None);
        assert_eq!(WatermarkSpec::new("   ").effective_text(), None);
        assert_eq!(WatermarkSpec::new("  Draft ").effective_text(), Some("Draft"));

        let disabled = WatermarkSpec {
            enabled: false,
            text: "Draft".into(),
        };
        assert_eq!(disabled.effective_text(), None);
    }

    #[test]
    fn extension_lookup() {
        assert_eq!(SourceFormat::from_extension("JPG"), Some(SourceFormat::Jpeg));
        assert_eq!(SourceFormat::from_extension("tif"), Some(SourceFormat::Tiff));
        assert_eq!(SourceFormat::from_extension("webp"), None);
        assert_eq!(
            SourceFormat::from_path(Path::new("/photos/holiday.Png")),
            Some(SourceFormat::Png)
        );
        assert_eq!(SourceFormat::from_path(Path::new("/photos/README")), None);
    }

    #[test]
    fn default_config_is_valid() {
        let config = ExportConfig::default();
        assert_eq!(config.margin_px, 50);
        assert_eq!(config.quality, 95);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_quality() {
        let config = ExportConfig {
            quality: 0,
            ..ExportConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BildwerkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_watermark_text() {
        let mut config = ExportConfig::default();
        config.watermark = WatermarkSpec::new("a".repeat(101));
        assert!(config.validate().is_err());

        config.watermark = WatermarkSpec::new("left | right");
        assert!(config.validate().is_err());

        config.watermark = WatermarkSpec::new("   ");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_escaped_nul_sequence() {
        let mut config = ExportConfig::default();
        config.watermark = WatermarkSpec::new(r"draft\0copy");
        assert!(config.validate().is_err());

        config.watermark = WatermarkSpec::new("draft\0copy");
        assert!(config.validate().is_err());

        config.watermark = WatermarkSpec::new(r"scans\photos");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn disabled_watermark_text_is_not_checked() {
        let mut config = ExportConfig::default();
        config.watermark = WatermarkSpec {
            enabled: false,
            text: "a".repeat(150),
        };
        assert!(config.validate().is_ok());

        config.watermark.text = "<draft>".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_round_trips_through_json_with_missing_fields() {
        let config: ExportConfig =
            serde_json::from_str(r#"{ "page_size": "Letter", "fit_policy": "FillPage" }"#)
                .expect("parse");
        assert_eq!(config.page_size, PageSize::Letter);
        assert_eq!(config.fit_policy, FitPolicy::FillPage);
        assert_eq!(config.margin_px, DEFAULT_MARGIN_PX);
        assert_eq!(config.placement, PagePlacement::ImageSized);
    }
}
