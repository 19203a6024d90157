// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fit engine — maps one source raster onto the available page box according
// to a fit policy. Planning is pure arithmetic on dimensions; `fit_image`
// applies the plan to pixels.

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::{FitPolicy, PageGeometry};
use image::RgbImage;
use tracing::{debug, instrument};

use crate::image::processor::ImageProcessor;

/// Rectangle removed from the scaled raster, in scaled-raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Geometry of a fit, before any pixels are touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitPlan {
    pub scale: f64,
    /// Size after rescaling, before cropping.
    pub scaled: (u32, u32),
    /// Present only when the scaled raster overflows the available box.
    pub crop: Option<CropBox>,
}

impl FitPlan {
    /// Final raster size.
    pub fn output_size(&self) -> (u32, u32) {
        match self.crop {
            Some(crop) => (crop.width, crop.height),
            None => self.scaled,
        }
    }

    fn identity(source: (u32, u32)) -> Self {
        Self {
            scale: 1.0,
            scaled: source,
            crop: None,
        }
    }
}

/// One laid-out page raster. Produced fresh per image and not retained.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub target_raster: RgbImage,
    pub applied_scale: f64,
    pub cropped: bool,
}

/// Validate the page box left after margins and return it as positive sizes.
pub fn available_box(page: &PageGeometry, margin_px: u32) -> Result<(u32, u32)> {
    let (width, height) = page.available(margin_px);
    if width <= 0 || height <= 0 {
        return Err(BildwerkError::InvalidGeometry { width, height });
    }
    // Both fit in u32: they are bounded above by the page dimensions.
    Ok((width as u32, height as u32))
}

/// Compute the scale and crop for a `source` of the given size.
pub fn plan(
    source: (u32, u32),
    page: &PageGeometry,
    policy: FitPolicy,
    margin_px: u32,
) -> Result<FitPlan> {
    let (avail_w, avail_h) = available_box(page, margin_px)?;
    let (src_w, src_h) = source;

    if src_w == 0 || src_h == 0 {
        return Err(BildwerkError::ImageError(format!(
            "cannot lay out an empty {src_w}x{src_h} image"
        )));
    }

    let width_scale = f64::from(avail_w) / f64::from(src_w);
    let height_scale = f64::from(avail_h) / f64::from(src_h);

    let plan = match policy {
        FitPolicy::OriginalSize => FitPlan::identity(source),

        FitPolicy::FitToPage => {
            let scale = width_scale.min(height_scale).min(1.0);
            if scale == 1.0 {
                FitPlan::identity(source)
            } else {
                FitPlan {
                    scale,
                    scaled: (
                        scaled_length(src_w, scale).min(avail_w),
                        scaled_length(src_h, scale).min(avail_h),
                    ),
                    crop: None,
                }
            }
        }

        FitPolicy::FillPage => {
            let scale = width_scale.max(height_scale);
            // The binding axis always lands on the box exactly.
            let scaled = if scale == 1.0 {
                source
            } else {
                (
                    scaled_length(src_w, scale).max(avail_w),
                    scaled_length(src_h, scale).max(avail_h),
                )
            };
            FitPlan {
                scale,
                scaled,
                crop: centre_crop(scaled, (avail_w, avail_h)),
            }
        }
    };

    debug!(?policy, src_w, src_h, avail_w, avail_h, ?plan, "Fit planned");
    Ok(plan)
}

/// Lay out `source` for the page, returning a new raster. The source is never
/// modified; a scale of exactly 1.0 skips resampling.
#[instrument(skip(source), fields(src_w = source.width(), src_h = source.height()))]
pub fn fit_image(
    source: &RgbImage,
    page: &PageGeometry,
    policy: FitPolicy,
    margin_px: u32,
) -> Result<LayoutResult> {
    let plan = plan(source.dimensions(), page, policy, margin_px)?;

    let processor = ImageProcessor::from_rgb(source.clone());
    let processor = match plan.crop {
        // Cut the covering window out of the source first, so only the kept
        // region is ever resampled.
        Some(crop) => {
            let window = source_window(crop, plan.scale, source.dimensions());
            processor
                .crop(window.x, window.y, window.width, window.height)
                .resize_exact(crop.width, crop.height)
        }
        None if plan.scale != 1.0 => processor.resize_exact(plan.scaled.0, plan.scaled.1),
        None => processor,
    };

    Ok(LayoutResult {
        target_raster: processor.into_rgb(),
        applied_scale: plan.scale,
        cropped: plan.crop.is_some(),
    })
}

/// Tolerance for products that land a hair below a whole pixel.
const FLOOR_EPSILON: f64 = 1e-9;

/// `floor(length * scale)`, never below one pixel.
fn scaled_length(length: u32, scale: f64) -> u32 {
    ((f64::from(length) * scale + FLOOR_EPSILON).floor() as u32).max(1)
}

/// Source pixels covering `crop`, which is given in scaled-raster pixels.
/// Partially covered edge pixels are included.
fn source_window(crop: CropBox, scale: f64, source: (u32, u32)) -> CropBox {
    let axis = |start: u32, length: u32, limit: u32| {
        let first = ((f64::from(start) / scale + FLOOR_EPSILON).floor() as u32).min(limit - 1);
        let end = ((f64::from(start + length) / scale - FLOOR_EPSILON).ceil() as u32).min(limit);
        (first, end.saturating_sub(first).max(1))
    };
    let (x, width) = axis(crop.x, crop.width, source.0);
    let (y, height) = axis(crop.y, crop.height, source.1);
    CropBox {
        x,
        y,
        width,
        height,
    }
}

/// Symmetric crop of `scaled` down to `target` on any overflowing axis.
fn centre_crop(scaled: (u32, u32), target: (u32, u32)) -> Option<CropBox> {
    let (scaled_w, scaled_h) = scaled;
    let (target_w, target_h) = target;
    if scaled_w <= target_w && scaled_h <= target_h {
        return None;
    }
    Some(CropBox {
        x: scaled_w.saturating_sub(target_w) / 2,
        y: scaled_h.saturating_sub(target_h) / 2,
        width: target_w.min(scaled_w),
        height: target_h.min(scaled_h),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bildwerk_core::types::PageSize;
    use image::Rgb;

    fn a4() -> PageGeometry {
        PageSize::A4.geometry()
    }

    #[test]
    fn fit_to_page_tall_image_on_a4() {
        let plan = plan((1000, 2000), &a4(), FitPolicy::FitToPage, 50).expect("plan");
        assert!((plan.scale - 0.371).abs() < 1e-9);
        let (w, h) = plan.output_size();
        assert!((370..=371).contains(&w), "width {w}");
        assert_eq!(h, 742);
        assert!(plan.crop.is_none());
    }

    #[test]
    fn fill_page_wide_image_on_a4() {
        let plan = plan((2000, 1000), &a4(), FitPolicy::FillPage, 50).expect("plan");
        assert!((plan.scale - 0.742).abs() < 1e-9);
        assert_eq!(plan.scaled, (1484, 742));
        assert_eq!(
            plan.crop,
            Some(CropBox {
                x: 494,
                y: 0,
                width: 495,
                height: 742,
            })
        );
        assert_eq!(plan.output_size(), (495, 742));
    }

    #[test]
    fn fit_to_page_never_upscales() {
        let sizes = [(1, 1), (10, 3000), (3000, 10), (495, 742), (494, 741), (5000, 5000)];
        for page in PageSize::ALL {
            for margin in [0, 10, 50, 150] {
                for source in sizes {
                    let plan = plan(source, &page.geometry(), FitPolicy::FitToPage, margin)
                        .expect("plan");
                    let (aw, ah) = available_box(&page.geometry(), margin).expect("box");
                    let (w, h) = plan.output_size();
                    assert!(plan.scale <= 1.0);
                    assert!(w <= aw && h <= ah, "{source:?} -> {w}x{h} in {aw}x{ah}");
                }
            }
        }
    }

    #[test]
    fn fill_page_always_covers_exactly() {
        let sizes = [(1, 1), (7, 3001), (3001, 7), (495, 742), (1000, 2000), (4032, 3024)];
        for page in PageSize::ALL {
            for margin in [0, 25, 50] {
                let expected = available_box(&page.geometry(), margin).expect("box");
                for source in sizes {
                    let plan =
                        plan(source, &page.geometry(), FitPolicy::FillPage, margin).expect("plan");
                    assert_eq!(plan.output_size(), expected, "{source:?} on {page:?}");
                }
            }
        }
    }

    #[test]
    fn original_size_is_identity() {
        let img = RgbImage::from_pixel(3000, 20, Rgb([1, 2, 3]));
        let result = fit_image(&img, &a4(), FitPolicy::OriginalSize, 50).expect("fit");
        assert_eq!(result.target_raster.dimensions(), (3000, 20));
        assert_eq!(result.applied_scale, 1.0);
        assert!(!result.cropped);
        assert_eq!(result.target_raster, img);
    }

    #[test]
    fn small_image_fits_without_resampling() {
        let img = RgbImage::from_fn(40, 30, |x, y| Rgb([x as u8, y as u8, 9]));
        let result = fit_image(&img, &a4(), FitPolicy::FitToPage, 50).expect("fit");
        assert_eq!(result.applied_scale, 1.0);
        assert_eq!(result.target_raster, img);
    }

    #[test]
    fn fill_page_pixels_match_plan() {
        let img = RgbImage::from_pixel(200, 100, Rgb([90, 90, 90]));
        let result = fit_image(&img, &a4(), FitPolicy::FillPage, 50).expect("fit");
        assert_eq!(result.target_raster.dimensions(), (495, 742));
        assert!(result.cropped);
        assert!(result.applied_scale > 1.0);
    }

    #[test]
    fn fill_page_thin_strip_resamples_only_the_window() {
        let img = RgbImage::from_fn(1, 4000, |_, y| Rgb([(y / 16) as u8, 0, 0]));
        let plan = plan(img.dimensions(), &a4(), FitPolicy::FillPage, 50).expect("plan");
        assert_eq!(plan.scaled, (495, 1_980_000));

        let crop = plan.crop.expect("crop");
        assert_eq!(
            source_window(crop, plan.scale, img.dimensions()),
            CropBox {
                x: 0,
                y: 1999,
                width: 1,
                height: 2,
            }
        );

        let result = fit_image(&img, &a4(), FitPolicy::FillPage, 50).expect("fit");
        assert_eq!(result.target_raster.dimensions(), (495, 742));
        assert!(result.cropped);
        // Rows 1999 and 2000 both sit in band 124 or 125.
        assert!(result.target_raster.pixels().all(|p| (123..=126).contains(&p[0])));
    }

    #[test]
    fn fill_page_window_matches_the_centre_of_the_source() {
        let uniform = RgbImage::from_pixel(300, 40, Rgb([90, 140, 200]));
        let result = fit_image(&uniform, &a4(), FitPolicy::FillPage, 50).expect("fit");
        assert_eq!(result.target_raster.dimensions(), (495, 742));
        for pixel in result.target_raster.pixels() {
            for (got, want) in pixel.0.iter().zip([90u8, 140, 200]) {
                assert!(got.abs_diff(want) <= 1, "{pixel:?}");
            }
        }

        // Horizontal ramp: the middle output column samples the middle source column.
        let ramp = RgbImage::from_fn(100, 50, |x, _| Rgb([(x * 2) as u8, 0, 0]));
        let result = fit_image(&ramp, &a4(), FitPolicy::FillPage, 50).expect("fit");
        let centre = result.target_raster.get_pixel(247, 371)[0];
        assert!(centre.abs_diff(100) <= 6, "centre {centre}");
        let left = result.target_raster.get_pixel(5, 371)[0];
        let right = result.target_raster.get_pixel(489, 371)[0];
        assert!(left < centre && centre < right);
    }

    #[test]
    fn source_window_at_unit_scale_is_the_crop() {
        let crop = CropBox {
            x: 10,
            y: 0,
            width: 495,
            height: 742,
        };
        assert_eq!(source_window(crop, 1.0, (515, 742)), crop);
    }

    #[test]
    fn oversized_margin_is_invalid_geometry() {
        let a5 = PageSize::A5.geometry();
        let err = plan((100, 100), &a5, FitPolicy::FitToPage, 500).unwrap_err();
        assert!(matches!(
            err,
            BildwerkError::InvalidGeometry {
                width: -580,
                height: -405
            }
        ));

        // Exactly half the page leaves a zero-width box.
        let err = plan((100, 100), &a5, FitPolicy::OriginalSize, 210).unwrap_err();
        assert!(matches!(err, BildwerkError::InvalidGeometry { width: 0, .. }));
    }

    #[test]
    fn scale_is_monotonic_in_margin() {
        let mut previous = f64::MAX;
        for margin in [0, 20, 40, 80, 160] {
            let plan = plan((4000, 3000), &a4(), FitPolicy::FitToPage, margin).expect("plan");
            assert!(plan.scale < previous);
            previous = plan.scale;
        }
    }
}
