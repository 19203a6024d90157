// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode and normalise to RGB, resample, crop and encode
// page rasters. Operates on in-memory images using the `image` crate.

use std::path::Path;

use bildwerk_core::error::BildwerkError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use tracing::{debug, info, instrument};

/// Filter used for every non-identity rescale.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Image processing pipeline operating on a single 8-bit RGB raster.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let page = ImageProcessor::open("photo.png")?
///     .resize_exact(495, 742)
///     .crop(0, 0, 400, 600)
///     .into_rgb();
/// let jpeg = encode_jpeg(&page, 95)?;
/// ```
pub struct ImageProcessor {
    /// The current working image, always three 8-bit channels.
    image: RgbImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode an image file and normalise it to RGB. Alpha is discarded and
    /// palette, greyscale and 16-bit sources are converted.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BildwerkError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|err| BildwerkError::UnreadableImage {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        info!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image loaded"
        );
        Ok(Self::from_dynamic(img))
    }

    /// Wrap an already-decoded `DynamicImage`, converting it to RGB.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let image = match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };
        Self { image }
    }

    /// Wrap an RGB raster as-is.
    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying raster.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    /// Consume the processor and return the underlying raster.
    pub fn into_rgb(self) -> RgbImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize the image to exactly `width` x `height` with Lanczos3 filtering.
    /// Requesting the current size returns the image untouched.
    #[instrument(skip(self), fields(width, height))]
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        if (width, height) == self.image.dimensions() {
            return self;
        }
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            "Resampling image"
        );
        let resized = imageops::resize(&self.image, width.max(1), height.max(1), RESAMPLE_FILTER);
        Self { image: resized }
    }

    /// Crop a rectangular region from the image.
    ///
    /// `x` and `y` are the top-left corner; `width` and `height` define the
    /// size of the crop rectangle. Values are clamped to image bounds.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w - safe_x);
        let safe_h = height.min(img_h - safe_y);

        if (safe_x, safe_y, safe_w, safe_h) == (0, 0, img_w, img_h) {
            return self;
        }

        debug!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        let cropped = imageops::crop_imm(&self.image, safe_x, safe_y, safe_w, safe_h).to_image();
        Self { image: cropped }
    }
}

/// Encode an RGB raster as baseline JPEG. Quality is clamped to 1-100.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, BildwerkError> {
    let mut buffer = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    image.write_with_encoder(encoder).map_err(|err| {
        BildwerkError::WriteFailure(format!("JPEG encoding failed: {}", err))
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, Rgba, RgbaImage};

    #[test]
    fn from_dynamic_normalises_to_rgb() {
        let rgba = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 0]));
        let processor = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(rgba));
        assert_eq!(processor.as_rgb().get_pixel(0, 0), &Rgb([10, 20, 30]));

        let gray = GrayImage::from_pixel(2, 2, Luma([77]));
        let processor = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(gray));
        assert_eq!(processor.as_rgb().get_pixel(1, 1), &Rgb([77, 77, 77]));
    }

    #[test]
    fn resize_exact_hits_requested_size() {
        let img = RgbImage::from_pixel(100, 50, Rgb([200, 100, 50]));
        let out = ImageProcessor::from_rgb(img).resize_exact(37, 19);
        assert_eq!((out.width(), out.height()), (37, 19));
    }

    #[test]
    fn crop_is_clamped_to_bounds() {
        let img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let out = ImageProcessor::from_rgb(img).crop(6, 6, 50, 50);
        assert_eq!((out.width(), out.height()), (4, 4));
    }

    #[test]
    fn open_reports_unreadable_files() {
        let err = ImageProcessor::open("/definitely/not/here.png")
            .err()
            .expect("missing file must fail");
        assert!(matches!(err, BildwerkError::UnreadableImage { .. }));
    }

    #[test]
    fn jpeg_output_has_soi_marker() {
        let img = RgbImage::from_pixel(8, 8, Rgb([255, 0, 0]));
        let bytes = encode_jpeg(&img, 80).expect("encode");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }
}
