// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page normalizer: bounded downscale and JPEG recompression. Operates on
// in-memory images using the `image` crate.

use image::{DynamicImage, ImageFormat};
use scanbook_core::NormalizeOptions;
use scanbook_core::error::ScanbookError;
use tracing::{debug, info, instrument};

/// A re-encoded JPEG together with its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Normalization pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `PageNormalizer`, so calls
/// chain:
///
/// ```ignore
/// let page = PageNormalizer::from_bytes(&raw)?
///     .fit_within(1600)
///     .to_jpeg(80)?;
/// ```
pub struct PageNormalizer {
    /// The current working image.
    image: DynamicImage,
}

impl PageNormalizer {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanbookError> {
        let img = image::load_from_memory(data).map_err(|err| {
            ScanbookError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
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

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the normalizer and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Shrink the image so its longer edge is at most `max_dimension`.
    ///
    /// Aspect ratio is preserved and images already inside the bound are
    /// returned untouched. Uses Lanczos3 filtering.
    #[instrument(skip(self), fields(max_dimension))]
    pub fn fit_within(self, max_dimension: u32) -> Self {
        let (width, height) = (self.image.width(), self.image.height());
        let (new_w, new_h) = fit_dimensions(width, height, max_dimension);
        if (new_w, new_h) == (width, height) {
            debug!(width, height, "Image already within bound");
            return self;
        }

        info!(
            from_w = width,
            from_h = height,
            to_w = new_w,
            to_h = new_h,
            "Downscaling image"
        );
        let resized = self
            .image
            .resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as baseline RGB JPEG with the given quality
    /// (1-100).
    pub fn to_jpeg(&self, quality: u8) -> Result<NormalizedImage, ScanbookError> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder).map_err(|err| {
            ScanbookError::ImageError(format!("JPEG encoding failed: {}", err))
        })?;
        Ok(NormalizedImage {
            jpeg: buffer,
            width: rgb.width(),
            height: rgb.height(),
        })
    }

    /// Fit and encode in one step.
    pub fn normalize(self, options: NormalizeOptions) -> Result<NormalizedImage, ScanbookError> {
        self.fit_within(options.max_dimension).to_jpeg(options.quality)
    }

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ScanbookError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| ScanbookError::ImageError(format!("image encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

/// Decode `data` and normalize it with `options`.
#[instrument(skip(data), fields(data_len = data.len(), max = options.max_dimension, quality = options.quality))]
pub fn normalize(data: &[u8], options: NormalizeOptions) -> Result<NormalizedImage, ScanbookError> {
    PageNormalizer::from_bytes(data)?.normalize(options)
}

/// Dimensions after bounding the longer edge to `max_dimension`.
///
/// The longer edge lands exactly on the bound; the shorter edge is rounded
/// to the nearest pixel and never drops below 1. Never upscales.
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longer = width.max(height);
    if max_dimension == 0 || longer <= max_dimension {
        return (width, height);
    }

    let scale = max_dimension as f64 / longer as f64;
    let shrink = |edge: u32| -> u32 {
        if edge == longer {
            max_dimension
        } else {
            ((edge as f64 * scale).round() as u32).max(1)
        }
    };
    (shrink(width), shrink(height))
}
