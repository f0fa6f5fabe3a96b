// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cover thumbnails for stored books.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use scanbook_core::error::ScanbookError;
use tracing::{debug, instrument, warn};

use crate::image::normalizer::PageNormalizer;
use crate::pdf::reader::PdfReader;

const COVER_QUALITY: u8 = 80;

/// Where a cover image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSource {
    /// The first page image of an assembled scan, reused as-is.
    FirstPageImage,
    /// Page 1 of an imported PDF, rasterised onto a page-sized canvas.
    RenderedPage,
    /// Page 1 had no raster content, or its image could not be decoded; the
    /// cover is an empty page.
    Blank,
}

/// JPEG cover thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source: CoverSource,
}

impl Cover {
    /// Reuse an already-encoded first page.
    pub fn from_first_page(jpeg: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            jpeg,
            width,
            height,
            source: CoverSource::FirstPageImage,
        }
    }

    /// Render page 1 of a PDF at `scale` (1.0 = one pixel per point).
    ///
    /// The canvas has the page's proportions. The largest image on the page
    /// is fitted into it, anchored at the top-left like the assembler places
    /// scans. Vector content and text are not drawn. An image the reader
    /// cannot decode leaves the cover blank instead of failing.
    #[instrument(skip(reader))]
    pub fn render_first_page(reader: &PdfReader, scale: f32) -> Result<Self, ScanbookError> {
        let (page_w, page_h) = reader.page_size(1)?;
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        let width = ((page_w * scale).round() as u32).max(1);
        let height = ((page_h * scale).round() as u32).max(1);

        let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        let source = match reader.page_image(1) {
            Ok(Some(page_image)) => {
                let (fit_w, fit_h) = fit_box(page_image.width(), page_image.height(), width, height);
                let scaled = page_image
                    .resize_exact(fit_w, fit_h, FilterType::Triangle)
                    .to_rgb8();
                imageops::overlay(&mut canvas, &scaled, 0, 0);
                CoverSource::RenderedPage
            }
            Ok(None) => CoverSource::Blank,
            Err(err) => {
                warn!(error = %err, "page 1 image unreadable, using a blank cover");
                CoverSource::Blank
            }
        };

        let encoded = PageNormalizer::from_dynamic(DynamicImage::ImageRgb8(canvas)).to_jpeg(COVER_QUALITY)?;
        debug!(width, height, ?source, "Cover rendered");

        Ok(Self {
            jpeg: encoded.jpeg,
            width: encoded.width,
            height: encoded.height,
            source,
        })
    }
}

/// Largest size with the image's aspect ratio that fits inside the box.
fn fit_box(img_w: u32, img_h: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    let by_width = (u64::from(img_h) * u64::from(box_w)) <= (u64::from(box_h) * u64::from(img_w));
    if by_width {
        let h = (f64::from(img_h) * f64::from(box_w) / f64::from(img_w)).round() as u32;
        (box_w, h.clamp(1, box_h))
    } else {
        let w = (f64::from(img_w) * f64::from(box_h) / f64::from(img_h)).round() as u32;
        (w.clamp(1, box_w), box_h)
    }
}
