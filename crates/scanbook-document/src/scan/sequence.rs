// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page sequence: the ordered pages waiting to be assembled into a PDF.

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ImageDecoder};
use scanbook_core::NormalizeOptions;
use scanbook_core::error::ScanbookError;
use tracing::debug;

use crate::image::normalizer::{NormalizedImage, PageNormalizer};

/// One page awaiting assembly. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPage {
    /// JPEG bytes embedded verbatim into the PDF.
    image_data: Vec<u8>,
    /// Small JPEG for redisplaying the page.
    preview: Vec<u8>,
    /// Pixel size of `image_data`; 0x0 when its header can't be read.
    width: u32,
    height: u32,
}

impl PendingPage {
    /// Normalize raw image bytes into a page plus its preview thumbnail.
    pub fn from_bytes(
        data: &[u8],
        options: NormalizeOptions,
        preview: NormalizeOptions,
    ) -> Result<Self, ScanbookError> {
        let image = PageNormalizer::from_bytes(data)?.into_dynamic();
        Self::from_dynamic(image, options, preview)
    }

    /// Normalize an already-decoded image into a page plus its preview.
    pub fn from_dynamic(
        image: DynamicImage,
        options: NormalizeOptions,
        preview: NormalizeOptions,
    ) -> Result<Self, ScanbookError> {
        let page = PageNormalizer::from_dynamic(image).normalize(options)?;
        let thumb = PageNormalizer::from_bytes(&page.jpeg)?.normalize(preview)?;
        Ok(Self::from_normalized(page, thumb))
    }

    /// Build a page from images that were normalized elsewhere.
    pub fn from_normalized(page: NormalizedImage, preview: NormalizedImage) -> Self {
        Self {
            width: page.width,
            height: page.height,
            image_data: page.jpeg,
            preview: preview.jpeg,
        }
    }

    /// Take JPEG bytes as-is; the preview shares the same image.
    ///
    /// Only the header is read, for the page size. A damaged buffer gets a
    /// 0x0 size here and is reported when the sequence is assembled.
    pub fn from_jpeg(jpeg: Vec<u8>) -> Self {
        let (width, height) = JpegDecoder::new(Cursor::new(jpeg.as_slice()))
            .map(|decoder| decoder.dimensions())
            .unwrap_or_else(|err| {
                debug!(error = %err, "JPEG header unreadable, size unknown");
                (0, 0)
            });
        Self {
            preview: jpeg.clone(),
            image_data: jpeg,
            width,
            height,
        }
    }

    pub fn image_data(&self) -> &[u8] {
        &self.image_data
    }

    pub fn preview(&self) -> &[u8] {
        &self.preview
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Ordered pages, positions contiguous from 0.
///
/// The length always equals the page count of the next assembled document.
#[derive(Debug, Clone, Default)]
pub struct PageSequence {
    pages: Vec<PendingPage>,
}

impl PageSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page at the end.
    pub fn append(&mut self, page: PendingPage) {
        self.pages.push(page);
        debug!(len = self.pages.len(), "page appended");
    }

    /// Remove the page at `index`, shifting later pages down by one.
    ///
    /// An index past the end is ignored and yields `None`.
    pub fn remove_at(&mut self, index: usize) -> Option<PendingPage> {
        if index >= self.pages.len() {
            debug!(index, len = self.pages.len(), "remove_at out of range, ignored");
            return None;
        }
        let removed = self.pages.remove(index);
        debug!(index, len = self.pages.len(), "page removed");
        Some(removed)
    }

    /// The pages in assembly order.
    pub fn to_ordered_list(&self) -> &[PendingPage] {
        &self.pages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PendingPage> {
        self.pages.iter()
    }

    pub fn get(&self, index: usize) -> Option<&PendingPage> {
        self.pages.get(index)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn into_pages(self) -> Vec<PendingPage> {
        self.pages
    }
}

impl Extend<PendingPage> for PageSequence {
    fn extend<I: IntoIterator<Item = PendingPage>>(&mut self, iter: I) {
        self.pages.extend(iter);
    }
}

impl<'a> IntoIterator for &'a PageSequence {
    type Item = &'a PendingPage;
    type IntoIter = std::slice::Iter<'a, PendingPage>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}
