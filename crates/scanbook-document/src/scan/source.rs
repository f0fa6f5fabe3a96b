// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image source: files picked by the user and stills taken from the camera.

use std::path::Path;

use image::{DynamicImage, RgbImage};
use scanbook_bridge::{CameraSession, Frame, NativeCamera};
use scanbook_core::error::ScanbookError;
use scanbook_core::{DocumentType, NormalizeOptions};
use tracing::{info, instrument, warn};

use crate::scan::sequence::PendingPage;

/// A file chosen by the user, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ScanbookError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!(bytes = bytes.len(), "file read");
        Ok(Self { name, bytes })
    }

    /// Content sniffing first, then the file extension.
    pub fn document_type(&self) -> Option<DocumentType> {
        DocumentType::from_magic(&self.bytes).or_else(|| {
            Path::new(&self.name)
                .extension()
                .and_then(|ext| DocumentType::from_extension(&ext.to_string_lossy()))
        })
    }

    /// File name without a trailing `.pdf`, used as the default title.
    pub fn title_stem(&self) -> &str {
        let name = self.name.as_str();
        match name.len().checked_sub(4) {
            Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf") => {
                &name[..cut]
            }
            _ => name,
        }
    }
}

/// What a file selection turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Nothing was picked.
    Empty,
    /// One or more images, in pick order.
    Images(Vec<SelectedFile>),
    /// A PDF to import verbatim. When several PDFs are picked the first one
    /// wins and everything else is ignored.
    Pdf(SelectedFile),
}

impl Selection {
    /// Sort a file pick into images or a PDF import.
    ///
    /// Any PDF in the pick makes it an import, whatever order the files came
    /// in: the first PDF wins and every other file is ignored. Without a PDF,
    /// a file that is neither PDF nor image rejects the whole pick.
    pub fn classify(files: Vec<SelectedFile>) -> Result<Self, ScanbookError> {
        if files.is_empty() {
            return Ok(Self::Empty);
        }

        let mut images = Vec::with_capacity(files.len());
        let mut first_pdf = None;
        let mut unsupported = None;
        let mut ignored = 0usize;
        for file in files {
            match file.document_type() {
                Some(DocumentType::Pdf) if first_pdf.is_none() => first_pdf = Some(file),
                Some(DocumentType::Pdf) => {
                    warn!(name = %file.name, "extra PDF in selection ignored");
                }
                Some(_) => images.push(file),
                None => {
                    ignored += 1;
                    unsupported.get_or_insert(file.name);
                }
            }
        }

        if let Some(pdf) = first_pdf {
            if !images.is_empty() || ignored > 0 {
                warn!(
                    images = images.len(),
                    unsupported = ignored,
                    "files ignored alongside a PDF"
                );
            }
            return Ok(Self::Pdf(pdf));
        }

        match unsupported {
            Some(name) => Err(ScanbookError::UnsupportedInput(name)),
            None => Ok(Self::Images(images)),
        }
    }
}

/// Convert a camera frame to an image.
pub fn frame_to_image(frame: Frame) -> Result<DynamicImage, ScanbookError> {
    let (width, height) = (frame.width, frame.height);
    RgbImage::from_raw(width, height, frame.rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| {
            ScanbookError::ImageError(format!(
                "camera frame buffer does not match {width}x{height} RGB"
            ))
        })
}

/// Take a still from a running camera session and normalize it into a page.
#[instrument(skip_all, fields(max = options.max_dimension))]
pub fn capture_page<C: NativeCamera + ?Sized>(
    session: &mut CameraSession<'_, C>,
    options: NormalizeOptions,
    preview: NormalizeOptions,
) -> Result<PendingPage, ScanbookError> {
    let frame = session.capture()?;
    let image = frame_to_image(frame)?;
    PendingPage::from_dynamic(image, options, preview)
}
