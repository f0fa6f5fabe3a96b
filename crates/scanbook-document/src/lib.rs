// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanbook-document — Document processing for Scanbook.
//
// Provides image normalization (bounded downscale + JPEG recompression), the
// pending page sequence, image intake from files and the camera, scan-to-PDF
// assembly, and PDF inspection (page text, page images, cover rendering).

pub mod image;
pub mod pdf;
pub mod scan;

// Re-export the primary structs so callers can use `scanbook_document::PdfAssembler` etc.
pub use crate::image::normalizer::{NormalizedImage, PageNormalizer};
pub use pdf::assembler::{AssembledDocument, PdfAssembler};
pub use pdf::cover::{Cover, CoverSource};
pub use pdf::reader::PdfReader;
pub use scan::scanner::{Intake, Scanner};
pub use scan::sequence::{PageSequence, PendingPage};
pub use scan::source::{Selection, SelectedFile};
