// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: assembling page images into PDFs, reading existing PDFs, and
// deriving cover thumbnails.

pub mod assembler;
pub mod cover;
pub mod reader;

pub use assembler::{AssembledDocument, PdfAssembler};
pub use cover::{Cover, CoverSource};
pub use reader::PdfReader;
