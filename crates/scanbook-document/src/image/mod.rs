// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: bounded downscaling and JPEG recompression of page images.

pub mod normalizer;

pub use normalizer::{NormalizedImage, PageNormalizer};
