// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

/// Bounds applied when an image is normalized into a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Longest edge allowed after normalization, in pixels.
    pub max_dimension: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
}

impl NormalizeOptions {
    /// Camera stills.
    pub const CAPTURE: Self = Self {
        max_dimension: 1600,
        quality: 80,
    };

    /// Uploaded images, recompressed before assembly.
    pub const ASSEMBLY: Self = Self {
        max_dimension: 1200,
        quality: 75,
    };

    /// Preview thumbnails shown in the page strip.
    pub const THUMBNAIL: Self = Self {
        max_dimension: 320,
        quality: 70,
    };
}

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page size of assembled documents.
    pub paper_size: crate::PaperSize,
    /// Base URL of the book/notes REST API. `None` means local-only.
    pub remote_api_url: Option<String>,
    /// Timeout for REST API calls, including the health check.
    pub remote_timeout_secs: u64,
    /// Normalization applied to camera captures.
    pub capture: NormalizeOptions,
    /// Normalization applied to uploaded images.
    pub upload: NormalizeOptions,
    /// Normalization applied to page previews.
    pub thumbnail: NormalizeOptions,
    /// Scale at which the first page of an imported PDF is rendered as its cover.
    pub cover_scale: f32,
    /// Generative model used by the reading assistant.
    pub ai_model: String,
    /// Base URL of the generative-language API.
    pub ai_endpoint: String,
    /// Timeout for a single generation request.
    pub ai_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paper_size: crate::PaperSize::A4,
            remote_api_url: None,
            remote_timeout_secs: 5,
            capture: NormalizeOptions::CAPTURE,
            upload: NormalizeOptions::ASSEMBLY,
            thumbnail: NormalizeOptions::THUMBNAIL,
            cover_scale: 0.5,
            ai_model: "gemini-3-flash-preview".into(),
            ai_endpoint: "https://generativelanguage.googleapis.com".into(),
            ai_timeout_secs: 60,
        }
    }
}
