// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanbook.

use thiserror::Error;

/// Top-level error type for all Scanbook operations.
#[derive(Debug, Error)]
pub enum ScanbookError {
    // -- Capture / input errors --
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("camera stream is not running")]
    CameraStopped,

    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// A well-formed request with arguments that can't be acted on, like
    /// page 0 or a question-less `answer`.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // -- Document errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("page {index} could not be decoded: {reason}")]
    PageDecode { index: usize, reason: String },

    #[error("cannot assemble a document with no pages")]
    EmptyDocument,

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Remote services --
    #[error("network request failed: {0}")]
    Network(String),

    #[error("remote returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("text generation failed: {0}")]
    Ai(String),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl ScanbookError {
    /// Whether this error came from talking to another machine, as opposed
    /// to bad input or local storage.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RemoteStatus { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanbookError>;
