// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the front end presents it.

use crate::error::ScanbookError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or busy service; trying again may work.
    Transient,
    /// User must do something (grant permission, pick another file).
    ActionRequired,
    /// Cannot be fixed by retrying; damaged file, unsupported format.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying again might succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanbookError` into a `HumanError`.
pub fn humanize_error(err: &ScanbookError) -> HumanError {
    match err {
        // -- Capture --
        ScanbookError::CameraUnavailable(_) => HumanError {
            message: "Could not access camera.".into(),
            suggestion: "Please check permissions, or add pages from files instead. Pages you already scanned are kept.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        ScanbookError::CameraStopped => HumanError {
            message: "The camera is not running.".into(),
            suggestion: "Start the camera again, then capture the page.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        ScanbookError::UnsupportedInput(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!("Choose image files (JPEG, PNG) or a single PDF. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanbookError::InvalidRequest(detail) => HumanError {
            message: "That request can't be done as asked.".into(),
            suggestion: format!("Check what you entered and try again: {detail}."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Documents --
        ScanbookError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanbookError::PageDecode { index, .. } => HumanError {
            message: format!("Page {} couldn't be read.", index + 1),
            suggestion: "Remove that page or scan it again, then create the document. Nothing was saved.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanbookError::EmptyDocument => HumanError {
            message: "There are no pages yet.".into(),
            suggestion: "Capture or add at least one page first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanbookError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in another viewer to check it works, or try a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Storage --
        ScanbookError::Database(_) => HumanError {
            message: "The library's storage had a problem.".into(),
            suggestion: "Try again. Your books and notes should still be there.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanbookError::NotFound(what) => HumanError {
            message: format!("We couldn't find that {what}."),
            suggestion: "It may have been deleted. Check the list and try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanbookError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Scanbook doesn't have permission to read that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        ScanbookError::Serialization(_) => HumanError {
            message: "Scanbook had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Remote services --
        ScanbookError::Network(_) | ScanbookError::RemoteStatus { .. } => HumanError {
            message: "The library server couldn't be reached.".into(),
            suggestion: "Your change was kept on this device instead.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanbookError::Ai(_) => HumanError {
            message: "Failed to generate response.".into(),
            suggestion: "Check your internet connection and API key, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Platform --
        ScanbookError::PlatformUnavailable => HumanError {
            message: "This feature isn't available on your device.".into(),
            suggestion: "Some features need a camera or a mobile device.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
