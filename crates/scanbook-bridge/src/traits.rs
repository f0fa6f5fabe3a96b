// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.

use scanbook_core::error::Result;

/// Unified bridge that groups all native capabilities.
pub trait PlatformBridge: NativeCamera {
    /// Human-readable platform name (e.g. "iOS 17", "Desktop").
    fn platform_name(&self) -> &str;
}

/// Which camera to prefer when a device has several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Rear camera, pointed at the document.
    Environment,
    /// Front camera.
    User,
}

/// Parameters for opening a video stream. Sizes are ideals, not minimums:
/// the device may deliver something smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for StreamRequest {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

/// A single still taken from a live stream, as packed RGB8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, row-major.
    pub rgb: Vec<u8>,
}

/// Access to the device camera.
pub trait NativeCamera {
    /// Acquire the camera and start streaming.
    ///
    /// Fails with `ScanbookError::CameraUnavailable` when permission is
    /// denied or no matching device exists.
    fn open_stream(&self, request: &StreamRequest) -> Result<Box<dyn CameraStream>>;
}

/// A live video stream holding the capture device.
pub trait CameraStream {
    /// Current frame size as delivered by the device.
    fn frame_size(&self) -> (u32, u32);

    /// Copy the most recent frame out of the stream.
    fn grab_frame(&mut self) -> Result<Frame>;

    /// Stop every track and give the device back to the OS. Must be
    /// idempotent.
    fn release(&mut self);
}
