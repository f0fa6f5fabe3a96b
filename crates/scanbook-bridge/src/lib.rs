// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanbook-bridge — Native platform capabilities.
//
// Defines the camera abstraction the scanner captures from, the scoped
// `CameraSession` that owns a live stream, and the platform dispatch that
// picks an implementation for the target OS.

pub mod camera;
pub mod stub;
pub mod traits;

pub use camera::CameraSession;
pub use traits::{CameraStream, Facing, Frame, NativeCamera, PlatformBridge, StreamRequest};

/// Returns the bridge implementation for the target operating system.
///
/// Every build currently gets the stub: no native camera backend exists
/// yet, so camera capture always fails with `CameraUnavailable`.
pub fn platform_bridge() -> Box<dyn PlatformBridge> {
    Box::new(stub::StubBridge)
}
