// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where no native camera API is wired up.

use scanbook_core::error::{Result, ScanbookError};

use crate::traits::*;

/// Bridge returned on platforms without a native camera.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeCamera for StubBridge {
    fn open_stream(&self, _request: &StreamRequest) -> Result<Box<dyn CameraStream>> {
        tracing::warn!("NativeCamera::open_stream called on stub bridge");
        Err(ScanbookError::CameraUnavailable(
            "no camera on this platform".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_camera_reports_unavailable() {
        let bridge = StubBridge;
        let result = bridge.open_stream(&StreamRequest::default());
        assert!(matches!(result, Err(ScanbookError::CameraUnavailable(_))));
    }
}
