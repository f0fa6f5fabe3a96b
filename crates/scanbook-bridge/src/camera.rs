// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Camera session: owns at most one live stream and guarantees the device is
// released on `stop`, on restart, and when the session is dropped.

use scanbook_core::error::{Result, ScanbookError};
use tracing::{debug, info, instrument, warn};

use crate::traits::{CameraStream, Frame, NativeCamera, StreamRequest};

/// Scoped access to a camera.
///
/// The stream is shared by preview and capture and only changes through
/// [`CameraSession::start`] and [`CameraSession::stop`]. Dropping the session
/// stops the stream, so every exit path of the owner releases the device.
pub struct CameraSession<'a, C: NativeCamera + ?Sized> {
    camera: &'a C,
    request: StreamRequest,
    stream: Option<Box<dyn CameraStream>>,
}

impl<'a, C: NativeCamera + ?Sized> CameraSession<'a, C> {
    /// Create an idle session. Nothing is acquired until [`start`](Self::start).
    pub fn new(camera: &'a C, request: StreamRequest) -> Self {
        Self {
            camera,
            request,
            stream: None,
        }
    }

    /// Acquire the camera. Any stream already held is released first.
    ///
    /// On failure the session stays stopped; callers surface the error and
    /// keep whatever pages they already captured.
    #[instrument(skip(self), fields(facing = ?self.request.facing))]
    pub fn start(&mut self) -> Result<()> {
        self.stop();

        match self.camera.open_stream(&self.request) {
            Ok(stream) => {
                let (width, height) = stream.frame_size();
                info!(width, height, "camera stream started");
                self.stream = Some(stream);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "camera acquisition failed");
                Err(match err {
                    ScanbookError::PlatformUnavailable => {
                        ScanbookError::CameraUnavailable("platform has no camera".into())
                    }
                    other => other,
                })
            }
        }
    }

    /// Whether a stream is currently held.
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Take a still from the running stream.
    pub fn capture(&mut self) -> Result<Frame> {
        let stream = self.stream.as_mut().ok_or(ScanbookError::CameraStopped)?;
        let frame = stream.grab_frame()?;
        debug!(width = frame.width, height = frame.height, "frame captured");
        Ok(frame)
    }

    /// Release the device. Safe to call when already stopped.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            info!("camera stream released");
        }
    }
}

impl<C: NativeCamera + ?Sized> Drop for CameraSession<'_, C> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Counts how many streams are held at once.
    struct FakeCamera {
        live: Rc<Cell<u32>>,
        opened: Rc<Cell<u32>>,
        deny: bool,
    }

    struct FakeStream {
        live: Rc<Cell<u32>>,
        released: bool,
    }

    impl NativeCamera for FakeCamera {
        fn open_stream(&self, _request: &StreamRequest) -> Result<Box<dyn CameraStream>> {
            if self.deny {
                return Err(ScanbookError::CameraUnavailable("permission denied".into()));
            }
            self.live.set(self.live.get() + 1);
            self.opened.set(self.opened.get() + 1);
            Ok(Box::new(FakeStream {
                live: Rc::clone(&self.live),
                released: false,
            }))
        }
    }

    impl CameraStream for FakeStream {
        fn frame_size(&self) -> (u32, u32) {
            (4, 2)
        }

        fn grab_frame(&mut self) -> Result<Frame> {
            Ok(Frame {
                width: 4,
                height: 2,
                rgb: vec![200; 4 * 2 * 3],
            })
        }

        fn release(&mut self) {
            if !self.released {
                self.released = true;
                self.live.set(self.live.get() - 1);
            }
        }
    }

    fn camera(deny: bool) -> FakeCamera {
        FakeCamera {
            live: Rc::new(Cell::new(0)),
            opened: Rc::new(Cell::new(0)),
            deny,
        }
    }

    #[test]
    fn drop_releases_the_stream() {
        let cam = camera(false);
        {
            let mut session = CameraSession::new(&cam, StreamRequest::default());
            session.start().expect("start");
            assert_eq!(cam.live.get(), 1);
        }
        assert_eq!(cam.live.get(), 0);
    }

    #[test]
    fn restart_releases_previous_stream_first() {
        let cam = camera(false);
        let mut session = CameraSession::new(&cam, StreamRequest::default());
        session.start().expect("first start");
        session.start().expect("second start");
        assert_eq!(cam.opened.get(), 2);
        assert_eq!(cam.live.get(), 1);
        session.stop();
        session.stop();
        assert_eq!(cam.live.get(), 0);
    }

    #[test]
    fn capture_requires_running_stream() {
        let cam = camera(false);
        let mut session = CameraSession::new(&cam, StreamRequest::default());
        assert!(matches!(session.capture(), Err(ScanbookError::CameraStopped)));

        session.start().expect("start");
        let frame = session.capture().expect("capture");
        assert_eq!(frame.rgb.len(), 24);
    }

    #[test]
    fn denied_permission_leaves_session_stopped() {
        let cam = camera(true);
        let mut session = CameraSession::new(&cam, StreamRequest::default());
        let err = session.start().expect_err("should fail");
        assert!(matches!(err, ScanbookError::CameraUnavailable(_)));
        assert!(!session.is_active());
        assert_eq!(cam.live.get(), 0);
    }
}
