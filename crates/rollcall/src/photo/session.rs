//! The owned camera session.

use std::fmt;

use image::RgbImage;
use tracing::debug;

use super::device::{DeviceError, Facing, VideoStream};

/// An open stream plus the direction it was opened for.
///
/// Dropping the session stops the stream, so every path that discards a
/// session also releases the device.
pub struct CameraSession {
    stream: Box<dyn VideoStream>,
    facing: Facing,
}

impl CameraSession {
    /// Take ownership of an open stream.
    #[must_use]
    pub fn new(stream: Box<dyn VideoStream>, facing: Facing) -> Self {
        Self { stream, facing }
    }

    /// Direction this session was opened for.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Whether the underlying stream is still live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.stream.is_active()
    }

    /// Grab the current frame.
    ///
    /// # Errors
    ///
    /// Returns the device error if no frame can be read.
    pub fn frame(&mut self) -> Result<RgbImage, DeviceError> {
        self.stream.current_frame()
    }

    /// Stop the stream now rather than at drop.
    pub fn close(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.stream.is_active() {
            debug!("Stopping {} camera stream", self.facing);
        }
        self.stream.stop();
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSession")
            .field("facing", &self.facing)
            .field("active", &self.stream.is_active())
            .finish()
    }
}
