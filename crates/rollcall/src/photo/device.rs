//! Camera device abstraction.
//!
//! This module defines the traits a camera backend implements, plus two
//! backends that need no hardware: a still-frame camera that serves an image
//! file as its only frame, and an always-unavailable camera for hosts without
//! one.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors a camera backend can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The user or platform refused camera access.
    #[error("camera permission denied")]
    PermissionDenied,

    /// No camera matches the request.
    #[error("no camera available")]
    NotFound,

    /// The camera is held by someone else.
    #[error("camera busy: {0}")]
    Busy(String),

    /// The stream was stopped or lost.
    #[error("camera stream has ended")]
    StreamEnded,

    /// Backend failure.
    #[error("camera error: {0}")]
    Internal(String),
}

/// Which way the camera points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Toward the user. Previews are shown mirrored.
    #[default]
    Front,
    /// Away from the user.
    Back,
}

impl Facing {
    /// The other direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    /// Whether snapshots from this direction must be flipped horizontally so
    /// they match what the lens saw rather than the mirrored preview.
    #[must_use]
    pub fn is_mirrored(self) -> bool {
        matches!(self, Self::Front)
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => write!(f, "front"),
            Self::Back => write!(f, "back"),
        }
    }
}

/// A request for a video-only stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    /// Requested facing direction.
    pub facing: Facing,
    /// Preferred frame width; backends may deliver another size.
    pub ideal_width: u32,
    /// Preferred frame height; backends may deliver another size.
    pub ideal_height: u32,
}

/// A source of camera streams.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// The name of this device (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Acquire a stream. May wait on a permission prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if permission is refused or no matching camera exists.
    async fn open_stream(
        &self,
        request: StreamRequest,
    ) -> Result<Box<dyn VideoStream>, DeviceError>;
}

/// An open camera stream. Holding one holds the device.
pub trait VideoStream: Send {
    /// Direction of the camera behind this stream.
    fn facing(&self) -> Facing;

    /// The most recent frame at its native resolution, unmirrored.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream has stopped or the frame is unavailable.
    fn current_frame(&mut self) -> Result<RgbImage, DeviceError>;

    /// Stop the stream and release the device. Must be idempotent.
    fn stop(&mut self);

    /// Whether the stream is still delivering frames.
    fn is_active(&self) -> bool;
}

/// A camera whose only frame is an image file.
///
/// Useful for kiosks fed by an external capture tool and for scripted runs.
#[derive(Debug, Clone)]
pub struct StillFrameCamera {
    path: PathBuf,
}

impl StillFrameCamera {
    /// Serve the image at `path` as the camera frame.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the frame image.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CameraDevice for StillFrameCamera {
    fn name(&self) -> &'static str {
        "still-frame"
    }

    async fn open_stream(
        &self,
        request: StreamRequest,
    ) -> Result<Box<dyn VideoStream>, DeviceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            warn!("Still frame {} unreadable: {}", self.path.display(), e);
            DeviceError::NotFound
        })?;
        let frame = image::load_from_memory(&bytes)
            .map_err(|e| DeviceError::Internal(format!("undecodable frame: {e}")))?
            .to_rgb8();
        debug!(
            "Still-frame stream opened ({}x{}, {} facing)",
            frame.width(),
            frame.height(),
            request.facing
        );
        Ok(Box::new(StillFrameStream {
            frame,
            facing: request.facing,
            active: true,
        }))
    }
}

#[derive(Debug)]
struct StillFrameStream {
    frame: RgbImage,
    facing: Facing,
    active: bool,
}

impl VideoStream for StillFrameStream {
    fn facing(&self) -> Facing {
        self.facing
    }

    fn current_frame(&mut self) -> Result<RgbImage, DeviceError> {
        if !self.active {
            return Err(DeviceError::StreamEnded);
        }
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// A camera that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCamera;

#[async_trait]
impl CameraDevice for UnavailableCamera {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn open_stream(
        &self,
        _request: StreamRequest,
    ) -> Result<Box<dyn VideoStream>, DeviceError> {
        Err(DeviceError::NotFound)
    }
}
