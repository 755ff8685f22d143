//! Photo capture from a camera stream or an image file.
//!
//! [`PhotoCapture`] owns at most one [`CameraSession`] and the current photo.
//! Camera acquisition and file reads are async; every action that changes
//! what the widget shows bumps a generation counter, and an async completion
//! that resumes under a newer generation is discarded. A late stream is
//! stopped on arrival and a late file read is dropped.

pub mod device;
pub mod session;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::imageops;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

pub use device::{
    CameraDevice, DeviceError, Facing, StillFrameCamera, StreamRequest, UnavailableCamera,
    VideoStream,
};
pub use session::CameraSession;

use crate::config::PhotoConfig;
use crate::error::{Error, Result};
use crate::media::{EncodedImage, ImageCallback};

/// What the photo widget is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoState {
    /// No photo and no camera.
    Empty,
    /// A stream has been requested and not yet delivered.
    Opening {
        /// Requested direction.
        facing: Facing,
    },
    /// A live preview is running.
    Live {
        /// Direction of the open stream.
        facing: Facing,
    },
    /// A photo is held and no camera is open.
    Captured,
}

/// How an async operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// The result was applied to the widget.
    Applied,
    /// A newer action ran while this one was pending; its result was discarded.
    Superseded,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    image: Option<EncodedImage>,
    session: Option<CameraSession>,
    opening: Option<Facing>,
    facing: Facing,
}

impl Inner {
    /// Start a new action: invalidate pending completions and drop any stream.
    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.opening = None;
        if let Some(session) = self.session.take() {
            session.close();
        }
        self.generation
    }

    fn state(&self) -> PhotoState {
        if let Some(session) = &self.session {
            PhotoState::Live {
                facing: session.facing(),
            }
        } else if let Some(facing) = self.opening {
            PhotoState::Opening { facing }
        } else if self.image.is_some() {
            PhotoState::Captured
        } else {
            PhotoState::Empty
        }
    }
}

/// Clears the pending request if `open_camera` is dropped mid-await and no
/// newer action has taken over.
struct OpeningGuard<'a> {
    inner: &'a Mutex<Inner>,
    generation: u64,
}

impl Drop for OpeningGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if inner.generation == self.generation && inner.opening.is_some() {
            inner.opening = None;
        }
    }
}

/// The photo capture widget.
pub struct PhotoCapture {
    device: Arc<dyn CameraDevice>,
    config: PhotoConfig,
    inner: Mutex<Inner>,
    listener: Mutex<Option<ImageCallback>>,
}

impl PhotoCapture {
    /// Create a widget backed by `device`.
    #[must_use]
    pub fn new(device: Arc<dyn CameraDevice>, config: PhotoConfig) -> Self {
        let inner = Inner {
            facing: config.default_facing,
            ..Inner::default()
        };
        Self {
            device,
            config,
            inner: Mutex::new(inner),
            listener: Mutex::new(None),
        }
    }

    /// Install the callback that receives every new photo or its removal.
    pub fn set_listener(&self, listener: ImageCallback) {
        *self.listener.lock() = Some(listener);
    }

    /// Current widget state.
    #[must_use]
    pub fn state(&self) -> PhotoState {
        self.inner.lock().state()
    }

    /// The photo currently held, if any.
    #[must_use]
    pub fn image(&self) -> Option<EncodedImage> {
        self.inner.lock().image.clone()
    }

    /// Direction of the last camera request.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.inner.lock().facing
    }

    /// Whether a camera stream is currently open.
    #[must_use]
    pub fn has_stream(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    /// Open the camera facing `facing`.
    ///
    /// Any open stream is closed before the request is made. The photo held
    /// before the attempt is kept, so a failed open or a cancel falls back
    /// to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if the device refuses or is missing.
    pub async fn open_camera(&self, facing: Facing) -> Result<Outcome> {
        let generation = {
            let mut inner = self.inner.lock();
            let generation = inner.begin();
            inner.opening = Some(facing);
            inner.facing = facing;
            generation
        };

        debug!("Requesting {} camera from {}", facing, self.device.name());
        let request = StreamRequest {
            facing,
            ideal_width: self.config.ideal_width,
            ideal_height: self.config.ideal_height,
        };
        let pending = OpeningGuard {
            inner: &self.inner,
            generation,
        };
        let result = self.device.open_stream(request).await;
        drop(pending);

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            if let Ok(mut stream) = result {
                stream.stop();
            }
            debug!("Discarding stale {} camera request", facing);
            return Ok(Outcome::Superseded);
        }

        match result {
            Ok(stream) => {
                info!("{} camera live", facing);
                inner.session = Some(CameraSession::new(stream, facing));
                Ok(Outcome::Applied)
            }
            Err(e) => {
                warn!("Camera unavailable: {}", e);
                Err(e.into())
            }
        }
    }

    /// Close the current stream and open the other direction.
    ///
    /// # Errors
    ///
    /// Same as [`open_camera`](Self::open_camera).
    pub async fn switch_facing(&self) -> Result<Outcome> {
        let next = self.facing().opposite();
        self.open_camera(next).await
    }

    /// Snapshot the live stream.
    ///
    /// The frame is read at its native size, mirrored for the front camera,
    /// encoded as JPEG, and emitted. The stream is closed whether or not the
    /// snapshot succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] when no stream is live,
    /// [`Error::NoFrame`] when the stream has nothing to show yet, or an
    /// encoding error.
    pub fn capture(&self) -> Result<EncodedImage> {
        let image = {
            let mut inner = self.inner.lock();
            let Some(mut session) = inner.session.take() else {
                return Err(Error::invalid_state("camera is not live"));
            };
            inner.generation += 1;

            let facing = session.facing();
            let frame = session.frame();
            session.close();

            let frame = match frame {
                Ok(frame) if frame.width() > 0 && frame.height() > 0 => frame,
                Ok(_) | Err(DeviceError::StreamEnded) => return Err(Error::NoFrame),
                Err(e) => return Err(e.into()),
            };
            let frame = if facing.is_mirrored() {
                imageops::flip_horizontal(&frame)
            } else {
                frame
            };

            let image = EncodedImage::encode_jpeg(&frame, self.config.jpeg_quality)?;
            info!(
                "Captured {}x{} photo from {} camera ({} bytes)",
                frame.width(),
                frame.height(),
                facing,
                image.len()
            );
            inner.image = Some(image.clone());
            image
        };
        self.emit(Some(image.clone()));
        Ok(image)
    }

    /// Close the camera without taking a photo.
    ///
    /// Returns whether a stream or pending request was abandoned. The photo
    /// held before the camera was opened is kept.
    pub fn cancel(&self) -> bool {
        let mut inner = self.inner.lock();
        let active = inner.session.is_some() || inner.opening.is_some();
        if active {
            inner.begin();
            debug!("Camera cancelled");
        }
        active
    }

    /// Use the bytes of a local image file as the photo.
    ///
    /// The file is taken verbatim. Any open stream is closed first.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or
    /// [`Error::UnsupportedImage`] if it is not an image.
    pub async fn select_file(&self, path: impl AsRef<Path>) -> Result<Outcome> {
        let path = path.as_ref();
        let generation = self.inner.lock().begin();

        let read = tokio::fs::read(path).await;

        let image = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                debug!("Discarding stale read of {}", path.display());
                return Ok(Outcome::Superseded);
            }
            let image = EncodedImage::from_file_bytes(read?)?;
            info!(
                "Selected {} ({}, {} bytes)",
                path.display(),
                image.mime_type(),
                image.len()
            );
            inner.image = Some(image.clone());
            image
        };
        self.emit(Some(image));
        Ok(Outcome::Applied)
    }

    /// Discard the photo, close any stream, and emit an absence.
    pub fn clear(&self) {
        {
            let mut inner = self.inner.lock();
            inner.begin();
            inner.image = None;
        }
        debug!("Photo cleared");
        self.emit(None);
    }

    fn emit(&self, image: Option<EncodedImage>) {
        if let Some(listener) = self.listener.lock().as_mut() {
            listener(image);
        }
    }
}

impl Drop for PhotoCapture {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        inner.generation += 1;
        if let Some(session) = inner.session.take() {
            session.close();
        }
    }
}

impl fmt::Debug for PhotoCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoCapture")
            .field("device", &self.device.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
