//! Freehand signature capture.
//!
//! A [`SignaturePad`] turns pointer-drag gestures into ink on a fixed-size
//! raster. Each finished gesture re-emits the whole accumulated raster as a
//! PNG; clearing erases it and emits an explicit absence.
//!
//! ```text
//! Idle --down--> Drawing --move--> Drawing (segment rendered immediately)
//!                Drawing --up (anywhere)--> Idle, emit Some(png)
//! Idle --clear--> Idle, emit None
//! ```

pub mod raster;

use std::fmt;

use image::RgbaImage;
use tracing::{debug, trace};

use crate::config::SignatureConfig;
use crate::error::Result;
use crate::media::{EncodedImage, ImageCallback};

pub use raster::{ClientPoint, StrokePoint, StrokeStyle, SurfaceGeometry};

/// A pointer event delivered to the pad.
///
/// `Up` carries no position: the gesture ends wherever the pointer is
/// released, including outside the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed over the surface.
    Down(ClientPoint),
    /// Pointer moved.
    Move(ClientPoint),
    /// Pointer released anywhere.
    Up,
}

/// Drawing state of the pad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadState {
    /// No gesture in progress.
    Idle,
    /// A gesture is in progress; `last` is the current path end.
    Drawing {
        /// Raster position the next segment starts from.
        last: StrokePoint,
    },
}

/// Signature capture surface.
pub struct SignaturePad {
    raster: RgbaImage,
    style: StrokeStyle,
    geometry: SurfaceGeometry,
    state: PadState,
    gestures: usize,
    listener: Option<ImageCallback>,
}

impl SignaturePad {
    /// Create a blank pad with the given raster size and ink.
    #[must_use]
    pub fn new(width: u32, height: u32, style: StrokeStyle) -> Self {
        Self {
            raster: RgbaImage::new(width, height),
            style,
            geometry: SurfaceGeometry::unscaled(width, height),
            state: PadState::Idle,
            gestures: 0,
            listener: None,
        }
    }

    /// Create a pad from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured stroke color or width is invalid.
    pub fn from_config(config: &SignatureConfig) -> Result<Self> {
        let style = StrokeStyle::from_hex(&config.stroke_color, config.stroke_width)?;
        Ok(Self::new(config.width, config.height, style))
    }

    /// Register the callback that receives every emitted signature.
    pub fn set_listener(&mut self, listener: ImageCallback) {
        self.listener = Some(listener);
    }

    /// Update where the surface is laid out on screen.
    pub fn set_geometry(&mut self, geometry: SurfaceGeometry) {
        self.geometry = geometry;
    }

    /// Current drawing state.
    #[must_use]
    pub fn state(&self) -> PadState {
        self.state
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, PadState::Drawing { .. })
    }

    /// Number of gestures completed since the last clear.
    #[must_use]
    pub fn gesture_count(&self) -> usize {
        self.gestures
    }

    /// Whether no ink is on the raster.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.raster.pixels().all(|p| p[3] == 0)
    }

    /// The raw raster.
    #[must_use]
    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// Dispatch a pointer event.
    ///
    /// Returns the emitted image when the event ends a gesture.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding the finished raster fails.
    pub fn handle(&mut self, event: PointerEvent) -> Result<Option<EncodedImage>> {
        match event {
            PointerEvent::Down(point) => {
                self.pointer_down(point);
                Ok(None)
            }
            PointerEvent::Move(point) => {
                self.pointer_move(point);
                Ok(None)
            }
            PointerEvent::Up => self.pointer_up(),
        }
    }

    /// Begin a new path at `point`.
    pub fn pointer_down(&mut self, point: ClientPoint) {
        let start = self.map(point);
        trace!(x = start.x, y = start.y, "Signature gesture started");
        self.state = PadState::Drawing { last: start };
    }

    /// Extend the current path to `point`, rendering the segment now.
    ///
    /// Ignored when no gesture is in progress.
    pub fn pointer_move(&mut self, point: ClientPoint) {
        let PadState::Drawing { last } = self.state else {
            return;
        };
        let next = self.map(point);
        raster::draw_segment(&mut self.raster, last, next, &self.style);
        self.state = PadState::Drawing { last: next };
    }

    /// End the gesture and emit the whole raster.
    ///
    /// Returns `Ok(None)` and emits nothing when no gesture was in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails; the gesture still ends.
    pub fn pointer_up(&mut self) -> Result<Option<EncodedImage>> {
        if !self.is_drawing() {
            return Ok(None);
        }
        self.state = PadState::Idle;
        self.gestures += 1;

        let image = EncodedImage::encode_png(&self.raster)?;
        debug!(
            gestures = self.gestures,
            bytes = image.len(),
            "Signature gesture committed"
        );
        self.emit(Some(image.clone()));
        Ok(Some(image))
    }

    /// Trace one complete gesture through `points`.
    ///
    /// Returns the emitted image, or `None` for an empty point list.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn trace(&mut self, points: &[ClientPoint]) -> Result<Option<EncodedImage>> {
        let Some((first, rest)) = points.split_first() else {
            return Ok(None);
        };
        self.pointer_down(*first);
        for point in rest {
            self.pointer_move(*point);
        }
        self.pointer_up()
    }

    /// Erase all ink and emit "no signature".
    pub fn clear(&mut self) {
        for pixel in self.raster.pixels_mut() {
            *pixel = image::Rgba([0, 0, 0, 0]);
        }
        self.state = PadState::Idle;
        self.gestures = 0;
        debug!("Signature cleared");
        self.emit(None);
    }

    /// Encode the current raster without ending or starting anything.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn snapshot(&self) -> Result<Option<EncodedImage>> {
        if self.is_blank() {
            return Ok(None);
        }
        EncodedImage::encode_png(&self.raster).map(Some)
    }

    fn map(&self, point: ClientPoint) -> StrokePoint {
        self.geometry
            .to_raster(point, self.raster.width(), self.raster.height())
    }

    fn emit(&mut self, image: Option<EncodedImage>) {
        if let Some(listener) = self.listener.as_mut() {
            listener(image);
        }
    }
}

impl Default for SignaturePad {
    fn default() -> Self {
        Self::new(400, 128, StrokeStyle::default())
    }
}

impl fmt::Debug for SignaturePad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignaturePad")
            .field("width", &self.raster.width())
            .field("height", &self.raster.height())
            .field("style", &self.style)
            .field("geometry", &self.geometry)
            .field("state", &self.state)
            .field("gestures", &self.gestures)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Emissions = Arc<Mutex<Vec<Option<EncodedImage>>>>;

    fn recording_pad() -> (SignaturePad, Emissions) {
        let emissions: Emissions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&emissions);
        let mut pad = SignaturePad::default();
        pad.set_listener(Box::new(move |image| sink.lock().unwrap().push(image)));
        (pad, emissions)
    }

    fn alpha_at(image: &EncodedImage, x: u32, y: u32) -> u8 {
        image.decode().unwrap().to_rgba8().get_pixel(x, y)[3]
    }

    fn p(x: f32, y: f32) -> ClientPoint {
        ClientPoint::new(x, y)
    }

    #[test]
    fn test_gesture_emits_png() {
        let (mut pad, emissions) = recording_pad();

        pad.pointer_down(p(10.0, 10.0));
        pad.pointer_move(p(30.0, 20.0));
        pad.pointer_move(p(60.0, 40.0));
        let image = pad.pointer_up().unwrap().expect("gesture should emit");

        assert_eq!(image.mime_type(), "image/png");
        assert!(!image.is_empty());
        let emitted = emissions.lock().unwrap();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].as_ref(), Some(&image));
    }

    #[test]
    fn test_strokes_render_during_move() {
        let mut pad = SignaturePad::default();
        pad.pointer_down(p(10.0, 10.0));
        pad.pointer_move(p(50.0, 10.0));

        assert!(pad.is_drawing());
        assert_eq!(pad.raster().get_pixel(30, 10)[3], 255);
    }

    #[test]
    fn test_up_after_clear_without_gesture_emits_nothing() {
        let (mut pad, emissions) = recording_pad();
        pad.clear();
        assert!(pad.pointer_up().unwrap().is_none());

        let emitted = emissions.lock().unwrap();
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0].is_none());
    }

    #[test]
    fn test_move_while_idle_is_ignored() {
        let mut pad = SignaturePad::default();
        pad.pointer_move(p(20.0, 20.0));
        pad.pointer_move(p(80.0, 80.0));
        assert!(pad.is_blank());
        assert_eq!(pad.state(), PadState::Idle);
    }

    #[test]
    fn test_gestures_accumulate() {
        let (mut pad, emissions) = recording_pad();

        pad.trace(&[p(10.0, 20.0), p(60.0, 20.0)]).unwrap();
        pad.trace(&[p(200.0, 100.0), p(260.0, 100.0)]).unwrap();

        let emitted = emissions.lock().unwrap();
        assert_eq!(emitted.len(), 2);
        let latest = emitted[1].as_ref().unwrap();
        assert_eq!(alpha_at(latest, 30, 20), 255);
        assert_eq!(alpha_at(latest, 230, 100), 255);
        assert_eq!(pad.gesture_count(), 2);
    }

    #[test]
    fn test_release_outside_surface_commits() {
        let (mut pad, emissions) = recording_pad();
        pad.set_geometry(SurfaceGeometry {
            left: 100.0,
            top: 200.0,
            width: 400.0,
            height: 128.0,
        });

        pad.handle(PointerEvent::Down(p(120.0, 220.0))).unwrap();
        pad.handle(PointerEvent::Move(p(300.0, 260.0))).unwrap();
        // Dragged well past the right edge before release.
        pad.handle(PointerEvent::Move(p(900.0, 260.0))).unwrap();
        let committed = pad.handle(PointerEvent::Up).unwrap();

        assert!(committed.is_some());
        assert_eq!(pad.state(), PadState::Idle);
        assert_eq!(emissions.lock().unwrap().len(), 1);
        assert_eq!(pad.raster().get_pixel(399, 60)[3], 255);
    }

    #[test]
    fn test_clear_then_single_stroke() {
        let (mut pad, emissions) = recording_pad();
        pad.trace(&[p(300.0, 100.0), p(380.0, 110.0)]).unwrap();

        pad.clear();
        emissions.lock().unwrap().clear();

        pad.pointer_down(p(10.0, 10.0));
        pad.pointer_move(p(50.0, 50.0));
        pad.pointer_up().unwrap();

        let emitted = emissions.lock().unwrap();
        assert_eq!(emitted.len(), 1);
        let image = emitted[0].as_ref().unwrap();
        assert_eq!(alpha_at(image, 30, 30), 255);
        // The stroke drawn before the clear is gone.
        assert_eq!(alpha_at(image, 340, 105), 0);
    }

    #[test]
    fn test_scaled_layout_maps_coordinates() {
        let mut pad = SignaturePad::default();
        // Displayed at half size.
        pad.set_geometry(SurfaceGeometry {
            left: 0.0,
            top: 0.0,
            width: 200.0,
            height: 64.0,
        });
        pad.trace(&[p(10.0, 10.0), p(40.0, 10.0)]).unwrap();

        assert_eq!(pad.raster().get_pixel(50, 20)[3], 255);
        assert_eq!(pad.raster().get_pixel(25, 10)[3], 0);
    }

    #[test]
    fn test_tap_without_move_still_emits() {
        let (mut pad, emissions) = recording_pad();
        pad.pointer_down(p(15.0, 15.0));
        assert!(pad.pointer_up().unwrap().is_some());
        assert_eq!(emissions.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_trace_empty_points() {
        let (mut pad, emissions) = recording_pad();
        assert!(pad.trace(&[]).unwrap().is_none());
        assert!(emissions.lock().unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_blank_is_none() {
        let mut pad = SignaturePad::default();
        assert!(pad.snapshot().unwrap().is_none());

        pad.trace(&[p(5.0, 5.0), p(25.0, 25.0)]).unwrap();
        assert!(pad.snapshot().unwrap().is_some());
    }

    #[test]
    fn test_from_config() {
        let config = SignatureConfig {
            width: 200,
            height: 80,
            stroke_color: "#000000".to_string(),
            stroke_width: 3.0,
        };
        let pad = SignaturePad::from_config(&config).unwrap();
        assert_eq!(pad.raster().dimensions(), (200, 80));
    }

    #[test]
    fn test_from_config_invalid_color() {
        let config = SignatureConfig {
            stroke_color: "blue".to_string(),
            ..SignatureConfig::default()
        };
        assert!(SignaturePad::from_config(&config).is_err());
    }
}
