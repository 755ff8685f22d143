//! Stroke geometry and rasterization for the signature surface.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A point in page (client) coordinates, before surface mapping.
///
/// Deserializes from either `{"x": .., "y": ..}` or `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientPoint {
    /// Horizontal page position.
    pub x: f32,
    /// Vertical page position.
    pub y: f32,
}

impl ClientPoint {
    /// Create a client point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A point in surface-local raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrokePoint {
    /// Raster column.
    pub x: f32,
    /// Raster row.
    pub y: f32,
}

/// Where the drawing surface sits on screen and how large it is displayed.
///
/// The raster keeps its own pixel size; layout may stretch or shrink the
/// displayed element, so client points are scaled back into raster space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    /// Client x of the surface's left edge.
    pub left: f32,
    /// Client y of the surface's top edge.
    pub top: f32,
    /// Displayed width in client units.
    pub width: f32,
    /// Displayed height in client units.
    pub height: f32,
}

impl SurfaceGeometry {
    /// Geometry of a surface displayed at its raster size at the origin.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn unscaled(raster_width: u32, raster_height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: raster_width as f32,
            height: raster_height as f32,
        }
    }

    /// Map a client point into raster coordinates.
    ///
    /// Points outside the surface map outside the raster; the rasterizer
    /// clips them.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_raster(
        &self,
        point: ClientPoint,
        raster_width: u32,
        raster_height: u32,
    ) -> StrokePoint {
        let scale_x = if self.width > 0.0 {
            raster_width as f32 / self.width
        } else {
            1.0
        };
        let scale_y = if self.height > 0.0 {
            raster_height as f32 / self.height
        } else {
            1.0
        };
        StrokePoint {
            x: (point.x - self.left) * scale_x,
            y: (point.y - self.top) * scale_y,
        }
    }
}

/// Ink used for every stroke. Caps and joins are always round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Ink color.
    pub color: Rgba<u8>,
    /// Line width in raster pixels.
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Rgba([0x1e, 0x3a, 0x8a, 0xff]),
            width: 2.0,
        }
    }
}

impl StrokeStyle {
    /// Build a style from a `#rrggbb` color.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a malformed color or a
    /// non-positive width.
    pub fn from_hex(color: &str, width: f32) -> Result<Self> {
        if !(width > 0.0 && width.is_finite()) {
            return Err(Error::ConfigValidation {
                message: format!("stroke width must be positive, got {width}"),
            });
        }
        Ok(Self {
            color: parse_hex_color(color)?,
            width,
        })
    }
}

/// Parse a `#rrggbb` color into an opaque pixel.
///
/// # Errors
///
/// Returns a configuration error if the string is not six hex digits
/// after the `#`.
pub fn parse_hex_color(color: &str) -> Result<Rgba<u8>> {
    let invalid = || Error::ConfigValidation {
        message: format!("invalid stroke color: {color} (expected #rrggbb)"),
    };
    let hex = color.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 0xff]))
}

/// Render one line segment onto the raster.
///
/// Each pixel's coverage is its distance to the segment against half the
/// stroke width, which yields round caps and joins when consecutive segments
/// share endpoints. Overlapping ink keeps the strongest alpha so repeated
/// passes do not darken.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn draw_segment(
    raster: &mut RgbaImage,
    from: StrokePoint,
    to: StrokePoint,
    style: &StrokeStyle,
) {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let half = style.width / 2.0;
    let reach = half + 1.0;
    let min_x = from.x.min(to.x) - reach;
    let max_x = from.x.max(to.x) + reach;
    let min_y = from.y.min(to.y) - reach;
    let max_y = from.y.max(to.y) + reach;

    let last_col = (width - 1) as f32;
    let last_row = (height - 1) as f32;
    if max_x < 0.0 || max_y < 0.0 || min_x > last_col || min_y > last_row {
        return;
    }

    let x0 = min_x.floor().max(0.0) as u32;
    let x1 = max_x.ceil().min(last_col) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let y1 = max_y.ceil().min(last_row) as u32;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let center = StrokePoint {
                x: x as f32 + 0.5,
                y: y as f32 + 0.5,
            };
            let coverage = (half + 0.5 - distance_to_segment(center, from, to)).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let alpha = (coverage * f32::from(style.color[3])).round() as u8;
            let pixel = raster.get_pixel_mut(x, y);
            if alpha > pixel[3] {
                *pixel = Rgba([style.color[0], style.color[1], style.color[2], alpha]);
            }
        }
    }
}

fn distance_to_segment(p: StrokePoint, a: StrokePoint, b: StrokePoint) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq <= f32::EPSILON {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let nearest_x = a.x + dx * t;
    let nearest_y = a.y + dy * t;
    ((p.x - nearest_x).powi(2) + (p.y - nearest_y).powi(2)).sqrt()
}
