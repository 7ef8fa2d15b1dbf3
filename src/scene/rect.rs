//! Axis-aligned geometry for document nodes.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in XYWH form (top-left corner plus size).
///
/// Canvas coordinates are continuous. Like the rest of the document model
/// this type does not reject negative or non-finite values; consumers that
/// need pixel addressing call [`Rect::rounded`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle of the given size anchored at the origin.
    #[inline]
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Returns this rectangle translated into the space whose origin is
    /// `origin`'s top-left corner.
    #[inline]
    pub fn relative_to(&self, origin: &Rect) -> Rect {
        Rect::new(self.x - origin.x, self.y - origin.y, self.width, self.height)
    }

    /// Rounds every component to the nearest integer.
    #[inline]
    pub fn rounded(&self) -> PixelRect {
        PixelRect {
            x: self.x.round() as i64,
            y: self.y.round() as i64,
            width: self.width.round() as i64,
            height: self.height.round() as i64,
        }
    }

    /// Returns true if all components are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// An integer rectangle, used wherever regions are handed to pixel code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}
