//! Pan/zoom view state.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_SCALE: f64 = 0.1;
/// Maximum allowed zoom level.
pub const MAX_SCALE: f64 = 10.0;

/// Pan offset and zoom scale of the viewport.
///
/// A document point `p` appears on screen at `p * scale + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Document to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset()) * Affine::scale(self.scale)
    }

    /// Screen to document transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset())
    }

    pub fn screen_to_document(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn document_to_screen(&self, document_point: Point) -> Point {
        self.transform() * document_point
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Zoom by `factor`, keeping `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        let document_point = self.screen_to_document(screen_point);
        self.scale = new_scale;

        // Shift so document_point lands back under screen_point
        let moved = self.document_to_screen(document_point);
        self.pan(screen_point - moved);
    }

    /// Center `bounds` in a viewport of `viewport` size, scaled to fit.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            *self = Self::default();
            return;
        }
        let available = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        self.scale = (available.width / bounds.width())
            .min(available.height / bounds.height())
            .clamp(MIN_SCALE, MAX_SCALE);

        let center = bounds.center();
        self.x = viewport.width / 2.0 - center.x * self.scale;
        self.y = viewport.height / 2.0 - center.y * self.scale;
    }

    /// Clamp a restored scale back into range.
    pub fn sanitized(self) -> Self {
        if self.scale.is_finite() && self.scale > 0.0 {
            Self {
                scale: self.scale.clamp(MIN_SCALE, MAX_SCALE),
                ..self
            }
        } else {
            Self {
                scale: 1.0,
                ..self
            }
        }
    }
}
