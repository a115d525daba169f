//! Builder for creating Detection objects from various input formats.

use crate::tracker::{Detection, HsvColor, bgr_to_hsv};

/// Builder for creating `Detection` objects from various input formats.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    frame_index: u64,
    x: f64,
    y: f64,
    shape_quality: f64,
    color: HsvColor,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame the detection belongs to.
    pub fn frame(mut self, frame_index: u64) -> Self {
        self.frame_index = frame_index;
        self
    }

    /// Set the centre position.
    pub fn center(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the centre from an enclosing box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        self.x = (x1 + x2) / 2.0;
        self.y = (y1 + y2) / 2.0;
        self
    }

    /// Set circularity directly, clamped to [0, 1].
    pub fn circularity(mut self, circularity: f64) -> Self {
        self.shape_quality = circularity.clamp(0.0, 1.0);
        self
    }

    /// Derive circularity `4 * pi * area / perimeter^2` from contour measurements.
    ///
    /// A degenerate contour (zero perimeter) gets circularity 0.
    pub fn contour(self, area: f64, perimeter: f64) -> Self {
        let circularity = if perimeter > 0.0 {
            4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
        } else {
            0.0
        };
        self.circularity(circularity)
    }

    /// Set the colour as normalised HSV.
    pub fn hsv(mut self, h: f64, s: f64, v: f64) -> Self {
        self.color = HsvColor::new(h, s, v);
        self
    }

    /// Set the colour from a mean BGR sample (0-255 per channel).
    pub fn bgr(mut self, b: f64, g: f64, r: f64) -> Self {
        self.color = bgr_to_hsv(b, g, r);
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        Detection::new(self.frame_index, self.x, self.y, self.shape_quality, self.color)
    }
}
