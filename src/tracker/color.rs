//! Colour descriptors and nearest-palette classification.

use serde::{Deserialize, Serialize};

/// Squared-distance cutoff used when classifying a point's mean colour.
pub const DEFAULT_COLOR_TOLERANCE: f64 = 0.5;

/// A colour in HSV space with every channel normalised to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HsvColor {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl HsvColor {
    #[inline]
    pub fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 3] {
        [self.h, self.s, self.v]
    }

    /// Plain Euclidean distance, squared, treating the three channels as a cube.
    #[inline]
    pub fn distance_squared(&self, other: &HsvColor) -> f64 {
        (other.h - self.h).powi(2) + (other.s - self.s).powi(2) + (other.v - self.v).powi(2)
    }

    /// Channel-wise mean of a set of colours. Returns black for an empty set.
    pub fn mean<'a, I>(colors: I) -> HsvColor
    where
        I: IntoIterator<Item = &'a HsvColor>,
    {
        let mut sum = [0.0; 3];
        let mut count = 0usize;
        for c in colors {
            sum[0] += c.h;
            sum[1] += c.s;
            sum[2] += c.v;
            count += 1;
        }
        if count == 0 {
            return HsvColor::default();
        }
        let n = count as f64;
        HsvColor::new(sum[0] / n, sum[1] / n, sum[2] / n)
    }
}

/// Marker colours the classifier knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    Blue,
    Green,
    Yellow,
    Red,
    Pink,
    White,
}

impl NamedColor {
    pub const ALL: [NamedColor; 6] = [
        NamedColor::Blue,
        NamedColor::Green,
        NamedColor::Yellow,
        NamedColor::Red,
        NamedColor::Pink,
        NamedColor::White,
    ];

    /// Reference value of this colour in the palette.
    pub fn reference(&self) -> HsvColor {
        match self {
            NamedColor::Blue => HsvColor::new(1.0, 0.0, 0.0),
            NamedColor::Green => HsvColor::new(0.40, 1.00, 0.30),
            NamedColor::Yellow => HsvColor::new(0.00, 1.00, 0.60),
            NamedColor::Red => HsvColor::new(0.15, 0.30, 0.60),
            NamedColor::Pink => HsvColor::new(1.00, 0.50, 0.60),
            NamedColor::White => HsvColor::new(0.50, 0.10, 0.50),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NamedColor::Blue => "blue",
            NamedColor::Green => "green",
            NamedColor::Yellow => "yellow",
            NamedColor::Red => "red",
            NamedColor::Pink => "pink",
            NamedColor::White => "white",
        }
    }
}

impl std::fmt::Display for NamedColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rank the palette by squared distance to `color`, nearest first.
///
/// With a positive `tolerance`, entries farther than `tolerance` (squared) are
/// dropped, so the result may be empty.
pub fn classify(color: &HsvColor, tolerance: f64) -> Vec<(NamedColor, f64)> {
    let mut ranked: Vec<(NamedColor, f64)> = NamedColor::ALL
        .iter()
        .map(|named| (*named, named.reference().distance_squared(color)))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    if tolerance > 0.0 {
        ranked.retain(|(_, dist)| *dist <= tolerance);
    }
    ranked
}

/// Convert a mean BGR sample (0-255 per channel) to normalised HSV.
///
/// Hue is computed on the colour wheel in radians and then mapped onto `[0, 1)`.
/// Achromatic input (zero maximum or zero range) yields `(0, 0, 0)`.
pub fn bgr_to_hsv(b: f64, g: f64, r: f64) -> HsvColor {
    let (b, g, r) = (b / 255.0, g / 255.0, r / 255.0);

    let min = r.min(g).min(b);
    let max = r.max(g).max(b);
    let range = max - min;

    if max == 0.0 || range == 0.0 {
        return HsvColor::default();
    }

    let sector = if r == max {
        (g - b) / range
    } else if g == max {
        2.0 + (b - r) / range
    } else {
        4.0 + (r - g) / range
    };

    let mut hue = sector * std::f64::consts::FRAC_PI_3;
    if hue < 0.0 {
        hue += std::f64::consts::TAU;
    }

    HsvColor::new(hue / std::f64::consts::TAU, range / max, max)
}
