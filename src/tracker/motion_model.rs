//! Constant-velocity motion model: prediction and search-region shaping.

use nalgebra::{Point2, Rotation2, Vector2};

use crate::tracker::geometry::SearchRegion;
use crate::tracker::point_tracker::TrackerConfig;

#[derive(Debug, Clone, Copy)]
pub struct MotionModel {
    window_size: usize,
    max_health: i32,
    miss_penalty: i32,
    timeout: i32,
    bounds_multiplier: f64,
    rotation_ccw: Rotation2<f64>,
    rotation_cw: Rotation2<f64>,
}

impl Default for MotionModel {
    fn default() -> Self {
        Self::new(&TrackerConfig::default())
    }
}

impl MotionModel {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            window_size: config.window_size.max(1),
            max_health: config.max_health,
            miss_penalty: config.miss_penalty,
            timeout: config.timeout,
            bounds_multiplier: config.bounds_multiplier,
            rotation_ccw: Rotation2::new(config.rotation_theta),
            rotation_cw: Rotation2::new(-config.rotation_theta),
        }
    }

    #[inline]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    #[inline]
    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    #[inline]
    pub fn miss_penalty(&self) -> i32 {
        self.miss_penalty
    }

    #[inline]
    pub fn timeout(&self) -> i32 {
        self.timeout
    }

    /// Linear extrapolation `last + velocity * frames`.
    #[inline]
    pub fn extrapolate(&self, last: &Point2<f64>, velocity: &Vector2<f64>, frames: f64) -> Point2<f64> {
        last + velocity * frames
    }

    /// Build the wedge in which the next match is expected.
    ///
    /// The apex is pulled back `bounds_multiplier` units against the direction of
    /// travel so small reversals still match. The base vertices are the travel
    /// direction rotated by the configured angle either way and pushed forward by
    /// `bounds_multiplier * speed`, so the wedge widens with speed.
    ///
    /// Returns `None` when the velocity has no usable direction (zero or non-finite).
    pub fn search_region(&self, position: &Point2<f64>, velocity: &Vector2<f64>) -> Option<SearchRegion> {
        let speed = velocity.norm();
        if !speed.is_finite() || speed <= f64::EPSILON {
            return None;
        }
        let direction = velocity / speed;

        let apex = position - direction * self.bounds_multiplier;
        let reach = self.bounds_multiplier * speed;
        let ccw = position + (self.rotation_ccw * direction) * reach;
        let cw = position + (self.rotation_cw * direction) * reach;

        Some(SearchRegion::new(apex, ccw, cw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_search_region_shape() {
        let model = MotionModel::default();
        let region = model
            .search_region(&Point2::new(100.0, 100.0), &Vector2::new(10.0, 0.0))
            .unwrap();

        assert_relative_eq!(region.apex(), Point2::new(80.0, 100.0), epsilon = 1e-9);

        let half = std::f64::consts::FRAC_PI_6;
        let ccw = region.vertices[1];
        let cw = region.vertices[2];
        assert_relative_eq!(ccw.x, 100.0 + 200.0 * half.cos(), epsilon = 1e-9);
        assert_relative_eq!(ccw.y, 100.0 + 200.0 * half.sin(), epsilon = 1e-9);
        assert_relative_eq!(cw.y, 100.0 - 200.0 * half.sin(), epsilon = 1e-9);
    }

    #[test]
    fn test_search_region_zero_velocity() {
        let model = MotionModel::default();
        assert!(model.search_region(&Point2::new(5.0, 5.0), &Vector2::zeros()).is_none());
    }

    #[test]
    fn test_search_region_nan_velocity() {
        let model = MotionModel::default();
        let v = Vector2::new(f64::NAN, 1.0);
        assert!(model.search_region(&Point2::new(5.0, 5.0), &v).is_none());
    }

    #[test]
    fn test_wedge_grows_with_speed() {
        let model = MotionModel::default();
        let p = Point2::new(0.0, 0.0);
        let slow = model.search_region(&p, &Vector2::new(1.0, 0.0)).unwrap();
        let fast = model.search_region(&p, &Vector2::new(8.0, 0.0)).unwrap();
        assert!(fast.area() > slow.area());
    }

    #[test]
    fn test_extrapolate() {
        let model = MotionModel::default();
        let p = model.extrapolate(&Point2::new(110.0, 100.0), &Vector2::new(10.0, 0.0), 2.0);
        assert_eq!(p, Point2::new(130.0, 100.0));
    }
}
