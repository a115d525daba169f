//! Single tracked point with a sliding window of matched detections.

use std::collections::VecDeque;

use nalgebra::{Point2, Vector2};

use crate::tracker::color::{DEFAULT_COLOR_TOLERANCE, HsvColor, NamedColor, classify};
use crate::tracker::geometry::{SearchRegion, midpoint, squared_distance};
use crate::tracker::matching::Detection;
use crate::tracker::motion_model::MotionModel;
use crate::tracker::point_state::PointState;

/// Identifier handed out by the tracker's allocator.
pub type PointId = u64;

/// A persistent identity matched across frames.
///
/// All derived statistics (mean position, mean velocity, circularity, colour and
/// the search region) are recomputed from the window on every matched update.
#[derive(Debug, Clone)]
pub struct TrackedPoint {
    /// Unique point identifier
    pub id: PointId,
    history: VecDeque<Detection>,
    health: i32,
    missed_last: bool,
    mean_position: Point2<f64>,
    mean_velocity: Vector2<f64>,
    mean_circularity: f64,
    mean_color: HsvColor,
    search_region: Option<SearchRegion>,
    model: MotionModel,
}

impl TrackedPoint {
    /// Create a new point from its first detection. Health starts at 0 and
    /// receives the usual +1 from that first update.
    pub fn new(id: PointId, detection: Detection, model: MotionModel) -> Self {
        let mut point = Self {
            id,
            history: VecDeque::with_capacity(model.window_size()),
            health: 0,
            missed_last: false,
            mean_position: detection.position(),
            mean_velocity: Vector2::zeros(),
            mean_circularity: 0.0,
            mean_color: HsvColor::default(),
            search_region: None,
            model,
        };
        point.update(detection);
        point
    }

    /// Record a matched detection.
    pub fn update(&mut self, detection: Detection) {
        self.history.push_back(detection);
        while self.history.len() > self.model.window_size() {
            self.history.pop_front();
        }
        self.recompute();

        self.health = (self.health + 1).min(self.model.max_health());
        self.missed_last = false;
    }

    /// Record a frame without a match.
    pub fn update_empty(&mut self) {
        self.health = self.health.saturating_sub(self.model.miss_penalty());
        self.missed_last = true;
    }

    fn recompute(&mut self) {
        let n = self.history.len();
        let inv = 1.0 / n as f64;

        let mut pos_sum = Vector2::<f64>::zeros();
        let mut circ_sum = 0.0;
        for det in &self.history {
            pos_sum += det.position().coords;
            circ_sum += det.shape_quality;
        }
        self.mean_position = Point2::from(pos_sum * inv);
        self.mean_circularity = circ_sum * inv;
        self.mean_color = HsvColor::mean(self.history.iter().map(|d| &d.color));

        self.mean_velocity = if n >= 2 {
            let delta_sum = self
                .history
                .iter()
                .zip(self.history.iter().skip(1))
                .fold(Vector2::<f64>::zeros(), |acc, (a, b)| acc + (b.position() - a.position()));
            delta_sum / (n - 1) as f64
        } else {
            Vector2::zeros()
        };
        if !self.mean_velocity.iter().all(|c| c.is_finite()) {
            self.mean_velocity = Vector2::zeros();
        }

        self.search_region = if n >= 2 {
            self.model.search_region(&self.mean_position, &self.mean_velocity)
        } else {
            None
        };
    }

    pub fn is_expired(&self) -> bool {
        self.health < -self.model.timeout()
    }

    /// Position expected at `target_frame`, or one frame ahead when `None`.
    ///
    /// Without at least two matches there is no velocity, so the current mean
    /// position is returned unchanged.
    pub fn predicted_position(&self, target_frame: Option<u64>) -> Point2<f64> {
        let Some(last) = self.history.back() else {
            return self.mean_position;
        };
        if self.history.len() < 2 {
            return self.mean_position;
        }

        let frames = match target_frame {
            Some(frame) => frame as f64 - last.frame_index as f64,
            None => 1.0,
        };
        self.model.extrapolate(&last.position(), &self.mean_velocity, frames)
    }

    /// Search wedge for the next match. `None` means unbounded.
    pub fn search_region(&self) -> Option<&SearchRegion> {
        self.search_region.as_ref()
    }

    pub fn contains_predicted(&self, detection: &Detection) -> bool {
        match &self.search_region {
            Some(region) => region.contains(&detection.position()),
            None => true,
        }
    }

    /// Squared distance between a detection and where this point is predicted
    /// to be in the detection's frame.
    pub fn predicted_distance_squared(&self, detection: &Detection) -> f64 {
        let predicted = self.predicted_position(Some(detection.frame_index));
        squared_distance(&predicted, &detection.position())
    }

    /// Blend of temporal confidence (75%) and shape circularity (25%), in [0, 1].
    pub fn quality(&self) -> f64 {
        let max_health = self.model.max_health() as f64;
        let health = (self.health as f64).clamp(0.0, max_health);
        0.75 * (health / max_health) + 0.25 * self.mean_circularity
    }

    pub fn squared_distance_to(&self, other: &TrackedPoint) -> f64 {
        squared_distance(&self.mean_position, &other.mean_position)
    }

    pub fn midpoint_with(&self, other: &TrackedPoint) -> Point2<f64> {
        midpoint(&self.mean_position, &other.mean_position)
    }

    pub fn state(&self) -> PointState {
        if self.is_expired() {
            PointState::Expired
        } else if self.missed_last {
            PointState::Missing
        } else if self.history.len() < 2 {
            PointState::Newborn
        } else {
            PointState::Tracked
        }
    }

    /// Closest palette colour to the mean colour, if any lies within tolerance.
    pub fn color(&self) -> Option<NamedColor> {
        classify(&self.mean_color, DEFAULT_COLOR_TOLERANCE)
            .first()
            .map(|(named, _)| *named)
    }

    #[inline]
    pub fn position(&self) -> Point2<f64> {
        self.mean_position
    }

    #[inline]
    pub fn velocity(&self) -> Vector2<f64> {
        self.mean_velocity
    }

    #[inline]
    pub fn health(&self) -> i32 {
        self.health
    }

    #[inline]
    pub fn mean_circularity(&self) -> f64 {
        self.mean_circularity
    }

    #[inline]
    pub fn mean_color(&self) -> HsvColor {
        self.mean_color
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &Detection> {
        self.history.iter()
    }

    pub fn last_detection(&self) -> Option<&Detection> {
        self.history.back()
    }

    pub fn last_matched_frame(&self) -> u64 {
        self.history.back().map_or(0, |d| d.frame_index)
    }
}
