//! Frame-by-frame correspondence between live points and new detections.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::motion_model::MotionModel;
use crate::tracker::tracked_point::{PointId, TrackedPoint};

/// Configuration for the PointTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Number of recent detections kept per point
    pub window_size: usize,
    /// Upper clamp on point health
    pub max_health: i32,
    /// Health lost on a frame without a match
    pub miss_penalty: i32,
    /// A point expires once its health drops below `-timeout`
    pub timeout: i32,
    /// Match radius for points that have no search region yet
    pub max_distance: f64,
    /// Rear offset and forward reach scale of the search wedge
    pub bounds_multiplier: f64,
    /// Half-opening angle of the search wedge, in radians
    pub rotation_theta: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            max_health: 50,
            miss_penalty: 5,
            timeout: 20,
            max_distance: 320.0,
            bounds_multiplier: 20.0,
            rotation_theta: std::f64::consts::FRAC_PI_6,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size < 2 {
            return Err(ConfigError::WindowTooSmall(self.window_size));
        }
        if self.max_health <= 0 {
            return Err(ConfigError::NonPositiveMaxHealth(self.max_health));
        }
        if self.miss_penalty <= 0 {
            return Err(ConfigError::NonPositiveMissPenalty(self.miss_penalty));
        }
        if self.timeout < 0 {
            return Err(ConfigError::NegativeTimeout(self.timeout));
        }
        for (name, value) in [
            ("max_distance", self.max_distance),
            ("bounds_multiplier", self.bounds_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidDistance { name, value });
            }
        }
        if !(self.rotation_theta > 0.0 && self.rotation_theta < std::f64::consts::PI) {
            return Err(ConfigError::InvalidRotation(self.rotation_theta));
        }
        Ok(())
    }
}

/// Hands out point identifiers for one tracker, in increasing order.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: PointId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first: PointId) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> PointId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The identifier the next call to [`IdAllocator::next_id`] will return.
    pub fn peek(&self) -> PointId {
        self.next
    }
}

pub struct PointTracker {
    points: Vec<TrackedPoint>,
    ids: IdAllocator,
    frame_id: u64,
    config: TrackerConfig,
    motion_model: MotionModel,
}

impl PointTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let motion_model = MotionModel::new(&config);
        Self {
            points: Vec::new(),
            ids: IdAllocator::new(),
            frame_id: 0,
            config,
            motion_model,
        }
    }

    /// Like [`PointTracker::new`], rejecting invalid configuration.
    pub fn try_new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Advance the tracker by one frame.
    ///
    /// Expired points are dropped first. Each remaining point is paired with at
    /// most one detection by greedy global-minimum predicted distance; points that
    /// find no detection are decayed, and detections nobody claimed become new
    /// points.
    ///
    /// Detections are stamped with `frame_index` before matching, so prediction
    /// and each point's last matched frame follow the tracker's frame clock.
    pub fn update(&mut self, frame_index: u64, detections: &[Detection]) -> &[TrackedPoint] {
        self.frame_id = frame_index;
        let detections: Vec<Detection> = detections
            .iter()
            .map(|det| Detection { frame_index, ..*det })
            .collect();

        // Step 1: Remove expired points
        let before = self.points.len();
        self.points.retain(|p| {
            let expired = p.is_expired();
            if expired {
                debug!(point_id = p.id, health = p.health(), frame = frame_index, "point expired");
            }
            !expired
        });
        let expired = before - self.points.len();

        // Step 2: Collect admissible candidate pairs
        let costs = self.candidate_costs(&detections);

        // Step 3: Greedy matching
        let AssignmentResult {
            matches,
            unmatched_points,
            unmatched_detections,
        } = matching::greedy_assignment(&costs);

        // Step 4: Apply matches and decay the rest
        for &(ipoint, idet) in &matches {
            self.points[ipoint].update(detections[idet]);
        }
        for &ipoint in &unmatched_points {
            self.points[ipoint].update_empty();
        }

        // Step 5: Init new points
        for &idet in &unmatched_detections {
            let id = self.ids.next_id();
            let det = detections[idet];
            debug!(point_id = id, x = det.x, y = det.y, frame = frame_index, "new point");
            self.points.push(TrackedPoint::new(id, det, self.motion_model));
        }

        trace!(
            frame = frame_index,
            detections = detections.len(),
            matched = matches.len(),
            missed = unmatched_points.len(),
            born = unmatched_detections.len(),
            expired,
            "tracker update"
        );

        &self.points
    }

    /// Cost matrix of shape (points, detections) holding squared predicted
    /// distances, with `+inf` for pairs outside a point's search region.
    ///
    /// Points without a region accept any detection within `max_distance`.
    fn candidate_costs(&self, detections: &[Detection]) -> Array2<f64> {
        let max_distance_sq = self.config.max_distance * self.config.max_distance;
        let mut costs = Array2::from_elem((self.points.len(), detections.len()), f64::INFINITY);

        for (i, point) in self.points.iter().enumerate() {
            for (j, det) in detections.iter().enumerate() {
                let dist = point.predicted_distance_squared(det);
                let admissible = if point.search_region().is_some() {
                    point.contains_predicted(det)
                } else {
                    dist <= max_distance_sq
                };
                if admissible && dist.is_finite() {
                    costs[[i, j]] = dist;
                }
            }
        }
        costs
    }

    pub fn points(&self) -> &[TrackedPoint] {
        &self.points
    }

    pub fn get(&self, id: PointId) -> Option<&TrackedPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the last frame passed to [`PointTracker::update`].
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Identifier the next new point will receive.
    pub fn next_id(&self) -> PointId {
        self.ids.peek()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::color::HsvColor;

    fn det(frame: u64, x: f64, y: f64) -> Detection {
        Detection::new(frame, x, y, 0.9, HsvColor::default())
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_rejections() {
        let bad = TrackerConfig {
            window_size: 1,
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(ConfigError::WindowTooSmall(1)));

        let bad = TrackerConfig {
            rotation_theta: 0.0,
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(ConfigError::InvalidRotation(0.0)));

        let bad = TrackerConfig {
            max_distance: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidDistance { name: "max_distance", .. })
        ));
        assert!(PointTracker::try_new(bad).is_err());
    }

    #[test]
    fn test_id_allocator_monotonic() {
        let mut ids = IdAllocator::starting_at(5);
        assert_eq!(ids.peek(), 5);
        assert_eq!(ids.next_id(), 5);
        assert_eq!(ids.next_id(), 6);
        assert_eq!(ids.peek(), 7);
    }

    #[test]
    fn test_unmatched_detections_spawn_points() {
        let mut tracker = PointTracker::new(TrackerConfig::default());
        let points = tracker.update(0, &[det(0, 10.0, 10.0), det(0, 400.0, 400.0)]);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, 0);
        assert_eq!(points[1].id, 1);
        assert_eq!(tracker.next_id(), 2);
    }

    #[test]
    fn test_newborn_gated_by_max_distance() {
        let mut tracker = PointTracker::new(TrackerConfig::default());
        tracker.update(0, &[det(0, 0.0, 0.0)]);
        // farther than 320 units: a second point is born instead of a match
        let points = tracker.update(1, &[det(1, 400.0, 0.0)]);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].health(), 1 - 5);
        assert_eq!(points[1].health(), 1);
    }

    #[test]
    fn test_empty_frame_decays_all() {
        let mut tracker = PointTracker::new(TrackerConfig::default());
        tracker.update(0, &[det(0, 0.0, 0.0), det(0, 100.0, 0.0)]);
        let points = tracker.update(1, &[]);
        assert!(points.iter().all(|p| p.health() == -4));
        assert_eq!(tracker.frame_id(), 1);
    }

    #[test]
    fn test_detections_follow_tracker_frame_clock() {
        let mut tracker = PointTracker::new(TrackerConfig::default());
        tracker.update(0, &[det(0, 0.0, 0.0)]);
        tracker.update(1, &[det(1, 10.0, 0.0)]);

        // stale frame stamps: the point still predicts two frames ahead of frame 0
        let points = tracker.update(2, &[det(0, 2.0, 0.0), det(0, 20.0, 0.0)]);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].last_detection().map(|d| d.x), Some(20.0));
        assert_eq!(points[0].last_matched_frame(), 2);
        assert_eq!(points[1].last_matched_frame(), 2);
    }

    #[test]
    fn test_expired_points_removed() {
        let mut tracker = PointTracker::new(TrackerConfig::default());
        tracker.update(0, &[det(0, 0.0, 0.0)]);
        for f in 1..=5 {
            tracker.update(f, &[]);
        }
        // health is now 1 - 25, expired; removed on the next frame
        assert!(tracker.points()[0].is_expired());
        tracker.update(6, &[]);
        assert!(tracker.is_empty());
    }
}
