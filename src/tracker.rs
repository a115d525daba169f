mod color;
mod geometry;
mod matching;
mod motion_model;
mod point_state;
mod point_tracker;
mod tracked_point;

pub use color::{DEFAULT_COLOR_TOLERANCE, HsvColor, NamedColor, bgr_to_hsv, classify};
pub use geometry::{SearchRegion, centroid, midpoint, squared_distance};
pub use matching::{AssignmentResult, Detection, greedy_assignment};
pub use motion_model::MotionModel;
pub use point_state::PointState;
pub use point_tracker::{IdAllocator, PointTracker, TrackerConfig};
pub use tracked_point::{PointId, TrackedPoint};
