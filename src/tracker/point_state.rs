//! Lifecycle states of a tracked point.

/// Lifecycle state of a tracked point, derived from its history and health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum PointState {
    /// Fewer than two matched detections, no motion estimate yet
    #[default]
    Newborn,
    /// Matched in the most recent frame
    Tracked,
    /// Missed in the most recent frame but not yet expired
    Missing,
    /// Health fell below the timeout, pending removal
    Expired,
}
