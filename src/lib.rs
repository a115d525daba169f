//! Online tracking of small point-like features with compact spatial clustering.
//!
//! Per frame, candidate detections are associated with live [`TrackedPoint`]s by
//! [`PointTracker`], points above a quality threshold are grouped by
//! [`ClusterBuilder`], and [`integration::FramePipeline`] ties both together for a
//! single stream.

pub mod clustering;
pub mod error;
pub mod integration;
pub mod tracker;

pub use clustering::{Cluster, ClusterBuilder, ClusterConfig};
pub use error::{ConfigError, WorkerError};
pub use integration::{FramePipeline, FrameResult, PipelineConfig, StreamWorker};
pub use tracker::{Detection, HsvColor, NamedColor, PointTracker, TrackedPoint, TrackerConfig};
