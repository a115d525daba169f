//! FramePipeline for combining point tracking with clustering on one stream.

use serde::{Deserialize, Serialize};

use super::DetectionSource;
use crate::clustering::{Cluster, ClusterBuilder, ClusterConfig, ClusterId};
use crate::error::ConfigError;
use crate::tracker::{Detection, NamedColor, PointId, PointState, PointTracker, TrackedPoint, TrackerConfig};

/// Configuration for a single stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tracker: TrackerConfig,
    pub clustering: ClusterConfig,
    /// Points must score strictly above this quality to be clustered
    pub quality_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            clustering: ClusterConfig::default(),
            quality_threshold: 0.25,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.clustering.validate()?;
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(ConfigError::InvalidQualityThreshold(self.quality_threshold));
        }
        Ok(())
    }
}

/// Per-point output handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSnapshot {
    pub id: PointId,
    pub position: [f64; 2],
    pub predicted_position: [f64; 2],
    pub quality: f64,
    pub color: Option<NamedColor>,
    pub state: PointState,
}

impl From<&TrackedPoint> for PointSnapshot {
    fn from(point: &TrackedPoint) -> Self {
        let position = point.position();
        let predicted = point.predicted_position(None);
        Self {
            id: point.id,
            position: [position.x, position.y],
            predicted_position: [predicted.x, predicted.y],
            quality: point.quality(),
            color: point.color(),
            state: point.state(),
        }
    }
}

/// Per-cluster output handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub id: ClusterId,
    pub members: Vec<PointId>,
    pub centroid: [f64; 2],
}

impl From<&Cluster> for ClusterSnapshot {
    fn from(cluster: &Cluster) -> Self {
        let centroid = cluster.centroid();
        Self {
            id: cluster.id(),
            members: cluster.members().to_vec(),
            centroid: [centroid.x, centroid.y],
        }
    }
}

/// Everything a consumer needs about one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub frame_index: u64,
    pub points: Vec<PointSnapshot>,
    pub clusters: Vec<ClusterSnapshot>,
}

impl FrameResult {
    pub fn point(&self, id: PointId) -> Option<&PointSnapshot> {
        self.points.iter().find(|p| p.id == id)
    }
}

/// Tracking and clustering state for one stream.
///
/// Frames must be processed strictly in order; each frame's prediction depends
/// on the previous frame's committed state.
pub struct FramePipeline {
    tracker: PointTracker,
    builder: ClusterBuilder,
    clusters: Vec<Cluster>,
    quality_threshold: f64,
    frame_count: u64,
}

impl FramePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            tracker: PointTracker::new(config.tracker),
            builder: ClusterBuilder::new(config.clustering),
            clusters: Vec::new(),
            quality_threshold: config.quality_threshold,
            frame_count: 0,
        }
    }

    pub fn try_new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn with_default_config() -> Self {
        Self::new(PipelineConfig::default())
    }

    /// Process one frame of detections.
    ///
    /// The tracker runs first, then points that are not expired and score above
    /// the quality threshold are handed to the cluster builder together with the
    /// clusters carried over from the previous frame.
    pub fn process(&mut self, detections: &[Detection]) -> FrameResult {
        let frame_index = self.frame_count;
        self.tracker.update(frame_index, detections);

        let acceptable: Vec<&TrackedPoint> = self
            .tracker
            .points()
            .iter()
            .filter(|p| !p.is_expired() && p.quality() > self.quality_threshold)
            .collect();

        let previous = std::mem::take(&mut self.clusters);
        self.clusters = self.builder.build(previous, &acceptable);
        self.frame_count += 1;

        FrameResult {
            frame_index,
            points: self.tracker.points().iter().map(PointSnapshot::from).collect(),
            clusters: self.clusters.iter().map(ClusterSnapshot::from).collect(),
        }
    }

    /// Pull one frame from `source` and process it. `Ok(None)` at end of stream.
    pub fn run_source<D: DetectionSource>(&mut self, source: &mut D) -> Result<Option<FrameResult>, D::Error> {
        match source.detect(self.frame_count)? {
            Some(detections) => Ok(Some(self.process(&detections))),
            None => Ok(None),
        }
    }

    /// Number of frames processed so far; also the index the next frame gets.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn tracker(&self) -> &PointTracker {
        &self.tracker
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }
}
