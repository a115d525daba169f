//! Integration module for connecting upstream detection producers with the tracker.
//!
//! This module provides the [`DetectionSource`] trait for the excluded vision
//! stage, a per-stream [`FramePipeline`] (tracking, quality filtering and
//! clustering) and a threaded [`StreamWorker`] that hands results to a consumer
//! one frame at a time.

mod builder;
mod detector;
mod pipeline;
mod worker;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections, ReplaySource};
pub use pipeline::{ClusterSnapshot, FramePipeline, FrameResult, PipelineConfig, PointSnapshot};
pub use worker::StreamWorker;
