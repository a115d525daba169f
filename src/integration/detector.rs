//! Trait for the upstream producer of per-frame detections.

use std::collections::VecDeque;
use std::convert::Infallible;

use crate::tracker::Detection;

/// Trait for per-frame detection producers.
///
/// Implement this trait to connect a capture and contour-analysis stage to the
/// tracker. Implementations own whatever capture handle they need; it is
/// released when the source is dropped.
///
/// # Example
///
/// ```ignore
/// use pointcluster_rs::integration::DetectionSource;
/// use pointcluster_rs::Detection;
///
/// struct MyCamera {
///     // capture handle and contour finder here
/// }
///
/// impl DetectionSource for MyCamera {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame_index: u64) -> Result<Option<Vec<Detection>>, Self::Error> {
///         // Grab a frame, find candidate circles, stamp them with `frame_index`
///         Ok(Some(vec![]))
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Read the next frame and return its detections, stamped with `frame_index`.
    ///
    /// `Ok(None)` means the stream has ended.
    fn detect(&mut self, frame_index: u64) -> Result<Option<Vec<Detection>>, Self::Error>;
}

/// Helper trait for converting producer-specific outputs to `Detection`.
pub trait IntoDetections {
    /// Convert the output into a vector of detections.
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// Plays back a fixed sequence of frames, then ends the stream.
///
/// Detections are re-stamped with the frame index requested by the caller.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: VecDeque<Vec<Detection>>,
}

impl ReplaySource {
    pub fn new<I, F>(frames: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: IntoDetections,
    {
        Self {
            frames: frames.into_iter().map(IntoDetections::into_detections).collect(),
        }
    }

    /// Frames not yet played.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl DetectionSource for ReplaySource {
    type Error = Infallible;

    fn detect(&mut self, frame_index: u64) -> Result<Option<Vec<Detection>>, Self::Error> {
        Ok(self.frames.pop_front().map(|mut dets| {
            for det in &mut dets {
                det.frame_index = frame_index;
            }
            dets
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::HsvColor;

    #[test]
    fn test_replay_restamps_and_ends() {
        let d = Detection::new(99, 1.0, 2.0, 0.5, HsvColor::default());
        let mut source = ReplaySource::new(vec![vec![d], vec![]]);
        assert_eq!(source.remaining(), 2);

        let first = source.detect(0).unwrap().unwrap();
        assert_eq!(first[0].frame_index, 0);
        assert!(source.detect(1).unwrap().unwrap().is_empty());
        assert!(source.detect(2).unwrap().is_none());
    }
}
