use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use pointcluster_rs::integration::{DetectionSource, ReplaySource};
use pointcluster_rs::{Detection, HsvColor, PipelineConfig, StreamWorker, WorkerError};

fn marker(x: f64, y: f64) -> Detection {
    Detection::new(0, x, y, 0.95, HsvColor::new(0.4, 1.0, 0.3))
}

/// Two markers drifting right together.
fn drifting_pair(frames: usize, offset: f64) -> ReplaySource {
    ReplaySource::new((0..frames).map(move |f| {
        let x = offset + f as f64 * 2.0;
        vec![marker(x, 100.0), marker(x + 20.0, 100.0)]
    }))
}

#[derive(Debug, thiserror::Error)]
#[error("camera unplugged")]
struct Unplugged;

struct FlakyCamera {
    frames_left: usize,
}

impl DetectionSource for FlakyCamera {
    type Error = Unplugged;

    fn detect(&mut self, frame_index: u64) -> Result<Option<Vec<Detection>>, Self::Error> {
        if self.frames_left == 0 {
            return Err(Unplugged);
        }
        self.frames_left -= 1;
        let mut d = marker(10.0, 10.0);
        d.frame_index = frame_index;
        Ok(Some(vec![d]))
    }
}

/// Endless source that counts how many frames were pulled from it.
struct CountingCamera {
    pulled: Arc<AtomicU64>,
}

impl DetectionSource for CountingCamera {
    type Error = Infallible;

    fn detect(&mut self, frame_index: u64) -> Result<Option<Vec<Detection>>, Self::Error> {
        self.pulled.fetch_add(1, Ordering::SeqCst);
        let mut d = marker(frame_index as f64, 0.0);
        d.frame_index = frame_index;
        Ok(Some(vec![d]))
    }
}

#[test]
fn test_slow_consumer_holds_producer_to_one_frame() {
    let pulled = Arc::new(AtomicU64::new(0));
    let camera = CountingCamera {
        pulled: Arc::clone(&pulled),
    };
    let worker = StreamWorker::spawn("counting", camera, PipelineConfig::default()).unwrap();

    let mut received = 0;
    for _ in 0..3 {
        assert!(worker.recv().is_some());
        received += 1;
        thread::sleep(Duration::from_millis(100));
        // one frame waiting in the slot, one more computed and blocked on send
        assert!(pulled.load(Ordering::SeqCst) <= received + 2);
    }

    let processed = worker.stop().unwrap();
    assert!(processed <= received + 2);
}

#[test]
fn test_independent_streams_in_parallel() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let left = StreamWorker::spawn("left", drifting_pair(10, 0.0), PipelineConfig::default()).unwrap();
    let right = StreamWorker::spawn("right", drifting_pair(10, 500.0), PipelineConfig::default()).unwrap();

    let mut last = Vec::new();
    for worker in [&left, &right] {
        let mut final_frame = None;
        while let Some(result) = worker.recv() {
            final_frame = Some(result);
        }
        last.push(final_frame.unwrap());
    }

    for result in &last {
        assert_eq!(result.frame_index, 9);
        assert_eq!(result.points.len(), 2);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].members.len(), 2);
    }
    // identities are per stream
    assert_eq!(last[0].clusters[0].members, last[1].clusters[0].members);

    assert_eq!(left.stop().unwrap(), 10);
    assert_eq!(right.stop().unwrap(), 10);
}

#[test]
fn test_source_error_surfaces_on_stop() {
    let worker = StreamWorker::spawn("flaky", FlakyCamera { frames_left: 2 }, PipelineConfig::default()).unwrap();
    let mut frames = 0;
    while worker.recv().is_some() {
        frames += 1;
    }
    assert_eq!(frames, 2);
    assert!(matches!(worker.stop(), Err(WorkerError::Source(Unplugged))));
}

#[test]
fn test_dropping_worker_does_not_hang() {
    let worker: StreamWorker<Infallible> =
        StreamWorker::spawn("dropped", drifting_pair(10_000, 0.0), PipelineConfig::default()).unwrap();
    assert!(worker.recv().is_some());
    drop(worker);
}
