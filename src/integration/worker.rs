//! One thread per stream, handing results to a consumer through a single slot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::{DetectionSource, FramePipeline, FrameResult, PipelineConfig};
use crate::error::WorkerError;

/// A running stream.
///
/// The worker owns its detection source and a [`FramePipeline`]. Each processed
/// frame is sent through a channel with capacity one, so a slow consumer holds
/// the producer back to at most one buffered frame.
pub struct StreamWorker<E> {
    name: String,
    stop: Arc<AtomicBool>,
    frames: Receiver<FrameResult>,
    handle: Option<JoinHandle<Result<u64, WorkerError<E>>>>,
}

impl<E> StreamWorker<E>
where
    E: std::error::Error + Send + 'static,
{
    /// Validate `config` and start processing `source` on a new thread.
    pub fn spawn<D>(name: impl Into<String>, source: D, config: PipelineConfig) -> Result<Self, WorkerError<E>>
    where
        D: DetectionSource<Error = E> + Send + 'static,
    {
        config.validate()?;
        let name = name.into();

        let (tx, rx) = sync_channel::<FrameResult>(1);
        let stop = Arc::new(AtomicBool::new(false));

        let thread_stop = Arc::clone(&stop);
        let thread_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_stream(&thread_name, source, config, &thread_stop, tx))
            .map_err(WorkerError::Spawn)?;

        Ok(Self {
            name,
            stop,
            frames: rx,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the next frame result is available. `None` once the worker
    /// has finished and the slot is empty.
    pub fn recv(&self) -> Option<FrameResult> {
        self.frames.recv().ok()
    }

    /// Take a waiting frame result without blocking.
    pub fn try_recv(&self) -> Option<FrameResult> {
        self.frames.try_recv().ok()
    }

    /// Ask the worker to stop at the next frame boundary, drain the handoff slot
    /// so a blocked producer can finish, and wait for the thread.
    ///
    /// Returns the number of frames the worker processed.
    pub fn stop(mut self) -> Result<u64, WorkerError<E>> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<u64, WorkerError<E>> {
        self.stop.store(true, Ordering::Release);
        while self.frames.try_recv().is_ok() {}

        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        match handle.join() {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Panicked(self.name.clone())),
        }
    }
}

impl<E> Drop for StreamWorker<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.store(true, Ordering::Release);
            while self.frames.try_recv().is_ok() {}
            let _ = handle.join();
        }
    }
}

fn run_stream<D>(
    name: &str,
    mut source: D,
    config: PipelineConfig,
    stop: &AtomicBool,
    frames: SyncSender<FrameResult>,
) -> Result<u64, WorkerError<D::Error>>
where
    D: DetectionSource,
    D::Error: std::error::Error,
{
    let mut pipeline = FramePipeline::new(config);
    info!(stream = name, "stream worker started");

    while !stop.load(Ordering::Acquire) {
        let detections = match source.detect(pipeline.frame_count()) {
            Ok(Some(detections)) => detections,
            Ok(None) => {
                info!(stream = name, frames = pipeline.frame_count(), "end of stream");
                break;
            }
            Err(e) => {
                warn!(stream = name, frame = pipeline.frame_count(), error = %e, "detection source failed");
                return Err(WorkerError::Source(e));
            }
        };

        let result = pipeline.process(&detections);
        // The receiver lives in the StreamWorker and outlasts the join.
        if frames.send(result).is_err() {
            break;
        }
    }

    drop(source);
    debug!(stream = name, "detection source released");
    info!(stream = name, frames = pipeline.frame_count(), "stream worker stopped");
    Ok(pipeline.frame_count())
}
