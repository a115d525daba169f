//! Error types for configuration and stream workers.
//!
//! Tracking and clustering themselves never fail; these cover the edges where
//! user configuration or an upstream detection source enters the crate.

use thiserror::Error;

/// Rejected tunable parameter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("window size must be at least 2, got {0}")]
    WindowTooSmall(usize),

    #[error("max health must be positive, got {0}")]
    NonPositiveMaxHealth(i32),

    #[error("miss penalty must be positive, got {0}")]
    NonPositiveMissPenalty(i32),

    #[error("timeout must not be negative, got {0}")]
    NegativeTimeout(i32),

    #[error("{name} must be finite and positive, got {value}")]
    InvalidDistance { name: &'static str, value: f64 },

    #[error("rotation angle must lie in (0, pi), got {0}")]
    InvalidRotation(f64),

    #[error("quality threshold must lie in [0, 1], got {0}")]
    InvalidQualityThreshold(f64),
}

/// Failure of a stream worker.
#[derive(Debug, Error)]
pub enum WorkerError<E> {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("detection source failed: {0}")]
    Source(E),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("worker thread `{0}` panicked")]
    Panicked(String),
}
