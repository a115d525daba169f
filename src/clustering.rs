//! Grouping of tracked points into compact spatial clusters.

mod builder;
mod cluster;

pub use builder::{ClusterBuilder, ClusterConfig};
pub use cluster::{Cluster, ClusterId, PositionIndex};
