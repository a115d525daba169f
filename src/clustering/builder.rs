//! Greedy radius-bounded clustering of tracked points.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::clustering::cluster::{Cluster, ClusterId, PositionIndex};
use crate::error::ConfigError;
use crate::tracker::{PointId, TrackedPoint};

/// Configuration for the ClusterBuilder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Every member must stay within this distance of the centroid
    pub max_radius: f64,
    /// Maximum members per cluster, 0 for unbounded
    pub max_members: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_radius: 75.0,
            max_members: 3,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_radius.is_finite() || self.max_radius <= 0.0 {
            return Err(ConfigError::InvalidDistance {
                name: "max_radius",
                value: self.max_radius,
            });
        }
        Ok(())
    }
}

pub struct ClusterBuilder {
    config: ClusterConfig,
    next_id: ClusterId,
}

impl ClusterBuilder {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config, next_id: 0 }
    }

    pub fn try_new(config: ClusterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Drop members that are not in `positions` from every cluster, refresh
    /// centroids, shed members that drifted beyond `max_radius` and discard
    /// clusters left with fewer than two members.
    pub fn maintain(&self, clusters: &mut Vec<Cluster>, positions: &PositionIndex) {
        let max_radius_sq = self.config.max_radius * self.config.max_radius;
        clusters.retain_mut(|cluster| {
            let removed = cluster.clean(positions) + cluster.shrink_to_radius(positions, max_radius_sq);
            if cluster.is_dead() {
                debug!(cluster_id = cluster.id(), "cluster dissolved");
                false
            } else {
                if removed > 0 {
                    trace!(cluster_id = cluster.id(), removed, "cluster shrank");
                }
                true
            }
        });
    }

    /// Extend `previous` with the given candidate points.
    ///
    /// Existing clusters are first maintained against the candidate set. Then
    /// every ordered pair of candidates within the cluster diameter is visited
    /// in ascending distance: two unclustered points form a new cluster, and a
    /// single unclustered point joins its partner's cluster only if all members
    /// stay within `max_radius` of the resulting centroid and the cluster is not
    /// full. A point belongs to at most one cluster.
    pub fn build(&mut self, previous: Vec<Cluster>, candidates: &[&TrackedPoint]) -> Vec<Cluster> {
        let mut points: Vec<&TrackedPoint> = Vec::with_capacity(candidates.len());
        let mut positions: PositionIndex = HashMap::with_capacity(candidates.len());
        for &point in candidates {
            if positions.insert(point.id, point.position()).is_none() {
                points.push(point);
            }
        }

        let mut clusters = previous;
        self.maintain(&mut clusters, &positions);

        let mut owner: HashMap<PointId, usize> = HashMap::new();
        for (idx, cluster) in clusters.iter().enumerate() {
            for &member in cluster.members() {
                owner.entry(member).or_insert(idx);
            }
        }

        let max_radius_sq = self.config.max_radius * self.config.max_radius;
        let max_diameter_sq = 4.0 * max_radius_sq;

        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for (i, a) in points.iter().enumerate() {
            for (j, b) in points.iter().enumerate() {
                if i == j {
                    continue;
                }
                let d = a.squared_distance_to(b);
                if d <= max_diameter_sq {
                    pairs.push((i, j, d));
                }
            }
        }
        pairs.sort_by(|a, b| a.2.total_cmp(&b.2));

        for (i, j, _) in pairs {
            let (a, b) = (points[i], points[j]);
            match (owner.get(&a.id).copied(), owner.get(&b.id).copied()) {
                (Some(_), Some(_)) => continue,
                (None, None) => {
                    let id = self.next_id;
                    self.next_id += 1;
                    debug!(cluster_id = id, a = a.id, b = b.id, "cluster formed");
                    owner.insert(a.id, clusters.len());
                    owner.insert(b.id, clusters.len());
                    clusters.push(Cluster::from_pair(id, a, b));
                }
                (Some(idx), None) => {
                    if self.try_grow(&mut clusters[idx], b, &positions, max_radius_sq) {
                        owner.insert(b.id, idx);
                    }
                }
                (None, Some(idx)) => {
                    if self.try_grow(&mut clusters[idx], a, &positions, max_radius_sq) {
                        owner.insert(a.id, idx);
                    }
                }
            }
        }

        clusters
    }

    fn try_grow(
        &self,
        cluster: &mut Cluster,
        point: &TrackedPoint,
        positions: &PositionIndex,
        max_radius_sq: f64,
    ) -> bool {
        if self.config.max_members > 0 && cluster.len() >= self.config.max_members {
            return false;
        }
        match cluster.simulate_insert(point.position(), positions, max_radius_sq) {
            Some(centroid) => {
                trace!(cluster_id = cluster.id(), point_id = point.id, "point joined cluster");
                cluster.insert(point.id, centroid);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Detection, HsvColor, MotionModel};
    use nalgebra::Point2;

    fn point(id: PointId, x: f64, y: f64) -> TrackedPoint {
        TrackedPoint::new(id, Detection::new(0, x, y, 1.0, HsvColor::default()), MotionModel::default())
    }

    fn unbounded(max_radius: f64) -> ClusterBuilder {
        ClusterBuilder::new(ClusterConfig {
            max_radius,
            max_members: 0,
        })
    }

    #[test]
    fn test_pair_forms_cluster_at_midpoint() {
        let pts = [point(0, 0.0, 0.0), point(1, 100.0, 0.0)];
        let refs: Vec<&TrackedPoint> = pts.iter().collect();
        let clusters = unbounded(75.0).build(Vec::new(), &refs);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members(), &[0, 1]);
        assert_eq!(clusters[0].centroid(), Point2::new(50.0, 0.0));
    }

    #[test]
    fn test_pair_beyond_diameter_stays_apart() {
        let pts = [point(0, 0.0, 0.0), point(1, 151.0, 0.0)];
        let refs: Vec<&TrackedPoint> = pts.iter().collect();
        assert!(unbounded(75.0).build(Vec::new(), &refs).is_empty());
    }

    #[test]
    fn test_three_points_grow_one_cluster() {
        let pts = [point(0, 0.0, 0.0), point(1, 10.0, 0.0), point(2, 60.0, 0.0)];
        let refs: Vec<&TrackedPoint> = pts.iter().collect();
        let clusters = unbounded(75.0).build(Vec::new(), &refs);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members(), &[0, 1, 2]);
        assert!((clusters[0].centroid().x - 70.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_rejected_when_centroid_drifts() {
        let pts = [point(0, 0.0, 0.0), point(1, 10.0, 0.0), point(2, 25.0, 0.0)];
        let refs: Vec<&TrackedPoint> = pts.iter().collect();
        let clusters = unbounded(10.0).build(Vec::new(), &refs);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members(), &[0, 1]);
        assert_eq!(clusters[0].centroid(), Point2::new(5.0, 0.0));
    }

    #[test]
    fn test_max_members_respected() {
        let pts = [point(0, 0.0, 0.0), point(1, 5.0, 0.0), point(2, 10.0, 0.0), point(3, 15.0, 0.0)];
        let refs: Vec<&TrackedPoint> = pts.iter().collect();
        let mut builder = ClusterBuilder::new(ClusterConfig {
            max_radius: 75.0,
            max_members: 2,
        });
        let clusters = builder.build(Vec::new(), &refs);

        assert!(clusters.iter().all(|c| c.len() <= 2));
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_previous_clusters_carried_and_pruned() {
        let pts = [point(0, 0.0, 0.0), point(1, 10.0, 0.0), point(2, 20.0, 0.0)];
        let refs: Vec<&TrackedPoint> = pts.iter().collect();
        let mut builder = unbounded(75.0);
        let clusters = builder.build(Vec::new(), &refs);
        assert_eq!(clusters.len(), 1);
        let id = clusters[0].id();

        // point 0 leaves: the cluster survives with the other two
        let refs: Vec<&TrackedPoint> = pts[1..].iter().collect();
        let clusters = builder.build(clusters, &refs);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].id(), id);
        assert_eq!(clusters[0].members(), &[1, 2]);
        assert_eq!(clusters[0].centroid(), Point2::new(15.0, 0.0));

        // only one point left: the cluster is dead
        let refs: Vec<&TrackedPoint> = pts[2..].iter().collect();
        assert!(builder.build(clusters, &refs).is_empty());
    }

    #[test]
    fn test_carried_cluster_sheds_drifted_members() {
        let mut builder = unbounded(75.0);
        let pts = [point(0, 0.0, 0.0), point(1, 10.0, 0.0), point(2, 20.0, 0.0)];
        let refs: Vec<&TrackedPoint> = pts.iter().collect();
        let clusters = builder.build(Vec::new(), &refs);
        assert_eq!(clusters[0].members(), &[0, 1, 2]);
        let id = clusters[0].id();

        // point 2 moves away: the rest stay grouped under the same id
        let moved = [point(0, 0.0, 0.0), point(1, 10.0, 0.0), point(2, 200.0, 0.0)];
        let refs: Vec<&TrackedPoint> = moved.iter().collect();
        let clusters = builder.build(clusters, &refs);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].id(), id);
        assert_eq!(clusters[0].members(), &[0, 1]);
        assert_eq!(clusters[0].centroid(), Point2::new(5.0, 0.0));

        // point 1 is now far from point 0: the pair dissolves
        let apart = [point(0, 0.0, 0.0), point(1, 1000.0, 0.0)];
        let refs: Vec<&TrackedPoint> = apart.iter().collect();
        assert!(builder.build(clusters, &refs).is_empty());
    }

    #[test]
    fn test_invalid_radius_rejected() {
        let bad = ClusterConfig {
            max_radius: 0.0,
            ..Default::default()
        };
        assert!(ClusterBuilder::try_new(bad).is_err());
    }
}
