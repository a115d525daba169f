//! A single cluster of tracked point ids and its centroid.

use std::collections::HashMap;

use nalgebra::Point2;

use crate::tracker::{PointId, TrackedPoint, centroid, squared_distance};

/// Cluster identifier, allocated by the [`ClusterBuilder`](super::ClusterBuilder).
pub type ClusterId = u64;

/// Current position of every point eligible for clustering, keyed by id.
pub type PositionIndex = HashMap<PointId, Point2<f64>>;

/// A group of tracked points that stay within a fixed radius of their centroid.
///
/// Members are stored by id only; positions are looked up in a
/// [`PositionIndex`] whenever the centroid has to be refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    id: ClusterId,
    members: Vec<PointId>,
    centroid: Point2<f64>,
}

impl Cluster {
    /// Two-member cluster centred on the midpoint of its members.
    pub fn from_pair(id: ClusterId, a: &TrackedPoint, b: &TrackedPoint) -> Self {
        Self {
            id,
            members: vec![a.id, b.id],
            centroid: a.midpoint_with(b),
        }
    }

    #[inline]
    pub fn id(&self) -> ClusterId {
        self.id
    }

    #[inline]
    pub fn members(&self) -> &[PointId] {
        &self.members
    }

    #[inline]
    pub fn centroid(&self) -> Point2<f64> {
        self.centroid
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.members.contains(&id)
    }

    /// A cluster needs at least two members to exist.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.members.len() < 2
    }

    /// Drop members that are no longer in `positions` and recompute the centroid.
    /// Returns how many members were removed.
    pub fn clean(&mut self, positions: &PositionIndex) -> usize {
        let before = self.members.len();
        self.members.retain(|id| positions.contains_key(id));
        self.refresh(positions);
        before - self.members.len()
    }

    /// Recompute the centroid from the members' current positions.
    pub fn refresh(&mut self, positions: &PositionIndex) {
        if let Some(c) = centroid(self.members.iter().filter_map(|id| positions.get(id).copied())) {
            self.centroid = c;
        }
    }

    /// Drop the member farthest from the centroid, then recompute, until every
    /// remaining member lies within `max_radius_sq` of the centroid or fewer than
    /// two members are left. Returns how many members were removed.
    pub fn shrink_to_radius(&mut self, positions: &PositionIndex, max_radius_sq: f64) -> usize {
        let mut removed = 0;
        while self.members.len() >= 2 {
            let farthest = self
                .members
                .iter()
                .enumerate()
                .filter_map(|(i, id)| positions.get(id).map(|p| (i, squared_distance(&self.centroid, p))))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            match farthest {
                Some((i, dist)) if dist > max_radius_sq => {
                    self.members.remove(i);
                    self.refresh(positions);
                    removed += 1;
                }
                _ => break,
            }
        }
        removed
    }

    /// Centroid the cluster would have with `candidate` added, provided every
    /// member (the candidate included) stays within `max_radius_sq` of it.
    pub fn simulate_insert(
        &self,
        candidate: Point2<f64>,
        positions: &PositionIndex,
        max_radius_sq: f64,
    ) -> Option<Point2<f64>> {
        let member_positions: Vec<Point2<f64>> = self
            .members
            .iter()
            .filter_map(|id| positions.get(id).copied())
            .chain(std::iter::once(candidate))
            .collect();

        let sim_centroid = centroid(member_positions.iter().copied())?;
        member_positions
            .iter()
            .all(|p| squared_distance(&sim_centroid, p) <= max_radius_sq)
            .then_some(sim_centroid)
    }

    pub(crate) fn insert(&mut self, id: PointId, centroid: Point2<f64>) {
        self.members.push(id);
        self.centroid = centroid;
    }
}
