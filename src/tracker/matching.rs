//! Matching utilities for point tracking.

use nalgebra::Point2;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::tracker::color::HsvColor;

/// Detection input for the tracker: one candidate circle seen in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Frame the detection was observed in
    pub frame_index: u64,
    /// Centre x coordinate
    pub x: f64,
    /// Centre y coordinate
    pub y: f64,
    /// Circularity of the detected contour, in [0, 1]
    pub shape_quality: f64,
    /// Mean colour inside the contour
    pub color: HsvColor,
}

impl Detection {
    pub fn new(frame_index: u64, x: f64, y: f64, shape_quality: f64, color: HsvColor) -> Self {
        Self {
            frame_index,
            x,
            y,
            shape_quality,
            color,
        }
    }

    #[inline]
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_points: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Greedy global-minimum assignment over a (points x detections) cost matrix.
///
/// Every finite entry is a candidate pair. Candidates are visited in ascending
/// cost; a pair is committed unless its row or column was already claimed.
/// Equal costs keep row-major order, so the first-seen pair wins. Non-finite
/// entries mark inadmissible pairs.
pub fn greedy_assignment(cost_matrix: &Array2<f64>) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    let mut candidates: Vec<(usize, usize, f64)> = cost_matrix
        .indexed_iter()
        .filter(|(_, cost)| cost.is_finite())
        .map(|((i, j), &cost)| (i, j, cost))
        .collect();
    candidates.sort_by(|a, b| a.2.total_cmp(&b.2));

    let mut row_taken = vec![false; num_rows];
    let mut col_taken = vec![false; num_cols];
    let mut matches = Vec::new();

    for (row, col, _) in candidates {
        if row_taken[row] || col_taken[col] {
            continue;
        }
        row_taken[row] = true;
        col_taken[col] = true;
        matches.push((row, col));
    }

    let unmatched_points = row_taken
        .iter()
        .enumerate()
        .filter_map(|(i, &taken)| if taken { None } else { Some(i) })
        .collect();
    let unmatched_detections = col_taken
        .iter()
        .enumerate()
        .filter_map(|(j, &taken)| if taken { None } else { Some(j) })
        .collect();

    AssignmentResult {
        matches,
        unmatched_points,
        unmatched_detections,
    }
}
