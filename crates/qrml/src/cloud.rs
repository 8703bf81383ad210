//! Point clouds in R^d and their k-nearest-neighbour candidate lists.
//!
//! - `Pointcloud`: immutable, non-empty, fixed ambient dimension.
//! - `k_nearest`: R*-tree queries for d = 2, 3; exhaustive scan otherwise.
//!   Results are sorted by `(distance, index)` so they are reproducible.

use std::cmp::Ordering;

use nalgebra::DVector;
use rstar::{primitives::GeomWithData, RTree};
use serde::{Deserialize, Serialize};

use crate::error::{QrmlError, Result};

/// Neighbour index paired with its Euclidean distance.
pub type Neighbour = (usize, f64);

/// Ordered sequence of samples in R^d.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pointcloud {
    points: Vec<DVector<f64>>,
    dim: usize,
}

impl Pointcloud {
    /// Wrap samples; rejects empty and ragged input.
    pub fn new(points: Vec<DVector<f64>>) -> Result<Self> {
        let Some(first) = points.first() else {
            return Err(QrmlError::InsufficientData {
                points: 0,
                required: 1,
                k: 0,
            });
        };
        let dim = first.len();
        if let Some(bad) = points.iter().find(|p| p.len() != dim) {
            return Err(QrmlError::DimensionMismatch {
                expected: dim,
                found: bad.len(),
            });
        }
        Ok(Self { points, dim })
    }

    /// Convenience constructor from row slices.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        Self::new(
            rows.iter()
                .map(|r| DVector::from_column_slice(r.as_ref()))
                .collect(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Ambient dimension d.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn points(&self) -> &[DVector<f64>] {
        &self.points
    }

    #[inline]
    pub fn point(&self, i: usize) -> &DVector<f64> {
        &self.points[i]
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        (&self.points[i] - &self.points[j]).norm()
    }

    /// The `k` nearest other points of every point, ascending by distance.
    pub fn k_nearest(&self, k: usize) -> Result<Vec<Vec<Neighbour>>> {
        if self.len() < k + 1 {
            return Err(QrmlError::InsufficientData {
                points: self.len(),
                required: k + 1,
                k,
            });
        }
        let out = match self.dim {
            2 => knn_rtree(&self.points, k, |p| [p[0], p[1]]),
            3 => knn_rtree(&self.points, k, |p| [p[0], p[1], p[2]]),
            _ => knn_exhaustive(&self.points, k),
        };
        Ok(out)
    }
}

#[inline]
pub(crate) fn by_distance(a: &Neighbour, b: &Neighbour) -> Ordering {
    a.1.partial_cmp(&b.1)
        .unwrap_or(Ordering::Equal)
        .then(a.0.cmp(&b.0))
}

fn knn_rtree<P>(points: &[DVector<f64>], k: usize, to_point: impl Fn(&DVector<f64>) -> P) -> Vec<Vec<Neighbour>>
where
    P: rstar::Point<Scalar = f64>,
{
    let tree = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new(to_point(p), i))
            .collect(),
    );
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut nn: Vec<Neighbour> = tree
                .nearest_neighbor_iter_with_distance_2(&to_point(p))
                .filter(|(entry, _)| entry.data != i)
                .take(k)
                .map(|(entry, d2)| (entry.data, d2.sqrt()))
                .collect();
            nn.sort_by(by_distance);
            nn
        })
        .collect()
}

fn knn_exhaustive(points: &[DVector<f64>], k: usize) -> Vec<Vec<Neighbour>> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut nn: Vec<Neighbour> = points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, q)| (j, (p - q).norm()))
                .collect();
            nn.sort_by(by_distance);
            nn.truncate(k);
            nn
        })
        .collect()
}
