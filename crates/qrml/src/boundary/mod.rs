//! Boundary of the planar projection: alpha shape, orientation, cleanup.
//!
//! Purpose
//! - Extract the single boundary cycle of the projected point set, oriented
//!   counter-clockwise, and strip loops that the proximity graph shows to be
//!   insignificant shortcuts.
//!
//! Method
//! - Delaunay triangulation (`spade`) of the 2-D coordinates; keep
//!   triangles with circumradius `<= 1/alpha`; boundary edges are directed
//!   triangle edges whose reverse is absent.
//! - The number of independent cycles is the cyclomatic number `E − V + C`
//!   of the boundary edges. More than one is a structural failure of the
//!   projection (`MultipleBoundaryCycles`); none means the boundary collapsed.
//! - Cleaning is `clean_cycle`; tear points are diagnostics only.
//!
//! Split: `delaunay.rs` (triangulation, alpha boundary), `clean.rs`
//! (cycle cleanup, tear points).

mod clean;
mod delaunay;

use std::collections::BTreeMap;

use nalgebra::Vector2;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use crate::cfg::BoundaryCfg;
use crate::error::{QrmlError, Result};
use crate::graph::ProximityGraph;
use crate::projection::Projection;

pub use clean::{clean_cycle, tear_points};
pub use delaunay::{alpha_boundary, circumradius, triangulate, Triangle};

/// Oriented boundary before and after cleaning, plus tear points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedBoundary {
    /// Counter-clockwise alpha-shape cycle; empty when there is none.
    pub raw: Vec<usize>,
    /// Cleaned cycle, a subsequence of `raw`; empty when collapsed.
    pub cycle: Vec<usize>,
    pub tear_points: Vec<usize>,
}

impl CleanedBoundary {
    /// The whole boundary cleaned away: one gluing covers everything.
    pub fn is_collapsed(&self) -> bool {
        self.cycle.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cycle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycle.is_empty()
    }
}

/// Number of independent cycles spanned by `edges` (cyclomatic number).
pub fn cycle_count(n: usize, edges: &[(usize, usize)]) -> usize {
    let mut uf = UnionFind::<usize>::new(n);
    let mut touched = vec![false; n];
    for &(u, v) in edges {
        uf.union(u, v);
        touched[u] = true;
        touched[v] = true;
    }
    let vertices = touched.iter().filter(|&&t| t).count();
    let mut roots: Vec<usize> = (0..n).filter(|&v| touched[v]).map(|v| uf.find(v)).collect();
    roots.sort_unstable();
    roots.dedup();
    (edges.len() + roots.len()).saturating_sub(vertices)
}

/// Twice the signed area of the polygon `cycle` (positive when CCW).
pub fn signed_area2(points: &[Vector2<f64>], cycle: &[usize]) -> f64 {
    let n = cycle.len();
    (0..n)
        .map(|k| {
            let (a, b) = (points[cycle[k]], points[cycle[(k + 1) % n]]);
            a.x * b.y - a.y * b.x
        })
        .sum()
}

/// Follow successor edges of a single directed cycle starting at its lowest vertex.
fn trace_cycle(edges: &[(usize, usize)]) -> Vec<usize> {
    let succ: BTreeMap<usize, usize> = edges.iter().copied().collect();
    let Some(&start) = succ.keys().next() else {
        return Vec::new();
    };
    let mut cycle = vec![start];
    let mut cur = start;
    while let Some(&next) = succ.get(&cur) {
        if next == start || cycle.len() > edges.len() {
            break;
        }
        cycle.push(next);
        cur = next;
    }
    cycle
}

/// Oriented alpha-shape cycle of the projection (empty when there is none).
pub fn boundary_cycle(projection: &Projection, alpha: f64) -> Result<Vec<usize>> {
    if projection.target_dim != 2 {
        return Err(QrmlError::DimensionMismatch {
            expected: 2,
            found: projection.target_dim,
        });
    }
    let points: Vec<Vector2<f64>> = projection
        .coords
        .iter()
        .map(|c| Vector2::new(c[0], c[1]))
        .collect();
    let triangles = triangulate(&points)?;
    let edges = alpha_boundary(&points, &triangles, 1.0 / alpha);
    let cycles = cycle_count(points.len(), &edges);
    tracing::debug!(
        triangles = triangles.len(),
        boundary_edges = edges.len(),
        cycles,
        alpha,
        "alpha shape computed"
    );
    if cycles > 1 {
        return Err(QrmlError::MultipleBoundaryCycles { cycles, alpha });
    }
    if cycles == 0 {
        return Ok(Vec::new());
    }
    let mut cycle = trace_cycle(&edges);
    if signed_area2(&points, &cycle) < 0.0 {
        cycle[1..].reverse();
    }
    Ok(cycle)
}

/// Extract, orient and clean the boundary of a planar projection.
pub fn extract(projection: &Projection, graph: &ProximityGraph, cfg: BoundaryCfg) -> Result<CleanedBoundary> {
    cfg.validate()?;
    if graph.len() != projection.len() {
        return Err(QrmlError::DimensionMismatch {
            expected: projection.len(),
            found: graph.len(),
        });
    }
    let raw = boundary_cycle(projection, cfg.alpha)?;
    let cycle = clean_cycle(&raw, graph, cfg.tol);
    let tear_points = tear_points(projection, graph, cfg.tear_ratio);
    if cycle.is_empty() {
        tracing::info!(raw = raw.len(), tol = cfg.tol, "boundary collapsed");
    } else {
        tracing::info!(
            raw = raw.len(),
            cleaned = cycle.len(),
            tear_points = tear_points.len(),
            "boundary extracted"
        );
    }
    Ok(CleanedBoundary {
        raw,
        cycle,
        tear_points,
    })
}

#[cfg(test)]
mod tests;
