//! Normal coordinates by shortest-path-ordered local reconstruction.
//!
//! Purpose
//! - Map every point to `R^t` (`t` = target dimension, 2 for the boundary
//!   stages) so that local angles and edge lengths around each point's
//!   shortest-path predecessor are preserved as well as possible.
//!
//! Algorithm
//! - Dijkstra from the base point fixes the processing order (the rank array
//!   of `graph::ShortestPaths`). The base sits at the origin; its neighbours
//!   are seeded by projecting their offsets onto the leading principal axes of
//!   the base neighbourhood, rescaled to the true edge length.
//! - Every other point `q` with predecessor `b` draws reference points from
//!   the neighbours of `b` strictly closer to the base than `q`, widened to
//!   their such neighbours (excluding `b`) when fewer than `t + k0` are
//!   available, and keeps the
//!   `t + k0` closest to `q` in the ambient space. The offset `x = q' − b'`
//!   solves `min ‖A x − y‖²` on the sphere `‖x‖ = ‖q − b‖`, where `y_i` is the
//!   ambient cosine between `c_i − b` and `q − b` and row `A_i` is the placed
//!   direction `(c'_i − b') / ‖c'_i − b'‖` scaled by `1 / ‖q − b‖`.
//!
//! Invariants
//! - A point is solved only after its predecessor and every reference point,
//!   and every reference point is strictly closer to the base (a predecessor
//!   across a zero-length edge may tie); `Projection::references`,
//!   `Projection::solve_order` and `Projection::paths` make this checkable.
//!
//! Split: `solve.rs` (sphere-constrained least squares).

mod solve;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::cfg::ProjectionCfg;
use crate::cloud::Pointcloud;
use crate::dimension::DimensionEstimate;
use crate::error::{QrmlError, Result};
use crate::graph::{shortest_paths, ProximityGraph, ShortestPaths};
use crate::pca::Pca;

pub use solve::sphere_lsq;

/// Offsets shorter than this are treated as coincident points.
const COINCIDENT_EPS: f64 = 1e-12;

/// Low-dimensional coordinates plus the ordering artifact they were built from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Projection {
    /// Coordinates in `R^target_dim`, indexed by point.
    pub coords: Vec<DVector<f64>>,
    pub base: usize,
    pub target_dim: usize,
    /// Shortest-path tree from `base`: distances, predecessors, rank array.
    pub paths: ShortestPaths,
    /// Points in the order their coordinates were fixed.
    pub solve_order: Vec<usize>,
    /// Per point: predecessor followed by the selected reference points
    /// (empty for the base, `[base]` for seeded neighbours).
    pub references: Vec<Vec<usize>>,
}

impl Projection {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coord(&self, i: usize) -> &DVector<f64> {
        &self.coords[i]
    }

    /// Euclidean distance between two projected points.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        (&self.coords[i] - &self.coords[j]).norm()
    }

    /// Whether every point was solved after all of its references and each
    /// reference lies strictly closer to the base.
    pub fn respects_order(&self) -> bool {
        let mut pos = vec![usize::MAX; self.len()];
        for (r, &v) in self.solve_order.iter().enumerate() {
            pos[v] = r;
        }
        let dist = &self.paths.dist;
        let closer = |c: usize, q: usize| {
            dist[c] < dist[q] || (self.paths.pred[q] == Some(c) && dist[c] <= dist[q])
        };
        self.references.iter().enumerate().all(|(q, refs)| {
            refs.iter()
                .all(|&c| pos[c] != usize::MAX && pos[c] < pos[q] && closer(c, q))
        })
    }
}

/// Target dimension of a projection run.
pub fn target_dim(estimate: &DimensionEstimate, ambient: usize, cfg: ProjectionCfg) -> Result<usize> {
    let t = if cfg.two_d { 2 } else { estimate.global };
    if t == 0 || t > ambient {
        return Err(QrmlError::invalid(
            "target_dim",
            format!("{t} is outside 1..={ambient}"),
        ));
    }
    Ok(t)
}

/// Compute normal coordinates of `cloud` anchored at `base`.
pub fn project(
    graph: &ProximityGraph,
    cloud: &Pointcloud,
    estimate: &DimensionEstimate,
    base: usize,
    cfg: ProjectionCfg,
) -> Result<Projection> {
    cfg.validate()?;
    let n = cloud.len();
    if graph.len() != n {
        return Err(QrmlError::DimensionMismatch {
            expected: n,
            found: graph.len(),
        });
    }
    if base >= n {
        return Err(QrmlError::invalid(
            "base_point",
            format!("{base} is out of range for {n} points"),
        ));
    }
    let t = target_dim(estimate, cloud.dim(), cfg)?;

    let paths = shortest_paths(graph, base);
    if paths.order.len() < n {
        let unreachable = paths.rank.iter().position(|&r| r == usize::MAX).unwrap_or(0);
        return Err(QrmlError::invalid(
            "graph",
            format!("point {unreachable} is unreachable from base {base}"),
        ));
    }

    let mut coords: Vec<Option<DVector<f64>>> = vec![None; n];
    let mut references = vec![Vec::new(); n];
    let mut solve_order = Vec::with_capacity(n);

    coords[base] = Some(DVector::zeros(t));
    solve_order.push(base);
    seed_neighbours(graph, cloud, base, t, cfg.k0, &mut coords)?;
    for &j in &paths.order {
        if j != base && coords[j].is_some() {
            references[j] = vec![base];
            solve_order.push(j);
        }
    }

    for &q in &paths.order {
        if coords[q].is_some() {
            continue;
        }
        let Some(b) = paths.pred[q] else {
            continue;
        };
        let pool = reference_pool(graph, cloud, &coords, &paths.dist, q, b, t, cfg.k0)?;
        let b_coord = coords[b].clone().unwrap_or_else(|| DVector::zeros(t));
        let x = solve_offset(cloud, &coords, q, b, &b_coord, &pool, t);
        coords[q] = Some(b_coord + x);
        let mut refs = Vec::with_capacity(pool.len() + 1);
        refs.push(b);
        refs.extend_from_slice(&pool);
        references[q] = refs;
        solve_order.push(q);
    }

    let coords: Vec<DVector<f64>> = coords
        .into_iter()
        .map(|c| c.unwrap_or_else(|| DVector::zeros(t)))
        .collect();
    tracing::info!(
        base,
        target_dim = t,
        k0 = cfg.k0,
        radius = paths.eccentricity(),
        "projection computed"
    );
    Ok(Projection {
        coords,
        base,
        target_dim: t,
        paths,
        solve_order,
        references,
    })
}

/// Place the neighbours of `base` in the span of the leading principal axes.
fn seed_neighbours(
    graph: &ProximityGraph,
    cloud: &Pointcloud,
    base: usize,
    t: usize,
    k0: usize,
    coords: &mut [Option<DVector<f64>>],
) -> Result<()> {
    let nbrs: Vec<usize> = graph.neighbour_ids(base).collect();
    if nbrs.len() < t {
        return Err(QrmlError::InsufficientNeighbors {
            point: base,
            found: nbrs.len(),
            required: t,
            target_dim: t,
            k0,
        });
    }
    let p = cloud.point(base);
    let offsets: Vec<DVector<f64>> = nbrs.iter().map(|&j| cloud.point(j) - p).collect();
    let Some(pca) = Pca::fit(&offsets) else {
        // Isolated base with a zero target is rejected above.
        return Ok(());
    };
    let axes = pca.axes.columns(0, t);
    for (&j, off) in nbrs.iter().zip(&offsets) {
        let len = off.norm();
        let proj = axes.transpose() * off;
        let pn = proj.norm();
        let c = if pn > COINCIDENT_EPS {
            proj * (len / pn)
        } else {
            let mut e = DVector::zeros(t);
            e[0] = len;
            e
        };
        coords[j] = Some(c);
    }
    Ok(())
}

/// The `t + k0` placed points closest to `q` around predecessor `b`, all
/// strictly closer to the base than `q`.
#[allow(clippy::too_many_arguments)]
fn reference_pool(
    graph: &ProximityGraph,
    cloud: &Pointcloud,
    coords: &[Option<DVector<f64>>],
    dist: &[f64],
    q: usize,
    b: usize,
    t: usize,
    k0: usize,
) -> Result<Vec<usize>> {
    let m = t + k0;
    // Seeded base neighbours are placed early but may lie further out than q.
    let placed = |j: usize| coords[j].is_some() && dist[j] < dist[q];
    let mut pool: Vec<usize> = graph.neighbour_ids(b).filter(|&j| placed(j)).collect();
    if pool.len() < m {
        let direct = pool.clone();
        for c in direct {
            for j in graph.neighbour_ids(c) {
                if j != b && placed(j) && !pool.contains(&j) {
                    pool.push(j);
                }
            }
        }
    }
    if pool.len() < m {
        return Err(QrmlError::InsufficientNeighbors {
            point: q,
            found: pool.len(),
            required: m,
            target_dim: t,
            k0,
        });
    }
    pool.sort_by(|&i, &j| {
        cloud
            .distance(q, i)
            .partial_cmp(&cloud.distance(q, j))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(i.cmp(&j))
    });
    pool.truncate(m);
    Ok(pool)
}

/// Offset `q' − b'` from the sphere-constrained least-squares fit.
fn solve_offset(
    cloud: &Pointcloud,
    coords: &[Option<DVector<f64>>],
    q: usize,
    b: usize,
    b_coord: &DVector<f64>,
    pool: &[usize],
    t: usize,
) -> DVector<f64> {
    let qb = cloud.point(q) - cloud.point(b);
    let r = qb.norm();
    if r <= COINCIDENT_EPS {
        return DVector::zeros(t);
    }
    let mut rows: Vec<(DVector<f64>, f64)> = Vec::with_capacity(pool.len());
    for &c in pool {
        let Some(c_coord) = coords[c].as_ref() else {
            continue;
        };
        let u = cloud.point(c) - cloud.point(b);
        let u_prime = c_coord - b_coord;
        let (un, upn) = (u.norm(), u_prime.norm());
        if un <= COINCIDENT_EPS || upn <= COINCIDENT_EPS {
            continue;
        }
        rows.push((u_prime / (upn * r), u.dot(&qb) / (un * r)));
    }
    let a = nalgebra::DMatrix::from_fn(rows.len(), t, |i, j| rows[i].0[j]);
    let y = DVector::from_iterator(rows.len(), rows.iter().map(|(_, yi)| *yi));
    sphere_lsq(&a, &y, r)
}

#[cfg(test)]
mod tests;
