//! Proximity graph construction from a point cloud.

use std::collections::BTreeMap;

use nalgebra::DVector;
use petgraph::algo::connected_components;

use crate::cfg::GraphCfg;
use crate::cloud::{Neighbour, Pointcloud};
use crate::error::{QrmlError, Result};
use crate::pca::explained_variance_ratio;

use super::types::ProximityGraph;

/// Build and refine the 1-skeleton of `cloud`.
///
/// Fails with `InsufficientData` for fewer than `k + 1` points and with
/// `DisconnectedGraph` when refinement leaves more than one component.
pub fn build_graph(cloud: &Pointcloud, cfg: GraphCfg) -> Result<ProximityGraph> {
    cfg.validate()?;
    let knn = cloud.k_nearest(cfg.k)?;
    let n = cloud.len();

    let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
    let mut safe_dims = Vec::with_capacity(n);
    for (idx, candidates) in knn.iter().enumerate() {
        let visible = visible_neighbours(cloud, idx, candidates);
        let (keep, dims) = safe_prefix(cloud, idx, &visible, cfg);
        for &(j, d) in &visible[..keep] {
            adj[idx].insert(j, d);
            adj[j].insert(idx, d);
        }
        safe_dims.push(dims);
    }
    let graph = ProximityGraph::from_adjacency(
        adj.into_iter().map(|m| m.into_iter().collect()).collect(),
        safe_dims,
    );

    if let Some(vertex) = graph.first_unreachable() {
        let components = connected_components(&graph.to_petgraph());
        tracing::warn!(vertex, components, "refined proximity graph is disconnected");
        return Err(QrmlError::DisconnectedGraph {
            vertex,
            components,
            threshold_var: cfg.threshold_var,
            edge_sen: cfg.edge_sen,
        });
    }
    tracing::debug!(
        points = n,
        edges = graph.edge_count(),
        k = cfg.k,
        "proximity graph built"
    );
    Ok(graph)
}

/// Candidates of `idx` not hidden behind another candidate.
///
/// `y` is hidden when some other candidate `z` sees `idx` and `y` at an
/// obtuse angle, i.e. `(p - z)·(y - z) < 0`. Input order is preserved.
pub fn visible_neighbours(cloud: &Pointcloud, idx: usize, candidates: &[Neighbour]) -> Vec<Neighbour> {
    let p = cloud.point(idx);
    candidates
        .iter()
        .filter(|&&(y, _)| {
            let py = cloud.point(y);
            candidates.iter().all(|&(z, _)| {
                if z == y {
                    return true;
                }
                let pz = cloud.point(z);
                (p - pz).dot(&(py - pz)) >= 0.0
            })
        })
        .copied()
        .collect()
}

/// Length of the safe prefix of `visible` (ascending by distance) and the
/// local dimension recorded after each prefix of length `2..`.
///
/// The prefix is cut before the first neighbour whose inclusion both raises
/// the PCA dimension of the offset vectors and follows a distance jump
/// larger than `edge_sen · mean distance`.
pub fn safe_prefix(
    cloud: &Pointcloud,
    idx: usize,
    visible: &[Neighbour],
    cfg: GraphCfg,
) -> (usize, Vec<usize>) {
    let m = visible.len();
    if m == 0 {
        return (0, Vec::new());
    }
    let p = cloud.point(idx);
    let mean = visible.iter().map(|&(_, d)| d).sum::<f64>() / m as f64;
    let threshold_edge = cfg.edge_sen * mean;
    let offsets: Vec<DVector<f64>> = visible.iter().map(|&(j, _)| cloud.point(j) - p).collect();

    let mut dims = Vec::with_capacity(m.saturating_sub(1));
    let mut prev = 0;
    for j in 2..=m {
        let dim = explained_variance_ratio(&offsets[..j])
            .iter()
            .filter(|&&r| r >= cfg.threshold_var)
            .count();
        dims.push(dim);
        if j > 2 && dim > prev && visible[j - 1].1 - visible[j - 2].1 > threshold_edge {
            return (j - 1, dims);
        }
        prev = dim;
    }
    (m, dims)
}
