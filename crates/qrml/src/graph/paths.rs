//! Single-source shortest paths and the graph center.
//!
//! The shortest-path tree is an explicit artifact: distances, predecessors
//! and a rank array. Consumers never re-derive traversal order on their own.

use std::collections::VecDeque;

use petgraph::algo::dijkstra;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use super::types::ProximityGraph;

/// Relative slack when matching `dist(u) + w(u, v)` against `dist(v)`.
const PRED_REL_EPS: f64 = 1e-12;

/// Shortest-path tree rooted at `source`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShortestPaths {
    pub source: usize,
    /// Path length from `source`; `f64::INFINITY` when unreachable.
    pub dist: Vec<f64>,
    /// Tree parent; `None` for the source and unreachable vertices.
    pub pred: Vec<Option<usize>>,
    /// Reachable vertices sorted by `(dist, depth, index)`.
    pub order: Vec<usize>,
    /// `rank[v]` = position of `v` in `order` (`usize::MAX` if unreachable).
    pub rank: Vec<usize>,
}

impl ShortestPaths {
    /// Largest finite distance from the source.
    pub fn eccentricity(&self) -> f64 {
        self.dist
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max)
    }
}

/// Dijkstra from `source`.
///
/// Among equally short parents the one discovered first in a breadth-first
/// sweep of tight edges (neighbours in index order) wins.
pub fn shortest_paths(graph: &ProximityGraph, source: usize) -> ShortestPaths {
    let n = graph.len();
    let g = graph.to_petgraph();
    let map = dijkstra(&g, NodeIndex::new(source), None, |e| *e.weight());
    let mut dist = vec![f64::INFINITY; n];
    for (node, d) in map {
        dist[node.index()] = d;
    }

    // Walk tight edges (dist[u] + w == dist[v]) breadth-first; this yields an
    // acyclic tree even when zero-length edges join duplicate samples.
    let mut pred = vec![None; n];
    let mut depth = vec![usize::MAX; n];
    depth[source] = 0;
    let mut queue = VecDeque::from([source]);
    while let Some(u) = queue.pop_front() {
        for &(v, w) in graph.neighbours(u) {
            if depth[v] != usize::MAX {
                continue;
            }
            let tol = PRED_REL_EPS * dist[v].max(1.0);
            if (dist[u] + w - dist[v]).abs() <= tol {
                pred[v] = Some(u);
                depth[v] = depth[u] + 1;
                queue.push_back(v);
            }
        }
    }

    let mut order: Vec<usize> = (0..n).filter(|&v| depth[v] != usize::MAX).collect();
    order.sort_by(|&a, &b| {
        dist[a]
            .partial_cmp(&dist[b])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(depth[a].cmp(&depth[b]))
            .then(a.cmp(&b))
    });
    let mut rank = vec![usize::MAX; n];
    for (r, &v) in order.iter().enumerate() {
        rank[v] = r;
    }
    ShortestPaths {
        source,
        dist,
        pred,
        order,
        rank,
    }
}

/// Vertex of minimum eccentricity (ties towards the lowest index).
pub fn graph_center(graph: &ProximityGraph) -> Option<usize> {
    let g = graph.to_petgraph();
    (0..graph.len())
        .map(|s| {
            let ecc = dijkstra(&g, NodeIndex::new(s), None, |e| *e.weight())
                .into_values()
                .fold(0.0, f64::max);
            (s, ecc)
        })
        .min_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        })
        .map(|(s, _)| s)
}
