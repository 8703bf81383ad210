//! The proximity graph artifact.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};

use crate::error::{QrmlError, Result};

/// Weighted undirected graph on point indices `0..n`.
///
/// Adjacency lists are sorted by neighbour index and symmetric.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProximityGraph {
    adj: Vec<Vec<(usize, f64)>>,
    /// Per point: local PCA dimension after each prefix of the safe pass.
    pub safe_dims: Vec<Vec<usize>>,
}

impl ProximityGraph {
    /// Build from explicit undirected edges `(u, v, weight)`.
    ///
    /// Self-loops are dropped; duplicate edges keep the last weight.
    pub fn from_edges(n: usize, edges: &[(usize, usize, f64)]) -> Result<Self> {
        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for &(u, v, w) in edges {
            if u >= n || v >= n {
                return Err(QrmlError::invalid(
                    "edges",
                    format!("edge ({u}, {v}) out of range for {n} vertices"),
                ));
            }
            if !(w.is_finite() && w >= 0.0) {
                return Err(QrmlError::invalid(
                    "edges",
                    format!("edge ({u}, {v}) has invalid weight {w}"),
                ));
            }
            if u == v {
                continue;
            }
            adj[u].push((v, w));
            adj[v].push((u, w));
        }
        for list in &mut adj {
            list.reverse();
            list.sort_by_key(|&(j, _)| j);
            list.dedup_by_key(|&mut (j, _)| j);
        }
        Ok(Self {
            adj,
            safe_dims: vec![Vec::new(); n],
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.adj.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    /// Neighbours of `i` with edge weights, ascending by index.
    #[inline]
    pub fn neighbours(&self, i: usize) -> &[(usize, f64)] {
        &self.adj[i]
    }

    pub fn neighbour_ids(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.adj[i].iter().map(|&(j, _)| j)
    }

    #[inline]
    pub fn degree(&self, i: usize) -> usize {
        self.adj[i].len()
    }

    pub fn weight(&self, i: usize, j: usize) -> Option<f64> {
        self.adj[i]
            .binary_search_by_key(&j, |&(k, _)| k)
            .ok()
            .map(|pos| self.adj[i][pos].1)
    }

    #[inline]
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        self.weight(i, j).is_some()
    }

    /// Undirected edges `(u, v, w)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.adj.iter().enumerate().flat_map(|(u, list)| {
            list.iter()
                .filter(move |&&(v, _)| u < v)
                .map(move |&(v, w)| (u, v, w))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.adj.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// petgraph view with node `i` ↔ `NodeIndex::new(i)`.
    pub fn to_petgraph(&self) -> UnGraph<(), f64> {
        let mut g = UnGraph::with_capacity(self.len(), self.edge_count());
        for _ in 0..self.len() {
            g.add_node(());
        }
        for (u, v, w) in self.edges() {
            g.add_edge(NodeIndex::new(u), NodeIndex::new(v), w);
        }
        g
    }

    /// Lowest vertex not reachable from vertex 0, if any.
    pub fn first_unreachable(&self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let g = self.to_petgraph();
        let mut seen = vec![false; self.len()];
        let mut bfs = Bfs::new(&g, NodeIndex::new(0));
        while let Some(nx) = bfs.next(&g) {
            seen[nx.index()] = true;
        }
        seen.iter().position(|s| !s)
    }

    pub fn is_connected(&self) -> bool {
        self.first_unreachable().is_none()
    }

    pub(crate) fn from_adjacency(adj: Vec<Vec<(usize, f64)>>, safe_dims: Vec<Vec<usize>>) -> Self {
        Self { adj, safe_dims }
    }
}
