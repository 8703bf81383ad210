//! Proximity graph (1-skeleton): construction, refinement, shortest paths.
//!
//! Purpose
//! - Approximate the sampled manifold's local connectivity by a sparse,
//!   weighted, undirected graph on the point indices.
//! - Provide the single-source shortest-path artifact (distances,
//!   predecessors, rank array) the projection stage is ordered by.
//!
//! Construction
//! - Start from the k-nearest-neighbour candidates; keep only "visible"
//!   neighbours (no other candidate sits in the way at an obtuse angle);
//!   then cut each neighbourhood at the first edge-length jump that also
//!   raises the local PCA dimension ("safe" edges). Edges are never added
//!   beyond the candidate set.
//! - The refined graph must stay connected, otherwise `DisconnectedGraph`.
//!
//! Split: `types.rs` (graph artifact), `build.rs` (builder), `paths.rs`
//! (Dijkstra artifact and graph center).

mod build;
mod paths;
mod types;

pub use build::{build_graph, safe_prefix, visible_neighbours};
pub use paths::{graph_center, shortest_paths, ShortestPaths};
pub use types::ProximityGraph;
