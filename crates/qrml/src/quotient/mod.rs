//! Quotient identification: which parts of the boundary are glued, and how.
//!
//! Purpose
//! - From the cleaned boundary cycle and the proximity graph, recover the
//!   boundary word of the sampled surface: short edges glued in pairs with
//!   a relative orientation, separated by free (non-short) edges.
//!
//! Steps
//! - Short circuits: graph connections between cycle positions further than
//!   `connection_tol` apart.
//! - Partition: chains of short-circuit points with gaps `<= quotient_tol`
//!   become short edges; everything else is non-short.
//! - Refinement: a short edge connected to itself is split at the point
//!   with the most well-separated (`> tol1`) internal connections.
//! - Matching: each refined edge is paired with the edge receiving most of
//!   its connections; orientation follows the order in which the partner
//!   is reached. An edge left paired only with itself is `SelfGluedEdge`.
//!
//! Limitations
//! - Quotients glued along more than one independent cycle (torus-like
//!   data) typically end in `SelfGluedEdge` for any `tol1`. This is
//!   surfaced, not retried.
//!
//! Split: `types.rs` (artifacts), `partition.rs` (short circuits,
//! partition, refinement), `glue.rs` (matching, orientation, assembly).

mod glue;
mod partition;
mod types;

use crate::boundary::CleanedBoundary;
use crate::cfg::QuotientCfg;
use crate::error::Result;
use crate::graph::ProximityGraph;

pub use glue::{assemble, match_edges, orientation_of, partners};
pub use partition::{cyclic_distance, partition, refine, short_circuits};
pub use types::{
    BoundaryEdge, EdgeKind, EdgePartition, Gluing, GluingMap, Orientation, Quotient, QuotientOutcome,
    ShortCircuits,
};

/// Identify the gluing pattern of a cleaned boundary.
pub fn identify(boundary: &CleanedBoundary, graph: &ProximityGraph, cfg: QuotientCfg) -> Result<QuotientOutcome> {
    cfg.validate()?;
    if boundary.is_collapsed() {
        tracing::info!("boundary collapsed; the whole boundary is one gluing");
        return Ok(QuotientOutcome::Collapsed);
    }
    let cycle = &boundary.cycle;
    let sc = short_circuits(cycle, graph, cfg.connection_tol);
    let part = partition(cycle.len(), &sc.points, cfg.quotient_tol);
    tracing::debug!(
        short_points = sc.points.len(),
        short_edges = part.short_edges().count(),
        non_short_edges = part.non_short_edges().count(),
        "boundary partitioned"
    );
    let refined = refine(&part, &sc, cfg.tol1);
    let pairs = match_edges(&refined, &sc, cfg.quotient_tol, cfg.tol1)?;
    let gluing = assemble(&pairs, refined.len())?;
    tracing::info!(
        refined_edges = refined.len(),
        pairs = gluing.pairs.len(),
        "gluing identified"
    );
    Ok(QuotientOutcome::Identified(Quotient {
        short_circuits: sc,
        partition: part,
        refined,
        gluing,
    }))
}
