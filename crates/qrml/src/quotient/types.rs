//! Quotient identification artifacts.
//!
//! All positions are indices into the cleaned boundary cycle, not point ids.

use serde::{Deserialize, Serialize};

/// Short connections per cleaned-cycle position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortCircuits {
    /// `connections[i]`: positions (ascending) that `i` reaches through a
    /// graph edge while being more than `connection_tol` apart along the cycle.
    pub connections: Vec<Vec<usize>>,
    /// Positions with at least one short connection, ascending.
    pub points: Vec<usize>,
}

impl ShortCircuits {
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Run of short-circuit points, to be glued.
    Short,
    /// Free boundary between short edges.
    NonShort,
}

/// Contiguous run of cycle positions, in boundary order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryEdge {
    pub kind: EdgeKind,
    pub positions: Vec<usize>,
}

/// Split of the cleaned cycle into short and non-short edges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePartition {
    /// Length of the cleaned cycle.
    pub n: usize,
    /// Edges in boundary order.
    pub edges: Vec<BoundaryEdge>,
}

impl EdgePartition {
    pub fn short_edges(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.of_kind(EdgeKind::Short)
    }

    pub fn non_short_edges(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.of_kind(EdgeKind::NonShort)
    }

    fn of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &[usize]> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.kind == kind)
            .map(|e| e.positions.as_slice())
    }

    /// Every position in exactly one edge, each edge cyclically contiguous.
    pub fn is_exact_cover(&self) -> bool {
        if self.n == 0 {
            return self.edges.is_empty();
        }
        let mut seen = vec![false; self.n];
        for e in &self.edges {
            if e.positions.is_empty() {
                return false;
            }
            for w in e.positions.windows(2) {
                if (w[0] + 1) % self.n != w[1] {
                    return false;
                }
            }
            for &p in &e.positions {
                if p >= self.n || seen[p] {
                    return false;
                }
                seen[p] = true;
            }
        }
        seen.into_iter().all(|s| s)
    }
}

/// How two glued edges are identified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Same direction along the boundary (`a … a`, non-orientable).
    Aligned,
    /// Opposite directions (`a … a⁻¹`).
    Reversed,
}

/// A pair of refined short edges glued together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gluing {
    pub first: usize,
    pub second: usize,
    pub orientation: Orientation,
}

/// Pairings between refined short edges plus their assembly for drawing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GluingMap {
    pub pairs: Vec<Gluing>,
    /// Per refined edge: class id shared by transitively glued edges.
    pub class_of: Vec<Option<usize>>,
    /// Per refined edge: draw against the boundary direction.
    pub flipped: Vec<bool>,
}

impl GluingMap {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Everything the identifier derived from one cleaned boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotient {
    pub short_circuits: ShortCircuits,
    pub partition: EdgePartition,
    /// Short edges after splitting self-connected ones, as cycle positions.
    pub refined: Vec<Vec<usize>>,
    pub gluing: GluingMap,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotientOutcome {
    /// The cleaned boundary vanished: the whole boundary is one gluing.
    Collapsed,
    Identified(Quotient),
}
