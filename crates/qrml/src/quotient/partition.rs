//! Short circuits, the initial edge partition and its refinement.

use std::collections::BTreeMap;

use crate::graph::ProximityGraph;

use super::types::{BoundaryEdge, EdgeKind, EdgePartition, ShortCircuits};

/// Distance between two positions on a cycle of length `n`.
#[inline]
pub fn cyclic_distance(a: usize, b: usize, n: usize) -> usize {
    let d = a.abs_diff(b) % n;
    d.min(n - d)
}

/// Graph connections between cycle positions further apart than `connection_tol`.
pub fn short_circuits(cycle: &[usize], graph: &ProximityGraph, connection_tol: usize) -> ShortCircuits {
    let n = cycle.len();
    let position: BTreeMap<usize, usize> = cycle.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let connections: Vec<Vec<usize>> = cycle
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let mut out: Vec<usize> = graph
                .neighbour_ids(v)
                .filter_map(|w| position.get(&w).copied())
                .filter(|&j| cyclic_distance(i, j, n) > connection_tol)
                .collect();
            out.sort_unstable();
            out
        })
        .collect();
    let points = (0..n).filter(|&i| !connections[i].is_empty()).collect();
    ShortCircuits {
        connections,
        points,
    }
}

fn run_positions(start: usize, end: usize, n: usize) -> Vec<usize> {
    let len = (end + n - start) % n + 1;
    (0..len).map(|k| (start + k) % n).collect()
}

/// Split a cycle of length `n` into short and non-short edges.
///
/// `short_points` (ascending) closer than `quotient_tol` (inclusive) chain
/// into runs; runs of at least two points become short edges from their
/// first to their last position, the rest of the cycle non-short edges.
/// If no gap exceeds `quotient_tol` the whole cycle is one short edge.
pub fn partition(n: usize, short_points: &[usize], quotient_tol: usize) -> EdgePartition {
    let m = short_points.len();
    if n == 0 {
        return EdgePartition {
            n,
            edges: Vec::new(),
        };
    }
    let whole = |kind| EdgePartition {
        n,
        edges: vec![BoundaryEdge {
            kind,
            positions: (0..n).collect(),
        }],
    };
    if m == 0 {
        return whole(EdgeKind::NonShort);
    }
    let gap = |k: usize| (short_points[(k + 1) % m] + n - short_points[k] - 1) % n + 1;
    let Some(big) = (0..m).find(|&k| gap(k) > quotient_tol) else {
        return whole(EdgeKind::Short);
    };

    // Runs of short points, starting right after a large gap.
    let mut runs: Vec<(usize, usize, usize)> = Vec::new();
    for step in 0..m {
        let k = (big + 1 + step) % m;
        let p = short_points[k];
        match runs.last_mut() {
            Some(run) if step > 0 && gap((k + m - 1) % m) <= quotient_tol => {
                run.1 = p;
                run.2 += 1;
            }
            _ => runs.push((p, p, 1)),
        }
    }

    let shorts: Vec<(usize, usize)> = runs
        .iter()
        .filter(|r| r.2 >= 2)
        .map(|r| (r.0, r.1))
        .collect();
    if shorts.is_empty() {
        return whole(EdgeKind::NonShort);
    }
    let mut edges = Vec::with_capacity(2 * shorts.len());
    for (s, &(start, end)) in shorts.iter().enumerate() {
        edges.push(BoundaryEdge {
            kind: EdgeKind::Short,
            positions: run_positions(start, end, n),
        });
        let next_start = shorts[(s + 1) % shorts.len()].0;
        let (from, to) = ((end + 1) % n, (next_start + n - 1) % n);
        if (next_start + n - end) % n > 1 {
            edges.push(BoundaryEdge {
                kind: EdgeKind::NonShort,
                positions: run_positions(from, to, n),
            });
        }
    }
    EdgePartition { n, edges }
}

/// Split self-connected short edges at well-separated connection points.
///
/// Returns the refined short edges as cycle positions, in boundary order.
pub fn refine(partition: &EdgePartition, sc: &ShortCircuits, tol1: usize) -> Vec<Vec<usize>> {
    let n = partition.n;
    let mut refined = Vec::new();
    for edge in partition.short_edges() {
        let offset: BTreeMap<usize, usize> = edge.iter().enumerate().map(|(o, &p)| (p, o)).collect();
        let mut best: Option<(usize, Vec<usize>)> = None;
        for (o, &p) in edge.iter().enumerate() {
            let mut current = p;
            let mut chosen = Vec::new();
            for &c in sc.connections[p].iter().filter(|c| offset.contains_key(*c)) {
                if cyclic_distance(p, c, n) > tol1 && cyclic_distance(current, c, n) > tol1 {
                    chosen.push(offset[&c]);
                }
                current = c;
            }
            if chosen.len() > best.as_ref().map_or(0, |b| b.1.len()) {
                best = Some((o, chosen));
            }
        }
        let Some((winner, chosen)) = best else {
            refined.push(edge.to_vec());
            continue;
        };
        let mut splits = chosen;
        splits.push(winner);
        splits.sort_unstable();
        splits.dedup();

        let len = edge.len();
        if len == n {
            // Whole loop: cut at every split point, starting from the first.
            for k in 0..splits.len() {
                let from = splits[k];
                let to = if k + 1 < splits.len() { splits[k + 1] } else { splits[0] + len };
                refined.push((from..to).map(|o| edge[o % len]).collect());
            }
        } else {
            let mut cuts = vec![0];
            cuts.extend(splits.iter().skip(1).copied());
            cuts.push(len);
            for w in cuts.windows(2) {
                refined.push(edge[w[0]..w[1]].to_vec());
            }
        }
    }
    refined
}
