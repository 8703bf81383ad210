//! Loop-closing cleanup of a boundary cycle and tear-point detection.

use crate::graph::ProximityGraph;
use crate::projection::Projection;

/// Remove insignificant loops from an oriented cycle.
///
/// From each point, look ahead at up to `tol` following points (never
/// wrapping onto the point itself). Among those at offset `>= 2` that are
/// graph neighbours, the furthest one closes a loop: the points strictly
/// between are dropped. Scans repeat until one changes nothing, so the
/// result is a fixed point. Fewer than 3 remaining points means the cycle
/// collapsed; an empty vector is returned then.
///
/// Offsets are counted forward, so a window of `tol >= len - 1` reaches
/// round to the predecessor, whose boundary edge closes everything else.
/// This wrap is the only way a cycle can shrink below 3 points: any window
/// at least as long as the (partly cleaned) cycle collapses it.
pub fn clean_cycle(cycle: &[usize], graph: &ProximityGraph, tol: usize) -> Vec<usize> {
    let mut cur = cycle.to_vec();
    loop {
        if cur.len() < 3 {
            return Vec::new();
        }
        let mut changed = false;
        let mut i = 0;
        while i < cur.len() {
            let n = cur.len();
            let reach = tol.min(n - 1);
            let node = cur[i];
            let furthest = (2..=reach)
                .rev()
                .find(|&off| graph.has_edge(node, cur[(i + off) % n]));
            if let Some(off) = furthest {
                let drop: Vec<usize> = (1..off).map(|k| (i + k) % n).collect();
                let mut keep = vec![true; n];
                for &pos in &drop {
                    keep[pos] = false;
                }
                let removed_before = drop.iter().filter(|&&pos| pos < i).count();
                let mut pos = 0;
                cur.retain(|_| {
                    let k = keep[pos];
                    pos += 1;
                    k
                });
                i -= removed_before;
                changed = true;
                if cur.len() < 3 {
                    return Vec::new();
                }
            }
            i += 1;
        }
        if !changed {
            return cur;
        }
    }
}

/// Points whose projected neighbourhood is stretched by more than `ratio`.
///
/// For each point: mean projected distance to its graph neighbours divided
/// by the mean edge weight to them.
pub fn tear_points(projection: &Projection, graph: &ProximityGraph, ratio: f64) -> Vec<usize> {
    (0..graph.len())
        .filter(|&i| {
            let nbrs = graph.neighbours(i);
            if nbrs.is_empty() {
                return false;
            }
            let k = nbrs.len() as f64;
            let manifold = nbrs.iter().map(|&(_, w)| w).sum::<f64>() / k;
            let projected = nbrs
                .iter()
                .map(|&(j, _)| projection.distance(i, j))
                .sum::<f64>()
                / k;
            manifold > 0.0 && projected / manifold > ratio
        })
        .collect()
}
