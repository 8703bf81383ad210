//! Matching refined short edges, their relative orientation, and assembly
//! of the pairs into glued classes.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{QrmlError, Result};

use super::types::{Gluing, GluingMap, Orientation, ShortCircuits};

/// Owner edge of every cycle position covered by `refined`.
fn owners(refined: &[Vec<usize>]) -> BTreeMap<usize, usize> {
    refined
        .iter()
        .enumerate()
        .flat_map(|(e, edge)| edge.iter().map(move |&p| (p, e)))
        .collect()
}

/// Partner of every refined edge: the edge receiving most of its short connections.
///
/// Ties go to the lower edge index; an edge without connections is its own partner.
pub fn partners(refined: &[Vec<usize>], sc: &ShortCircuits) -> Vec<usize> {
    let owner = owners(refined);
    refined
        .iter()
        .enumerate()
        .map(|(e, edge)| {
            let reached: BTreeSet<usize> = edge
                .iter()
                .flat_map(|&p| sc.connections[p].iter().copied())
                .collect();
            let mut counts = vec![0usize; refined.len()];
            for p in reached {
                if let Some(&o) = owner.get(&p) {
                    counts[o] += 1;
                }
            }
            let mut best = e;
            let mut best_count = 0;
            for (o, &c) in counts.iter().enumerate() {
                if c > best_count {
                    best = o;
                    best_count = c;
                }
            }
            best
        })
        .collect()
}

/// Relative orientation of `first` and `second` from their connection pattern.
///
/// Walks `first`; every point with connections into `second` contributes the
/// range of partner offsets it reaches. Against the previous such range a
/// later maximum votes aligned, an earlier minimum votes reversed.
pub fn orientation_of(first: &[usize], second: &[usize], sc: &ShortCircuits) -> Orientation {
    let offset: BTreeMap<usize, usize> = second.iter().enumerate().map(|(o, &p)| (p, o)).collect();
    let (mut aligned, mut reversed) = (0usize, 0usize);
    let mut prev: Option<(usize, usize)> = None;
    for &p in first {
        let mut hits = sc.connections[p].iter().filter_map(|c| offset.get(c).copied());
        let Some(h) = hits.next() else {
            continue;
        };
        let (lo, hi) = hits.fold((h, h), |(lo, hi), o| (lo.min(o), hi.max(o)));
        if let Some((prev_lo, prev_hi)) = prev {
            if hi >= prev_lo {
                aligned += 1;
            }
            if lo <= prev_hi {
                reversed += 1;
            }
        }
        prev = Some((lo, hi));
    }
    if aligned > reversed {
        Orientation::Aligned
    } else {
        Orientation::Reversed
    }
}

/// Pair refined edges with their partners.
///
/// Pairs are unordered, deduplicated and sorted. An edge whose only pairing
/// is with itself cannot be glued and fails with `SelfGluedEdge`.
pub fn match_edges(
    refined: &[Vec<usize>],
    sc: &ShortCircuits,
    quotient_tol: usize,
    tol1: usize,
) -> Result<Vec<Gluing>> {
    let partner = partners(refined, sc);
    let mut proper = BTreeSet::new();
    let mut lonely = BTreeSet::new();
    for (e, &o) in partner.iter().enumerate() {
        if e == o {
            lonely.insert(e);
        } else {
            proper.insert((e.min(o), e.max(o)));
        }
    }
    let paired: BTreeSet<usize> = proper.iter().flat_map(|&(a, b)| [a, b]).collect();
    if let Some(&edge) = lonely.iter().find(|e| !paired.contains(e)) {
        return Err(QrmlError::SelfGluedEdge {
            edge,
            quotient_tol,
            tol1,
        });
    }
    Ok(proper
        .into_iter()
        .map(|(first, second)| Gluing {
            first,
            second,
            orientation: orientation_of(&refined[first], &refined[second], sc),
        })
        .collect())
}

/// Union-find with the flip parity of every node relative to its root.
struct ParityForest {
    parent: Vec<usize>,
    parity: Vec<bool>,
}

impl ParityForest {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            parity: vec![false; n],
        }
    }

    fn find(&mut self, v: usize) -> (usize, bool) {
        let p = self.parent[v];
        if p == v {
            return (v, false);
        }
        let (root, up) = self.find(p);
        self.parent[v] = root;
        self.parity[v] ^= up;
        (root, self.parity[v])
    }
}

/// Group glued edges into classes and pick a drawing direction per edge.
///
/// Within a class the lowest edge keeps the boundary direction; a reversed
/// gluing flips its partner relative to it, an aligned one does not. A
/// pair contradicting the flips already implied fails with
/// `IncompatibleGluing`. Class ids follow the lowest edge of each class.
pub fn assemble(pairs: &[Gluing], count: usize) -> Result<GluingMap> {
    let mut forest = ParityForest::new(count);
    let mut glued = vec![false; count];
    for g in pairs {
        let differ = g.orientation == Orientation::Reversed;
        let (ra, pa) = forest.find(g.first);
        let (rb, pb) = forest.find(g.second);
        glued[g.first] = true;
        glued[g.second] = true;
        if ra == rb {
            if (pa ^ pb) != differ {
                return Err(QrmlError::IncompatibleGluing {
                    first: g.first,
                    second: g.second,
                });
            }
            continue;
        }
        let (root, child) = (ra.min(rb), ra.max(rb));
        forest.parent[child] = root;
        forest.parity[child] = pa ^ pb ^ differ;
    }

    let mut class_of = vec![None; count];
    let mut flipped = vec![false; count];
    let mut ids: BTreeMap<usize, usize> = BTreeMap::new();
    for e in (0..count).filter(|&e| glued[e]) {
        let (root, parity) = forest.find(e);
        let next = ids.len();
        class_of[e] = Some(*ids.entry(root).or_insert(next));
        flipped[e] = parity;
    }
    Ok(GluingMap {
        pairs: pairs.to_vec(),
        class_of,
        flipped,
    })
}
