use super::*;
use crate::graph::ShortestPaths;
use nalgebra::dvector;
use proptest::prelude::*;

fn flat_projection(points: &[[f64; 2]]) -> Projection {
    let n = points.len();
    Projection {
        coords: points.iter().map(|p| dvector![p[0], p[1]]).collect(),
        base: 0,
        target_dim: 2,
        paths: ShortestPaths {
            source: 0,
            dist: vec![0.0; n],
            pred: vec![None; n],
            order: (0..n).collect(),
            rank: (0..n).collect(),
        },
        solve_order: (0..n).collect(),
        references: vec![Vec::new(); n],
    }
}

fn lattice(w: usize, h: usize) -> Vec<[f64; 2]> {
    (0..h)
        .flat_map(|y| (0..w).map(move |x| [x as f64, y as f64]))
        .collect()
}

/// King-move graph on a `w × h` lattice with Euclidean weights.
fn king_graph(w: usize, h: usize) -> ProximityGraph {
    let mut edges = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let a = y * w + x;
            if x + 1 < w {
                edges.push((a, a + 1, 1.0));
            }
            if y + 1 < h {
                edges.push((a, a + w, 1.0));
                if x + 1 < w {
                    edges.push((a, a + w + 1, 2.0f64.sqrt()));
                }
                if x > 0 {
                    edges.push((a, a + w - 1, 2.0f64.sqrt()));
                }
            }
        }
    }
    ProximityGraph::from_edges(w * h, &edges).unwrap()
}

fn ring_graph(n: usize, chords: &[(usize, usize)]) -> ProximityGraph {
    let mut edges: Vec<(usize, usize, f64)> = (0..n).map(|i| (i, (i + 1) % n, 1.0)).collect();
    edges.extend(chords.iter().map(|&(u, v)| (u, v, 1.0)));
    ProximityGraph::from_edges(n, &edges).unwrap()
}

#[test]
fn lattice_rim_is_traced_counter_clockwise() {
    let proj = flat_projection(&lattice(4, 4));
    let raw = boundary_cycle(&proj, 1.0).unwrap();
    assert_eq!(raw, vec![0, 1, 2, 3, 7, 11, 15, 14, 13, 12, 8, 4]);
    let pts: Vec<Vector2<f64>> = lattice(4, 4).iter().map(|p| Vector2::new(p[0], p[1])).collect();
    assert!((signed_area2(&pts, &raw) - 18.0).abs() < 1e-12);
}

#[test]
fn diagonal_edges_cut_the_corners() {
    let proj = flat_projection(&lattice(4, 4));
    let graph = king_graph(4, 4);
    let cfg = BoundaryCfg {
        alpha: 1.0,
        ..BoundaryCfg::default()
    };
    let b = extract(&proj, &graph, cfg).unwrap();
    assert_eq!(b.raw.len(), 12);
    assert_eq!(b.cycle, vec![1, 2, 7, 11, 14, 13, 8, 4]);
    assert!(b.tear_points.is_empty());
    assert!(!b.is_collapsed());
}

#[test]
fn punctured_lattice_has_two_cycles() {
    let pts: Vec<[f64; 2]> = lattice(5, 5)
        .into_iter()
        .filter(|p| *p != [2.0, 2.0])
        .collect();
    let proj = flat_projection(&pts);
    assert_eq!(
        boundary_cycle(&proj, 1.25),
        Err(QrmlError::MultipleBoundaryCycles {
            cycles: 2,
            alpha: 1.25
        })
    );
    // A coarser alpha fills the hole.
    assert_eq!(boundary_cycle(&proj, 0.9).unwrap().len(), 16);
}

#[test]
fn small_radius_means_no_boundary() {
    let proj = flat_projection(&lattice(4, 4));
    let cfg = BoundaryCfg {
        alpha: 10.0,
        ..BoundaryCfg::default()
    };
    let b = extract(&proj, &king_graph(4, 4), cfg).unwrap();
    assert!(b.raw.is_empty());
    assert!(b.is_collapsed());
}

#[test]
fn boundary_needs_a_planar_projection() {
    let mut proj = flat_projection(&lattice(3, 3));
    proj.target_dim = 3;
    assert_eq!(
        boundary_cycle(&proj, 1.0),
        Err(QrmlError::DimensionMismatch {
            expected: 2,
            found: 3
        })
    );
}

#[test]
fn cyclomatic_counts() {
    assert_eq!(cycle_count(3, &[(0, 1), (1, 2), (2, 0)]), 1);
    assert_eq!(
        cycle_count(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]),
        2
    );
    assert_eq!(cycle_count(4, &[(0, 1), (1, 2)]), 0);
    assert_eq!(cycle_count(4, &[]), 0);
}

#[test]
fn chord_closes_a_loop() {
    let graph = ring_graph(10, &[(2, 5)]);
    let cycle: Vec<usize> = (0..10).collect();
    assert_eq!(clean_cycle(&cycle, &graph, 5), vec![0, 1, 2, 5, 6, 7, 8, 9]);
    // The chord spans three positions; a window of two does not see it.
    assert_eq!(clean_cycle(&cycle, &graph, 2), cycle);
}

#[test]
fn hub_collapses_the_cycle() {
    let chords: Vec<(usize, usize)> = (2..6).map(|j| (0, j)).collect();
    let graph = ring_graph(7, &chords);
    let cycle: Vec<usize> = (0..7).collect();
    assert!(clean_cycle(&cycle, &graph, 5).is_empty());
    // Without chords nothing is closable.
    assert_eq!(clean_cycle(&cycle, &ring_graph(7, &[]), 5), cycle);
}

#[test]
fn window_round_the_whole_cycle_collapses_it() {
    let cycle: Vec<usize> = (0..7).collect();
    let graph = ring_graph(7, &[]);
    // Offset 6 is the predecessor: its ring edge closes the cycle.
    assert!(clean_cycle(&cycle, &graph, 6).is_empty());
    assert!(clean_cycle(&cycle, &graph, 40).is_empty());
    assert_eq!(clean_cycle(&cycle, &graph, 5), cycle);
}

#[test]
fn stretched_neighbourhoods_are_tears() {
    let proj = flat_projection(&[[0.0, 0.0], [3.0, 0.0], [0.0, 1.0]]);
    let graph = ProximityGraph::from_edges(3, &[(0, 1, 1.0), (0, 2, 1.0)]).unwrap();
    assert_eq!(tear_points(&proj, &graph, 2.5), vec![1]);
    assert!(tear_points(&proj, &graph, 3.0).is_empty());
}

proptest! {
    #[test]
    fn cleaning_is_idempotent(
        n in 6usize..30,
        raw_chords in prop::collection::vec((0usize..30, 0usize..30), 0..12),
        tol in 2usize..8,
    ) {
        let chords: Vec<(usize, usize)> = raw_chords
            .into_iter()
            .map(|(u, v)| (u % n, v % n))
            .collect();
        let graph = ring_graph(n, &chords);
        let cycle: Vec<usize> = (0..n).collect();
        let once = clean_cycle(&cycle, &graph, tol);
        let twice = clean_cycle(&once, &graph, tol);
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.windows(2).all(|w| w[0] < w[1]));
    }
}
