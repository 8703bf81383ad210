use super::*;
use crate::cfg::GraphCfg;
use crate::graph::{build_graph, graph_center};
use proptest::prelude::*;

fn estimate_of(global: usize, n: usize) -> DimensionEstimate {
    DimensionEstimate {
        local: vec![Some(global); n],
        global,
        undefined: Vec::new(),
    }
}

/// `w × h` lattice in the plane with king-move edges.
fn king_grid(w: usize, h: usize) -> (Pointcloud, ProximityGraph) {
    let rows: Vec<[f64; 2]> = (0..h)
        .flat_map(|y| (0..w).map(move |x| [x as f64, y as f64]))
        .collect();
    let cloud = Pointcloud::from_rows(&rows).unwrap();
    let id = |x: usize, y: usize| y * w + x;
    let mut edges = Vec::new();
    for y in 0..h {
        for x in 0..w {
            for (dx, dy) in [(1isize, 0isize), (0, 1), (1, 1), (-1, 1)] {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let (a, b) = (id(x, y), id(nx as usize, ny as usize));
                edges.push((a, b, cloud.distance(a, b)));
            }
        }
    }
    let graph = ProximityGraph::from_edges(w * h, &edges).unwrap();
    (cloud, graph)
}

#[test]
fn planar_grid_is_reproduced_isometrically() {
    let (cloud, graph) = king_grid(5, 5);
    let base = graph_center(&graph).unwrap();
    assert_eq!(base, 12);
    let cfg = ProjectionCfg {
        k0: 1,
        ..ProjectionCfg::default()
    };
    let proj = project(&graph, &cloud, &estimate_of(2, 25), base, cfg).unwrap();
    assert_eq!(proj.target_dim, 2);
    assert!(proj.coord(base).norm() < 1e-12);
    for i in 0..25 {
        for j in 0..25 {
            let err = (proj.distance(i, j) - cloud.distance(i, j)).abs();
            assert!(err < 1e-6, "pair ({i}, {j}) off by {err}");
        }
    }
    assert!(proj.respects_order());
    assert_eq!(proj.solve_order.len(), 25);
}

#[test]
fn seeded_neighbours_keep_edge_lengths() {
    // A slightly bent sheet in R^3: seeds lose the bend but keep lengths.
    let (flat, graph) = king_grid(5, 5);
    let rows: Vec<Vec<f64>> = flat
        .points()
        .iter()
        .map(|p| vec![p[0], p[1], 0.05 * p[0] * p[0]])
        .collect();
    let cloud = Pointcloud::from_rows(&rows).unwrap();
    let proj = project(&graph, &cloud, &estimate_of(2, 25), 12, ProjectionCfg::default()).unwrap();
    for j in graph.neighbour_ids(12) {
        assert!((proj.coord(j).norm() - cloud.distance(12, j)).abs() < 1e-9);
        assert_eq!(proj.references[j], vec![12]);
    }
    assert!(proj.respects_order());
}

#[test]
fn references_start_with_the_predecessor() {
    let (cloud, graph) = king_grid(4, 4);
    let proj = project(&graph, &cloud, &estimate_of(2, 16), 5, ProjectionCfg::default()).unwrap();
    for q in 0..16 {
        if q == 5 || graph.has_edge(5, q) {
            continue;
        }
        assert_eq!(proj.references[q][0], proj.paths.pred[q].unwrap());
        assert_eq!(proj.references[q].len(), 3);
    }
}

#[test]
fn base_with_too_few_neighbours() {
    let cloud = Pointcloud::from_rows(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]).unwrap();
    let graph = ProximityGraph::from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0)]).unwrap();
    let err = project(&graph, &cloud, &estimate_of(2, 3), 0, ProjectionCfg::default()).unwrap_err();
    assert_eq!(
        err,
        QrmlError::InsufficientNeighbors {
            point: 0,
            found: 1,
            required: 2,
            target_dim: 2,
            k0: 0
        }
    );
}

#[test]
fn widened_pool_still_too_small() {
    // 0 is the base with neighbours 1 and 2; 3 hangs off 1.
    let cloud = Pointcloud::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [2.0, 0.0]]).unwrap();
    let graph = ProximityGraph::from_edges(4, &[(0, 1, 1.0), (0, 2, 1.0), (1, 3, 1.0)]).unwrap();
    let cfg = ProjectionCfg {
        k0: 1,
        ..ProjectionCfg::default()
    };
    let err = project(&graph, &cloud, &estimate_of(2, 4), 0, cfg).unwrap_err();
    assert_eq!(
        err,
        QrmlError::InsufficientNeighbors {
            point: 3,
            found: 2,
            required: 3,
            target_dim: 2,
            k0: 1
        }
    );
    // Without the extra reference the widened pool {0, 2} suffices.
    assert!(project(&graph, &cloud, &estimate_of(2, 4), 0, ProjectionCfg::default()).is_ok());
}

#[test]
fn seeded_points_further_out_are_not_references() {
    // 3 is a base neighbour, so it is seeded first, but its graph distance
    // exceeds that of 4, which it sits next to in the plane.
    let cloud =
        Pointcloud::from_rows(&[[0.0, 0.0], [0.1, 0.0], [0.0, 0.1], [0.3, 0.0], [0.2, 0.05]]).unwrap();
    let edges = [
        (0, 1, 0.1),
        (0, 2, 0.1),
        (1, 2, 0.15),
        (0, 3, 1.0),
        (1, 3, 1.0),
        (1, 4, 0.12),
    ];
    let graph = ProximityGraph::from_edges(5, &edges).unwrap();
    let proj = project(&graph, &cloud, &estimate_of(2, 5), 0, ProjectionCfg::default()).unwrap();
    assert!(proj.paths.dist[4] < proj.paths.dist[3]);
    assert_eq!(proj.references[3], vec![0]);
    assert_eq!(proj.references[4][0], 1);
    assert_eq!(proj.references[4].len(), 3);
    assert!(!proj.references[4].contains(&3));
    assert!(proj.respects_order());
}

#[test]
fn target_dimension_must_fit() {
    let est = estimate_of(0, 1);
    let no_force = ProjectionCfg {
        two_d: false,
        ..ProjectionCfg::default()
    };
    assert!(matches!(
        target_dim(&est, 3, no_force),
        Err(QrmlError::InvalidParameter { name: "target_dim", .. })
    ));
    assert!(matches!(
        target_dim(&est, 1, ProjectionCfg::default()),
        Err(QrmlError::InvalidParameter { name: "target_dim", .. })
    ));
    assert_eq!(target_dim(&estimate_of(3, 1), 4, no_force).unwrap(), 3);
    assert_eq!(target_dim(&estimate_of(3, 1), 4, ProjectionCfg::default()).unwrap(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn references_are_solved_first(
        jitter in prop::collection::vec((-0.2f64..0.2, -0.2f64..0.2, -0.1f64..0.1), 36),
        k0 in 0usize..3,
    ) {
        let rows: Vec<Vec<f64>> = jitter
            .iter()
            .enumerate()
            .map(|(i, &(dx, dy, dz))| vec![(i % 6) as f64 + dx, (i / 6) as f64 + dy, dz])
            .collect();
        let cloud = Pointcloud::from_rows(&rows).unwrap();
        let Ok(graph) = build_graph(&cloud, GraphCfg { k: 8, ..GraphCfg::default() }) else {
            return Ok(());
        };
        let base = graph_center(&graph).unwrap();
        let cfg = ProjectionCfg { k0, ..ProjectionCfg::default() };
        let Ok(proj) = project(&graph, &cloud, &estimate_of(2, 36), base, cfg) else {
            return Ok(());
        };
        prop_assert!(proj.respects_order());
        prop_assert_eq!(proj.solve_order.len(), 36);
        for (q, refs) in proj.references.iter().enumerate() {
            for &c in refs {
                prop_assert!(proj.paths.dist[c] < proj.paths.dist[q]);
            }
        }
        for q in 0..36 {
            if let Some(b) = proj.paths.pred[q] {
                prop_assert!(proj.paths.rank[b] < proj.paths.rank[q]);
            }
        }
    }
}
