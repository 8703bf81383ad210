//! Composition of the pure stages into one run.
//!
//! Each stage consumes the artifacts of the previous ones and returns a new
//! immutable artifact; the first failing stage ends the run with its error.

use serde::{Deserialize, Serialize};

use crate::boundary::{self, CleanedBoundary};
use crate::cfg::PipelineCfg;
use crate::cloud::Pointcloud;
use crate::dimension::{self, DimensionEstimate};
use crate::error::{QrmlError, Result};
use crate::graph::{build_graph, graph_center, ProximityGraph};
use crate::projection::{self, Projection};
use crate::quotient::{self, QuotientOutcome};

/// Everything one run produced, in stage order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artifacts {
    pub graph: ProximityGraph,
    pub dimension: DimensionEstimate,
    pub projection: Projection,
    pub boundary: CleanedBoundary,
    pub quotient: QuotientOutcome,
}

/// Run graph → dimension → projection → boundary → quotient on `cloud`.
pub fn run(cloud: &Pointcloud, cfg: &PipelineCfg) -> Result<Artifacts> {
    cfg.validate()?;
    tracing::info!(points = cloud.len(), dim = cloud.dim(), "pipeline started");

    let graph = build_graph(cloud, cfg.graph)?;
    tracing::info!(edges = graph.edge_count(), "proximity graph ready");

    let dimension = dimension::estimate(&graph, cloud, cfg.dimension)?;
    tracing::info!(
        global = dimension.global,
        undefined = dimension.undefined.len(),
        "dimension estimated"
    );

    let base = match cfg.projection.base_point {
        Some(b) => b,
        None => graph_center(&graph).ok_or(QrmlError::InsufficientData {
            points: 0,
            required: cfg.graph.k + 1,
            k: cfg.graph.k,
        })?,
    };
    let projection = projection::project(&graph, cloud, &dimension, base, cfg.projection)?;
    tracing::info!(base, target_dim = projection.target_dim, "projection ready");

    let boundary = boundary::extract(&projection, &graph, cfg.boundary)?;
    let quotient = quotient::identify(&boundary, &graph, cfg.quotient)?;
    match &quotient {
        QuotientOutcome::Collapsed => tracing::info!("pipeline finished: collapsed boundary"),
        QuotientOutcome::Identified(q) => {
            tracing::info!(pairs = q.gluing.pairs.len(), "pipeline finished")
        }
    }
    Ok(Artifacts {
        graph,
        dimension,
        projection,
        boundary,
        quotient,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quotient::{Gluing, Orientation};
    use crate::sample::{sample, SampleCfg, Shape};

    fn lattice(side: usize) -> Pointcloud {
        let rows: Vec<[f64; 2]> = (0..side)
            .flat_map(|y| (0..side).map(move |x| [x as f64, y as f64]))
            .collect();
        Pointcloud::from_rows(&rows).unwrap()
    }

    fn lattice_cfg() -> PipelineCfg {
        let mut cfg = PipelineCfg::default();
        cfg.projection.k0 = 1;
        cfg.boundary.alpha = 1.0;
        cfg
    }

    #[test]
    fn flat_lattice_is_a_disk() {
        let cloud = lattice(8);
        let out = run(&cloud, &lattice_cfg()).unwrap();
        assert!(out.graph.is_connected());
        assert_eq!(out.projection.target_dim, 2);
        assert!(out.projection.respects_order());
        assert!(!out.boundary.is_collapsed());
        assert!(out.boundary.cycle.len() < out.boundary.raw.len());
        match out.quotient {
            QuotientOutcome::Identified(q) => {
                assert!(q.short_circuits.points.is_empty());
                assert!(q.gluing.is_empty());
            }
            QuotientOutcome::Collapsed => panic!("lattice boundary should survive cleaning"),
        }
    }

    #[test]
    fn explicit_base_point_is_used() {
        let mut cfg = lattice_cfg();
        cfg.projection.base_point = Some(0);
        let out = run(&lattice(6), &cfg).unwrap();
        assert_eq!(out.projection.base, 0);
    }

    #[test]
    fn invalid_config_stops_before_any_stage() {
        let mut cfg = PipelineCfg::default();
        cfg.boundary.alpha = 0.0;
        assert!(matches!(
            run(&lattice(4), &cfg),
            Err(QrmlError::InvalidParameter { name: "alpha", .. })
        ));
    }

    #[test]
    fn tiny_cloud_is_insufficient() {
        assert!(matches!(
            run(&lattice(3), &PipelineCfg::default()),
            Err(QrmlError::InsufficientData { points: 9, .. })
        ));
    }

    fn sampled(shape: Shape) -> Pointcloud {
        sample(SampleCfg {
            shape,
            n: 400,
            seed: 1,
            noise: 0.0,
        })
        .unwrap()
    }

    fn sampled_cfg(tol: usize) -> PipelineCfg {
        let mut cfg = PipelineCfg::default();
        cfg.boundary.alpha = 1.0;
        cfg.boundary.tol = tol;
        cfg
    }

    fn quotient_of(out: Artifacts) -> crate::quotient::Quotient {
        match out.quotient {
            QuotientOutcome::Identified(q) => q,
            QuotientOutcome::Collapsed => panic!("boundary collapsed unexpectedly"),
        }
    }

    #[test]
    fn sampled_disk_has_no_short_circuits() {
        let out = run(&sampled(Shape::Disk), &sampled_cfg(5)).unwrap();
        assert!(out.projection.respects_order());
        let q = quotient_of(out);
        assert!(q.short_circuits.points.is_empty());
        assert!(q.gluing.pairs.is_empty());
    }

    #[test]
    fn sampled_cylinder_glues_its_sides_reversed() {
        let out = run(&sampled(Shape::Cylinder), &sampled_cfg(5)).unwrap();
        assert!(out.projection.respects_order());
        let q = quotient_of(out);
        assert_eq!(
            q.gluing.pairs,
            vec![Gluing {
                first: 0,
                second: 1,
                orientation: Orientation::Reversed
            }]
        );
    }

    #[test]
    fn sampled_sphere_collapses_once_the_window_spans_the_boundary() {
        let cloud = sampled(Shape::Sphere);
        let narrow = run(&cloud, &sampled_cfg(10)).unwrap();
        assert!(!narrow.boundary.is_collapsed());
        assert!(narrow.boundary.cycle.len() < narrow.boundary.raw.len());

        let wide = run(&cloud, &sampled_cfg(narrow.boundary.raw.len())).unwrap();
        assert!(wide.boundary.is_collapsed());
        assert!(matches!(wide.quotient, QuotientOutcome::Collapsed));
    }
}
