//! Intrinsic dimension estimation on the proximity graph.
//!
//! Purpose
//! - Estimate a local dimension per point from the PCA spectrum of its graph
//!   neighbourhood, and one global dimension (the mode) for the projection.
//!
//! Method
//! - Local: explained-variance ratios of the neighbours' coordinates, knee
//!   located by Kneedle (convex, decreasing, sensitivity `s1`); dimension is
//!   knee index + 1, or 0 without a knee. A single neighbour counts as 1.
//! - Global: mode of the local estimates, ties towards the smaller value.
//!   Points with fewer neighbours than the global estimate get an undefined
//!   local estimate and a diagnostic; the mode is then recomputed over the
//!   points that remain defined.
//!
//! Undefined local dimensions are non-fatal: they are logged at `warn` and
//! returned to the caller alongside the estimate.

mod knee;

use std::collections::BTreeMap;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::cfg::DimensionCfg;
use crate::cloud::Pointcloud;
use crate::error::{QrmlError, Result};
use crate::graph::ProximityGraph;
use crate::pca::explained_variance_ratio;

pub use knee::knee_convex_decreasing;

/// Non-fatal diagnostic: `point` has too few neighbours for the global estimate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndefinedLocalDimension {
    pub point: usize,
    pub neighbours: usize,
    pub required: usize,
}

/// Local and global intrinsic dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionEstimate {
    /// Per point; `None` where the estimate is undefined.
    pub local: Vec<Option<usize>>,
    pub global: usize,
    pub undefined: Vec<UndefinedLocalDimension>,
}

impl DimensionEstimate {
    /// Number of points with a defined local estimate.
    pub fn defined_count(&self) -> usize {
        self.local.iter().filter(|d| d.is_some()).count()
    }
}

/// Local dimension of a neighbourhood given by its points.
pub fn local_dimension(neighbours: &[DVector<f64>], s1: f64) -> usize {
    match neighbours.len() {
        0 => 0,
        1 => 1,
        _ => {
            let ratios = explained_variance_ratio(neighbours);
            knee_convex_decreasing(&ratios, s1).map_or(0, |k| k + 1)
        }
    }
}

/// Estimate local and global dimension of `cloud` over `graph`.
pub fn estimate(graph: &ProximityGraph, cloud: &Pointcloud, cfg: DimensionCfg) -> Result<DimensionEstimate> {
    cfg.validate()?;
    if graph.len() != cloud.len() {
        return Err(QrmlError::DimensionMismatch {
            expected: cloud.len(),
            found: graph.len(),
        });
    }

    let raw: Vec<usize> = (0..graph.len())
        .map(|i| {
            let nbrs: Vec<DVector<f64>> = graph
                .neighbour_ids(i)
                .map(|j| cloud.point(j).clone())
                .collect();
            local_dimension(&nbrs, cfg.s1)
        })
        .collect();

    let first = mode(raw.iter().copied()).unwrap_or(0);
    let mut local: Vec<Option<usize>> = raw.into_iter().map(Some).collect();
    let mut undefined = Vec::new();
    for (point, slot) in local.iter_mut().enumerate() {
        let neighbours = graph.degree(point);
        if neighbours < first {
            *slot = None;
            tracing::warn!(point, neighbours, required = first, "undefined local dimension");
            undefined.push(UndefinedLocalDimension {
                point,
                neighbours,
                required: first,
            });
        }
    }
    let global = mode(local.iter().flatten().copied()).unwrap_or(first);

    tracing::debug!(
        global,
        undefined = undefined.len(),
        s1 = cfg.s1,
        "dimension estimated"
    );
    Ok(DimensionEstimate {
        local,
        global,
        undefined,
    })
}

/// Most frequent value; ties go to the smallest.
fn mode(values: impl Iterator<Item = usize>) -> Option<usize> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(usize, usize)>, (v, c)| match best {
            Some((_, bc)) if bc >= c => best,
            _ => Some((v, c)),
        })
        .map(|(v, _)| v)
}
