//! Stage configurations.
//!
//! One small `Copy` struct per stage with working defaults, grouped into
//! `PipelineCfg`. Every struct deserializes
//! with `#[serde(default)]` so partial JSON configs are accepted.
//!
//! Policy
//! - Validation only rejects values that make a stage meaningless (zero
//!   neighbour counts, non-positive alpha). Values that are merely poor
//!   choices surface later as structured stage errors.

use serde::{Deserialize, Serialize};

use crate::error::{QrmlError, Result};

/// ProximityGraphBuilder parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphCfg {
    /// Candidate neighbours per point.
    pub k: usize,
    /// Explained-variance ratio a principal direction needs to count.
    pub threshold_var: f64,
    /// Multiplier on the mean neighbour distance for the edge-length jump.
    pub edge_sen: f64,
}

impl Default for GraphCfg {
    fn default() -> Self {
        Self {
            k: 10,
            threshold_var: 0.08,
            edge_sen: 1.0,
        }
    }
}

impl GraphCfg {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(QrmlError::invalid("k", "must be at least 1"));
        }
        if !(self.threshold_var.is_finite() && self.threshold_var >= 0.0) {
            return Err(QrmlError::invalid(
                "threshold_var",
                format!("must be finite and non-negative, got {}", self.threshold_var),
            ));
        }
        if !(self.edge_sen.is_finite() && self.edge_sen >= 0.0) {
            return Err(QrmlError::invalid(
                "edge_sen",
                format!("must be finite and non-negative, got {}", self.edge_sen),
            ));
        }
        Ok(())
    }
}

/// DimensionEstimator parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionCfg {
    /// Kneedle sensitivity; larger values find later knees.
    pub s1: f64,
}

impl Default for DimensionCfg {
    fn default() -> Self {
        Self { s1: 0.1 }
    }
}

impl DimensionCfg {
    pub fn validate(&self) -> Result<()> {
        if !(self.s1.is_finite() && self.s1 >= 0.0) {
            return Err(QrmlError::invalid(
                "s1",
                format!("must be finite and non-negative, got {}", self.s1),
            ));
        }
        Ok(())
    }
}

/// ProjectionEngine parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionCfg {
    /// Extra reference points on top of the target dimension.
    pub k0: usize,
    /// Force a planar target regardless of the estimated dimension.
    pub two_d: bool,
    /// Explicit base point; `None` selects the graph center.
    pub base_point: Option<usize>,
}

impl Default for ProjectionCfg {
    fn default() -> Self {
        Self {
            k0: 0,
            two_d: true,
            base_point: None,
        }
    }
}

impl ProjectionCfg {
    /// Every value is admissible on its own; `base_point` is range-checked
    /// against the cloud by `projection::project`.
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// BoundaryExtractor parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryCfg {
    /// Alpha-shape parameter: triangles with circumradius `<= 1/alpha` are kept.
    pub alpha: f64,
    /// Look-ahead window of the loop-closing cleaner.
    pub tol: usize,
    /// Tear-point ratio threshold (`a`).
    pub tear_ratio: f64,
}

impl Default for BoundaryCfg {
    fn default() -> Self {
        Self {
            alpha: 2.0,
            tol: 5,
            tear_ratio: 2.5,
        }
    }
}

impl BoundaryCfg {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(QrmlError::invalid(
                "alpha",
                format!("must be finite and positive, got {}", self.alpha),
            ));
        }
        if self.tol < 2 {
            return Err(QrmlError::invalid("tol", "must be at least 2"));
        }
        Ok(())
    }
}

/// QuotientIdentifier parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotientCfg {
    /// Connections to boundary points within this many positions are ignored.
    pub connection_tol: usize,
    /// Largest gap between short-circuit points inside one short-edge.
    pub quotient_tol: usize,
    /// Minimum separation of refinement split points.
    pub tol1: usize,
}

impl Default for QuotientCfg {
    fn default() -> Self {
        Self {
            connection_tol: 5,
            quotient_tol: 5,
            tol1: 5,
        }
    }
}

impl QuotientCfg {
    pub fn validate(&self) -> Result<()> {
        // Positions one apart are boundary neighbours, never gaps or shortcuts.
        if self.connection_tol == 0 {
            return Err(QrmlError::invalid("connection_tol", "must be at least 1"));
        }
        if self.quotient_tol == 0 {
            return Err(QrmlError::invalid("quotient_tol", "must be at least 1"));
        }
        Ok(())
    }
}

/// All stage parameters for one pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineCfg {
    pub graph: GraphCfg,
    pub dimension: DimensionCfg,
    pub projection: ProjectionCfg,
    pub boundary: BoundaryCfg,
    pub quotient: QuotientCfg,
}

impl PipelineCfg {
    pub fn validate(&self) -> Result<()> {
        self.graph.validate()?;
        self.dimension.validate()?;
        self.projection.validate()?;
        self.boundary.validate()?;
        self.quotient.validate()
    }
}
