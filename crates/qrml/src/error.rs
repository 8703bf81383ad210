//! Error taxonomy shared by every pipeline stage.
//!
//! All variants are fatal to a run and carry the offending entity plus the
//! parameter values that were in effect, so callers can decide which knob to
//! turn. Undefined local dimensions are not errors; see
//! `dimension::UndefinedLocalDimension`.

use thiserror::Error;

/// Fatal outcome of a pipeline stage.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum QrmlError {
    #[error("insufficient data: {points} points, need at least {required} (k = {k})")]
    InsufficientData {
        points: usize,
        required: usize,
        k: usize,
    },

    #[error(
        "proximity graph is disconnected: vertex {vertex} is unreachable from vertex 0 \
         ({components} components; threshold_var = {threshold_var}, edge_sen = {edge_sen})"
    )]
    DisconnectedGraph {
        vertex: usize,
        components: usize,
        threshold_var: f64,
        edge_sen: f64,
    },

    #[error(
        "point {point} has {found} placed reference points, need {required} \
         (target_dim = {target_dim}, k0 = {k0})"
    )]
    InsufficientNeighbors {
        point: usize,
        found: usize,
        required: usize,
        target_dim: usize,
        k0: usize,
    },

    #[error("alpha shape has {cycles} boundary cycles, expected at most one (alpha = {alpha})")]
    MultipleBoundaryCycles { cycles: usize, alpha: f64 },

    #[error(
        "short-circuit edges not properly separated: edge {edge} is glued to itself; \
         try another tolerance (quotient_tol = {quotient_tol}, tol1 = {tol1})"
    )]
    SelfGluedEdge {
        edge: usize,
        quotient_tol: usize,
        tol1: usize,
    },

    #[error("incompatible gluing between short edges {first} and {second}")]
    IncompatibleGluing { first: usize, second: usize },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl QrmlError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QrmlError>;
