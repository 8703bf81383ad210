//! Quotient recovery from point clouds.
//!
//! Given samples of a surface, approximate its 1-skeleton, flatten it into
//! normal coordinates around a base point, and read off how the boundary of
//! the flattened picture has to be glued to get the surface back.
//!
//! Stages (each a pure function returning an immutable artifact):
//! `graph::build_graph` → `dimension::estimate` → `projection::project` →
//! `boundary::extract` → `quotient::identify`. `pipeline::run` chains them.
//!
//! API Policy
//! - Artifacts are plain data with `serde` derives; rendering and storage
//!   belong to callers (see the `qrml` CLI).
//! - All fatal outcomes are `QrmlError` values carrying the offending entity
//!   and the parameters in effect; no stage retries on its own.

pub mod boundary;
pub mod cfg;
pub mod cloud;
pub mod dimension;
pub mod error;
pub mod graph;
pub mod pca;
pub mod pipeline;
pub mod projection;
pub mod quotient;
pub mod sample;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::{BoundaryCfg, DimensionCfg, GraphCfg, PipelineCfg, ProjectionCfg, QuotientCfg};
pub use cloud::Pointcloud;
pub use error::{QrmlError, Result};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::boundary::{extract, CleanedBoundary};
    pub use crate::cfg::{BoundaryCfg, DimensionCfg, GraphCfg, PipelineCfg, ProjectionCfg, QuotientCfg};
    pub use crate::cloud::Pointcloud;
    pub use crate::dimension::{estimate, DimensionEstimate};
    pub use crate::error::{QrmlError, Result};
    pub use crate::graph::{build_graph, graph_center, ProximityGraph};
    pub use crate::pipeline::{run, Artifacts};
    pub use crate::projection::{project, Projection};
    pub use crate::quotient::{identify, GluingMap, Orientation, QuotientOutcome};
    pub use crate::sample::{sample, SampleCfg, Shape};
}
