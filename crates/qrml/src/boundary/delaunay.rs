//! Delaunay triangulation and the alpha-shape boundary.
//!
//! Triangulation is delegated to `spade`, whose predicates are exact, so
//! co-circular input (lattices, points on a circle) yields a valid
//! triangulation. Points that coincide exactly with an earlier point are
//! skipped; the lowest index stands for each position.

use std::collections::BTreeSet;

use nalgebra::Vector2;
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};

use crate::error::{QrmlError, Result};

/// Counter-clockwise triangle of input point indices.
pub type Triangle = [usize; 3];

/// Input point tagged with its index.
#[derive(Clone, Copy, Debug)]
struct Site {
    pos: Point2<f64>,
    index: usize,
}

impl HasPosition for Site {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.pos
    }
}

#[inline]
fn cross(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Circumradius of a triangle; infinite for degenerate ones.
pub fn circumradius(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>) -> f64 {
    let area2 = cross(a, b, c).abs();
    if area2 <= 0.0 {
        return f64::INFINITY;
    }
    (a - b).norm() * (b - c).norm() * (c - a).norm() / (2.0 * area2)
}

/// Delaunay triangles of `points`, each counter-clockwise.
///
/// Fewer than three distinct points, or collinear input, give no triangles.
/// Non-finite coordinates are rejected.
pub fn triangulate(points: &[Vector2<f64>]) -> Result<Vec<Triangle>> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| {
        points[i]
            .x
            .total_cmp(&points[j].x)
            .then(points[i].y.total_cmp(&points[j].y))
            .then(i.cmp(&j))
    });
    order.dedup_by(|a, b| points[*a] == points[*b]);
    order.sort_unstable();
    if order.len() < 3 {
        return Ok(Vec::new());
    }

    let sites: Vec<Site> = order
        .iter()
        .map(|&i| Site {
            pos: Point2::new(points[i].x, points[i].y),
            index: i,
        })
        .collect();
    let dt: DelaunayTriangulation<Site> = DelaunayTriangulation::bulk_load(sites)
        .map_err(|e| QrmlError::invalid("coords", format!("cannot triangulate: {e:?}")))?;
    Ok(dt
        .inner_faces()
        .map(|face| face.vertices().map(|v| v.data().index))
        .collect())
}

/// Directed boundary edges of the alpha complex: triangles with circumradius
/// at most `radius` are kept, and a CCW triangle edge is on the boundary when
/// its reverse is not.
pub fn alpha_boundary(points: &[Vector2<f64>], triangles: &[Triangle], radius: f64) -> Vec<(usize, usize)> {
    let mut directed = BTreeSet::new();
    for t in triangles {
        let [a, b, c] = *t;
        if circumradius(points[a], points[b], points[c]) <= radius {
            directed.insert((a, b));
            directed.insert((b, c));
            directed.insert((c, a));
        }
    }
    directed
        .iter()
        .filter(|&&(u, v)| !directed.contains(&(v, u)))
        .copied()
        .collect()
}
