//! Seeded synthetic point clouds.
//!
//! Purpose
//! - Reproducible test inputs with a known quotient: disk and square (no
//!   gluing), cylinder (one reversed pair), sphere (boundary collapses),
//!   torus (two independent cycles, a documented failure case).
//!
//! Model
//! - Each shape draws `n` points from a fixed parameterization with one
//!   `StdRng` seeded from `seed`; optional noise adds an independent
//!   uniform offset in `[-noise, noise]` to every coordinate.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::cloud::Pointcloud;
use crate::error::{QrmlError, Result};

/// Cylinder height (circumference is 2π).
const CYLINDER_HEIGHT: f64 = 3.0;
/// Torus radii: distance of the tube center from the axis, tube radius.
const TORUS_MAJOR: f64 = 2.0;
const TORUS_MINOR: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Unit disk in R².
    Disk,
    /// Unit square `[0, 1]²`.
    Square,
    /// Unit-radius open cylinder in R³.
    Cylinder,
    /// Unit sphere in R³.
    Sphere,
    /// Ring torus in R³.
    Torus,
}

impl Shape {
    pub const ALL: [Shape; 5] = [Shape::Disk, Shape::Square, Shape::Cylinder, Shape::Sphere, Shape::Torus];

    pub fn ambient_dim(self) -> usize {
        match self {
            Shape::Disk | Shape::Square => 2,
            Shape::Cylinder | Shape::Sphere | Shape::Torus => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Disk => "disk",
            Shape::Square => "square",
            Shape::Cylinder => "cylinder",
            Shape::Sphere => "sphere",
            Shape::Torus => "torus",
        }
    }

    fn draw<R: Rng>(self, rng: &mut R) -> Vec<f64> {
        match self {
            Shape::Disk => {
                let r = rng.gen::<f64>().sqrt();
                let t = rng.gen::<f64>() * TAU;
                vec![r * t.cos(), r * t.sin()]
            }
            Shape::Square => vec![rng.gen::<f64>(), rng.gen::<f64>()],
            Shape::Cylinder => {
                let t = rng.gen::<f64>() * TAU;
                vec![t.cos(), t.sin(), rng.gen::<f64>() * CYLINDER_HEIGHT]
            }
            Shape::Sphere => {
                // Uniform z and azimuth give the uniform area measure.
                let z: f64 = rng.gen_range(-1.0..=1.0);
                let t = rng.gen::<f64>() * TAU;
                let r = (1.0 - z * z).max(0.0).sqrt();
                vec![r * t.cos(), r * t.sin(), z]
            }
            Shape::Torus => {
                let u = rng.gen::<f64>() * TAU;
                let v = rng.gen::<f64>() * TAU;
                let ring = TORUS_MAJOR + TORUS_MINOR * v.cos();
                vec![ring * u.cos(), ring * u.sin(), TORUS_MINOR * v.sin()]
            }
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shape {
    type Err = QrmlError;

    fn from_str(s: &str) -> Result<Self> {
        Shape::ALL
            .into_iter()
            .find(|shape| shape.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                QrmlError::invalid("shape", format!("unknown shape `{s}` (disk, square, cylinder, sphere, torus)"))
            })
    }
}

/// Sampler configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleCfg {
    pub shape: Shape,
    pub n: usize,
    pub seed: u64,
    /// Half-width of the uniform per-coordinate noise.
    pub noise: f64,
}

impl Default for SampleCfg {
    fn default() -> Self {
        Self {
            shape: Shape::Disk,
            n: 500,
            seed: 0,
            noise: 0.0,
        }
    }
}

/// Draw a point cloud; identical configs give identical clouds.
pub fn sample(cfg: SampleCfg) -> Result<Pointcloud> {
    if !(cfg.noise.is_finite() && cfg.noise >= 0.0) {
        return Err(QrmlError::invalid(
            "noise",
            format!("must be finite and non-negative, got {}", cfg.noise),
        ));
    }
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let points = (0..cfg.n)
        .map(|_| {
            let mut p = cfg.shape.draw(&mut rng);
            if cfg.noise > 0.0 {
                for c in &mut p {
                    *c += rng.gen_range(-cfg.noise..=cfg.noise);
                }
            }
            DVector::from_vec(p)
        })
        .collect();
    Pointcloud::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(shape: Shape) -> SampleCfg {
        SampleCfg {
            shape,
            n: 200,
            seed: 7,
            noise: 0.0,
        }
    }

    #[test]
    fn same_seed_same_cloud() {
        for shape in Shape::ALL {
            let a = sample(cfg(shape)).unwrap();
            let b = sample(cfg(shape)).unwrap();
            assert_eq!(a.points(), b.points());
            assert_eq!(a.dim(), shape.ambient_dim());
        }
        let other = sample(SampleCfg {
            seed: 8,
            ..cfg(Shape::Disk)
        })
        .unwrap();
        assert_ne!(sample(cfg(Shape::Disk)).unwrap().points(), other.points());
    }

    #[test]
    fn points_lie_on_their_shape() {
        for p in sample(cfg(Shape::Disk)).unwrap().points() {
            assert!(p.norm() <= 1.0 + 1e-12);
        }
        for p in sample(cfg(Shape::Square)).unwrap().points() {
            assert!(p.iter().all(|&c| (0.0..=1.0).contains(&c)));
        }
        for p in sample(cfg(Shape::Sphere)).unwrap().points() {
            assert!((p.norm() - 1.0).abs() < 1e-9);
        }
        for p in sample(cfg(Shape::Cylinder)).unwrap().points() {
            assert!((p[0].hypot(p[1]) - 1.0).abs() < 1e-9);
            assert!((0.0..=CYLINDER_HEIGHT).contains(&p[2]));
        }
        for p in sample(cfg(Shape::Torus)).unwrap().points() {
            let ring = p[0].hypot(p[1]) - TORUS_MAJOR;
            assert!((ring.hypot(p[2]) - TORUS_MINOR).abs() < 1e-9);
        }
    }

    #[test]
    fn noise_is_bounded() {
        let clean = sample(cfg(Shape::Sphere)).unwrap();
        let noisy = sample(SampleCfg {
            noise: 0.01,
            ..cfg(Shape::Sphere)
        })
        .unwrap();
        for p in noisy.points() {
            assert!((p.norm() - 1.0).abs() <= 0.01 * 3f64.sqrt() + 1e-12);
        }
        assert_ne!(clean.points(), noisy.points());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            sample(SampleCfg {
                noise: -1.0,
                ..SampleCfg::default()
            }),
            Err(QrmlError::InvalidParameter { name: "noise", .. })
        ));
        assert!(matches!(
            sample(SampleCfg {
                n: 0,
                ..SampleCfg::default()
            }),
            Err(QrmlError::InsufficientData { points: 0, .. })
        ));
    }

    #[test]
    fn shapes_parse_by_name() {
        assert_eq!("Torus".parse::<Shape>().unwrap(), Shape::Torus);
        assert_eq!(Shape::Cylinder.to_string(), "cylinder");
        assert!("klein".parse::<Shape>().is_err());
    }
}
