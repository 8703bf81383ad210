//! Least squares on a sphere: `min ‖A x − y‖²  s.t. ‖x‖ = r`.
//!
//! Stationary points satisfy `(AᵀA − μ I) x = Aᵀy`; the global minimiser has
//! `μ ≤ λ_min(AᵀA)`. In the eigenbasis of `AᵀA` the constraint becomes the
//! secular equation `Σ g̃_i² / (λ_i − μ)² = r²`, monotone on `μ < λ_min`, so
//! plain bisection finds the root. When `g̃` vanishes on the `λ_min`
//! eigenspace and the remaining terms stay below `r²` at `μ = λ_min`
//! (the "hard case"), the missing norm is made up along that eigenspace.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Relative tolerance for eigenvalue ties and vanishing gradient components.
const EIG_REL_EPS: f64 = 1e-12;
/// Bisection steps; the bracket width shrinks by 2^-200.
const BISECT_ITERS: usize = 200;

/// Minimise `‖a x − y‖²` over the sphere of radius `r` (`r >= 0`).
pub fn sphere_lsq(a: &DMatrix<f64>, y: &DVector<f64>, r: f64) -> DVector<f64> {
    let d = a.ncols();
    if r <= 0.0 || d == 0 {
        return DVector::zeros(d);
    }
    let at = a.transpose();
    let eig = SymmetricEigen::new(&at * a);
    let g = &at * y;

    let mut idx: Vec<usize> = (0..d).collect();
    idx.sort_by(|&i, &j| {
        eig.eigenvalues[i]
            .partial_cmp(&eig.eigenvalues[j])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(i.cmp(&j))
    });
    let lam: Vec<f64> = idx.iter().map(|&i| eig.eigenvalues[i]).collect();
    let vecs: Vec<DVector<f64>> = idx
        .iter()
        .map(|&i| eig.eigenvectors.column(i).into_owned())
        .collect();
    let gt: Vec<f64> = vecs.iter().map(|v| v.dot(&g)).collect();

    let lmin = lam[0];
    let lam_tol = EIG_REL_EPS * lam[d - 1].abs().max(1.0);
    let g_norm = g.norm();
    let g_tol = EIG_REL_EPS * g_norm.max(1.0);
    let bottom = lam.iter().take_while(|&&l| l - lmin <= lam_tol).count();
    let g_bottom = gt[..bottom].iter().map(|v| v * v).sum::<f64>().sqrt();

    let combine = |mu: f64, skip_bottom: bool| {
        let mut x = DVector::zeros(d);
        for i in 0..d {
            if skip_bottom && i < bottom {
                continue;
            }
            x += &vecs[i] * (gt[i] / (lam[i] - mu));
        }
        x
    };

    if g_bottom <= g_tol {
        let partial = combine(lmin, true);
        let s = partial.norm_squared();
        if s <= r * r {
            return partial + &vecs[0] * (r * r - s).sqrt();
        }
    }

    let phi = |mu: f64| -> f64 {
        lam.iter()
            .zip(&gt)
            .map(|(&l, &c)| c * c / ((l - mu) * (l - mu)))
            .sum()
    };
    // phi(lo) <= ‖g‖² / (λ_min − lo)² = r².
    let mut lo = lmin - g_norm / r;
    let mut hi = lmin;
    for _ in 0..BISECT_ITERS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if phi(mid) > r * r {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    let x = combine(lo, false);
    let norm = x.norm();
    if norm > 0.0 {
        x * (r / norm)
    } else {
        &vecs[0] * r
    }
}
