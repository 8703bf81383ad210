//! Principal component analysis on small local samples.
//!
//! Used by the safe-edge pass of the graph builder, by the local dimension
//! estimator, and to seed the tangent plane at the projection base point.
//! Conventions follow the usual PCA contract: samples are centered, the
//! number of components is `min(#samples, d)`, and components are sorted by
//! decreasing variance.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Variance below this is treated as zero.
const VAR_EPS: f64 = 1e-15;

/// Fitted principal components.
#[derive(Clone, Debug)]
pub struct Pca {
    pub mean: DVector<f64>,
    /// Component variances, descending; length `min(#samples, d)`.
    pub variances: Vec<f64>,
    /// Unit principal axes as columns, same order as `variances`.
    pub axes: DMatrix<f64>,
}

impl Pca {
    /// Fit on `samples` (all of the same dimension). Returns `None` for no samples.
    pub fn fit(samples: &[DVector<f64>]) -> Option<Self> {
        let first = samples.first()?;
        let d = first.len();
        let n = samples.len();
        let mut mean = DVector::zeros(d);
        for s in samples {
            mean += s;
        }
        mean /= n as f64;
        let mut cov = DMatrix::zeros(d, d);
        for s in samples {
            let c = s - &mean;
            cov += &c * c.transpose();
        }
        if n > 1 {
            cov /= (n - 1) as f64;
        }
        let eig = SymmetricEigen::new(cov);
        let mut order: Vec<usize> = (0..d).collect();
        order.sort_by(|&a, &b| {
            eig.eigenvalues[b]
                .partial_cmp(&eig.eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        order.truncate(n.min(d));
        let variances = order
            .iter()
            .map(|&i| eig.eigenvalues[i].max(0.0))
            .collect();
        let axes = DMatrix::from_columns(
            &order
                .iter()
                .map(|&i| eig.eigenvectors.column(i).into_owned())
                .collect::<Vec<_>>(),
        );
        Some(Self {
            mean,
            variances,
            axes,
        })
    }

    /// Explained-variance ratios; all zeros when the samples do not spread.
    pub fn explained_variance_ratio(&self) -> Vec<f64> {
        let total: f64 = self.variances.iter().sum();
        if total <= VAR_EPS {
            return vec![0.0; self.variances.len()];
        }
        self.variances.iter().map(|v| v / total).collect()
    }
}

/// Shorthand: explained-variance ratios of `samples` (empty for no samples).
pub fn explained_variance_ratio(samples: &[DVector<f64>]) -> Vec<f64> {
    Pca::fit(samples)
        .map(|p| p.explained_variance_ratio())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn planar_samples_have_two_components() {
        let samples = vec![
            dvector![1.0, 0.0, 0.0],
            dvector![-1.0, 0.0, 0.0],
            dvector![0.0, 0.5, 0.0],
            dvector![0.0, -0.5, 0.0],
        ];
        let pca = Pca::fit(&samples).unwrap();
        let r = pca.explained_variance_ratio();
        assert_eq!(r.len(), 3);
        assert!((r[0] - 0.8).abs() < 1e-12);
        assert!((r[1] - 0.2).abs() < 1e-12);
        assert!(r[2].abs() < 1e-12);
        // First axis is ±e_x.
        assert!((pca.axes[(0, 0)].abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn component_count_is_capped_by_samples() {
        let samples = vec![dvector![0.0, 0.0, 0.0, 0.0], dvector![1.0, 2.0, 3.0, 4.0]];
        let r = explained_variance_ratio(&samples);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_samples_give_zero_ratios() {
        let samples = vec![dvector![1.0, 1.0], dvector![1.0, 1.0]];
        assert_eq!(explained_variance_ratio(&samples), vec![0.0, 0.0]);
        assert!(explained_variance_ratio(&[]).is_empty());
    }
}
