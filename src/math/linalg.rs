//! Linear algebra utilities for dispersion analysis.
//!
//! This module provides a closed-form eigendecomposition of 2x2 symmetric
//! matrices (sample covariance of COP points), using nalgebra types for the
//! matrix and axis vectors.

use nalgebra::{Matrix2, Vector2};

/// Off-diagonal magnitude below which a matrix is treated as diagonal.
const DIAGONAL_EPS: f64 = 1e-12;

/// Eigendecomposition of a 2x2 symmetric matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetricEigen2 {
    /// Eigenvalues sorted in descending order (`eigenvalues[0] >= eigenvalues[1]`).
    pub eigenvalues: [f64; 2],

    /// Unit eigenvectors; `eigenvectors[i]` pairs with `eigenvalues[i]`.
    /// The pair forms a right-handed basis.
    pub eigenvectors: [Vector2<f64>; 2],
}

impl SymmetricEigen2 {
    /// Decompose a symmetric matrix. Only the upper triangle is read.
    ///
    /// Eigenvalues use `T/2 +- sqrt(T^2/4 - det)`; a negative radicand from
    /// rounding is clamped to zero so degenerate (collinear or coincident)
    /// scatters yield a repeated or zero eigenvalue instead of NaN.
    #[must_use]
    pub fn new(m: &Matrix2<f64>) -> Self {
        let (a, b, d) = (m[(0, 0)], m[(0, 1)], m[(1, 1)]);

        let half_trace = 0.5 * (a + d);
        let det = a * d - b * b;
        let disc = (half_trace * half_trace - det).max(0.0).sqrt();
        let l1 = half_trace + disc;
        let l2 = half_trace - disc;

        let major = if b.abs() <= DIAGONAL_EPS * (a.abs() + d.abs()).max(f64::MIN_POSITIVE) {
            if a >= d {
                Vector2::x()
            } else {
                Vector2::y()
            }
        } else {
            // Rows of (M - l1 I) are orthogonal to the major axis; take the
            // better conditioned of the two candidate null vectors.
            let u = Vector2::new(l1 - d, b);
            let v = Vector2::new(b, l1 - a);
            if u.norm_squared() >= v.norm_squared() {
                u.normalize()
            } else {
                v.normalize()
            }
        };
        let minor = Vector2::new(-major.y, major.x);

        Self {
            eigenvalues: [l1, l2],
            eigenvectors: [major, minor],
        }
    }

    /// Orientation of the major axis in radians, in `(-pi, pi]`.
    #[must_use]
    pub fn major_angle(&self) -> f64 {
        self.eigenvectors[0].y.atan2(self.eigenvectors[0].x)
    }

    /// Square roots of the eigenvalues, with negative noise clamped to zero.
    #[must_use]
    pub fn std_devs(&self) -> [f64; 2] {
        [
            self.eigenvalues[0].max(0.0).sqrt(),
            self.eigenvalues[1].max(0.0).sqrt(),
        ]
    }
}
