//! Confidence ellipse of the COP scatter.
//!
//! The ellipse is built from the unbiased sample covariance of the defined
//! COP points seen so far. Its semi-axes are `scale * sqrt(eigenvalue)`
//! along the covariance eigenvectors, where `scale` is the chi-square radius
//! of the chosen confidence level (2.45 for 95%).
//!
//! # Example
//!
//! ```
//! use pressure_sway::{confidence_ellipse, SwayConfig};
//!
//! let points = [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0]];
//! let ellipse = confidence_ellipse(&points, &SwayConfig::default());
//! assert_eq!(ellipse.points().len(), 100);
//!
//! let shape = ellipse.shape().unwrap();
//! assert!((shape.center[0] - 1.0).abs() < 1e-12);
//! ```

use std::f64::consts::PI;

use nalgebra::{Matrix2, Vector2};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SwayConfig;
use crate::math::linalg::SymmetricEigen2;

/// Sample mean and unbiased covariance of a 2-D scatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Covariance {
    /// Number of points the estimate is based on.
    pub count: usize,
    /// Sample mean `[mx, my]`.
    pub mean: [f64; 2],
    /// Covariance with denominator `count - 1`.
    pub matrix: Matrix2<f64>,
}

/// Compute mean and unbiased covariance. Returns `None` for fewer than two
/// points, where the estimator is undefined.
#[must_use]
pub fn sample_covariance(points: &[[f64; 2]]) -> Option<Covariance> {
    let n = points.len();
    if n < 2 {
        return None;
    }

    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    let mean = [sx / n as f64, sy / n as f64];

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in points {
        let dx = p[0] - mean[0];
        let dy = p[1] - mean[1];
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    let denom = (n - 1) as f64;

    Some(Covariance {
        count: n,
        mean,
        matrix: Matrix2::new(sxx / denom, sxy / denom, sxy / denom, syy / denom),
    })
}

/// Geometric parameters of a confidence ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EllipseShape {
    /// Ellipse center (the sample mean).
    pub center: [f64; 2],
    /// Major and minor semi-axis lengths.
    pub semi_axes: [f64; 2],
    /// Major-axis orientation in radians.
    pub angle: f64,
}

impl EllipseShape {
    /// Enclosed area, `pi * a * b`.
    #[must_use]
    pub fn area(&self) -> f64 {
        PI * self.semi_axes[0] * self.semi_axes[1]
    }
}

/// Sampled confidence ellipse. Empty when too few points were available.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DispersionEllipse {
    points: Vec<[f64; 2]>,
    shape: Option<EllipseShape>,
}

impl DispersionEllipse {
    /// An ellipse with no boundary points.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Boundary samples in increasing angle order. The loop is not closed
    /// explicitly; the last point does not repeat the first.
    #[must_use]
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Shape parameters, if an ellipse was drawable.
    #[must_use]
    pub const fn shape(&self) -> Option<&EllipseShape> {
        self.shape.as_ref()
    }

    /// Whether no ellipse was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area (0 when empty).
    #[must_use]
    pub fn area(&self) -> f64 {
        self.shape.map_or(0.0, |s| s.area())
    }
}

/// Compute the confidence ellipse of a scatter of defined COP points.
///
/// Returns an empty ellipse when fewer than `config.min_ellipse_points`
/// points are given. Collinear or coincident points produce a degenerate
/// ellipse (a segment or a point) rather than an error.
#[must_use]
pub fn confidence_ellipse(points: &[[f64; 2]], config: &SwayConfig) -> DispersionEllipse {
    if points.len() < config.min_ellipse_points.max(2) {
        return DispersionEllipse::empty();
    }
    let Some(cov) = sample_covariance(points) else {
        return DispersionEllipse::empty();
    };

    let eig = SymmetricEigen2::new(&cov.matrix);
    let [sd1, sd2] = eig.std_devs();
    let k = config.confidence_scale;
    let axis1: Vector2<f64> = eig.eigenvectors[0] * (k * sd1);
    let axis2: Vector2<f64> = eig.eigenvectors[1] * (k * sd2);
    let center = Vector2::new(cov.mean[0], cov.mean[1]);

    let n = config.ellipse_samples;
    let boundary = (0..n)
        .map(|i| {
            let theta = i as f64 * 2.0 * PI / n as f64;
            let p = center + axis1 * theta.cos() + axis2 * theta.sin();
            [p.x, p.y]
        })
        .collect();

    DispersionEllipse {
        points: boundary,
        shape: Some(EllipseShape {
            center: cov.mean,
            semi_axes: [k * sd1, k * sd2],
            angle: eig.major_angle(),
        }),
    }
}
