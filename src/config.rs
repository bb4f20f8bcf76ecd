//! Runtime parameters for field synthesis, ellipse estimation and playback.
//!
//! # Example
//!
//! ```
//! use pressure_sway::SwayConfig;
//!
//! let config = SwayConfig::default();
//! assert_eq!(config.canvas_width, 120);
//!
//! // 99% confidence ellipse instead of the default 95%
//! let strict = SwayConfig::insole().with_confidence_level(0.99).unwrap();
//! assert!(strict.confidence_scale > config.confidence_scale);
//! ```

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SwayError};

/// Default confidence scale: radius of the 95% region of a bivariate normal.
pub const DEFAULT_CONFIDENCE_SCALE: f64 = 2.45;

/// Runtime parameters shared by every stage of the pipeline.
///
/// # Canvas
///
/// - `canvas_width`/`canvas_height`: extent of the heatmap canvas; samples
///   are emitted only inside `[0, width) x [0, height)`.
///
/// # Smoothing
///
/// - `sigma`: standard deviation of the Gaussian splat, in canvas units.
/// - `kernel_extent`: truncation half-width in multiples of `sigma`.
///
/// # Dispersion
///
/// - `confidence_scale`: multiplier applied to `sqrt(eigenvalue)` for the
///   ellipse semi-axes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SwayConfig {
    /// Heatmap canvas width.
    pub canvas_width: usize,

    /// Heatmap canvas height.
    pub canvas_height: usize,

    /// Gaussian smoothing radius (standard deviation).
    pub sigma: f64,

    /// Kernel truncation in units of sigma. The splat covers
    /// `[-extent*sigma, extent*sigma]` on both axes.
    pub kernel_extent: f64,

    /// Scale applied to the square root of each covariance eigenvalue.
    /// 2.45 approximates the 95% chi-square radius with 2 degrees of freedom.
    pub confidence_scale: f64,

    /// Number of boundary samples in the ellipse polygon.
    pub ellipse_samples: usize,

    /// Minimum number of defined COP points before an ellipse is drawn.
    pub min_ellipse_points: usize,

    /// Wall-clock interval between displayed frames, in milliseconds.
    pub cadence_ms: u64,
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            canvas_width: 120,
            canvas_height: 300,
            sigma: 20.0,
            kernel_extent: 3.0,
            confidence_scale: DEFAULT_CONFIDENCE_SCALE,
            ellipse_samples: 100,
            min_ellipse_points: 3,
            cadence_ms: 1000,
        }
    }
}

impl SwayConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(SwayError::invalid_config(
                "canvas dimensions must be positive",
            ));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(SwayError::invalid_config("sigma must be positive"));
        }
        if !(self.kernel_extent.is_finite() && self.kernel_extent > 0.0) {
            return Err(SwayError::invalid_config(
                "kernel_extent must be positive",
            ));
        }
        if !(self.confidence_scale.is_finite() && self.confidence_scale > 0.0) {
            return Err(SwayError::invalid_config(
                "confidence_scale must be positive",
            ));
        }
        if self.ellipse_samples < 3 {
            return Err(SwayError::invalid_config(
                "ellipse_samples must be at least 3",
            ));
        }
        if self.min_ellipse_points < 2 {
            return Err(SwayError::invalid_config(
                "min_ellipse_points must be at least 2",
            ));
        }
        if self.cadence_ms == 0 {
            return Err(SwayError::invalid_config("cadence must be positive"));
        }
        Ok(())
    }

    /// Preset matching the 16-sensor insole canvas (the defaults).
    #[must_use]
    pub fn insole() -> Self {
        Self::default()
    }

    /// Preset with a tighter kernel for sharper heatmaps.
    #[must_use]
    pub fn fine() -> Self {
        Self {
            sigma: 10.0,
            ..Self::default()
        }
    }

    /// Radius of the `level` confidence region of a bivariate normal,
    /// in units of standard deviation: `sqrt(-2 ln(1 - level))`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0 < level < 1`.
    pub fn confidence_scale_for(level: f64) -> Result<f64> {
        if !(level > 0.0 && level < 1.0) {
            return Err(SwayError::invalid_config(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }
        Ok((-2.0 * (1.0 - level).ln()).sqrt())
    }

    /// Set the confidence scale from a confidence level such as `0.95`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0 < level < 1`.
    pub fn with_confidence_level(mut self, level: f64) -> Result<Self> {
        self.confidence_scale = Self::confidence_scale_for(level)?;
        Ok(self)
    }

    /// Set the raw confidence scale.
    #[must_use]
    pub const fn with_confidence_scale(mut self, scale: f64) -> Self {
        self.confidence_scale = scale;
        self
    }

    /// Set the smoothing radius.
    #[must_use]
    pub const fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the canvas size.
    #[must_use]
    pub const fn with_canvas(mut self, width: usize, height: usize) -> Self {
        self.canvas_width = width;
        self.canvas_height = height;
        self
    }

    /// Set the playback cadence.
    #[must_use]
    pub fn with_cadence(mut self, cadence: Duration) -> Self {
        self.cadence_ms = u64::try_from(cadence.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Playback cadence as a [`Duration`].
    #[must_use]
    pub const fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    /// Half-width of the truncated kernel in whole canvas units.
    #[must_use]
    pub fn kernel_radius(&self) -> i64 {
        (self.kernel_extent * self.sigma).floor() as i64
    }

    /// Load a configuration from a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails validation.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
