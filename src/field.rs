//! Gaussian-splat intensity field for one frame.
//!
//! Each sensor splats a truncated isotropic Gaussian around its position.
//! Overlapping contributions are NOT merged: every sensor emits its own
//! samples, and compositing is left to the consumer (see
//! [`IntensityField::composite`] for a ready-made rasterizer).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SwayConfig;
use crate::error::Result;
use crate::frames::Frame;
use crate::geometry::SensorGeometry;

/// One `(x, y, value)` sample of the field.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldSample {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// How overlapping samples are combined when rasterizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    /// Keep the strongest contribution per cell.
    #[default]
    Max,
    /// Add all contributions per cell.
    Sum,
}

/// Unmerged list of field samples covering the canvas.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct IntensityField {
    samples: Vec<FieldSample>,
}

impl IntensityField {
    /// All samples, grouped by sensor in sensor order.
    #[must_use]
    pub fn samples(&self) -> &[FieldSample] {
        &self.samples
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the field has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest single sample value (0 for an empty field).
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.samples.iter().map(|s| s.value).fold(0.0, f64::max)
    }

    /// Rasterize onto a row-major `width x height` grid. A sample lands in
    /// cell `(floor(x), floor(y))`; samples outside the grid are dropped.
    #[must_use]
    pub fn composite(&self, mode: Composite, width: usize, height: usize) -> Vec<f64> {
        let mut grid = vec![0.0_f64; width * height];
        for s in &self.samples {
            let (cx, cy) = (s.x.floor(), s.y.floor());
            if cx < 0.0 || cy < 0.0 || cx >= width as f64 || cy >= height as f64 {
                continue;
            }
            let cell = &mut grid[cy as usize * width + cx as usize];
            match mode {
                Composite::Max => *cell = cell.max(s.value),
                Composite::Sum => *cell += s.value,
            }
        }
        grid
    }
}

/// Synthesize the intensity field of one frame.
///
/// For each sensor at `(x, y)` with reading `z`, every integer offset
/// `(dx, dy)` in `[-r, r]^2`, with `r = floor(kernel_extent * sigma)`,
/// yields a sample at `(x + dx, y + dy)` of value
/// `z * exp(-(dx^2 + dy^2) / (2 sigma^2))`, unless the point falls outside
/// `[0, width) x [0, height)`.
///
/// # Errors
///
/// Returns a length mismatch error (as frame 0) if the frame's reading count
/// differs from the sensor count.
pub fn synthesize_field(
    frame: &Frame,
    geometry: &SensorGeometry,
    config: &SwayConfig,
) -> Result<IntensityField> {
    frame.check_len(0, geometry.len())?;

    let radius = config.kernel_radius();
    let width = config.canvas_width as f64;
    let height = config.canvas_height as f64;
    let two_sigma_sq = 2.0 * config.sigma * config.sigma;

    let mut samples = Vec::new();
    for (&z, p) in frame.readings().iter().zip(geometry.positions()) {
        for dy in -radius..=radius {
            let y = p[1] + dy as f64;
            if y < 0.0 || y >= height {
                continue;
            }
            for dx in -radius..=radius {
                let x = p[0] + dx as f64;
                if x < 0.0 || x >= width {
                    continue;
                }
                let dist_sq = (dx * dx + dy * dy) as f64;
                samples.push(FieldSample {
                    x,
                    y,
                    value: z * (-dist_sq / two_sigma_sq).exp(),
                });
            }
        }
    }

    Ok(IntensityField { samples })
}
