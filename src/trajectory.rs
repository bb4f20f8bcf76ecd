//! Center-of-pressure trajectory.
//!
//! The COP of a frame is the reading-weighted centroid of the sensor
//! positions. A frame with zero total load has no center; it yields
//! [`CopPoint::Undefined`], which downstream stages filter out.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frames::{Frame, FrameSeries};
use crate::geometry::SensorGeometry;

/// Center of pressure for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum CopPoint {
    /// Weighted centroid `[x, y]`.
    Defined([f64; 2]),
    /// No load on any sensor.
    #[default]
    Undefined,
}

impl CopPoint {
    /// Coordinates if defined.
    #[must_use]
    pub const fn coords(&self) -> Option<[f64; 2]> {
        match *self {
            Self::Defined(p) => Some(p),
            Self::Undefined => None,
        }
    }

    /// Whether this frame had a center of pressure.
    #[must_use]
    pub const fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }

    /// Coordinates with NaN in both axes for undefined points.
    #[must_use]
    pub const fn to_array(&self) -> [f64; 2] {
        match *self {
            Self::Defined(p) => p,
            Self::Undefined => [f64::NAN, f64::NAN],
        }
    }
}

/// Compute the center of pressure of a single frame.
///
/// # Errors
///
/// Returns [`SwayError::LengthMismatch`](crate::SwayError::LengthMismatch)
/// (as frame 0) if the frame's reading count differs from the sensor count.
pub fn compute_cop(frame: &Frame, geometry: &SensorGeometry) -> Result<CopPoint> {
    frame_cop(frame, geometry, 0)
}

/// Compute the COP of every frame, in frame order.
///
/// # Errors
///
/// Returns [`SwayError::LengthMismatch`](crate::SwayError::LengthMismatch)
/// naming the first frame whose reading count differs from the sensor count.
pub fn compute_cop_trajectory(
    series: &FrameSeries,
    geometry: &SensorGeometry,
) -> Result<Vec<CopPoint>> {
    series
        .iter()
        .enumerate()
        .map(|(i, f)| frame_cop(f, geometry, i))
        .collect()
}

fn frame_cop(frame: &Frame, geometry: &SensorGeometry, index: usize) -> Result<CopPoint> {
    frame.check_len(index, geometry.len())?;

    let total = frame.total();
    if total == 0.0 {
        return Ok(CopPoint::Undefined);
    }

    let (sx, sy) = frame
        .readings()
        .iter()
        .zip(geometry.positions())
        .fold((0.0, 0.0), |(sx, sy), (&z, p)| (sx + z * p[0], sy + z * p[1]));

    Ok(CopPoint::Defined([sx / total, sy / total]))
}

/// Defined COP coordinates among frames `0..=index`.
///
/// `index` past the end is clamped to the last frame.
#[must_use]
pub fn valid_prefix(cops: &[CopPoint], index: usize) -> Vec<[f64; 2]> {
    let end = index.saturating_add(1).min(cops.len());
    cops[..end].iter().filter_map(CopPoint::coords).collect()
}

/// Total COP excursion: sum of distances between consecutive defined points.
#[must_use]
pub fn path_length(points: &[[f64; 2]]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1][0] - w[0][0]).hypot(w[1][1] - w[0][1]))
        .sum()
}
