//! Sensor geometry: the fixed mapping from sensor index to canvas position.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SwayError};

/// 16-sensor insole layout, in canvas units (120 x 300 canvas).
const INSOLE16: [[f64; 2]; 16] = [
    [98.4909, 211.439],
    [100.7945, 178.4249],
    [66.6567, 175.9563],
    [82.986, 178.8826],
    [33.2587, 162.0871],
    [49.8978, 168.845],
    [42.0029, 113.2988],
    [77.0211, 114.4686],
    [59.1284, 41.3161],
    [70.285, 53.3156],
    [68.8198, 24.8434],
    [47.2946, 24.5495],
    [47.5886, 53.3203],
    [59.6174, 82.9056],
    [49.0136, 147.1317],
    [77.8881, 151.4722],
];

/// Ordered sensor positions, index-aligned with every frame's readings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<[f64; 2]>", into = "Vec<[f64; 2]>"))]
pub struct SensorGeometry {
    positions: Vec<[f64; 2]>,
}

/// Axis-aligned bounding box of the sensor positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl SensorGeometry {
    /// Create a geometry from sensor positions.
    ///
    /// # Errors
    ///
    /// Returns an error if `positions` is empty or contains non-finite values.
    pub fn new(positions: Vec<[f64; 2]>) -> Result<Self> {
        if positions.is_empty() {
            return Err(SwayError::invalid_input("sensor geometry is empty"));
        }
        if let Some(i) = positions
            .iter()
            .position(|p| !(p[0].is_finite() && p[1].is_finite()))
        {
            return Err(SwayError::invalid_input(format!(
                "sensor {i} has a non-finite position"
            )));
        }
        Ok(Self { positions })
    }

    /// The 16-sensor insole layout the default canvas is sized for.
    #[must_use]
    pub fn insole16() -> Self {
        Self {
            positions: INSOLE16.to_vec(),
        }
    }

    /// Number of sensors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false for a constructed geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sensor positions in index order.
    #[must_use]
    pub fn positions(&self) -> &[[f64; 2]] {
        &self.positions
    }

    /// Bounding box of all sensors.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in &self.positions {
            for axis in 0..2 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Bounds { min, max }
    }
}

impl TryFrom<Vec<[f64; 2]>> for SensorGeometry {
    type Error = SwayError;

    fn try_from(positions: Vec<[f64; 2]>) -> Result<Self> {
        Self::new(positions)
    }
}

impl From<SensorGeometry> for Vec<[f64; 2]> {
    fn from(geometry: SensorGeometry) -> Self {
        geometry.positions
    }
}

impl Bounds {
    /// Whether `point` lies inside the box, with tolerance `eps`.
    #[must_use]
    pub fn contains(&self, point: [f64; 2], eps: f64) -> bool {
        (0..2).all(|a| point[a] >= self.min[a] - eps && point[a] <= self.max[a] + eps)
    }
}
