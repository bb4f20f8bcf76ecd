//! Frames of sensor readings and the validated frame series.
//!
//! A session's frames are loaded once, fully materialized, and never mutated.
//! Two on-disk formats are accepted:
//!
//! - JSON: a top-level array of arrays of numbers, one inner array per frame.
//! - CSV: header-less rows of comma-separated numbers, one row per frame.
//!
//! # Example
//!
//! ```
//! use pressure_sway::{FrameSeries, SensorGeometry};
//!
//! let geometry = SensorGeometry::new(vec![[0.0, 0.0], [10.0, 0.0]])?;
//! let series = FrameSeries::from_json_str("[[1, 0], [0.5, 0.5]]", &geometry)?;
//! assert_eq!(series.len(), 2);
//! # Ok::<(), pressure_sway::SwayError>(())
//! ```

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, SwayError};
use crate::geometry::SensorGeometry;

/// One time sample: a non-negative reading per sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    readings: Vec<f64>,
}

impl Frame {
    /// Wrap readings that are validated by the caller.
    pub(crate) fn new(readings: Vec<f64>) -> Self {
        Self { readings }
    }

    /// Validate a standalone frame against `geometry`.
    ///
    /// # Errors
    ///
    /// Fails if the reading count differs from the sensor count, or any
    /// reading is negative or non-finite. Errors report the frame as 0.
    ///
    /// # Example
    ///
    /// ```
    /// use pressure_sway::{compute_cop, CopPoint, Frame, SensorGeometry};
    ///
    /// let geometry = SensorGeometry::new(vec![[0.0, 0.0], [10.0, 0.0]])?;
    /// let frame = Frame::try_new(vec![1.0, 3.0], &geometry)?;
    /// assert_eq!(compute_cop(&frame, &geometry)?, CopPoint::Defined([7.5, 0.0]));
    ///
    /// assert!(Frame::try_new(vec![1.0], &geometry).is_err());
    /// # Ok::<(), pressure_sway::SwayError>(())
    /// ```
    pub fn try_new(readings: Vec<f64>, geometry: &SensorGeometry) -> Result<Self> {
        let frame = Self::new(readings);
        frame.validate(0, geometry.len())?;
        Ok(frame)
    }

    /// Check the reading count and every reading, reporting errors as
    /// frame `index`.
    fn validate(&self, index: usize, expected: usize) -> Result<()> {
        self.check_len(index, expected)?;
        for (s, &value) in self.readings.iter().enumerate() {
            if !value.is_finite() {
                return Err(SwayError::non_finite_reading(index, s));
            }
            if value < 0.0 {
                return Err(SwayError::negative_reading(index, s, value));
            }
        }
        Ok(())
    }

    /// Fail unless the frame has exactly `expected` readings.
    pub(crate) fn check_len(&self, index: usize, expected: usize) -> Result<()> {
        if self.readings.len() == expected {
            Ok(())
        } else {
            Err(SwayError::length_mismatch(index, expected, self.readings.len()))
        }
    }

    /// Readings in sensor order.
    #[must_use]
    pub fn readings(&self) -> &[f64] {
        &self.readings
    }

    /// Number of readings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the frame carries no readings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Total load on all sensors.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.readings.iter().sum()
    }
}

/// Validated, ordered sequence of frames. Index is the time step.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSeries {
    frames: Vec<Frame>,
}

impl FrameSeries {
    /// Validate `frames` against `geometry`.
    ///
    /// # Errors
    ///
    /// Fails if the series is empty, any frame length differs from the sensor
    /// count, or any reading is negative or non-finite. Nothing is truncated
    /// or padded.
    pub fn new(frames: Vec<Frame>, geometry: &SensorGeometry) -> Result<Self> {
        if frames.is_empty() {
            return Err(SwayError::EmptySeries);
        }

        let expected = geometry.len();
        for (f, frame) in frames.iter().enumerate() {
            frame.validate(f, expected)?;
        }

        Ok(Self { frames })
    }

    /// Build from nested vectors of readings.
    ///
    /// # Errors
    ///
    /// See [`FrameSeries::new`].
    pub fn from_rows(rows: Vec<Vec<f64>>, geometry: &SensorGeometry) -> Result<Self> {
        Self::new(rows.into_iter().map(Frame::new).collect(), geometry)
    }

    /// Parse a JSON array of arrays of numbers.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed JSON, then validates as
    /// [`FrameSeries::new`].
    pub fn from_json_str(json: &str, geometry: &SensorGeometry) -> Result<Self> {
        let rows: Vec<Vec<f64>> = serde_json::from_str(json)?;
        Self::from_rows(rows, geometry)
    }

    /// Parse JSON from a reader.
    ///
    /// # Errors
    ///
    /// See [`FrameSeries::from_json_str`].
    pub fn from_json_reader<R: Read>(reader: R, geometry: &SensorGeometry) -> Result<Self> {
        let rows: Vec<Vec<f64>> = serde_json::from_reader(reader)?;
        Self::from_rows(rows, geometry)
    }

    /// Load a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened, otherwise see
    /// [`FrameSeries::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>, geometry: &SensorGeometry) -> Result<Self> {
        let file = fs::File::open(path)?;
        Self::from_json_reader(std::io::BufReader::new(file), geometry)
    }

    /// Parse header-less CSV, one frame per row. Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns a CSV error naming the 1-based line of the first unparseable
    /// field, then validates as [`FrameSeries::new`].
    pub fn from_csv_str(csv: &str, geometry: &SensorGeometry) -> Result<Self> {
        let mut rows = Vec::new();
        for (i, line) in csv.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split(',')
                .map(|field| {
                    let field = field.trim();
                    field
                        .parse::<f64>()
                        .map_err(|e| SwayError::csv(i + 1, format!("{field:?}: {e}")))
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }
        Self::from_rows(rows, geometry)
    }

    /// Load a CSV file.
    ///
    /// # Errors
    ///
    /// See [`FrameSeries::from_csv_str`].
    pub fn from_csv_file(path: impl AsRef<Path>, geometry: &SensorGeometry) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_csv_str(&text, geometry)
    }

    /// Serialize as a JSON array of arrays.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_json_string(&self) -> Result<String> {
        let rows: Vec<&[f64]> = self.frames.iter().map(Frame::readings).collect();
        Ok(serde_json::to_string(&rows)?)
    }

    /// Keep only the first `limit` frames.
    ///
    /// A limit at or past the series length leaves it unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error for a limit of 0, which would leave no frames.
    pub fn limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(SwayError::invalid_input("frame limit must be at least 1"));
        }
        self.frames.truncate(limit);
        Ok(self)
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false for a constructed series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// All frames in time order.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Iterate over frames in time order.
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }
}

impl<'a> IntoIterator for &'a FrameSeries {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
