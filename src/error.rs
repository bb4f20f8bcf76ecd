//! Error types for pressure-sway analysis.
//!
//! Only malformed input and invalid configuration are errors. Numerical
//! degeneracies (zero-load frames, singular covariance, too few points for
//! an ellipse) are represented in the output values instead.

use thiserror::Error;

/// Main error type for loading and analysis operations.
#[derive(Error, Debug)]
pub enum SwayError {
    /// Generic input validation error.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The frame sequence contains no frames.
    #[error("Frame sequence is empty")]
    EmptySeries,

    /// A frame's reading count does not match the sensor geometry.
    #[error("Frame {frame} has {actual} readings, geometry has {expected} sensors")]
    LengthMismatch {
        frame: usize,
        expected: usize,
        actual: usize,
    },

    /// A reading is below zero.
    #[error("Negative reading {value} at frame {frame}, sensor {sensor}")]
    NegativeReading {
        frame: usize,
        sensor: usize,
        value: f64,
    },

    /// A reading is NaN or infinite.
    #[error("Non-finite reading at frame {frame}, sensor {sensor}")]
    NonFiniteReading { frame: usize, sensor: usize },

    /// A frame index outside the loaded series was requested.
    #[error("Frame index {index} out of range for {len} frames")]
    FrameOutOfRange { index: usize, len: usize },

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON document could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// CSV row could not be parsed.
    #[error("CSV error at line {line}: {message}")]
    Csv { line: usize, message: String },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pressure-sway operations.
pub type Result<T> = std::result::Result<T, SwayError>;

impl SwayError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a length mismatch error.
    #[must_use]
    pub const fn length_mismatch(frame: usize, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            frame,
            expected,
            actual,
        }
    }

    /// Create a negative reading error.
    #[must_use]
    pub const fn negative_reading(frame: usize, sensor: usize, value: f64) -> Self {
        Self::NegativeReading {
            frame,
            sensor,
            value,
        }
    }

    /// Create a non-finite reading error.
    #[must_use]
    pub const fn non_finite_reading(frame: usize, sensor: usize) -> Self {
        Self::NonFiniteReading { frame, sensor }
    }

    /// Create a frame-out-of-range error.
    #[must_use]
    pub const fn frame_out_of_range(index: usize, len: usize) -> Self {
        Self::FrameOutOfRange { index, len }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a CSV parse error.
    #[must_use]
    pub fn csv(line: usize, message: impl Into<String>) -> Self {
        Self::Csv {
            line,
            message: message.into(),
        }
    }
}
