//! Pressure Sway Library
//!
//! Center-of-pressure analytics for pressure-sensor time series.
//!
//! This library turns sparse per-frame sensor readings into the three
//! artifacts a posturography display needs: a smoothed heatmap of the
//! current frame, the center-of-pressure (COP) trajectory, and a running
//! confidence ellipse describing postural sway.
//!
//! # Pipeline
//!
//! - **Trajectory**: reading-weighted centroid per frame, computed once
//! - **Field**: truncated Gaussian splat per sensor, per displayed frame
//! - **Dispersion**: covariance eigen-ellipse over the COP prefix
//! - **Scheduler**: play / pause / replay over the frame sequence
//!
//! # Quick Start
//!
//! ```
//! use pressure_sway::{FrameSeries, SensorGeometry, Session, SwayConfig};
//!
//! let geometry = SensorGeometry::new(vec![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]])?;
//! let frames = FrameSeries::from_json_str(
//!     "[[10, 0, 0, 0], [0, 0, 0, 0], [10, 10, 10, 10], [0, 5, 0, 5]]",
//!     &geometry,
//! )?;
//!
//! let session = Session::new(geometry, frames, SwayConfig::default())?;
//! let output = session.frame_output(3)?;
//!
//! assert_eq!(output.display_number, 4);
//! assert_eq!(output.trajectory.len(), 3);
//! assert_eq!(output.ellipse.points().len(), 100);
//! # Ok::<(), pressure_sway::SwayError>(())
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

pub mod config;
pub mod dispersion;
pub mod error;
pub mod field;
pub mod frames;
pub mod geometry;
pub mod math;
pub mod scheduler;
pub mod session;
pub mod trajectory;

// Re-exports for convenient access
pub use config::{SwayConfig, DEFAULT_CONFIDENCE_SCALE};
pub use dispersion::{
    confidence_ellipse, sample_covariance, Covariance, DispersionEllipse, EllipseShape,
};
pub use error::{Result, SwayError};
pub use field::{synthesize_field, Composite, FieldSample, IntensityField};
pub use frames::{Frame, FrameSeries};
pub use geometry::{Bounds, SensorGeometry};
pub use scheduler::{FrameScheduler, PlaybackCommand, PlaybackState};
pub use session::{FrameOutput, FrameSink, Session};
pub use trajectory::{compute_cop, compute_cop_trajectory, path_length, valid_prefix, CopPoint};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
