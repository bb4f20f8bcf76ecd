//! Mathematical utilities for dispersion analysis.
//!
//! - [`linalg`]: closed-form 2x2 symmetric eigendecomposition

pub mod linalg;

pub use linalg::SymmetricEigen2;
