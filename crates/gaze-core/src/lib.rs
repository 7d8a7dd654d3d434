//! Core math and geometry primitives for model-based gaze estimation.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Pt3`, ...) and the
//!   optical/visual axis angle convention,
//! - the [`PinholeCamera`] model (projection and back-projection),
//! - ray optics on spheres (intersection, reflection, refraction),
//! - the per-subject [`EyeAndCameraParameters`] bundle and the per-frame
//!   observation/result types,
//! - deterministic synthetic scene helpers.
//!
//! Units follow the eye model: centimeters in space, pixels on the image.

/// Ray/sphere intersection, reflection and refraction.
pub mod geometry;
/// Linear algebra type aliases and angle helpers.
pub mod math;
/// Camera and eye models.
pub mod models;
/// Synthetic scenes for tests and demos.
pub mod synthetic;
/// Observation and estimation result types.
pub mod types;

pub use math::*;
pub use models::*;
pub use types::*;
