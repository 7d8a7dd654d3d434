//! Deterministic synthetic data generation helpers.
//!
//! Small building blocks for constructing synthetic gaze scenes in tests and
//! demos:
//! - forward simulation of glints and the refracted pupil image ([`eye`]),
//! - deterministic pixel noise ([`noise`]).
//!
//! Everything here is deterministic: no global RNG, explicit seeds.

pub mod eye;
pub mod noise;
