//! Bounded non-linear least squares and a generic calibration engine.
//!
//! [`GenericCalibration`] fits a flat, bounded variable vector so that an
//! [`Estimator`] run over parameters built by a caller-supplied applicator
//! reproduces known targets. The optimizer itself is the Levenberg-Marquardt
//! backend in [`backend_lm`], driven through the [`NllsProblem`] trait.

pub mod backend_lm;
pub mod bounds;
pub mod calibration;
mod error;
pub mod jacobian;
pub mod robust;
mod traits;

pub use crate::backend_lm::LmBackend;
pub use crate::bounds::{BoundsArray, VariableLayout, VariableVector};
pub use crate::calibration::{
    CalibrationOptions, CalibrationOutcome, CalibrationReport, CalibrationSample,
    CalibrationStatus, Estimator, ExcludedSample, GenericCalibration,
};
pub use crate::error::CalibrationError;
pub use crate::robust::RobustKernel;
pub use crate::traits::{
    NllsProblem, NllsSolverBackend, SolveOptions, SolveReport, SolveTermination,
};
