//! High-level entry crate for model-based gaze estimation.
//!
//! A gaze estimate starts from the pupil center and the corneal reflections
//! (glints) of known lights in one or two calibrated cameras. The spherical
//! cornea model turns them into a cornea center, an optical axis and, after
//! the subject-specific kappa offset, a visual axis. Intersecting the visual
//! axis with the screen plane gives the point of interest.
//!
//! ## Per-frame estimation
//!
//! ```no_run
//! use gaze::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScenarioConfig::single_camera_reference();
//! let params = config.parameters();
//! let frame = PupilCenterGlintInputs::single(
//!     Pt2::new(301.2, 402.7),
//!     vec![Pt2::new(296.0, 401.1), Pt2::new(306.3, 401.0)],
//! );
//!
//! let result = config.estimator.estimate(&frame, &params)?;
//! let poi = config.reducer().reduce(&result)?;
//! println!("looking at {:?} px", config.screen.world_to_pixel(&poi));
//! # Ok(())
//! # }
//! ```
//!
//! ## Calibration and evaluation
//!
//! ```no_run
//! use gaze::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ScenarioConfig::load("scenario.json")?;
//! let samples = SessionInput::load("samples.json")?;
//!
//! let run = run_calibration(&config, &samples.calibration)?;
//! let report = evaluate(&config, &run.parameters, &samples.test)?;
//! println!("mean error {:?} px", report.mean_error_px);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - **[`core`]**: math types, camera and eye models, synthetic scenes
//! - **[`estimation`]**: one- and two-camera estimators, point of interest
//! - **[`optim`]**: bounded Levenberg-Marquardt calibration engine
//! - **[`pipeline`]**: scenario configuration, calibration and evaluation runs
//! - **[`prelude`]**: common re-exports

/// Math types, camera and eye models, ray optics and synthetic scenes.
pub mod core {
    pub use gaze_core::*;
}

/// Cornea center, optical and visual axis estimation.
pub mod estimation {
    pub use gaze_estimation::*;
}

/// Generic bounded calibration over any estimator.
pub mod optim {
    pub use gaze_optim::*;
}

/// Serializable scenarios and calibration/evaluation workflows.
pub mod pipeline {
    pub use gaze_pipeline::*;
}

/// Convenient re-exports for common use cases.
///
/// Import with `use gaze::prelude::*;`.
pub mod prelude {
    pub use crate::core::{
        EyeAndCameraParameters, EyeParameters, GazeEstimationResult, PinholeCamera,
        PinholeCameraParams, Pt2, Pt3, PupilCenterGlintInputs, Real, Vec3,
    };
    pub use crate::estimation::{
        GazeError, GazeEstimatorKind, PointOfInterestReducer, ScreenGeometry, TargetPlane,
        TwoCameraMode,
    };
    pub use crate::optim::{
        BoundsArray, CalibrationOptions, CalibrationOutcome, CalibrationSample, Estimator,
        GenericCalibration, VariableVector,
    };
    pub use crate::pipeline::{
        evaluate, run_calibration, run_session, CalibrationLayout, EvaluationReport,
        ScenarioConfig, SessionInput, SyntheticSession,
    };
}
