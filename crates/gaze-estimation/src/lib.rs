//! Model-based gaze estimation from pupil and corneal reflections.
//!
//! Two strategies share the same eye optics ([`eye_model`]) and differ in how
//! they find the cornea center:
//! - [`OneCameraSpherical`]: one camera, at least two lights; the glint
//!   distances are solved so that every light proposes the same center.
//! - [`TwoCameraSpherical`]: two cameras; each camera's glint planes give a
//!   line through the center and the lines are triangulated.
//!
//! [`GazeEstimatorKind`] wraps both and implements the calibration engine's
//! [`gaze_optim::Estimator`] seam. [`PointOfInterestReducer`] turns a result
//! into the point the subject looks at.

mod error;
mod estimator;
pub mod eye_model;
mod one_camera;
pub mod poi;
pub mod triangulation;
mod two_camera;

pub use error::GazeError;
pub use estimator::GazeEstimatorKind;
pub use one_camera::{OneCameraOptions, OneCameraSpherical};
pub use poi::{PointOfInterestReducer, ScreenGeometry, TargetPlane};
pub use two_camera::{TwoCameraMode, TwoCameraOptions, TwoCameraSpherical};
