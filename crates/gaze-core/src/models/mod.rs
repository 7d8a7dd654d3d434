//! Camera and eye models.
//!
//! - [`PinholeCamera`]: projection between world points and pixels.
//! - [`PinholeCameraParams`]: its serializable form.
//! - [`EyeParameters`] / [`EyeAndCameraParameters`]: the per-subject
//!   parameter bundle consumed by gaze estimators.

mod camera;
mod eye;
mod params;

pub use camera::*;
pub use eye::*;
pub use params::*;
