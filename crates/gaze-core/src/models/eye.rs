use serde::{Deserialize, Serialize};

use super::PinholeCamera;
use crate::{deg_to_rad, Pt3, Real};

/// Subject-specific optical constants of the spherical cornea eye model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EyeParameters {
    /// Horizontal offset of the visual axis from the optical axis (radians).
    pub alpha: Real,
    /// Vertical offset of the visual axis from the optical axis (radians).
    pub beta: Real,
    /// Radius of the corneal sphere (cm).
    pub r: Real,
    /// Distance from the cornea center to the pupil center (cm). The
    /// refracted pupil ray is intersected with a sphere of this radius.
    pub k: Real,
    /// Refractive index of the cornea and aqueous humor.
    pub n1: Real,
    /// Refractive index of the medium in front of the eye.
    pub n2: Real,
    /// Distance from the cornea center to the eye rotation center (cm).
    pub d: Real,
}

impl Default for EyeParameters {
    fn default() -> Self {
        Self {
            alpha: deg_to_rad(-5.0),
            beta: deg_to_rad(1.5),
            r: 0.78,
            k: 0.42,
            n1: 1.3375,
            n2: 1.0,
            d: 0.53,
        }
    }
}

/// Everything a gaze estimator needs besides the per-frame observation.
///
/// The camera count selects the estimator variant (one or two cameras), and
/// each camera must see one glint per light.
#[derive(Clone, Debug, PartialEq)]
pub struct EyeAndCameraParameters {
    pub eye: EyeParameters,
    pub cameras: Vec<PinholeCamera>,
    /// Illuminant positions in the world frame.
    pub lights: Vec<Pt3>,
    /// Rough eye-to-camera distance used to seed iterative solves (cm).
    pub distance_to_camera_estimate: Real,
}

impl EyeAndCameraParameters {
    pub fn num_cameras(&self) -> usize {
        self.cameras.len()
    }

    pub fn num_lights(&self) -> usize {
        self.lights.len()
    }
}
