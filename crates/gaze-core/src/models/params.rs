use serde::{Deserialize, Serialize};

use super::PinholeCamera;
use crate::{Pt3, Real, Vec2, Vec3};

/// Serializable pinhole camera parameters.
///
/// Angles are radians, composed as `Rz(z) * Ry(y) * Rx(x)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinholeCameraParams {
    /// Principal point `[cx, cy]` in pixels.
    pub principal_point: [Real; 2],
    /// Pixel pitch `[sx, sy]` in cm/px.
    pub pixel_size: [Real; 2],
    /// Effective focal length in cm.
    pub focal_length: Real,
    /// Projection center in the world frame (cm).
    pub position: [Real; 3],
    /// Orientation angles `[x, y, z]` in radians.
    pub angles: [Real; 3],
}

impl PinholeCameraParams {
    pub fn build(&self) -> PinholeCamera {
        PinholeCamera::new(
            Vec2::from(self.principal_point),
            Vec2::from(self.pixel_size),
            self.focal_length,
            Pt3::from(self.position),
            Vec3::from(self.angles),
        )
    }
}

impl From<&PinholeCamera> for PinholeCameraParams {
    fn from(camera: &PinholeCamera) -> Self {
        Self {
            principal_point: camera.principal_point.into(),
            pixel_size: camera.pixel_size.into(),
            focal_length: camera.focal_length,
            position: camera.position.coords.into(),
            angles: camera.angles().into(),
        }
    }
}
