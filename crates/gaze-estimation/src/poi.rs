//! Point of interest: where the visual axis meets the target plane, and the
//! conversion between screen pixels and the display's world frame.

use gaze_core::{GazeEstimationResult, Pt2, Pt3, Real, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::GazeError;

/// Plane in the estimator frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetPlane {
    pub point: Pt3,
    /// Plane normal; need not be unit length.
    pub normal: Vec3,
}

impl TargetPlane {
    /// Plane `z = z`.
    pub fn z(z: Real) -> Self {
        Self {
            point: Pt3::new(0.0, 0.0, z),
            normal: Vec3::z(),
        }
    }

    /// Intersection of the half-line `origin + t * dir`, `t >= 0`.
    pub fn intersect(&self, origin: &Pt3, dir: &Vec3) -> Result<Pt3, GazeError> {
        let denom = self.normal.dot(dir);
        if denom.abs() <= 1e-12 * self.normal.norm() * dir.norm() {
            return Err(GazeError::ParallelToTargetPlane);
        }
        let t = self.normal.dot(&(self.point - origin)) / denom;
        if t < 0.0 {
            return Err(GazeError::Degenerate(
                "target plane is behind the eye".to_string(),
            ));
        }
        Ok(origin + dir * t)
    }
}

/// Reduces an estimate to its point of interest in the world frame.
///
/// The estimator frame is the world frame shifted by `wcs_offset`, so the
/// reduced point is `poi - wcs_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterestReducer {
    pub plane: TargetPlane,
    pub wcs_offset: Vec3,
}

impl PointOfInterestReducer {
    pub fn new(plane: TargetPlane, wcs_offset: Vec3) -> Self {
        Self { plane, wcs_offset }
    }

    /// Point of interest in the estimator frame.
    pub fn point_of_interest(&self, result: &GazeEstimationResult) -> Result<Pt3, GazeError> {
        self.plane
            .intersect(&result.cornea_center, &result.visual_axis)
    }

    pub fn reduce(&self, result: &GazeEstimationResult) -> Result<Pt3, GazeError> {
        Ok(self.point_of_interest(result)? - self.wcs_offset)
    }
}

/// Physical size and resolution of the display.
///
/// Screen pixels have their origin at the top-left corner with `y` down; the
/// display's world frame shares the origin with `y` up and `z = 0` on the
/// display surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub size_cm: [Real; 2],
    pub resolution: [Real; 2],
}

impl ScreenGeometry {
    pub fn new(size_cm: [Real; 2], resolution: [Real; 2]) -> Self {
        Self {
            size_cm,
            resolution,
        }
    }

    /// Centimeters per screen pixel.
    pub fn pixel_pitch(&self) -> Vec2 {
        Vec2::new(
            self.size_cm[0] / self.resolution[0],
            self.size_cm[1] / self.resolution[1],
        )
    }

    pub fn pixel_to_world(&self, px: &Pt2) -> Pt3 {
        let pitch = self.pixel_pitch();
        Pt3::new(px.x * pitch.x, -px.y * pitch.y, 0.0)
    }

    pub fn world_to_pixel(&self, p: &Pt3) -> Pt2 {
        let pitch = self.pixel_pitch();
        Pt2::new(p.x / pitch.x, -p.y / pitch.y)
    }
}
