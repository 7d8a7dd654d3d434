//! Two-camera spherical cornea estimator.
//!
//! For camera `j` and light `i`, the camera, the light, the glint and the
//! cornea center are coplanar. All planes of one camera therefore share the
//! line from the camera through the cornea center, and the cornea center is
//! where the two cameras' lines meet.

use gaze_core::{
    EyeAndCameraParameters, GazeEstimationResult, PinholeCamera, Pt2, Pt3,
    PupilCenterGlintInputs, Ray, Real, Vec3,
};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::triangulation::{common_line_direction, triangulate_rays};
use crate::{eye_model, GazeError};

/// How the optical axis is found once the cornea center is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TwoCameraMode {
    /// Intersect the planes spanned by each camera, the cornea center and
    /// that camera's pupil ray. Refraction keeps the ray in this plane, so no
    /// eye optics are needed.
    PlaneIntersection,
    /// Refract each pupil ray into the eye and triangulate the refracted rays.
    #[default]
    ExplicitRefraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoCameraOptions {
    pub mode: TwoCameraMode,
    /// Smallest accepted sine of the angle between triangulated rays.
    pub min_ray_angle_sin: Real,
}

impl Default for TwoCameraOptions {
    fn default() -> Self {
        Self {
            mode: TwoCameraMode::default(),
            min_ray_angle_sin: 1e-3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TwoCameraSpherical {
    pub options: TwoCameraOptions,
}

impl TwoCameraSpherical {
    pub fn new(options: TwoCameraOptions) -> Self {
        Self { options }
    }

    pub fn with_mode(mode: TwoCameraMode) -> Self {
        Self::new(TwoCameraOptions {
            mode,
            ..TwoCameraOptions::default()
        })
    }

    fn check_shapes(
        inputs: &PupilCenterGlintInputs,
        params: &EyeAndCameraParameters,
    ) -> Result<(), GazeError> {
        if params.num_cameras() != 2 {
            return Err(GazeError::ParameterCameraCount {
                expected: 2,
                got: params.num_cameras(),
            });
        }
        if inputs.num_cameras() != 2 {
            return Err(GazeError::ObservationCameraCount {
                expected: 2,
                got: inputs.num_cameras(),
            });
        }
        if params.num_lights() < 2 {
            return Err(GazeError::NotEnoughLights {
                required: 2,
                got: params.num_lights(),
            });
        }
        for (camera, obs) in inputs.cameras.iter().enumerate() {
            if obs.glints.len() != params.num_lights() {
                return Err(GazeError::GlintCountMismatch {
                    camera,
                    expected: params.num_lights(),
                    got: obs.glints.len(),
                });
            }
        }
        eye_model::check_eye(&params.eye)
    }

    /// Ray from a camera towards the cornea center, from that camera's glints.
    pub fn cornea_ray(
        camera: &PinholeCamera,
        glints: &[Pt2],
        lights: &[Pt3],
    ) -> Result<Ray, GazeError> {
        let glint_dirs: Vec<Vec3> = glints.iter().map(|g| camera.backproject(g).dir).collect();
        let normals: Vec<Vec3> = lights
            .iter()
            .zip(&glint_dirs)
            .map(|(light, g)| (light - camera.position).cross(g))
            .collect();

        let mut dir = common_line_direction(&normals).ok_or_else(|| {
            GazeError::Degenerate("glint planes do not define a line".to_string())
        })?;
        let mean_glint: Vec3 = glint_dirs.iter().sum();
        if dir.dot(&mean_glint) < 0.0 {
            dir = -dir;
        }
        Ok(Ray::new(camera.position, dir))
    }

    /// Cornea center from the glints of both cameras.
    pub fn cornea_center(
        &self,
        inputs: &PupilCenterGlintInputs,
        params: &EyeAndCameraParameters,
    ) -> Result<Pt3, GazeError> {
        let rays = params
            .cameras
            .iter()
            .zip(&inputs.cameras)
            .map(|(camera, obs)| Self::cornea_ray(camera, &obs.glints, &params.lights))
            .collect::<Result<Vec<_>, _>>()?;
        triangulate_rays(&rays, self.options.min_ray_angle_sin)
    }

    fn optical_axis_from_planes(
        &self,
        c: &Pt3,
        inputs: &PupilCenterGlintInputs,
        params: &EyeAndCameraParameters,
    ) -> Result<Vec3, GazeError> {
        let normals: Vec<Vec3> = params
            .cameras
            .iter()
            .zip(&inputs.cameras)
            .map(|(camera, obs)| {
                (camera.position - c).cross(&camera.backproject(&obs.pupil).dir)
            })
            .collect();

        let axis = normals[0].cross(&normals[1]);
        let scale = normals[0].norm() * normals[1].norm();
        let sin_angle = if scale > 0.0 { axis.norm() / scale } else { 0.0 };
        if sin_angle.is_nan() || sin_angle < self.options.min_ray_angle_sin {
            return Err(GazeError::NearParallelRays { sin_angle });
        }

        let mut w = axis / axis.norm();
        let toward_cameras: Vec3 = params.cameras.iter().map(|cam| cam.position - c).sum();
        if w.dot(&toward_cameras) < 0.0 {
            w = -w;
        }
        Ok(w)
    }

    pub fn estimate(
        &self,
        inputs: &PupilCenterGlintInputs,
        params: &EyeAndCameraParameters,
    ) -> Result<GazeEstimationResult, GazeError> {
        Self::check_shapes(inputs, params)?;
        let c = self.cornea_center(inputs, params)?;
        let eye = &params.eye;

        match self.options.mode {
            TwoCameraMode::PlaneIntersection => {
                let w = self.optical_axis_from_planes(&c, inputs, params)?;
                eye_model::assemble_result(eye, c, w, c + w * eye.k)
            }
            TwoCameraMode::ExplicitRefraction => {
                let refracted = params
                    .cameras
                    .iter()
                    .zip(&inputs.cameras)
                    .map(|(camera, obs)| {
                        eye_model::refract_into_eye(eye, &c, &camera.backproject(&obs.pupil))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let p = triangulate_rays(&refracted, self.options.min_ray_angle_sin)?;
                debug!(
                    "refracted pupil center {:.3} cm from the cornea center",
                    (p - c).norm()
                );
                eye_model::result_from_pupil(eye, c, p)
            }
        }
    }
}
