//! Single-camera spherical cornea estimator.
//!
//! Every glint lies on its back-projected ray at an unknown distance `k_i`.
//! At that point the corneal normal bisects the directions to the camera and
//! to the light, so each light proposes a cornea center
//! `c_i = q_i - R * n_i`. The distances are chosen so that all proposals
//! agree, which needs at least two lights.

use gaze_core::{
    geometry, EyeAndCameraParameters, GazeEstimationResult, PinholeCamera, Pt2, Pt3,
    PupilCenterGlintInputs, Real, Vec3,
};
use gaze_optim::{
    LmBackend, NllsProblem, NllsSolverBackend, SolveOptions, SolveReport, SolveTermination,
};
use log::debug;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::{eye_model, GazeError};

// Residual used where a candidate distance gives no reflection normal.
const DEGENERATE_RESIDUAL: Real = 1.0e3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OneCameraOptions {
    pub solve: SolveOptions,
    /// Number of geometric steps when scanning for the initial distance.
    pub scan_steps: usize,
    /// Scan range as multiples of `distance_to_camera_estimate`.
    pub scan_min_factor: Real,
    pub scan_max_factor: Real,
    /// Largest center disagreement, as a fraction of the corneal radius,
    /// accepted from a solve that stopped without meeting a tolerance.
    pub stalled_spread_tolerance: Real,
}

impl Default for OneCameraOptions {
    fn default() -> Self {
        Self {
            solve: SolveOptions {
                max_iters: 100,
                ftol: 1e-14,
                gtol: 1e-14,
                xtol: 1e-14,
            },
            scan_steps: 64,
            scan_min_factor: 0.25,
            scan_max_factor: 8.0,
            stalled_spread_tolerance: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneCameraSpherical {
    pub options: OneCameraOptions,
}

struct GlintRays {
    origin: Pt3,
    dirs: Vec<Vec3>,
    lights: Vec<Pt3>,
    radius: Real,
}

impl GlintRays {
    fn center_for(&self, i: usize, k: Real) -> Option<Pt3> {
        let q = self.origin + self.dirs[i] * k;
        let n = geometry::reflection_normal(&q, &self.lights[i], &self.origin)?;
        Some(q - n * self.radius)
    }

    fn centers(&self, ks: &[Real]) -> Option<Vec<Pt3>> {
        ks.iter()
            .enumerate()
            .map(|(i, &k)| self.center_for(i, k))
            .collect()
    }

    /// Summed squared disagreement when every glint sits at distance `k`.
    fn spread_at(&self, k: Real) -> Option<Real> {
        let ks = vec![k; self.dirs.len()];
        let centers = self.centers(&ks)?;
        Some(centers[1..].iter().map(|c| (c - centers[0]).norm_squared()).sum())
    }
}

impl NllsProblem for GlintRays {
    fn num_params(&self) -> usize {
        self.dirs.len()
    }

    fn num_residuals(&self) -> usize {
        3 * (self.dirs.len() - 1)
    }

    fn residuals(&self, x: &DVector<Real>) -> DVector<Real> {
        let Some(centers) = self.centers(x.as_slice()) else {
            return DVector::from_element(self.num_residuals(), DEGENERATE_RESIDUAL);
        };
        let mut r = DVector::zeros(self.num_residuals());
        for (i, c) in centers[1..].iter().enumerate() {
            r.fixed_rows_mut::<3>(3 * i).copy_from(&(c - centers[0]));
        }
        r
    }
}

impl OneCameraSpherical {
    pub fn new(options: OneCameraOptions) -> Self {
        Self { options }
    }

    fn check_shapes(
        inputs: &PupilCenterGlintInputs,
        params: &EyeAndCameraParameters,
    ) -> Result<(), GazeError> {
        if params.num_cameras() != 1 {
            return Err(GazeError::ParameterCameraCount {
                expected: 1,
                got: params.num_cameras(),
            });
        }
        if inputs.num_cameras() != 1 {
            return Err(GazeError::ObservationCameraCount {
                expected: 1,
                got: inputs.num_cameras(),
            });
        }
        if params.num_lights() < 2 {
            return Err(GazeError::NotEnoughLights {
                required: 2,
                got: params.num_lights(),
            });
        }
        let glints = inputs.cameras[0].glints.len();
        if glints != params.num_lights() {
            return Err(GazeError::GlintCountMismatch {
                camera: 0,
                expected: params.num_lights(),
                got: glints,
            });
        }
        eye_model::check_eye(&params.eye)
    }

    fn seed_distance(&self, rays: &GlintRays, estimate: Real) -> Option<Real> {
        let steps = self.options.scan_steps.max(2);
        let lo = estimate * self.options.scan_min_factor;
        let hi = estimate * self.options.scan_max_factor;
        let ratio = (hi / lo).powf(1.0 / (steps - 1) as Real);

        let mut best: Option<(Real, Real)> = None;
        let mut k = lo;
        for _ in 0..steps {
            if let Some(spread) = rays.spread_at(k) {
                if best.map_or(true, |(_, s)| spread < s) {
                    best = Some((k, spread));
                }
            }
            k *= ratio;
        }
        best.map(|(k, _)| k)
    }

    /// Accept a cornea solve only if it converged, or stalled with the
    /// proposed centers already close together.
    fn check_solve(&self, report: &SolveReport, radius: Real) -> Result<(), GazeError> {
        match report.termination {
            SolveTermination::Converged => Ok(()),
            SolveTermination::IterationLimit => Err(GazeError::NonConvergent {
                iterations: report.iterations,
            }),
            SolveTermination::Stalled => {
                // final_cost is 0.5 * ||r||^2 over the center differences.
                let spread = (2.0 * report.final_cost).sqrt();
                if spread.is_finite() && spread <= self.options.stalled_spread_tolerance * radius {
                    Ok(())
                } else {
                    Err(GazeError::Degenerate(format!(
                        "cornea solve stalled ({}) with centers {spread:.3e} cm apart",
                        report.detail
                    )))
                }
            }
        }
    }

    /// Cornea center from the glints of a single camera.
    pub fn cornea_center(
        &self,
        camera: &PinholeCamera,
        glints: &[Pt2],
        params: &EyeAndCameraParameters,
    ) -> Result<Pt3, GazeError> {
        let rays = GlintRays {
            origin: camera.position,
            dirs: glints.iter().map(|g| camera.backproject(g).dir).collect(),
            lights: params.lights.clone(),
            radius: params.eye.r,
        };

        let estimate = params.distance_to_camera_estimate;
        if !(estimate.is_finite() && estimate > 0.0) {
            return Err(GazeError::Degenerate(format!(
                "distance estimate {estimate} must be positive"
            )));
        }
        let k0 = self.seed_distance(&rays, estimate).ok_or_else(|| {
            GazeError::Degenerate("no reflection geometry along glint rays".to_string())
        })?;

        let x0 = DVector::from_element(rays.num_params(), k0);
        let (x, report) = LmBackend.solve(&rays, x0, &self.options.solve);
        debug!(
            "cornea solve: seed {k0:.4}, {:?} after {} evaluations, cost {:.3e}",
            report.termination, report.iterations, report.final_cost
        );
        self.check_solve(&report, rays.radius)?;
        if x.iter().any(|k| !(k.is_finite() && *k > 0.0)) {
            return Err(GazeError::Degenerate(
                "reflection point behind the camera".to_string(),
            ));
        }

        let centers = rays
            .centers(x.as_slice())
            .ok_or_else(|| GazeError::Degenerate("reflection normal undefined".to_string()))?;
        let sum = centers
            .iter()
            .fold(Vec3::zeros(), |acc, c| acc + c.coords);
        Ok(Pt3::from(sum / centers.len() as Real))
    }

    pub fn estimate(
        &self,
        inputs: &PupilCenterGlintInputs,
        params: &EyeAndCameraParameters,
    ) -> Result<GazeEstimationResult, GazeError> {
        Self::check_shapes(inputs, params)?;
        let camera = &params.cameras[0];
        let observation = &inputs.cameras[0];

        let c = self.cornea_center(camera, &observation.glints, params)?;
        let pupil_ray = camera.backproject(&observation.pupil);
        let p = eye_model::pupil_center_from_ray(&params.eye, &c, &pupil_ray)?;
        eye_model::result_from_pupil(&params.eye, c, p)
    }
}
