//! Forward simulation of the spherical cornea eye model.
//!
//! Given a parameter bundle and the true eye pose, these helpers produce the
//! pixel observations a perfect feature detector would report:
//! - glints from the mirror law on the corneal sphere,
//! - the pupil image from refraction at the corneal sphere.

use crate::{
    angles_from_direction, direction_from_angles, geometry, CameraObservation,
    EyeAndCameraParameters, EyeParameters, Pt3, PupilCenterGlintInputs, Real, Vec3,
};

const GLINT_MAX_ITERS: usize = 200;
const PUPIL_SCAN_STEPS: usize = 512;
const PUPIL_BISECTION_ITERS: usize = 200;

/// True eye pose in the world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePose {
    pub cornea_center: Pt3,
    /// Unit optical axis.
    pub optical_axis: Vec3,
}

impl EyePose {
    /// Pose whose visual axis passes through `target`.
    pub fn looking_at(eye: &EyeParameters, cornea_center: Pt3, target: &Pt3) -> Self {
        let visual = (target - cornea_center).normalize();
        let (theta, phi) = angles_from_direction(&visual);
        Self {
            cornea_center,
            optical_axis: direction_from_angles(theta - eye.alpha, phi - eye.beta),
        }
    }

    pub fn pupil_center(&self, eye: &EyeParameters) -> Pt3 {
        self.cornea_center + self.optical_axis * eye.k
    }
}

/// Point on the corneal sphere that mirrors `light` into `camera`.
pub fn glint_point(center: &Pt3, radius: Real, light: &Pt3, camera: &Pt3) -> Option<Pt3> {
    let mut normal = ((camera - center).normalize() + (light - center).normalize()).normalize();
    let mut q = center + normal * radius;
    for _ in 0..GLINT_MAX_ITERS {
        normal = geometry::reflection_normal(&q, light, camera)?;
        let next = center + normal * radius;
        let step = (next - q).norm();
        q = next;
        if step < 1e-15 {
            break;
        }
    }
    Some(q)
}

/// Point on the corneal sphere where the ray from `camera` enters the eye
/// and, after refraction, passes through `pupil`.
///
/// The search runs in the plane spanned by the camera, the cornea center and
/// the pupil, from the point facing the camera outwards to the limb.
pub fn pupil_surface_point(
    eye: &EyeParameters,
    center: &Pt3,
    pupil: &Pt3,
    camera: &Pt3,
) -> Option<Pt3> {
    let to_camera = camera - center;
    let dist = to_camera.norm();
    if dist <= eye.r {
        return None;
    }
    let e1 = to_camera / dist;
    let rel = pupil - center;
    let lateral = rel - e1 * rel.dot(&e1);
    let Some(e2) = lateral.try_normalize(1e-15) else {
        return Some(center + e1 * eye.r);
    };
    let e3 = e1.cross(&e2);
    let eta = eye.n2 / eye.n1;

    let surface = |theta: Real| center + (e1 * theta.cos() + e2 * theta.sin()) * eye.r;
    let mismatch = |theta: Real| -> Option<Real> {
        let s = surface(theta);
        let incoming = (s - camera).normalize();
        let normal = (s - center) / eye.r;
        let refracted = geometry::refract(&incoming, &normal, eta)?;
        Some(refracted.cross(&(pupil - s)).dot(&e3))
    };

    let theta_max = (eye.r / dist).acos() * (1.0 - 1e-9);
    let mut lo = 0.0;
    let mut f_lo = mismatch(lo)?;
    let mut bracket = None;
    for i in 1..=PUPIL_SCAN_STEPS {
        let hi = theta_max * i as Real / PUPIL_SCAN_STEPS as Real;
        let f_hi = mismatch(hi)?;
        if f_lo == 0.0 {
            return Some(surface(lo));
        }
        if f_lo.signum() != f_hi.signum() {
            bracket = Some((lo, hi));
            break;
        }
        lo = hi;
        f_lo = f_hi;
    }

    let (mut a, mut b) = bracket?;
    let mut f_a = mismatch(a)?;
    for _ in 0..PUPIL_BISECTION_ITERS {
        let mid = 0.5 * (a + b);
        let f_mid = mismatch(mid)?;
        if f_mid.signum() == f_a.signum() {
            a = mid;
            f_a = f_mid;
        } else {
            b = mid;
        }
        if b - a < 1e-16 {
            break;
        }
    }
    Some(surface(0.5 * (a + b)))
}

/// Exact pupil/glint pixels for every camera of `params`.
///
/// `None` when a feature falls behind a camera or the refraction search
/// finds no entry point.
pub fn observe(params: &EyeAndCameraParameters, pose: &EyePose) -> Option<PupilCenterGlintInputs> {
    let eye = &params.eye;
    let pupil = pose.pupil_center(eye);
    let mut cameras = Vec::with_capacity(params.cameras.len());
    for camera in &params.cameras {
        let entry = pupil_surface_point(eye, &pose.cornea_center, &pupil, &camera.position)?;
        let pupil_px = camera.project(&entry)?;
        let mut glints = Vec::with_capacity(params.lights.len());
        for light in &params.lights {
            let q = glint_point(&pose.cornea_center, eye.r, light, &camera.position)?;
            glints.push(camera.project(&q)?);
        }
        cameras.push(CameraObservation::new(pupil_px, glints));
    }
    Some(PupilCenterGlintInputs::new(cameras))
}
