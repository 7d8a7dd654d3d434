//! Steps shared by every estimator once the cornea center is known:
//! refraction of the pupil ray, the optical axis and the kappa rotation to
//! the visual axis.

use gaze_core::{
    angles_from_direction, direction_from_angles, geometry, EyeParameters, GazeEstimationResult,
    Pt3, Ray, Vec3,
};

use crate::GazeError;

/// Reject eye shapes where the pupil sphere is not inside the cornea.
pub fn check_eye(eye: &EyeParameters) -> Result<(), GazeError> {
    if eye.k > 0.0 && eye.k < eye.r && eye.r.is_finite() {
        Ok(())
    } else {
        Err(GazeError::InvalidEyeGeometry { r: eye.r, k: eye.k })
    }
}

/// Bend a camera ray into the eye at the corneal sphere around `cornea_center`.
///
/// The returned ray starts on the corneal surface.
pub fn refract_into_eye(
    eye: &EyeParameters,
    cornea_center: &Pt3,
    ray: &Ray,
) -> Result<Ray, GazeError> {
    let t = geometry::intersect_sphere(ray, cornea_center, eye.r)
        .ok_or(GazeError::NoSphereIntersection { surface: "corneal" })?;
    let surface = ray.point_at(t);
    let normal = (surface - cornea_center) / eye.r;
    let dir = geometry::refract(&ray.dir, &normal, eye.n2 / eye.n1)
        .ok_or(GazeError::TotalInternalReflection)?;
    Ok(Ray::new(surface, dir))
}

/// Pupil center seen along the camera ray `ray`.
///
/// The refracted ray is intersected with the sphere of radius `k` around the
/// cornea center.
pub fn pupil_center_from_ray(
    eye: &EyeParameters,
    cornea_center: &Pt3,
    ray: &Ray,
) -> Result<Pt3, GazeError> {
    let inner = refract_into_eye(eye, cornea_center, ray)?;
    let t = geometry::intersect_sphere(&inner, cornea_center, eye.k)
        .ok_or(GazeError::NoSphereIntersection { surface: "pupil" })?;
    Ok(inner.point_at(t))
}

/// Visual axis for a unit optical axis: rotate by `(alpha, beta)`.
pub fn visual_axis(eye: &EyeParameters, optical_axis: &Vec3) -> Vec3 {
    let (theta, phi) = angles_from_direction(optical_axis);
    direction_from_angles(theta + eye.alpha, phi + eye.beta)
}

/// Result for a solved cornea center and optical axis.
pub fn assemble_result(
    eye: &EyeParameters,
    cornea_center: Pt3,
    optical_axis: Vec3,
    pupil_center: Pt3,
) -> Result<GazeEstimationResult, GazeError> {
    let optical_axis = optical_axis
        .try_normalize(1e-12)
        .ok_or_else(|| GazeError::Degenerate("optical axis has zero length".to_string()))?;
    let visual_axis = visual_axis(eye, &optical_axis);
    let result = GazeEstimationResult {
        cornea_center,
        visual_axis,
        optical_axis,
        pupil_center,
        rotation_center: cornea_center - optical_axis * eye.d,
    };
    let finite = result.cornea_center.iter().all(|v| v.is_finite())
        && result.visual_axis.iter().all(|v| v.is_finite());
    if finite {
        Ok(result)
    } else {
        Err(GazeError::Degenerate("non-finite estimate".to_string()))
    }
}

/// Result from a cornea center and the pupil center behind the cornea.
pub fn result_from_pupil(
    eye: &EyeParameters,
    cornea_center: Pt3,
    pupil_center: Pt3,
) -> Result<GazeEstimationResult, GazeError> {
    assemble_result(eye, cornea_center, pupil_center - cornea_center, pupil_center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaze_core::synthetic::eye::{pupil_surface_point, EyePose};

    #[test]
    fn refraction_recovers_pupil_center() {
        let eye = EyeParameters::default();
        assert_eq!((eye.n1, eye.n2), (1.3375, 1.0));

        let camera = Pt3::origin();
        for target in [
            Pt3::new(-24.5, 35.0, -10.0),
            Pt3::new(0.0, 20.0, -10.0),
            Pt3::new(20.0, 40.0, -10.0),
        ] {
            let center = Pt3::new(-1.0, 22.0, 55.0);
            let pose = EyePose::looking_at(&eye, center, &target);
            let pupil = pose.pupil_center(&eye);
            let entry = pupil_surface_point(&eye, &center, &pupil, &camera).unwrap();

            let ray = Ray::through(camera, &entry);
            let found = pupil_center_from_ray(&eye, &center, &ray).unwrap();
            let err = (found - pupil).norm();
            assert!(err < 1e-6, "pupil error {err} for target {target:?}");
        }
    }

    #[test]
    fn missing_the_cornea_is_reported() {
        let eye = EyeParameters::default();
        let ray = Ray::new(Pt3::origin(), Vec3::z());
        let err = pupil_center_from_ray(&eye, &Pt3::new(5.0, 0.0, 50.0), &ray).unwrap_err();
        assert_eq!(err, GazeError::NoSphereIntersection { surface: "corneal" });
    }

    #[test]
    fn pupil_sphere_must_sit_inside_the_cornea() {
        let mut eye = EyeParameters::default();
        assert!(check_eye(&eye).is_ok());
        eye.r = 0.4;
        eye.k = 1.2;
        assert_eq!(
            check_eye(&eye).unwrap_err(),
            GazeError::InvalidEyeGeometry { r: 0.4, k: 1.2 }
        );
        eye.k = 0.4;
        assert!(check_eye(&eye).is_err());
        eye.k = 0.0;
        assert!(check_eye(&eye).is_err());
    }

    #[test]
    fn visual_axis_applies_kappa_angles() {
        let eye = EyeParameters::default();
        let optical = direction_from_angles(0.1, -0.05);
        let (theta, phi) = angles_from_direction(&visual_axis(&eye, &optical));
        assert!((theta - (0.1 + eye.alpha)).abs() < 1e-12);
        assert!((phi - (-0.05 + eye.beta)).abs() < 1e-12);
    }

    #[test]
    fn rotation_center_sits_behind_the_cornea() {
        let eye = EyeParameters::default();
        let c = Pt3::new(0.0, 0.0, 50.0);
        let p = c + Vec3::new(0.0, 0.0, -eye.k);
        let result = result_from_pupil(&eye, c, p).unwrap();
        assert!((result.optical_axis - Vec3::new(0.0, 0.0, -1.0)).norm() < 1e-12);
        assert!((result.rotation_center - Pt3::new(0.0, 0.0, 50.0 + eye.d)).norm() < 1e-12);
    }
}
