//! Least-squares intersection of 3D rays.
//!
//! The point minimizing the summed squared distance to every line solves
//! `sum(I - d d^T) x = sum(I - d d^T) o`.

use gaze_core::{Mat3, Pt3, Ray, Real, Vec3};
use nalgebra::SymmetricEigen;

use crate::GazeError;

/// Sine of the widest angle between any two ray directions.
pub fn widest_ray_angle_sin(rays: &[Ray]) -> Real {
    let mut widest: Real = 0.0;
    for (i, a) in rays.iter().enumerate() {
        for b in &rays[i + 1..] {
            widest = widest.max(a.dir.cross(&b.dir).norm());
        }
    }
    widest
}

/// Point closest to all `rays` (treated as infinite lines).
///
/// Fails with [`GazeError::NearParallelRays`] when no pair of rays meets at
/// an angle whose sine reaches `min_angle_sin`.
pub fn triangulate_rays(rays: &[Ray], min_angle_sin: Real) -> Result<Pt3, GazeError> {
    if rays.len() < 2 {
        return Err(GazeError::Degenerate(format!(
            "need at least 2 rays to triangulate, got {}",
            rays.len()
        )));
    }

    let sin_angle = widest_ray_angle_sin(rays);
    if sin_angle.is_nan() || sin_angle < min_angle_sin {
        return Err(GazeError::NearParallelRays { sin_angle });
    }

    let mut a = Mat3::zeros();
    let mut b = Vec3::zeros();
    for ray in rays {
        let proj = Mat3::identity() - ray.dir * ray.dir.transpose();
        a += proj;
        b += proj * ray.origin.coords;
    }

    let x = a
        .try_inverse()
        .map(|inv| inv * b)
        .ok_or(GazeError::NearParallelRays { sin_angle })?;
    if x.iter().all(|v| v.is_finite()) {
        Ok(Pt3::from(x))
    } else {
        Err(GazeError::NearParallelRays { sin_angle })
    }
}

/// Unit direction shared by planes through a common point, given the plane
/// normals: the null vector of the stacked normals.
///
/// `None` when fewer than two independent normals are supplied.
pub fn common_line_direction(normals: &[Vec3]) -> Option<Vec3> {
    match normals {
        [] | [_] => None,
        [a, b] => a.cross(b).try_normalize(1e-12),
        _ => {
            let scatter = normals
                .iter()
                .fold(Mat3::zeros(), |acc, n| acc + n * n.transpose());
            let eig = SymmetricEigen::new(scatter);
            let (min_idx, _) = eig
                .eigenvalues
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.total_cmp(b.1))?;
            let mut sorted: Vec<Real> = eig.eigenvalues.iter().copied().collect();
            sorted.sort_by(|a, b| a.total_cmp(b));
            // Rank below two: the normals do not pin down a single line.
            if sorted[1] <= 1e-12 * sorted[2].max(Real::MIN_POSITIVE) {
                return None;
            }
            Some(eig.eigenvectors.column(min_idx).into_owned().normalize())
        }
    }
}
