//! Ray optics on spheres: intersection, reflection and refraction.

use crate::{Pt3, Ray, Real, Vec3};

/// Distance along `ray` to the first intersection with a sphere.
///
/// Returns the smallest non-negative parameter, so a ray starting inside the
/// sphere reports its exit point. `None` when the ray misses the sphere.
pub fn intersect_sphere(ray: &Ray, center: &Pt3, radius: Real) -> Option<Real> {
    let oc = ray.origin - center;
    let b = ray.dir.dot(&oc);
    let c = oc.norm_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 || !disc.is_finite() {
        return None;
    }
    let sq = disc.sqrt();
    let t_near = -b - sq;
    let t_far = -b + sq;
    if t_near >= 0.0 {
        Some(t_near)
    } else if t_far >= 0.0 {
        Some(t_far)
    } else {
        None
    }
}

/// Mirror `dir` about the plane with unit `normal`.
pub fn reflect(dir: &Vec3, normal: &Vec3) -> Vec3 {
    dir - normal * (2.0 * dir.dot(normal))
}

/// Refract unit `dir` at a surface with unit `normal` (either orientation).
///
/// `eta` is the ratio `n_incident / n_transmitted`. Returns `None` on total
/// internal reflection.
pub fn refract(dir: &Vec3, normal: &Vec3, eta: Real) -> Option<Vec3> {
    let n = if dir.dot(normal) > 0.0 { -normal } else { *normal };
    let cos_i = -n.dot(dir);
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i);
    if sin2_t > 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    Some((dir * eta + n * (eta * cos_i - cos_t)).normalize())
}

/// Outward surface normal that reflects light arriving from `source` at
/// `surface_point` towards `observer`.
pub fn reflection_normal(surface_point: &Pt3, source: &Pt3, observer: &Pt3) -> Option<Vec3> {
    let to_source = (source - surface_point).try_normalize(Real::EPSILON)?;
    let to_observer = (observer - surface_point).try_normalize(Real::EPSILON)?;
    (to_source + to_observer).try_normalize(Real::EPSILON)
}

/// Unit normal of the plane through `origin` spanned by two directions.
pub fn plane_normal(a: &Vec3, b: &Vec3) -> Option<Vec3> {
    a.cross(b).try_normalize(Real::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_intersection_near_and_inside() {
        let center = Pt3::new(0.0, 0.0, 10.0);
        let ray = Ray::new(Pt3::origin(), Vec3::z());
        let t = intersect_sphere(&ray, &center, 2.0).unwrap();
        assert!((t - 8.0).abs() < 1e-12);

        let inside = Ray::new(Pt3::new(0.0, 0.0, 10.0), Vec3::z());
        let t = intersect_sphere(&inside, &center, 2.0).unwrap();
        assert!((t - 2.0).abs() < 1e-12);

        let miss = Ray::new(Pt3::new(5.0, 0.0, 0.0), Vec3::z());
        assert!(intersect_sphere(&miss, &center, 2.0).is_none());

        let behind = Ray::new(Pt3::new(0.0, 0.0, 20.0), Vec3::z());
        assert!(intersect_sphere(&behind, &center, 2.0).is_none());
    }

    #[test]
    fn refraction_obeys_snell() {
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let angle: Real = 0.6;
        let dir = Vec3::new(angle.sin(), 0.0, -angle.cos());
        let eta = 1.0 / 1.3375;
        let out = refract(&dir, &normal, eta).unwrap();
        let sin_t = out.x;
        assert!((angle.sin() - 1.3375 * sin_t).abs() < 1e-12);
        assert!(out.z < 0.0);
        assert!((out.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn refraction_reports_total_internal_reflection() {
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let angle: Real = 1.2;
        let dir = Vec3::new(angle.sin(), 0.0, -angle.cos());
        assert!(refract(&dir, &normal, 1.3375).is_none());
    }

    #[test]
    fn reflection_normal_satisfies_mirror_law() {
        let q = Pt3::new(0.1, 0.2, 50.0);
        let light = Pt3::new(13.0, 0.0, 0.0);
        let camera = Pt3::origin();
        let n = reflection_normal(&q, &light, &camera).unwrap();
        let incoming = (q - light).normalize();
        let out = reflect(&incoming, &n);
        let expected = (camera - q).normalize();
        assert!((out - expected).norm() < 1e-12);
    }
}
