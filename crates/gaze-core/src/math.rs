use nalgebra::{Matrix3, Point2, Point3, Rotation3, Vector2, Vector3};

pub type Real = f64;

pub type Vec2 = Vector2<Real>;
pub type Vec3 = Vector3<Real>;
pub type Pt2 = Point2<Real>;
pub type Pt3 = Point3<Real>;
pub type Mat3 = Matrix3<Real>;

pub fn deg_to_rad(deg: Real) -> Real {
    deg.to_radians()
}

pub fn rad_to_deg(rad: Real) -> Real {
    rad.to_degrees()
}

/// Rotation `Rz(z) * Ry(y) * Rx(x)` built from three angles in radians.
pub fn rotation_from_angles(x: Real, y: Real, z: Real) -> Mat3 {
    Rotation3::from_euler_angles(x, y, z).into_inner()
}

/// Unit direction for horizontal angle `theta` and vertical angle `phi`.
///
/// The zero direction points along `-z` (from the subject towards the
/// display): `(cos phi sin theta, sin phi, -cos phi cos theta)`.
pub fn direction_from_angles(theta: Real, phi: Real) -> Vec3 {
    Vec3::new(phi.cos() * theta.sin(), phi.sin(), -phi.cos() * theta.cos())
}

/// Inverse of [`direction_from_angles`] for a unit vector.
pub fn angles_from_direction(dir: &Vec3) -> (Real, Real) {
    let theta = dir.x.atan2(-dir.z);
    let phi = dir.y.clamp(-1.0, 1.0).asin();
    (theta, phi)
}
