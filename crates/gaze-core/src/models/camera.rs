use crate::{rotation_from_angles, Mat3, Pt2, Pt3, Real, Vec2, Vec3};

/// World-frame ray with a unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Pt3,
    pub dir: Vec3,
}

impl Ray {
    /// Builds a ray, normalizing `dir`.
    pub fn new(origin: Pt3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize(),
        }
    }

    pub fn through(origin: Pt3, target: &Pt3) -> Self {
        Self::new(origin, target - origin)
    }

    pub fn point_at(&self, t: Real) -> Pt3 {
        self.origin + self.dir * t
    }
}

/// Pinhole camera placed in the world frame.
///
/// Pixels back-project to camera-frame directions
/// `((u - cx) * sx, (v - cy) * sy, f)`, which the rotation matrix maps to the
/// world frame. The rotation is cached from the three stored angles and is
/// recomputed by every angle setter.
#[derive(Clone, Debug, PartialEq)]
pub struct PinholeCamera {
    /// Principal point in pixels.
    pub principal_point: Vec2,
    /// Pixel pitch in cm/px along x and y.
    pub pixel_size: Vec2,
    /// Effective focal length in cm.
    pub focal_length: Real,
    /// Projection center in the world frame.
    pub position: Pt3,
    angles: Vec3,
    rotation: Mat3,
}

impl PinholeCamera {
    pub fn new(
        principal_point: Vec2,
        pixel_size: Vec2,
        focal_length: Real,
        position: Pt3,
        angles: Vec3,
    ) -> Self {
        Self {
            principal_point,
            pixel_size,
            focal_length,
            position,
            angles,
            rotation: rotation_from_angles(angles.x, angles.y, angles.z),
        }
    }

    pub fn angles(&self) -> Vec3 {
        self.angles
    }

    pub fn angle_x(&self) -> Real {
        self.angles.x
    }

    pub fn angle_y(&self) -> Real {
        self.angles.y
    }

    pub fn angle_z(&self) -> Real {
        self.angles.z
    }

    /// Camera-to-world rotation.
    pub fn rotation(&self) -> &Mat3 {
        &self.rotation
    }

    pub fn set_angles(&mut self, x: Real, y: Real, z: Real) {
        self.angles = Vec3::new(x, y, z);
        self.rotation = rotation_from_angles(x, y, z);
    }

    pub fn set_angle_x(&mut self, x: Real) {
        self.set_angles(x, self.angles.y, self.angles.z);
    }

    pub fn set_angle_y(&mut self, y: Real) {
        self.set_angles(self.angles.x, y, self.angles.z);
    }

    pub fn set_angle_z(&mut self, z: Real) {
        self.set_angles(self.angles.x, self.angles.y, z);
    }

    /// World point to camera-frame coordinates.
    pub fn to_camera_frame(&self, p_w: &Pt3) -> Vec3 {
        self.rotation.transpose() * (p_w - self.position)
    }

    /// Project a world point to pixels; `None` at or behind the camera plane.
    pub fn project(&self, p_w: &Pt3) -> Option<Pt2> {
        let p_c = self.to_camera_frame(p_w);
        if p_c.z <= 0.0 {
            return None;
        }
        let scale = self.focal_length / p_c.z;
        Some(Pt2::new(
            self.principal_point.x + p_c.x * scale / self.pixel_size.x,
            self.principal_point.y + p_c.y * scale / self.pixel_size.y,
        ))
    }

    /// Position of a pixel on the image plane, expressed in the world frame.
    pub fn image_point_world(&self, px: &Pt2) -> Pt3 {
        let d_c = Vec3::new(
            (px.x - self.principal_point.x) * self.pixel_size.x,
            (px.y - self.principal_point.y) * self.pixel_size.y,
            self.focal_length,
        );
        self.position + self.rotation * d_c
    }

    /// Ray from the projection center through `px`.
    pub fn backproject(&self, px: &Pt2) -> Ray {
        Ray::through(self.position, &self.image_point_world(px))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deg_to_rad;

    fn tilted_camera() -> PinholeCamera {
        PinholeCamera::new(
            Vec2::new(299.5, 399.5),
            Vec2::new(2.4e-4, 2.4e-4),
            0.0119144 * 40.0,
            Pt3::new(1.0, -2.0, 0.5),
            Vec3::new(deg_to_rad(8.0), deg_to_rad(-3.0), deg_to_rad(1.5)),
        )
    }

    #[test]
    fn backproject_recovers_projected_direction() {
        let cam = tilted_camera();
        for p in [
            Pt3::new(0.0, 0.0, 60.0),
            Pt3::new(5.0, -3.0, 45.0),
            Pt3::new(-8.0, 6.0, 70.0),
        ] {
            let px = cam.project(&p).expect("point in front of the camera");
            let ray = cam.backproject(&px);
            let expected = (p - cam.position).normalize();
            let err = (ray.dir - expected).norm();
            assert!(err < 1e-9, "direction error {err} for {p:?}");
            assert!((ray.origin - cam.position).norm() < 1e-12);
        }
    }

    #[test]
    fn project_rejects_points_behind_camera() {
        let cam = PinholeCamera::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(1e-3, 1e-3),
            1.0,
            Pt3::origin(),
            Vec3::zeros(),
        );
        assert!(cam.project(&Pt3::new(0.0, 0.0, -5.0)).is_none());
        assert!(cam.project(&Pt3::new(1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn angle_setters_refresh_rotation() {
        let mut cam = tilted_camera();
        cam.set_angle_y(0.25);
        cam.set_angle_z(-0.1);
        assert_eq!(cam.angle_x(), deg_to_rad(8.0));
        assert_eq!(cam.angle_y(), 0.25);
        assert_eq!(cam.angle_z(), -0.1);
        let expected = rotation_from_angles(deg_to_rad(8.0), 0.25, -0.1);
        assert!((cam.rotation() - expected).norm() < 1e-15);
    }
}
