use super::math::{Ray, Vec3};
use super::solid::EPSILON;

/// Pinhole camera shooting rays through a rectangular view plane in front of the eye.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    forward: Vec3,
    up: Vec3,
    right: Vec3,
    position: Vec3,
    plane_width: f64,
    plane_height: f64,
    plane_distance: f64,
}

impl Camera {
    /// Creates a camera that looks at a specific point from a specific position.
    /// The point is referred to be the center of the screen.
    /// Looking straight up or down, the top of the screen faces away from the viewer (-z).
    pub fn look_at(position: Vec3, point: Vec3) -> Self {
        let forward = (point - position).normalize();
        let world_up = if forward.cross(Vec3::y_axis()).len() < EPSILON {
            -Vec3::z_axis()
        } else {
            Vec3::y_axis()
        };
        let right = forward.cross(world_up).normalize();
        // to get an orthonormal base, we should calculate the up vector with two perpendicular vectors
        let up = right.cross(forward).normalize();
        Self {
            forward,
            up,
            right,
            position,
            plane_width: 20.0,
            plane_height: 20.0,
            plane_distance: 30.0,
        }
    }

    pub fn with_view_plane(self, width: f64, height: f64, distance: f64) -> Self {
        Self {
            plane_width: width,
            plane_height: height,
            plane_distance: distance,
            ..self
        }
    }

    /// Create a ray from the camera position to the relative uv coordinate on his screen:
    /// `(0, 0)` is the top left corner of the view plane and `(1, 1)` the bottom right one.
    pub fn shoot_to(&self, u: f64, v: f64) -> Ray {
        let x = (u - 0.5) * self.plane_width;
        let y = (0.5 - v) * self.plane_height;
        let direction = self.forward * self.plane_distance + self.right * x + self.up * y;
        Ray::new(self.position, direction)
    }
}

/// Looks down the negative z axis from the origin, as the reference scene expects.
impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3::zero(), -Vec3::z_axis())
    }
}
