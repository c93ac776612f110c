//! Perspective camera used for hit testing.
//!
//! The renderer owns its own camera controller; this type only carries the
//! pose the configuration asks for and the projection needed to turn a
//! pointer coordinate into a world-space ray.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4};
use winit::dpi::{PhysicalPosition, PhysicalSize};

use crate::{config::CameraPose, pick::Ray};

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(eye: Point3<f32>, target: Point3<f32>, fovy: Deg<f32>) -> Self {
        Self {
            eye,
            target,
            up: Vector3::unit_y(),
            fovy,
            znear: 0.1,
            zfar: 500.0,
        }
    }

    pub fn set_pose(&mut self, pose: &CameraPose) {
        self.eye = Point3::from(pose.position);
        self.target = Point3::from(pose.target);
        self.fovy = Deg(pose.fov);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        cgmath::perspective(self.fovy, aspect, self.znear, self.zfar)
    }

    /**
     * World-space ray through a pixel of a viewport of `size`.
     *
     * The pixel is converted to normalized device coordinates (y flipped), the
     * near and far plane points are unprojected with the inverse
     * view-projection matrix and the ray runs from near to far.
     */
    pub fn screen_to_ray(
        &self,
        position: PhysicalPosition<f64>,
        size: PhysicalSize<u32>,
    ) -> Option<Ray> {
        if size.width == 0 || size.height == 0 {
            return None;
        }
        let width = size.width as f32;
        let height = size.height as f32;
        let ndc_x = (2.0 * position.x as f32) / width - 1.0;
        let ndc_y = 1.0 - (2.0 * position.y as f32) / height;

        let view_proj = self.projection_matrix(width / height) * self.view_matrix();
        let inverse = view_proj.invert()?;

        let unproject = |z: f32| {
            let world = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            Vector3::new(world.x / world.w, world.y / world.w, world.z / world.w)
        };
        let near = unproject(-1.0);
        let far = unproject(1.0);
        let direction = far - near;
        if direction.magnitude2() == 0.0 {
            return None;
        }
        Some(Ray::new(near, direction))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 1.5, 5.0), Point3::new(0.0, 1.0, 0.0), Deg(45.0))
    }
}

impl From<&CameraPose> for Camera {
    fn from(pose: &CameraPose) -> Self {
        let mut camera = Camera::default();
        camera.set_pose(pose);
        camera
    }
}
