//! Local transformation data of scene nodes.
//!
//! Rotations are stored as Euler angles so that a single axis of a part (the
//! hinge of a door, for instance) can be read and animated on its own. The
//! matrix form is only built when world transforms or bounds are needed.

use cgmath::{Deg, Euler, Quaternion, Rad, Vector3};
use serde::{Deserialize, Serialize};

/// One of the three local axes of a part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Local transformation of a node: position, rotation (Euler, radians) and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Euler<Rad<f32>>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Build an instance from the decomposed form glTF and most DCC exports use.
    pub fn from_decomposed(position: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        // glTF quaternions are [x, y, z, w], cgmath wants (w, x, y, z)
        let quat = Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]);
        Self {
            position: position.into(),
            rotation: Euler::from(quat),
            scale: scale.into(),
        }
    }

    pub fn with_rotation_deg(mut self, rotation: [f32; 3]) -> Self {
        self.rotation = euler_from_degrees(rotation);
        self
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(Quaternion::from(self.rotation))
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn rotation_on(&self, axis: Axis) -> Rad<f32> {
        match axis {
            Axis::X => self.rotation.x,
            Axis::Y => self.rotation.y,
            Axis::Z => self.rotation.z,
        }
    }

    pub fn set_rotation_on(&mut self, axis: Axis, angle: Rad<f32>) {
        match axis {
            Axis::X => self.rotation.x = angle,
            Axis::Y => self.rotation.y = angle,
            Axis::Z => self.rotation.z = angle,
        }
    }

    pub fn position_on(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.position.x,
            Axis::Y => self.position.y,
            Axis::Z => self.position.z,
        }
    }

    pub fn set_position_on(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::X => self.position.x = value,
            Axis::Y => self.position.y = value,
            Axis::Z => self.position.z = value,
        }
    }

    /// Copy of `self` rotated by `angle` degrees around `axis`.
    pub fn rotated(&self, axis: Axis, angle: Deg<f32>) -> Instance {
        let mut rotated = self.clone();
        let current = self.rotation_on(axis);
        rotated.set_rotation_on(axis, current + Rad::from(angle));
        rotated
    }

    /// Copy of `self` moved by `offset` along `axis`.
    pub fn translated(&self, axis: Axis, offset: f32) -> Instance {
        let mut translated = self.clone();
        translated.set_position_on(axis, self.position_on(axis) + offset);
        translated
    }

    /**
     * Component-wise linear interpolation between `self` and `target`.
     *
     * Euler components are interpolated independently which is exactly what a
     * hinge or a slide needs: only the animated axis changes.
     */
    pub fn lerp(&self, target: &Instance, t: f32) -> Instance {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Instance {
            position: self.position + (target.position - self.position) * t,
            rotation: Euler::new(
                Rad(mix(self.rotation.x.0, target.rotation.x.0)),
                Rad(mix(self.rotation.y.0, target.rotation.y.0)),
                Rad(mix(self.rotation.z.0, target.rotation.z.0)),
            ),
            scale: self.scale + (target.scale - self.scale) * t,
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

pub fn euler_from_degrees(rotation: [f32; 3]) -> Euler<Rad<f32>> {
    Euler::new(
        Rad::from(Deg(rotation[0])),
        Rad::from(Deg(rotation[1])),
        Rad::from(Deg(rotation[2])),
    )
}
