//! Scene transforms.
//!
//! Position, rotation and scale of a scene object. Transforms compose like a
//! scene graph: `parent * child` yields the child's world transform.

use std::ops::Mul;

use cgmath::{ElementWise, One};

/// Position, rotation (as quaternion) and scale of a scene object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// Identity transform (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn origin(&self) -> cgmath::Point3<f32> {
        cgmath::Point3::new(self.position.x, self.position.y, self.position.z)
    }
}

impl<'a, 'b> Mul<&'b Transform> for &'a Transform {
    type Output = Transform;

    /// `self` is the parent: the child's position is scaled and rotated into
    /// the parent's space before the parent's position is added.
    fn mul(self, rhs: &'b Transform) -> Self::Output {
        Transform {
            position: self.position + self.rotation * self.scale.mul_element_wise(rhs.position),
            rotation: self.rotation * rhs.rotation,
            scale: self.scale.mul_element_wise(rhs.scale),
        }
    }
}

impl Mul<Transform> for Transform {
    type Output = Self;

    fn mul(self, rhs: Transform) -> Self::Output {
        &self * &rhs
    }
}

impl From<cgmath::Vector3<f32>> for Transform {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

impl From<[f32; 3]> for Transform {
    fn from(position: [f32; 3]) -> Self {
        cgmath::Vector3::from(position).into()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
