//! Camera pose and orbit placement.
//!
//! The capture camera is a plain pose (position + rotation). Its local `+Z` axis
//! is the view direction and `+Y` is up. Each frame the orchestrator derives a
//! fresh pose from the origin pose captured at startup, see [`orbit_pose`].

use cgmath::{Deg, InnerSpace, Matrix3, One, Point3, Quaternion, Rotation3, Vector3};
use rand::RngExt;
use rand::rngs::StdRng;

use crate::config::CaptureConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub rotation: Quaternion<f32>,
}

impl Camera {
    pub fn new(position: Point3<f32>, rotation: Quaternion<f32>) -> Self {
        Self { position, rotation }
    }

    pub fn looking_at(position: Point3<f32>, target: Point3<f32>) -> Self {
        let mut camera = Self::new(position, Quaternion::one());
        camera.look_at(target);
        camera
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * Vector3::unit_z()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.rotation * Vector3::unit_y()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.rotation * Vector3::unit_x()
    }

    /// Rotate both position and orientation around `pivot`.
    pub fn rotate_around(&mut self, pivot: Point3<f32>, axis: Vector3<f32>, angle: Deg<f32>) {
        let rotation = Quaternion::from_axis_angle(axis.normalize(), angle);
        self.position = pivot + rotation * (self.position - pivot);
        self.rotation = (rotation * self.rotation).normalize();
    }

    /// Turn towards `target` keeping world `+Y` as the up hint.
    ///
    /// A target straight above or below the camera leaves the rotation untouched.
    pub fn look_at(&mut self, target: Point3<f32>) {
        let direction = target - self.position;
        if let Some(rotation) = look_rotation(direction, Vector3::unit_y()) {
            self.rotation = rotation;
        }
    }
}

/// Rotation that maps local `+Z` onto `forward` and keeps local `+Y` as close to
/// `up` as possible.
pub fn look_rotation(forward: Vector3<f32>, up: Vector3<f32>) -> Option<Quaternion<f32>> {
    if forward.magnitude2() <= f32::EPSILON {
        return None;
    }
    let forward = forward.normalize();
    let right = up.cross(forward);
    if right.magnitude2() <= f32::EPSILON {
        return None;
    }
    let right = right.normalize();
    let up = forward.cross(right);
    Some(Quaternion::from(Matrix3::from_cols(right, up, forward)).normalize())
}

/// Per-frame random offsets applied on top of the orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitJitter {
    pub height: f32,
    /// Always non-negative: the camera only ever moves away from the model.
    pub distance: f32,
    pub tilt: Deg<f32>,
}

impl OrbitJitter {
    pub const NONE: OrbitJitter = OrbitJitter {
        height: 0.0,
        distance: 0.0,
        tilt: Deg(0.0),
    };

    pub fn sample(rng: &mut StdRng, config: &CaptureConfig) -> Self {
        Self {
            height: symmetric(rng, config.height_jitter),
            distance: if config.distance_jitter > 0.0 {
                rng.random_range(0.0..config.distance_jitter)
            } else {
                0.0
            },
            tilt: Deg(symmetric(rng, config.tilt_jitter_degrees)),
        }
    }
}

fn symmetric(rng: &mut StdRng, range: f32) -> f32 {
    if range > 0.0 {
        rng.random_range(-range..range)
    } else {
        0.0
    }
}

/// Place the camera for one orbit step.
///
/// Starting from `origin`, the camera is lifted by the height jitter and pushed
/// back along its view axis by the distance jitter, then orbited around `pivot`
/// about `+Y` by `angle`, tilted around `pivot` about `+Z`, and finally aimed at
/// the pivot with the target height pinned to the camera's own height.
pub fn orbit_pose(
    origin: &Camera,
    pivot: Point3<f32>,
    angle: Deg<f32>,
    jitter: &OrbitJitter,
) -> Camera {
    let backward = origin.rotation * -Vector3::unit_z();
    let offset = Vector3::unit_y() * jitter.height + backward * jitter.distance;
    let mut camera = Camera::new(origin.position + offset, origin.rotation);
    camera.rotate_around(pivot, Vector3::unit_y(), angle);
    camera.rotate_around(pivot, Vector3::unit_z(), jitter.tilt);

    let target = Point3::new(pivot.x, camera.position.y, pivot.z);
    camera.look_at(target);
    camera
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn horizontal_distance(a: Point3<f32>, b: Point3<f32>) -> f32 {
        Vector3::new(a.x - b.x, 0.0, a.z - b.z).magnitude()
    }

    #[test]
    fn looking_at_aims_forward_axis() {
        let camera = Camera::looking_at(Point3::new(0.0, 1.0, -5.0), Point3::new(0.0, 1.0, 0.0));
        let forward = camera.forward();
        assert!(close(forward.x, 0.0));
        assert!(close(forward.y, 0.0));
        assert!(close(forward.z, 1.0));
        assert!(close(camera.up().y, 1.0));
    }

    #[test]
    fn quarter_orbit_keeps_distance_and_faces_pivot() {
        let origin = Camera::looking_at(Point3::new(0.0, 1.0, -5.0), Point3::new(0.0, 1.0, 0.0));
        let pivot = Point3::new(0.0, 0.0, 0.0);
        let camera = orbit_pose(&origin, pivot, Deg(90.0), &OrbitJitter::NONE);

        assert!(close(horizontal_distance(camera.position, pivot), 5.0));
        assert!(close(camera.position.y, 1.0));
        assert!(close(camera.position.x, -5.0));

        let to_pivot = (Point3::new(pivot.x, camera.position.y, pivot.z) - camera.position).normalize();
        let forward = camera.forward();
        assert!(close(forward.dot(to_pivot), 1.0));
        assert!(close(forward.y, 0.0));
    }

    #[test]
    fn distance_jitter_moves_camera_away() {
        let origin = Camera::looking_at(Point3::new(0.0, 1.0, -5.0), Point3::new(0.0, 1.0, 0.0));
        let pivot = Point3::new(0.0, 0.0, 0.0);
        let jitter = OrbitJitter {
            height: 0.05,
            distance: 0.5,
            tilt: Deg(0.0),
        };
        let camera = orbit_pose(&origin, pivot, Deg(180.0), &jitter);
        assert!(close(horizontal_distance(camera.position, pivot), 5.5));
        assert!(close(camera.position.y, 1.05));
        assert!(close(camera.forward().y, 0.0));
    }

    #[test]
    fn pinned_target_avoids_pitch_towards_low_pivot() {
        let origin = Camera::looking_at(Point3::new(0.0, 3.0, -4.0), Point3::new(0.0, 0.0, 0.0));
        assert!(origin.forward().y < 0.0);
        let camera = orbit_pose(&origin, Point3::new(0.0, 0.0, 0.0), Deg(45.0), &OrbitJitter::NONE);
        assert!(close(camera.forward().y, 0.0));
    }
}
