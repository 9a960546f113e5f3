//! Conversions between the engine's cgmath types and rapier's nalgebra types.

use rapier3d::na::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};

use crate::components::transform::Transform;

pub fn vec3_to_physics(v: cgmath::Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub fn vec3_from_physics(v: &Vector3<f32>) -> cgmath::Vector3<f32> {
    cgmath::Vector3::new(v.x, v.y, v.z)
}

pub fn point_to_physics(v: cgmath::Vector3<f32>) -> Point3<f32> {
    Point3::new(v.x, v.y, v.z)
}

pub fn point_from_physics(p: &Point3<f32>) -> cgmath::Vector3<f32> {
    cgmath::Vector3::new(p.x, p.y, p.z)
}

/// Renormalizes on the way in; rapier requires unit rotations.
pub fn rotation_to_physics(q: cgmath::Quaternion<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.s, q.v.x, q.v.y, q.v.z))
}

pub fn rotation_from_physics(q: &UnitQuaternion<f32>) -> cgmath::Quaternion<f32> {
    cgmath::Quaternion::new(q.w, q.i, q.j, q.k)
}

/// Position and rotation only; the physics side has no notion of scale.
pub fn transform_to_physics(transform: &Transform) -> Isometry3<f32> {
    Isometry3::from_parts(
        Translation3::from(vec3_to_physics(transform.position)),
        rotation_to_physics(transform.rotation),
    )
}

pub fn transform_from_physics(isometry: &Isometry3<f32>, scale: cgmath::Vector3<f32>) -> Transform {
    Transform {
        position: vec3_from_physics(&isometry.translation.vector),
        rotation: rotation_from_physics(&isometry.rotation),
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Rotation3};

    const EPSILON: f32 = 1e-5;

    fn same_rotation(a: cgmath::Quaternion<f32>, b: cgmath::Quaternion<f32>) -> bool {
        // q and -q describe the same orientation
        (a.dot(b).abs() - 1.0).abs() < EPSILON
    }

    #[test]
    fn transform_round_trips_through_physics() {
        let samples = [
            (cgmath::Vector3::new(0.0, 0.0, 0.0), cgmath::Vector3::new(0.0, 1.0, 0.0), 0.0),
            (cgmath::Vector3::new(3.5, -2.0, 10.25), cgmath::Vector3::new(1.0, 0.0, 0.0), 45.0),
            (cgmath::Vector3::new(-100.0, 0.5, 7.0), cgmath::Vector3::new(1.0, 2.0, -3.0), 170.0),
            (cgmath::Vector3::new(1e3, -1e3, 0.001), cgmath::Vector3::new(-0.3, 0.1, 0.9), -90.0),
        ];

        for (position, axis, degrees) in samples {
            let transform = Transform::from_position(position)
                .with_rotation(cgmath::Quaternion::from_axis_angle(axis.normalize(), cgmath::Deg(degrees)))
                .with_scale(cgmath::Vector3::new(2.0, 3.0, 4.0));

            let back = transform_from_physics(&transform_to_physics(&transform), transform.scale);

            assert!((back.position - transform.position).magnitude() < EPSILON * position.magnitude().max(1.0));
            assert!(same_rotation(back.rotation, transform.rotation));
            assert_eq!(back.scale, transform.scale);
        }
    }

    #[test]
    fn rotation_components_keep_their_axes() {
        let q = cgmath::Quaternion::from_angle_y(cgmath::Deg(30.0));
        let physics = rotation_to_physics(q);
        assert!((physics.w - q.s).abs() < EPSILON);
        assert!((physics.j - q.v.y).abs() < EPSILON);
        assert!(physics.i.abs() < EPSILON && physics.k.abs() < EPSILON);
    }

    #[test]
    fn non_unit_rotation_is_normalized() {
        let q = cgmath::Quaternion::new(2.0, 0.0, 0.0, 0.0);
        let physics = rotation_to_physics(q);
        assert!((physics.w - 1.0).abs() < EPSILON);
    }
}
