use cgmath::Vector3;
use rapier3d::prelude::SharedShape;

use crate::physics::PhysicsWorld;

/// Axis-aligned box in the body's local frame.
#[derive(Clone)]
pub struct BoxCollider {
    half_extents: Vector3<f32>,
    shape: SharedShape,
}

impl BoxCollider {
    pub fn new(half_extents: Vector3<f32>, physics: &mut PhysicsWorld) -> Self {
        let shape = SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z);
        physics.add_collision_shape(&shape);
        Self { half_extents, shape }
    }

    pub fn half_extents(&self) -> Vector3<f32> {
        self.half_extents
    }

    pub fn shape(&self) -> &SharedShape {
        &self.shape
    }
}

#[derive(Clone)]
pub struct SphereCollider {
    radius: f32,
    shape: SharedShape,
}

impl SphereCollider {
    pub fn new(radius: f32, physics: &mut PhysicsWorld) -> Self {
        let shape = SharedShape::ball(radius);
        physics.add_collision_shape(&shape);
        Self { radius, shape }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn shape(&self) -> &SharedShape {
        &self.shape
    }
}
