use std::sync::Arc;

use cgmath::Vector3;
use rapier3d::prelude::SharedShape;

use crate::components::transform::Transform;
use crate::physics::{vec3_from_physics, MotionState, PhysicsWorld, RigidBody, RigidBodyConstructionInfo};

/// Principal inertia of `shape` carrying `mass`; zero for static bodies.
pub fn compute_local_inertia(shape: &SharedShape, mass: f32) -> Vector3<f32> {
    if mass <= 0.0 {
        return Vector3::new(0.0, 0.0, 0.0);
    }

    let unit = shape.mass_properties(1.0);
    if unit.mass() <= 0.0 {
        return Vector3::new(0.0, 0.0, 0.0);
    }

    vec3_from_physics(&unit.principal_inertia()) * (mass / unit.mass())
}

/// Scene-side reference to a simulated body. The body's motion state is the
/// authority on this entity's position and rotation.
#[derive(Clone)]
pub struct RigidBodyComponent {
    body: Arc<RigidBody>,
    shape: SharedShape,
}

impl RigidBodyComponent {
    pub fn new(shape: &SharedShape, transform: &Transform, mass: f32, physics: &mut PhysicsWorld) -> Self {
        let local_inertia = compute_local_inertia(shape, mass);

        let motion_state = Arc::new(MotionState::from_transform(transform));
        physics.add_motion_state(&motion_state);

        let body = physics.add_rigid_body(RigidBodyConstructionInfo {
            mass,
            motion_state,
            shape: shape.clone(),
            local_inertia,
        });

        Self {
            body,
            shape: shape.clone(),
        }
    }

    pub fn body(&self) -> &Arc<RigidBody> {
        &self.body
    }

    pub fn motion_state(&self) -> &Arc<MotionState> {
        self.body.motion_state()
    }

    pub fn shape(&self) -> &SharedShape {
        &self.shape
    }

    pub fn mass(&self) -> f32 {
        self.body.mass()
    }
}
