use hecs::World;

use super::math::transform_from_physics;
use crate::components::rigid_body::RigidBodyComponent;
use crate::components::transform::Transform;

/// Overwrites position and rotation of every simulated scene entity with its
/// body's motion state. Scale is left alone.
pub fn physics_sync_update(scene: &mut World) {
    for (_, (body, transform)) in scene.query_mut::<(&RigidBodyComponent, &mut Transform)>() {
        let world_transform = body.motion_state().world_transform();
        *transform = transform_from_physics(&world_transform, transform.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsWorld;
    use cgmath::Vector3;
    use rapier3d::prelude::SharedShape;

    #[test]
    fn entities_without_transform_are_skipped() {
        let mut physics = PhysicsWorld::new();
        let mut scene = World::new();
        let shape = SharedShape::ball(1.0);
        physics.add_collision_shape(&shape);

        let start = Transform::from_position(Vector3::new(0.0, 5.0, 0.0));
        let body = RigidBodyComponent::new(&shape, &start, 1.0, &mut physics);
        let lonely = scene.spawn((body,));

        physics.update_world();
        physics_sync_update(&mut scene);

        assert!(scene.get::<&Transform>(lonely).is_err());
    }

    #[test]
    fn scale_survives_sync() {
        let mut physics = PhysicsWorld::new();
        let mut scene = World::new();
        let shape = SharedShape::ball(1.0);
        physics.add_collision_shape(&shape);

        let start = Transform::from_position(Vector3::new(1.0, 5.0, -2.0)).with_scale(Vector3::new(3.0, 3.0, 3.0));
        let body = RigidBodyComponent::new(&shape, &start, 1.0, &mut physics);
        let entity = scene.spawn((body, start));

        physics.update_world();
        physics_sync_update(&mut scene);

        let transform = scene.get::<&Transform>(entity).unwrap();
        assert_eq!(transform.scale, Vector3::new(3.0, 3.0, 3.0));
        assert!(transform.position.y < 5.0);
        assert!((transform.position.x - 1.0).abs() < 1e-5);
    }
}
