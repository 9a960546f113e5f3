//! Rigid-body simulation built on rapier, and the pass that copies its
//! results into scene transforms.

mod debug;
mod math;
mod ray;
mod sync;
mod world;

pub use debug::{DebugLines, LineVertex};
pub use math::{
    point_from_physics, point_to_physics, rotation_from_physics, rotation_to_physics,
    transform_from_physics, transform_to_physics, vec3_from_physics, vec3_to_physics,
};
pub use ray::{AllHitsRayResult, ClosestRayResult, RayHit, RayResultCallback};
pub use sync::physics_sync_update;
pub use world::{MotionState, PhysicsConfig, PhysicsWorld, RigidBody, RigidBodyConstructionInfo};
