use std::sync::Arc;

use cgmath::{InnerSpace, Vector3};
use log::{debug, warn};
use parking_lot::RwLock;
use rapier3d::na::{Isometry3, Point3};
use rapier3d::parry::query::RayCast;
use rapier3d::prelude::{
    BroadPhaseBvh, CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, ImpulseJointSet,
    IntegrationParameters, IslandManager, MassProperties, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, Ray, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, SharedShape,
};

use super::debug::DebugLines;
use super::math::{point_from_physics, point_to_physics, transform_to_physics, vec3_from_physics, vec3_to_physics};
use super::ray::{RayHit, RayResultCallback};
use crate::components::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConfig {
    pub gravity: [f32; 3],
    pub time_step: f32,
    pub max_substeps: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            time_step: 1.0 / 60.0,
            max_substeps: 10,
        }
    }
}

/// World transform of a simulated body, written by the physics world after
/// every step and read by the sync pass.
#[derive(Debug)]
pub struct MotionState {
    world_transform: RwLock<Isometry3<f32>>,
}

impl MotionState {
    pub fn new(world_transform: Isometry3<f32>) -> Self {
        Self {
            world_transform: RwLock::new(world_transform),
        }
    }

    pub fn from_transform(transform: &Transform) -> Self {
        Self::new(transform_to_physics(transform))
    }

    pub fn world_transform(&self) -> Isometry3<f32> {
        *self.world_transform.read()
    }

    pub fn set_world_transform(&self, world_transform: Isometry3<f32>) {
        *self.world_transform.write() = world_transform;
    }
}

pub struct RigidBodyConstructionInfo {
    /// Zero or negative means a static body.
    pub mass: f32,
    pub motion_state: Arc<MotionState>,
    pub shape: SharedShape,
    pub local_inertia: Vector3<f32>,
}

/// A body registered with a [`PhysicsWorld`]. Mass is fixed at construction.
#[derive(Debug)]
pub struct RigidBody {
    handle: RigidBodyHandle,
    collider: ColliderHandle,
    mass: f32,
    local_inertia: Vector3<f32>,
    motion_state: Arc<MotionState>,
}

impl RigidBody {
    pub fn handle(&self) -> RigidBodyHandle {
        self.handle
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }

    pub fn local_inertia(&self) -> Vector3<f32> {
        self.local_inertia
    }

    pub fn motion_state(&self) -> &Arc<MotionState> {
        &self.motion_state
    }
}

pub struct PhysicsWorld {
    config: PhysicsConfig,
    gravity: rapier3d::na::Vector3<f32>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    // Torn down in reverse: bodies, then motion states, then shapes.
    collision_shapes: Vec<SharedShape>,
    motion_states: Vec<Arc<MotionState>>,
    rigid_bodies: Vec<Arc<RigidBody>>,

    accumulator: f32,
    debug_enabled: bool,
    debug_lines: DebugLines,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    pub fn with_config(config: PhysicsConfig) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: config.time_step,
            ..IntegrationParameters::default()
        };

        debug!("Created physics world with {:?}", config);

        Self {
            gravity: vec3_to_physics(config.gravity.into()),
            config,
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collision_shapes: Vec::new(),
            motion_states: Vec::new(),
            rigid_bodies: Vec::new(),
            accumulator: 0.0,
            debug_enabled: false,
            debug_lines: DebugLines::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn add_collision_shape(&mut self, shape: &SharedShape) {
        self.collision_shapes.push(shape.clone());
    }

    pub fn add_motion_state(&mut self, motion_state: &Arc<MotionState>) {
        self.motion_states.push(Arc::clone(motion_state));
    }

    /// Builds the body, inserts it into the simulation and keeps a reference
    /// until the world is dropped.
    pub fn add_rigid_body(&mut self, info: RigidBodyConstructionInfo) -> Arc<RigidBody> {
        let pose = info.motion_state.world_transform();

        let builder = if info.mass > 0.0 {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let handle = self.bodies.insert(builder.pose(pose).build());

        let mut collider = ColliderBuilder::new(info.shape);
        if info.mass > 0.0 {
            collider = collider.mass_properties(MassProperties::new(
                Point3::origin(),
                info.mass,
                vec3_to_physics(info.local_inertia),
            ));
        }
        let collider = self
            .colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);

        let body = Arc::new(RigidBody {
            handle,
            collider,
            mass: info.mass.max(0.0),
            local_inertia: info.local_inertia,
            motion_state: info.motion_state,
        });
        self.rigid_bodies.push(Arc::clone(&body));
        body
    }

    /// Advances the simulation by exactly one fixed time step.
    pub fn update_world(&mut self) {
        self.step();
        self.publish_step();
    }

    /// Runs as many fixed steps as `elapsed` seconds cover, capped at
    /// `max_substeps`. Returns the number of steps taken.
    pub fn advance(&mut self, elapsed: f32) -> usize {
        if !elapsed.is_finite() {
            warn!("Ignoring non-finite frame time {}", elapsed);
            return 0;
        }

        let time_step = self.config.time_step;
        self.accumulator += elapsed.max(0.0);

        let mut steps = 0;
        while self.accumulator >= time_step && steps < self.config.max_substeps {
            self.step();
            self.accumulator -= time_step;
            steps += 1;
        }

        // Lagging too far behind; drop what could not be simulated.
        if self.accumulator >= time_step {
            self.accumulator %= time_step;
        }

        if steps > 0 {
            self.publish_step();
        }
        steps
    }

    fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    fn publish_step(&mut self) {
        for body in &self.rigid_bodies {
            if let Some(simulated) = self.bodies.get(body.handle) {
                body.motion_state.set_world_transform(*simulated.position());
            }
        }

        if self.debug_enabled {
            self.debug_lines.clear_lines();
            self.debug_lines.emit_world(&self.colliders, &self.narrow_phase);
        }
    }

    pub fn enable_debug(&mut self) {
        self.debug_enabled = true;
    }

    pub fn disable_debug(&mut self) {
        self.debug_enabled = false;
        self.debug_lines.clear_lines();
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    pub fn debug_lines(&self) -> &DebugLines {
        &self.debug_lines
    }

    /// Reports every collider crossed by the segment `from -> to` to `callback`.
    pub fn single_ray_cast(
        &self,
        from: Vector3<f32>,
        to: Vector3<f32>,
        callback: &mut dyn RayResultCallback,
    ) {
        let direction = to - from;
        if direction.magnitude2() <= f32::EPSILON {
            return;
        }

        // With an unnormalized direction the time of impact is the segment fraction.
        let ray = Ray::new(point_to_physics(from), vec3_to_physics(direction));

        for (handle, collider) in self.colliders.iter() {
            let Some(intersection) =
                collider
                    .shape()
                    .cast_ray_and_get_normal(collider.position(), &ray, 1.0, true)
            else {
                continue;
            };

            callback.add_single_result(RayHit {
                collider: handle,
                hit_fraction: intersection.time_of_impact,
                point: point_from_physics(&ray.point_at(intersection.time_of_impact)),
                normal: vec3_from_physics(&intersection.normal),
            });
        }
    }

    pub fn rigid_body_count(&self) -> usize {
        self.rigid_bodies.len()
    }

    pub fn motion_state_count(&self) -> usize {
        self.motion_states.len()
    }

    pub fn collision_shape_count(&self) -> usize {
        self.collision_shapes.len()
    }
}

impl Drop for PhysicsWorld {
    fn drop(&mut self) {
        for body in self.rigid_bodies.drain(..) {
            self.bodies.remove(
                body.handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
        debug!("Released rigid bodies");

        self.motion_states.clear();
        debug!("Released motion states");

        self.collision_shapes.clear();
        debug!("Released collision shapes");

        debug!("Physics world destroyed");
    }
}
