//! Level collision layout stored as JSON.
//!
//! ```json
//! { "COLLISION": [
//!     { "Type": "Box", "Position": [0, -1, 0], "Rotation": [1, 0, 0, 0], "Size": [50, 2, 50] }
//! ] }
//! ```
//!
//! Rotation is `[w, x, y, z]`. Size is the full extent of the shape.

use std::path::Path;

use cgmath::{Quaternion, Vector3};
use hecs::{Entity, World};
use log::debug;
use serde::Deserialize;

use crate::components::{BoxCollider, RigidBodyComponent, SphereCollider, Transform};
use crate::error::{EngineError, EngineResult};
use crate::physics::PhysicsWorld;

#[derive(Debug, Deserialize)]
struct LevelFile {
    #[serde(rename = "COLLISION", default)]
    collision: Vec<ColliderEntry>,
}

#[derive(Debug, Deserialize)]
struct ColliderEntry {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Position")]
    position: [f32; 3],
    #[serde(rename = "Rotation")]
    rotation: [f32; 4],
    #[serde(rename = "Size")]
    size: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Box { half_extents: Vector3<f32> },
    Sphere { radius: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelCollider {
    pub shape: ColliderShape,
    pub transform: Transform,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level {
    pub colliders: Vec<LevelCollider>,
}

pub fn load_level(path: impl AsRef<Path>) -> EngineResult<Level> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let level = parse_level(&text).map_err(|source| EngineError::Level {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Level loaded from {:?} with {} colliders", path, level.colliders.len());
    Ok(level)
}

/// Entries with an unknown `Type` are skipped.
pub fn parse_level(text: &str) -> Result<Level, serde_json::Error> {
    let file: LevelFile = serde_json::from_str(text)?;

    let colliders = file
        .collision
        .into_iter()
        .filter_map(|entry| {
            let [x, y, z] = entry.size;
            let shape = match entry.kind.as_str() {
                "Box" => ColliderShape::Box {
                    half_extents: Vector3::new(x, y, z) * 0.5,
                },
                "Sphere" => ColliderShape::Sphere { radius: x * 0.5 },
                _ => return None,
            };

            let [w, i, j, k] = entry.rotation;
            let transform = Transform::from_position(entry.position.into())
                .with_rotation(Quaternion::new(w, i, j, k));

            Some(LevelCollider { shape, transform })
        })
        .collect();

    Ok(Level { colliders })
}

/// Spawns one static body per collider. Returns the new scene entities.
pub fn spawn_level_colliders(level: &Level, scene: &mut World, physics: &mut PhysicsWorld) -> Vec<Entity> {
    level
        .colliders
        .iter()
        .map(|collider| match collider.shape {
            ColliderShape::Box { half_extents } => {
                let shape = BoxCollider::new(half_extents, physics);
                let body = RigidBodyComponent::new(shape.shape(), &collider.transform, 0.0, physics);
                scene.spawn((collider.transform, shape, body))
            }
            ColliderShape::Sphere { radius } => {
                let shape = SphereCollider::new(radius, physics);
                let body = RigidBodyComponent::new(shape.shape(), &collider.transform, 0.0, physics);
                scene.spawn((collider.transform, shape, body))
            }
        })
        .collect()
}
