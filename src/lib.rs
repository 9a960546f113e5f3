//! Resource management and per-frame synchronization for a small OpenGL
//! engine: glTF meshes, shaders and textures behind handles, rapier rigid
//! bodies, and the passes that copy physics results into scene transforms
//! and draw the scene.

pub mod camera;
pub mod components;
pub mod data;
pub mod error;
pub mod handles;
pub mod headless;
pub mod level;
pub mod loader;
pub mod opengl;
pub mod physics;
pub mod renderer;
pub mod resources;
pub mod shaders;
pub mod textures;

pub use error::{EngineError, EngineResult};
