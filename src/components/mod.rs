pub mod collider;
pub mod material;
pub mod mesh;
pub mod model;
pub mod rigid_body;
pub mod transform;

pub use collider::{BoxCollider, SphereCollider};
pub use material::MaterialComponent;
pub use mesh::MeshComponent;
pub use model::{ModelComponent, ShaderRef};
pub use rigid_body::{compute_local_inertia, RigidBodyComponent};
pub use transform::Transform;
