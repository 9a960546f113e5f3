use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use hecs::{Entity, Ref, World};
use log::{debug, error};

use crate::components::{MaterialComponent, MeshComponent, ModelComponent, Transform};
use crate::data::{MaterialData, MeshData};
use crate::error::{EngineError, EngineResult};
use crate::handles::{MeshHandle, ShaderHandle, TextureHandle};
use crate::loader;
use crate::opengl::GraphicsDevice;
use crate::shaders::{split_shader_source, ShaderComponent};
use crate::textures::TextureComponent;

/// Owns every GPU object created from asset files.
///
/// Records live as components in a private entity store and are handed out as
/// typed handles. Textured materials are cached by image name, so an image is
/// uploaded once no matter how many primitives or models sample it.
pub struct ResourceManager {
    device: Arc<dyn GraphicsDevice>,
    registry: World,
    material_cache: HashMap<String, MaterialComponent>,
    model_map: HashMap<PathBuf, ModelComponent>,
    shader_map: HashMap<PathBuf, ShaderHandle>,
}

impl ResourceManager {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            registry: World::new(),
            material_cache: HashMap::new(),
            model_map: HashMap::new(),
            shader_map: HashMap::new(),
        }
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    /// Imports a glTF file and registers it under `path`. Loading the same
    /// path again replaces the entry; meshes of the old entry stay valid.
    pub fn load_model_asset(&mut self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        let meshes = loader::load_model(path)?;
        self.insert_model(path, &meshes)
    }

    /// Uploads already decoded meshes and registers them under `path`.
    ///
    /// Nothing is registered if any primitive fails; records created up to
    /// that point are released again.
    pub fn insert_model(&mut self, path: impl AsRef<Path>, meshes: &[MeshData]) -> EngineResult<()> {
        let path = path.as_ref();
        let mut created = Vec::new();
        let mut new_cache_keys = Vec::new();

        match self.build_model(meshes, &mut created, &mut new_cache_keys) {
            Ok(model) => {
                debug!("Loaded model {:?} with {} meshes", path, model.len());
                self.model_map.insert(path.to_path_buf(), model);
                Ok(())
            }
            Err(err) => {
                for key in new_cache_keys {
                    self.material_cache.remove(&key);
                }
                for entity in created {
                    self.release_entity(entity);
                }
                Err(err)
            }
        }
    }

    fn build_model(
        &mut self,
        meshes: &[MeshData],
        created: &mut Vec<Entity>,
        new_cache_keys: &mut Vec<String>,
    ) -> EngineResult<ModelComponent> {
        let mut model = ModelComponent::default();

        for mesh in meshes {
            let local = Transform {
                position: mesh.translation,
                rotation: mesh.rotation,
                scale: mesh.scale,
            };

            for primitive in &mesh.primitives {
                let material = self.resolve_material(&primitive.material, created, new_cache_keys)?;
                let mesh_component = MeshComponent::create(self.device.as_ref(), primitive)?;

                let entity = self.registry.spawn((mesh_component, material, local));
                created.push(entity);
                model.meshes.push(MeshHandle(entity));
            }
        }

        Ok(model)
    }

    fn resolve_material(
        &mut self,
        data: &MaterialData,
        created: &mut Vec<Entity>,
        new_cache_keys: &mut Vec<String>,
    ) -> EngineResult<MaterialComponent> {
        let Some(texture) = &data.texture else {
            return Ok(MaterialComponent {
                base_color: data.base_color,
                texture: None,
            });
        };

        if let Some(material) = self.cached_material(&texture.name) {
            debug!("Used material cache for {}", texture.name);
            return Ok(material);
        }

        let component = TextureComponent::create(self.device.as_ref(), texture)?;
        let entity = self.registry.spawn((component,));
        created.push(entity);

        let material = MaterialComponent {
            base_color: data.base_color,
            texture: Some(TextureHandle(entity)),
        };
        self.material_cache.insert(texture.name.clone(), material);
        new_cache_keys.push(texture.name.clone());
        Ok(material)
    }

    /// The cached material for an image name, if that image was uploaded.
    pub fn cached_material(&self, image_name: &str) -> Option<MaterialComponent> {
        self.material_cache.get(image_name).copied()
    }

    pub fn material_cache_len(&self) -> usize {
        self.material_cache.len()
    }

    /// Reads a combined `#vertex`/`#fragment` shader file and links it.
    pub fn load_shader_asset(&mut self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.insert_shader(path, &source)
    }

    pub fn insert_shader(&mut self, path: impl AsRef<Path>, source: &str) -> EngineResult<()> {
        let path = path.as_ref();
        let (vertex, fragment) = split_shader_source(source).map_err(|source| EngineError::ShaderMarker {
            path: path.to_path_buf(),
            source,
        })?;

        let shader = ShaderComponent::compile(self.device.as_ref(), vertex, fragment)?;
        let entity = self.registry.spawn((shader,));
        self.shader_map.insert(path.to_path_buf(), ShaderHandle(entity));

        debug!("Loaded shader {:?}", path);
        Ok(())
    }

    pub fn has_model_resource(&self, path: impl AsRef<Path>) -> bool {
        self.model_map.contains_key(path.as_ref())
    }

    /// Panics if `path` was never loaded.
    pub fn get_model_resource(&self, path: impl AsRef<Path>) -> ModelComponent {
        let path = path.as_ref();
        match self.model_map.get(path) {
            Some(model) => model.clone(),
            None => {
                error!("Model {:?} requested before it was loaded", path);
                panic!("model {:?} is not loaded", path);
            }
        }
    }

    /// Panics if `path` was never loaded.
    pub fn get_shader_resource(&self, path: impl AsRef<Path>) -> ShaderHandle {
        let path = path.as_ref();
        match self.shader_map.get(path) {
            Some(shader) => *shader,
            None => {
                error!("Shader {:?} requested before it was loaded", path);
                panic!("shader {:?} is not loaded", path);
            }
        }
    }

    pub fn get_mesh_from_handle(&self, handle: MeshHandle) -> Ref<'_, MeshComponent> {
        self.component(handle.0)
    }

    pub fn get_material_from_handle(&self, handle: MeshHandle) -> Ref<'_, MaterialComponent> {
        self.component(handle.0)
    }

    pub fn get_local_transform_from_mesh_handle(&self, handle: MeshHandle) -> Ref<'_, Transform> {
        self.component(handle.0)
    }

    /// `None` for untextured materials.
    pub fn get_texture_from_material_handle(&self, handle: MeshHandle) -> Option<Ref<'_, TextureComponent>> {
        let texture = self.get_material_from_handle(handle).texture?;
        Some(self.component(texture.0))
    }

    pub fn get_shader_from_handle(&self, handle: ShaderHandle) -> Ref<'_, ShaderComponent> {
        self.component(handle.0)
    }

    fn component<T: hecs::Component>(&self, entity: Entity) -> Ref<'_, T> {
        match self.registry.get::<&T>(entity) {
            Ok(component) => component,
            Err(err) => {
                error!(
                    "Invalid resource handle {:?} for {}: {}",
                    entity,
                    std::any::type_name::<T>(),
                    err
                );
                panic!("invalid resource handle {:?}", entity);
            }
        }
    }

    fn release_entity(&mut self, entity: Entity) {
        let device = self.device.as_ref();
        if let Ok(texture) = self.registry.get::<&TextureComponent>(entity) {
            texture.release(device);
        }
        if let Ok(mesh) = self.registry.get::<&MeshComponent>(entity) {
            mesh.release(device);
        }
        // Despawning an entity created moments ago cannot fail.
        let _ = self.registry.despawn(entity);
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        let device = self.device.as_ref();

        for (_, texture) in self.registry.query_mut::<&TextureComponent>() {
            texture.release(device);
            debug!("Released texture {}", texture.name);
        }

        for (_, mesh) in self.registry.query_mut::<&MeshComponent>() {
            mesh.release(device);
        }
        debug!("Released mesh buffers");

        for (_, shader) in self.registry.query_mut::<&ShaderComponent>() {
            shader.release(device);
        }
        debug!("Released shader programs");

        self.registry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PrimitiveData, TextureData};
    use crate::headless::{GpuCommand, HeadlessDevice};
    use cgmath::{One, Quaternion, Vector3};

    fn primitive(image: Option<&str>, indexed: bool) -> PrimitiveData {
        let positions = [[0.0f32; 3]; 3];
        let normals = [[0.0f32, 1.0, 0.0]; 3];
        let texcoords = [[0.0f32; 2]; 3];
        let indices: [u32; 3] = [0, 1, 2];

        PrimitiveData {
            positions: bytemuck::cast_slice(&positions).to_vec(),
            normals: bytemuck::cast_slice(&normals).to_vec(),
            texcoords: bytemuck::cast_slice(&texcoords).to_vec(),
            indices: if indexed { bytemuck::cast_slice(&indices).to_vec() } else { Vec::new() },
            index_count: if indexed { 3 } else { 0 },
            mode: glow::TRIANGLES,
            index_type: glow::UNSIGNED_INT,
            material: MaterialData {
                base_color: Vector3::new(0.5, 0.25, 1.0),
                texture: image.map(|name| TextureData {
                    name: name.to_string(),
                    width: 1,
                    height: 1,
                    components: 4,
                    bits: 8,
                    pixels: vec![255; 4],
                    wrap_s: glow::REPEAT,
                    wrap_t: glow::REPEAT,
                }),
            },
        }
    }

    fn mesh(primitives: Vec<PrimitiveData>) -> MeshData {
        MeshData {
            name: "node".to_string(),
            translation: Vector3::new(0.0, 2.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            primitives,
        }
    }

    fn manager() -> (Arc<HeadlessDevice>, ResourceManager) {
        let device = Arc::new(HeadlessDevice::new());
        let resources = ResourceManager::new(device.clone());
        (device, resources)
    }

    #[test]
    fn textures_are_shared_by_image_name() {
        let (device, mut resources) = manager();
        let meshes = vec![mesh(vec![
            primitive(Some("brick.png"), true),
            primitive(Some("brick.png"), true),
            primitive(Some("moss.png"), true),
        ])];
        resources.insert_model("wall.gltf", &meshes).unwrap();

        let model = resources.get_model_resource("wall.gltf");
        assert_eq!(model.len(), 3);
        assert_eq!(resources.material_cache_len(), 2);
        assert_eq!(device.count(|c| matches!(c, GpuCommand::CreateTexture(_))), 2);

        let first = resources.get_material_from_handle(model.meshes[0]).texture;
        let second = resources.get_material_from_handle(model.meshes[1]).texture;
        let third = resources.get_material_from_handle(model.meshes[2]).texture;
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_ne!(first, third);
    }

    #[test]
    fn cache_outlives_a_single_load() {
        let (device, mut resources) = manager();
        resources.insert_model("a.gltf", &[mesh(vec![primitive(Some("brick.png"), true)])]).unwrap();
        resources.insert_model("b.gltf", &[mesh(vec![primitive(Some("brick.png"), true)])]).unwrap();

        assert_eq!(device.count(|c| matches!(c, GpuCommand::CreateTexture(_))), 1);
        let a = resources.get_model_resource("a.gltf");
        let b = resources.get_model_resource("b.gltf");
        assert_eq!(
            resources.get_material_from_handle(a.meshes[0]).texture,
            resources.get_material_from_handle(b.meshes[0]).texture
        );
    }

    #[test]
    fn untextured_materials_are_not_cached() {
        let (_device, mut resources) = manager();
        resources.insert_model("plain.gltf", &[mesh(vec![primitive(None, false)])]).unwrap();

        let model = resources.get_model_resource("plain.gltf");
        assert_eq!(resources.material_cache_len(), 0);
        assert!(resources.get_texture_from_material_handle(model.meshes[0]).is_none());
        assert_eq!(
            resources.get_material_from_handle(model.meshes[0]).base_color,
            Vector3::new(0.5, 0.25, 1.0)
        );
    }

    #[test]
    fn meshes_carry_their_node_transform() {
        let (_device, mut resources) = manager();
        resources.insert_model("node.gltf", &[mesh(vec![primitive(None, true)])]).unwrap();

        let model = resources.get_model_resource("node.gltf");
        let local = resources.get_local_transform_from_mesh_handle(model.meshes[0]);
        assert_eq!(local.position, Vector3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn reloading_replaces_the_entry() {
        let (_device, mut resources) = manager();
        resources.insert_model("m.gltf", &[mesh(vec![primitive(None, true)])]).unwrap();
        let old = resources.get_model_resource("m.gltf");

        resources
            .insert_model("m.gltf", &[mesh(vec![primitive(None, true), primitive(None, true)])])
            .unwrap();
        let new = resources.get_model_resource("m.gltf");

        assert_eq!(new.len(), 2);
        assert!(!new.meshes.contains(&old.meshes[0]));
        // the old meshes stay valid until teardown
        assert_eq!(resources.get_mesh_from_handle(old.meshes[0]).index_count, 3);
    }

    #[test]
    fn failed_upload_registers_nothing() {
        let (device, mut resources) = manager();
        // the first primitive gets both of its buffers, the second runs out
        device.limit_buffers(Some(3));

        let meshes = [mesh(vec![primitive(Some("brick.png"), true), primitive(None, true)])];
        let result = resources.insert_model("broken.gltf", &meshes);

        assert!(matches!(result, Err(EngineError::Gpu(_))));
        assert!(!resources.has_model_resource("broken.gltf"));
        assert_eq!(resources.material_cache_len(), 0);
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn shader_marker_errors_carry_the_path() {
        let (_device, mut resources) = manager();
        let result = resources.insert_shader("broken.glsl", "void main() {}");
        assert!(matches!(result, Err(EngineError::ShaderMarker { .. })));
    }

    #[test]
    fn missing_shader_file_is_an_io_error() {
        let (_device, mut resources) = manager();
        let result = resources.load_shader_asset("does/not/exist.glsl");
        assert!(matches!(result, Err(EngineError::Io { .. })));
    }

    #[test]
    #[should_panic(expected = "is not loaded")]
    fn unknown_model_is_a_programming_error() {
        let (_device, resources) = manager();
        resources.get_model_resource("never.gltf");
    }

    #[test]
    #[should_panic(expected = "is not loaded")]
    fn unknown_shader_is_a_programming_error() {
        let (_device, resources) = manager();
        resources.get_shader_resource("never.glsl");
    }

    #[test]
    #[should_panic(expected = "invalid resource handle")]
    fn handle_without_a_mesh_is_a_programming_error() {
        let (_device, mut resources) = manager();
        resources
            .insert_shader("s.glsl", "#vertex\nuniform mat4 model;\n#fragment\nvoid main() {}\n")
            .unwrap();
        let shader = resources.get_shader_resource("s.glsl");

        resources.get_mesh_from_handle(MeshHandle(shader.entity()));
    }

    #[test]
    fn teardown_releases_in_order() {
        let (device, mut resources) = manager();
        resources
            .insert_shader("s.glsl", "#vertex\nuniform mat4 model;\n#fragment\nvoid main() {}\n")
            .unwrap();
        resources.insert_model("m.gltf", &[mesh(vec![primitive(Some("brick.png"), true)])]).unwrap();
        assert!(device.live_objects() > 0);
        device.clear_commands();

        drop(resources);

        assert_eq!(device.live_objects(), 0);
        let deletes: Vec<&'static str> = device
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::DeleteTexture(_) => Some("texture"),
                GpuCommand::DeleteVertexArray(_) | GpuCommand::DeleteBuffer(_) => Some("mesh"),
                GpuCommand::DeleteProgram(_) => Some("program"),
                _ => None,
            })
            .collect();
        assert_eq!(deletes, vec!["texture", "mesh", "mesh", "mesh", "program"]);
    }
}
