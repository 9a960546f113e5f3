use std::sync::Arc;

use rune_core::headless::{GpuCommand, HeadlessDevice};
use rune_core::resources::ResourceManager;
use rune_core::EngineError;

fn asset(name: &str) -> String {
    format!("{}/tests/assets/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn manager() -> (Arc<HeadlessDevice>, ResourceManager) {
    let device = Arc::new(HeadlessDevice::new());
    let resources = ResourceManager::new(device.clone());
    (device, resources)
}

#[test]
fn primitives_sampling_one_image_share_a_texture() {
    let (device, mut resources) = manager();
    resources.load_model_asset(asset("two_bricks.gltf")).unwrap();

    let model = resources.get_model_resource(asset("two_bricks.gltf"));
    assert_eq!(model.len(), 3);

    assert_eq!(resources.material_cache_len(), 1);
    let cached = resources.cached_material("brick.png").unwrap();
    assert!(cached.texture.is_some());

    let first = resources.get_material_from_handle(model.meshes[0]).texture;
    let second = resources.get_material_from_handle(model.meshes[1]).texture;
    assert_eq!(first, cached.texture);
    assert_eq!(first, second);

    assert_eq!(device.count(|c| matches!(c, GpuCommand::CreateTexture(_))), 1);
    let texture = resources.get_texture_from_material_handle(model.meshes[0]).unwrap();
    assert_eq!((texture.width, texture.height), (4, 4));
}

#[test]
fn child_nodes_keep_their_local_transform() {
    let (_device, mut resources) = manager();
    resources.load_model_asset(asset("two_bricks.gltf")).unwrap();

    let model = resources.get_model_resource(asset("two_bricks.gltf"));
    let trim = resources.get_local_transform_from_mesh_handle(model.meshes[2]);
    assert_eq!(trim.position.z, -2.0);
    assert_eq!(trim.scale.x, 2.0);
    assert!(resources.get_texture_from_material_handle(model.meshes[2]).is_none());
}

#[test]
fn teardown_releases_every_gpu_object() {
    let (device, mut resources) = manager();
    resources.load_model_asset(asset("two_bricks.gltf")).unwrap();
    resources.load_shader_asset(asset("basic.glsl")).unwrap();
    assert!(device.live_objects() > 0);

    drop(resources);
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn missing_model_file_is_an_io_error() {
    let (_device, mut resources) = manager();
    let result = resources.load_model_asset(asset("missing.gltf"));
    assert!(matches!(result, Err(EngineError::Io { .. })));
    assert!(!resources.has_model_resource(asset("missing.gltf")));
}

#[test]
fn primitives_without_texcoords_are_rejected() {
    let (device, mut resources) = manager();
    let result = resources.load_model_asset(asset("no_texcoords.gltf"));

    assert!(matches!(
        result,
        Err(EngineError::MissingAttribute { attribute: "TEXCOORD_0", .. })
    ));
    assert!(!resources.has_model_resource(asset("no_texcoords.gltf")));
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn failed_shader_link_is_reported() {
    let (device, mut resources) = manager();
    device.fail_linking(true);

    let result = resources.load_shader_asset(asset("basic.glsl"));
    assert!(matches!(result, Err(EngineError::ProgramLink(_))));
    assert_eq!(device.live_objects(), 0);
}
