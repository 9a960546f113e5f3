use std::sync::Arc;

use cgmath::{Matrix4, One, Quaternion, SquareMatrix, Vector3};
use hecs::World;

use rune_core::components::{ModelComponent, ShaderRef, Transform};
use rune_core::data::{MaterialData, MeshData, PrimitiveData};
use rune_core::headless::{GpuCommand, HeadlessDevice};
use rune_core::renderer::render_update;
use rune_core::resources::ResourceManager;

fn asset(name: &str) -> String {
    format!("{}/tests/assets/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn loaded() -> (Arc<HeadlessDevice>, ResourceManager) {
    let device = Arc::new(HeadlessDevice::new());
    let mut resources = ResourceManager::new(device.clone());
    resources.load_shader_asset(asset("basic.glsl")).unwrap();
    (device, resources)
}

fn flat_triangle(base_color: Vector3<f32>) -> MeshData {
    let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let normals = [[0.0f32, 0.0, 1.0]; 3];
    let texcoords = [[0.0f32; 2]; 3];

    MeshData {
        name: "triangle".to_string(),
        translation: Vector3::new(0.0, 0.0, 0.0),
        rotation: Quaternion::one(),
        scale: Vector3::new(1.0, 1.0, 1.0),
        primitives: vec![PrimitiveData {
            positions: bytemuck::cast_slice(&positions).to_vec(),
            normals: bytemuck::cast_slice(&normals).to_vec(),
            texcoords: bytemuck::cast_slice(&texcoords).to_vec(),
            indices: Vec::new(),
            index_count: 0,
            mode: glow::TRIANGLES,
            index_type: glow::UNSIGNED_SHORT,
            material: MaterialData {
                base_color,
                texture: None,
            },
        }],
    }
}

#[test]
fn untextured_meshes_touch_no_texture_state() {
    let (device, mut resources) = loaded();
    resources
        .insert_model("triangle", &[flat_triangle(Vector3::new(0.25, 0.5, 0.75))])
        .unwrap();

    let mut scene = World::new();
    scene.spawn((
        resources.get_model_resource("triangle"),
        ShaderRef(resources.get_shader_resource(asset("basic.glsl"))),
        Transform::default(),
    ));

    device.clear_commands();
    render_update(&scene, &resources, &Matrix4::identity());

    assert_eq!(device.count(|c| matches!(c, GpuCommand::ActiveTexture(_))), 0);
    assert_eq!(device.count(|c| matches!(c, GpuCommand::BindTexture(_))), 0);
    assert_eq!(
        device.count(|c| *c
            == GpuCommand::SetUniformVec3 {
                name: "fragBaseColor".to_string(),
                value: [0.25, 0.5, 0.75],
            }),
        1
    );
    assert_eq!(
        device.count(|c| *c == GpuCommand::DrawArrays { mode: glow::TRIANGLES, first: 0, count: 3 }),
        1
    );
}

#[test]
fn textured_meshes_bind_and_unbind_their_texture() {
    let (device, mut resources) = loaded();
    resources.load_model_asset(asset("two_bricks.gltf")).unwrap();

    let mut scene = World::new();
    scene.spawn((
        resources.get_model_resource(asset("two_bricks.gltf")),
        ShaderRef(resources.get_shader_resource(asset("basic.glsl"))),
    ));

    device.clear_commands();
    render_update(&scene, &resources, &Matrix4::identity());

    assert_eq!(
        device.count(|c| matches!(c, GpuCommand::DrawElements { count: 6, element_type: glow::UNSIGNED_SHORT, .. })),
        3
    );
    assert_eq!(device.count(|c| *c == GpuCommand::ActiveTexture(glow::TEXTURE0)), 2);
    assert_eq!(device.count(|c| matches!(c, GpuCommand::BindTexture(Some(_)))), 2);
    assert_eq!(device.count(|c| *c == GpuCommand::BindTexture(None)), 2);
    assert_eq!(
        device.count(|c| *c == GpuCommand::SetUniformInt { name: "texture0".to_string(), value: 0 }),
        2
    );
}

#[test]
fn missing_global_transform_renders_at_the_local_offset() {
    let (device, mut resources) = loaded();
    resources.load_model_asset(asset("two_bricks.gltf")).unwrap();

    let model = resources.get_model_resource(asset("two_bricks.gltf"));
    let mut scene = World::new();
    scene.spawn((
        ModelComponent::new(vec![model.meshes[2]]),
        ShaderRef(resources.get_shader_resource(asset("basic.glsl"))),
    ));

    device.clear_commands();
    render_update(&scene, &resources, &Matrix4::identity());

    let models: Vec<[f32; 16]> = device
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            GpuCommand::SetUniformMat4 { name, value } if name == "model" => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0][0], 2.0);
    assert_eq!(models[0][14], -2.0);
}

#[test]
fn global_transform_is_applied_before_the_local_one() {
    let (device, mut resources) = loaded();
    resources
        .insert_model("triangle", &[flat_triangle(Vector3::new(1.0, 1.0, 1.0))])
        .unwrap();

    let mut scene = World::new();
    scene.spawn((
        resources.get_model_resource("triangle"),
        ShaderRef(resources.get_shader_resource(asset("basic.glsl"))),
        Transform::from_position(Vector3::new(4.0, 0.0, 0.0)),
    ));

    device.clear_commands();
    render_update(&scene, &resources, &Matrix4::identity());

    let translated = device.count(|c| match c {
        GpuCommand::SetUniformMat4 { name, value } => name == "model" && value[12] == 4.0,
        _ => false,
    });
    assert_eq!(translated, 1);
}
