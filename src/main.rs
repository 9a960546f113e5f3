use std::ffi::CString;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context as _};
use cgmath::{Point3, Vector3};
use clap::{value_parser, Arg, ArgAction, Command};
use egui_glow::Painter;
use egui_winit::State as EguiState;
use glow::HasContext;
use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use hecs::World;
use log::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use winit::window::{Window, WindowId};

use rune_core::camera::{CameraInput, FlyCamera};
use rune_core::components::{BoxCollider, ModelComponent, RigidBodyComponent, ShaderRef, SphereCollider, Transform};
use rune_core::level::{load_level, spawn_level_colliders};
use rune_core::opengl::GraphicsDevice;
use rune_core::physics::{physics_sync_update, PhysicsWorld};
use rune_core::renderer::{render_update, DebugLineRenderer};
use rune_core::resources::ResourceManager;

mod gui;
use gui::{Overlay, OverlayStats};

const SPHERE_RADIUS: f32 = 0.5;
const SPHERE_MASS: f32 = 1.0;

struct Options {
    model: PathBuf,
    shader: PathBuf,
    level: Option<PathBuf>,
    debug_physics: bool,
    width: u32,
    height: u32,
}

fn cli() -> Command {
    Command::new("rune")
        .about("Drops physics-driven models onto a level")
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .default_value("assets/models/ball.gltf")
                .help("glTF model drawn for every dynamic body"),
        )
        .arg(
            Arg::new("shader")
                .long("shader")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .default_value("assets/shaders/basic.glsl")
                .help("Combined #vertex/#fragment shader file"),
        )
        .arg(
            Arg::new("level")
                .long("level")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Level collision layout (JSON)"),
        )
        .arg(
            Arg::new("debug-physics")
                .long("debug-physics")
                .action(ArgAction::SetTrue)
                .help("Start with physics debug lines enabled"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_parser(value_parser!(u32))
                .default_value("1280"),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_parser(value_parser!(u32))
                .default_value("720"),
        )
}

impl Options {
    fn parse() -> Self {
        let matches = cli().get_matches();
        let path = |name: &str| matches.get_one::<PathBuf>(name).cloned().unwrap_or_default();

        Self {
            model: path("model"),
            shader: path("shader"),
            level: matches.get_one::<PathBuf>("level").cloned(),
            debug_physics: matches.get_flag("debug-physics"),
            width: matches.get_one::<u32>("width").copied().unwrap_or(1280),
            height: matches.get_one::<u32>("height").copied().unwrap_or(720),
        }
    }
}

struct Timer {
    last_frame: Instant,
    delta_time: f32,
}

impl Timer {
    fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
    }
}

/// Everything that lives inside the GL context.
struct Engine {
    scene: World,
    physics: PhysicsWorld,
    resources: ResourceManager,
    debug_lines: DebugLineRenderer,

    model: ModelComponent,
    shader: ShaderRef,
    sphere: SphereCollider,

    camera: FlyCamera,
    input: CameraInput,
}

impl Engine {
    fn new(gl: Arc<glow::Context>, options: &Options) -> anyhow::Result<Self> {
        let device: Arc<dyn GraphicsDevice> = gl;
        let mut resources = ResourceManager::new(Arc::clone(&device));
        resources
            .load_shader_asset(&options.shader)
            .with_context(|| format!("loading shader {:?}", options.shader))?;
        resources
            .load_model_asset(&options.model)
            .with_context(|| format!("loading model {:?}", options.model))?;

        let mut scene = World::new();
        let mut physics = PhysicsWorld::new();
        if options.debug_physics {
            physics.enable_debug();
        }

        match &options.level {
            Some(path) => {
                let level = load_level(path)?;
                spawn_level_colliders(&level, &mut scene, &mut physics);
            }
            None => {
                let ground = Transform::from_position(Vector3::new(0.0, -1.0, 0.0));
                let shape = BoxCollider::new(Vector3::new(25.0, 1.0, 25.0), &mut physics);
                let body = RigidBodyComponent::new(shape.shape(), &ground, 0.0, &mut physics);
                scene.spawn((ground, shape, body));
            }
        }

        let mut engine = Self {
            debug_lines: DebugLineRenderer::new(device.as_ref())?,
            model: resources.get_model_resource(&options.model),
            shader: ShaderRef(resources.get_shader_resource(&options.shader)),
            sphere: SphereCollider::new(SPHERE_RADIUS, &mut physics),
            scene,
            physics,
            resources,
            camera: FlyCamera::new(Point3::new(0.0, 4.0, 14.0)),
            input: CameraInput::default(),
        };

        for i in 0..5 {
            let position = Vector3::new(i as f32 * 1.5 - 3.0, 4.0 + i as f32 * 1.5, 0.0);
            engine.spawn_sphere(position);
        }

        Ok(engine)
    }

    /// Dynamic bodies share one sphere shape and one model resource.
    fn spawn_sphere(&mut self, position: Vector3<f32>) {
        let transform = Transform::from_position(position);
        let body = RigidBodyComponent::new(self.sphere.shape(), &transform, SPHERE_MASS, &mut self.physics);
        self.scene.spawn((transform, self.model.clone(), self.shader, self.sphere.clone(), body));
    }

    /// Physics step, then sync, then draw. The order matters: rendering
    /// reads the transforms the sync just wrote.
    fn frame(&mut self, gl: &glow::Context, delta_time: f32, aspect_ratio: f32) -> usize {
        self.camera.translate(&self.input, delta_time);

        let steps = self.physics.advance(delta_time);
        physics_sync_update(&mut self.scene);

        let view_projection = self.camera.view_projection(aspect_ratio);
        render_update(&self.scene, &self.resources, &view_projection);

        if self.physics.is_debug_enabled() {
            self.debug_lines.draw(gl, self.physics.debug_lines(), &view_projection);
        }

        steps
    }

    fn stats(&self, physics_steps: usize) -> OverlayStats {
        OverlayStats {
            scene_entities: self.scene.len(),
            rigid_bodies: self.physics.rigid_body_count(),
            collision_shapes: self.physics.collision_shape_count(),
            debug_lines: self.physics.debug_lines().line_count(),
            physics_steps,
        }
    }

    fn release(&self, gl: &glow::Context) {
        self.debug_lines.release(gl);
    }
}

struct App {
    options: Options,
    startup_error: Option<anyhow::Error>,
    timer: Timer,

    window: Option<Window>,
    current_context: Option<PossiblyCurrentContext>,
    surface: Option<Surface<WindowSurface>>,
    gl: Option<Arc<glow::Context>>,

    engine: Option<Engine>,
    overlay: Overlay,
    right_mouse_down: bool,
    last_cursor: Option<(f64, f64)>,

    egui_context: egui::Context,
    egui_painter: Option<Painter>,
    egui_state: Option<EguiState>,
}

impl App {
    fn new(options: Options) -> Self {
        Self {
            overlay: Overlay::new(options.debug_physics),
            options,
            startup_error: None,
            timer: Timer::new(),
            window: None,
            current_context: None,
            surface: None,
            gl: None,
            engine: None,
            right_mouse_down: false,
            last_cursor: None,
            egui_context: egui::Context::default(),
            egui_painter: None,
            egui_state: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes()
            .with_title("Rune")
            .with_inner_size(LogicalSize::new(self.options.width, self.options.height));
        let window = event_loop.create_window(attributes)?;

        let display_handle = window.display_handle()?;
        let window_handle = window.window_handle()?;

        let display = unsafe { Display::new(display_handle.into(), display_preference(window_handle.into()))? };

        let template = ConfigTemplateBuilder::new().with_depth_size(24).build();
        let config: Config = unsafe { display.find_configs(template)? }
            .next()
            .ok_or_else(|| anyhow!("no suitable OpenGL config"))?;

        let physical_size = window.inner_size();
        let width = NonZeroU32::new(physical_size.width).unwrap_or(NonZeroU32::MIN);
        let height = NonZeroU32::new(physical_size.height).unwrap_or(NonZeroU32::MIN);

        let surface_attributes =
            SurfaceAttributesBuilder::<WindowSurface>::new().build(window_handle.into(), width, height);
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(window_handle.into()));

        let surface = unsafe { display.create_window_surface(&config, &surface_attributes)? };
        let context = unsafe { display.create_context(&config, &context_attributes)? };
        let current_context = context.make_current(&surface)?;

        let gl = unsafe {
            Arc::new(glow::Context::from_loader_function(|s| match CString::new(s) {
                Ok(name) => display.get_proc_address(&name) as *const _,
                Err(_) => std::ptr::null(),
            }))
        };

        let engine = Engine::new(Arc::clone(&gl), &self.options)?;
        info!(
            "Loaded {:?} and {:?}, {} bodies in the world",
            self.options.model,
            self.options.shader,
            engine.physics.rigid_body_count()
        );

        let painter = Painter::new(Arc::clone(&gl), "", None, false)
            .map_err(|err| anyhow!("failed to create egui painter: {err:?}"))?;
        let egui_state = EguiState::new(
            self.egui_context.clone(),
            self.egui_context.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        self.surface = Some(surface);
        self.current_context = Some(current_context);
        self.gl = Some(gl);
        self.engine = Some(engine);
        self.egui_painter = Some(painter);
        self.egui_state = Some(egui_state);
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let (Some(window), Some(gl), Some(engine), Some(painter), Some(egui_state)) = (
            self.window.as_ref(),
            self.gl.as_ref(),
            self.engine.as_mut(),
            self.egui_painter.as_mut(),
            self.egui_state.as_mut(),
        ) else {
            return Ok(());
        };

        self.timer.update();
        let size = window.inner_size();
        let aspect_ratio = size.width.max(1) as f32 / size.height.max(1) as f32;

        if self.overlay.debug_physics != engine.physics.is_debug_enabled() {
            if self.overlay.debug_physics {
                engine.physics.enable_debug();
            } else {
                engine.physics.disable_debug();
            }
        }

        unsafe {
            gl.viewport(0, 0, size.width as i32, size.height as i32);
            gl.clear_color(0.1, 0.1, 0.12, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
        }

        let steps = engine.frame(gl, self.timer.delta_time, aspect_ratio);

        let (full_output, actions) =
            self.overlay
                .update(egui_state.take_egui_input(window), &self.egui_context, engine.stats(steps));
        if actions.drop_sphere {
            let camera = &engine.camera;
            let spawn = camera.position + camera.orientation() * 2.0;
            engine.spawn_sphere(Vector3::new(spawn.x, spawn.y, spawn.z));
        }

        egui_state.handle_platform_output(window, full_output.platform_output);
        let clipped_primitives = self
            .egui_context
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        painter.paint_and_update_textures(
            [size.width, size.height],
            full_output.pixels_per_point,
            &clipped_primitives,
            &full_output.textures_delta,
        );

        if let (Some(surface), Some(context)) = (self.surface.as_ref(), self.current_context.as_ref()) {
            surface.swap_buffers(context)?;
        }
        window.request_redraw();
        Ok(())
    }

    fn handle_input(&mut self, event: &WindowEvent) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state.is_pressed();
                let input = &mut engine.input;
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::KeyW) => input.forward = pressed,
                    PhysicalKey::Code(KeyCode::KeyS) => input.back = pressed,
                    PhysicalKey::Code(KeyCode::KeyA) => input.left = pressed,
                    PhysicalKey::Code(KeyCode::KeyD) => input.right = pressed,
                    PhysicalKey::Code(KeyCode::Space) => input.up = pressed,
                    PhysicalKey::Code(KeyCode::ShiftLeft) => input.down = pressed,
                    _ => {}
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Right,
                ..
            } => {
                self.right_mouse_down = *state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some((x, y))) = (self.right_mouse_down, self.last_cursor) {
                    engine
                        .camera
                        .rotate((position.x - x) as f32, (position.y - y) as f32);
                }
                self.last_cursor = Some((position.x, position.y));
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.init(event_loop) {
            error!("Startup failed: {err:#}");
            self.startup_error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let consumed = match (self.window.as_ref(), self.egui_state.as_mut()) {
            (Some(window), Some(egui_state)) => egui_state.on_window_event(window, &event).consumed,
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, stopping");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let (Some(surface), Some(context)) = (self.surface.as_ref(), self.current_context.as_ref()) {
                    surface.resize(
                        context,
                        NonZeroU32::new(size.width).unwrap_or(NonZeroU32::MIN),
                        NonZeroU32::new(size.height).unwrap_or(NonZeroU32::MIN),
                    );
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    error!("Frame failed: {err:#}");
                    event_loop.exit();
                }
            }
            ref other if !consumed => self.handle_input(other),
            _ => {}
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // GPU objects go before the context that owns them.
        if let (Some(engine), Some(gl)) = (self.engine.take(), self.gl.as_ref()) {
            engine.release(gl);
            drop(engine);
        }
        if let Some(painter) = self.egui_painter.as_mut() {
            painter.destroy();
        }
    }
}

#[cfg(target_os = "windows")]
fn display_preference(window_handle: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Wgl(Some(window_handle))
}

#[cfg(target_os = "macos")]
fn display_preference(_window_handle: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn display_preference(_window_handle: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Egl
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::parse();
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(options);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
