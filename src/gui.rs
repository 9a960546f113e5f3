use std::time::{Duration, Instant};

use egui::{Align2, RichText};

/// Numbers shown in the overlay, gathered by the frame loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlayStats {
    pub scene_entities: u32,
    pub rigid_bodies: usize,
    pub collision_shapes: usize,
    pub debug_lines: usize,
    pub physics_steps: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OverlayActions {
    pub drop_sphere: bool,
}

pub struct Overlay {
    frame_count: u32,
    accumulator: Duration,
    last_frame_time: Instant,
    fps: u32,

    pub debug_physics: bool,
}

impl Overlay {
    pub fn new(debug_physics: bool) -> Self {
        Self {
            frame_count: 0,
            accumulator: Duration::ZERO,
            last_frame_time: Instant::now(),
            fps: 0,
            debug_physics,
        }
    }

    pub fn update(
        &mut self,
        raw_input: egui::RawInput,
        ctx: &egui::Context,
        stats: OverlayStats,
    ) -> (egui::FullOutput, OverlayActions) {
        let now = Instant::now();
        self.accumulator += now - self.last_frame_time;
        self.last_frame_time = now;
        self.frame_count += 1;

        // Refresh the fps counter ten times a second
        if self.accumulator >= Duration::from_secs_f32(0.1) {
            self.fps = (self.frame_count as f32 / self.accumulator.as_secs_f32()) as u32;
            self.accumulator = Duration::ZERO;
            self.frame_count = 0;
        }

        let mut actions = OverlayActions::default();

        let output = ctx.run(raw_input, |ctx| {
            egui::Window::new("Stats")
                .anchor(Align2::LEFT_TOP, [8.0, 8.0])
                .resizable(false)
                .collapsible(true)
                .show(ctx, |ui| {
                    ui.label(RichText::new(format!("{} fps", self.fps)).monospace());
                    ui.separator();
                    ui.label(format!("Scene entities: {}", stats.scene_entities));
                    ui.label(format!("Rigid bodies: {}", stats.rigid_bodies));
                    ui.label(format!("Collision shapes: {}", stats.collision_shapes));
                    ui.label(format!("Physics steps this frame: {}", stats.physics_steps));
                    if self.debug_physics {
                        ui.label(format!("Debug lines: {}", stats.debug_lines));
                    }
                    ui.separator();
                    ui.checkbox(&mut self.debug_physics, "Draw physics debug");
                    if ui.button("Drop sphere").clicked() {
                        actions.drop_sphere = true;
                    }
                });
        });

        (output, actions)
    }
}
