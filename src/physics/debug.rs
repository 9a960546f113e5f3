use cgmath::Vector3;
use rapier3d::prelude::{ColliderSet, NarrowPhase};

use super::math::{point_from_physics, vec3_from_physics};

const AABB_COLOR: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);
const CONTACT_COLOR: Vector3<f32> = Vector3::new(1.0, 0.0, 0.0);
const CONTACT_NORMAL_LENGTH: f32 = 0.25;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Line list produced by the physics world while debug drawing is enabled.
#[derive(Debug, Default)]
pub struct DebugLines {
    vertices: Vec<LineVertex>,
}

impl DebugLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_line(&mut self, from: Vector3<f32>, to: Vector3<f32>, color: Vector3<f32>) {
        self.vertices.push(LineVertex {
            position: from.into(),
            color: color.into(),
        });
        self.vertices.push(LineVertex {
            position: to.into(),
            color: color.into(),
        });
    }

    pub fn draw_contact_point(
        &mut self,
        point: Vector3<f32>,
        normal: Vector3<f32>,
        color: Vector3<f32>,
    ) {
        self.draw_line(point, point + normal * CONTACT_NORMAL_LENGTH, color);
    }

    pub fn clear_lines(&mut self) {
        self.vertices.clear();
    }

    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    pub fn line_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub(crate) fn emit_world(&mut self, colliders: &ColliderSet, narrow_phase: &NarrowPhase) {
        for (_, collider) in colliders.iter() {
            let aabb = collider.compute_aabb();
            self.draw_box(
                point_from_physics(&aabb.mins),
                point_from_physics(&aabb.maxs),
                AABB_COLOR,
            );
        }

        for pair in narrow_phase.contact_pairs() {
            for manifold in &pair.manifolds {
                let normal = vec3_from_physics(&manifold.data.normal);
                for contact in &manifold.data.solver_contacts {
                    self.draw_contact_point(point_from_physics(&contact.point), normal, CONTACT_COLOR);
                }
            }
        }
    }

    fn draw_box(&mut self, min: Vector3<f32>, max: Vector3<f32>, color: Vector3<f32>) {
        let corner = |x: bool, y: bool, z: bool| {
            Vector3::new(
                if x { max.x } else { min.x },
                if y { max.y } else { min.y },
                if z { max.z } else { min.z },
            )
        };

        for a in [false, true] {
            for b in [false, true] {
                self.draw_line(corner(false, a, b), corner(true, a, b), color);
                self.draw_line(corner(a, false, b), corner(a, true, b), color);
                self.draw_line(corner(a, b, false), corner(a, b, true), color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_is_twelve_edges() {
        let mut lines = DebugLines::new();
        lines.draw_box(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0), AABB_COLOR);
        assert_eq!(lines.line_count(), 12);

        for edge in lines.vertices().chunks(2) {
            let from = Vector3::from(edge[0].position);
            let to = Vector3::from(edge[1].position);
            let delta = to - from;
            let axes_changed = [delta.x, delta.y, delta.z].iter().filter(|d| d.abs() > 0.0).count();
            assert_eq!(axes_changed, 1);
        }
    }

    #[test]
    fn clearing_drops_all_lines() {
        let mut lines = DebugLines::new();
        lines.draw_contact_point(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0), CONTACT_COLOR);
        assert_eq!(lines.line_count(), 1);
        lines.clear_lines();
        assert!(lines.vertices().is_empty());
    }
}
