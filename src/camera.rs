use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3};

/// Keys held this frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct CameraInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Point3<f32>,
    /// Degrees around +Y; -90 looks down -Z.
    pub yaw: f32,
    /// Degrees, clamped to +-89.
    pub pitch: f32,
    pub fov: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 2.0, 10.0),
            yaw: -90.0,
            pitch: 0.0,
            fov: 60.0,
            near_plane: 0.1,
            far_plane: 500.0,
            speed: 5.0,
            sensitivity: 0.1,
        }
    }
}

impl FlyCamera {
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn orientation(&self) -> Vector3<f32> {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.orientation(), Vector3::unit_y())
    }

    pub fn projection(&self, aspect_ratio: f32) -> Matrix4<f32> {
        cgmath::perspective(Deg(self.fov), aspect_ratio, self.near_plane, self.far_plane)
    }

    /// The value handed to the render and debug passes of a frame.
    pub fn view_projection(&self, aspect_ratio: f32) -> Matrix4<f32> {
        self.projection(aspect_ratio) * self.view()
    }

    pub fn translate(&mut self, input: &CameraInput, delta_time: f32) {
        let forward = self.orientation();
        let right = forward.cross(Vector3::unit_y()).normalize();
        let step = self.speed * delta_time;

        let mut direction = Vector3::new(0.0, 0.0, 0.0);
        if input.forward {
            direction += forward;
        }
        if input.back {
            direction -= forward;
        }
        if input.right {
            direction += right;
        }
        if input.left {
            direction -= right;
        }
        if input.up {
            direction += Vector3::unit_y();
        }
        if input.down {
            direction -= Vector3::unit_y();
        }

        if direction.magnitude2() > 0.0 {
            self.position += direction.normalize() * step;
        }
    }

    /// Mouse motion in pixels.
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw += delta_x * self.sensitivity;
        self.pitch = (self.pitch - delta_y * self.sensitivity).clamp(-89.0, 89.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_looks_down_negative_z() {
        let camera = FlyCamera::default();
        let orientation = camera.orientation();
        assert!((orientation.z + 1.0).abs() < 1e-5);
        assert!(orientation.x.abs() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.rotate(0.0, -10_000.0);
        assert_eq!(camera.pitch, 89.0);
    }

    #[test]
    fn moves_along_the_view_direction() {
        let mut camera = FlyCamera::new(Point3::new(0.0, 0.0, 0.0));
        let input = CameraInput {
            forward: true,
            ..Default::default()
        };
        camera.translate(&input, 1.0);
        assert!((camera.position.z + camera.speed).abs() < 1e-4);
    }
}
