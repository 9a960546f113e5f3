use cgmath::{Matrix4, One, Quaternion, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    /// Translation * rotation * scale.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3, SquareMatrix, Vector4};

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform::default().matrix(), Matrix4::identity());
    }

    #[test]
    fn scale_applies_before_rotation_and_translation() {
        let transform = Transform::from_position(Vector3::new(1.0, 0.0, 0.0))
            .with_rotation(Quaternion::from_angle_z(Deg(90.0)))
            .with_scale(Vector3::new(2.0, 2.0, 2.0));

        let moved = transform.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((moved.x - 1.0).abs() < 1e-5);
        assert!((moved.y - 2.0).abs() < 1e-5);
    }
}
