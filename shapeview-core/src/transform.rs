/// Object transforms and matrix builders
use nalgebra::{Matrix4, Point3, Vector3};

/// Bounds of the uniform scale a user can give an object
pub const SIZE_MIN: f32 = 0.1;
pub const SIZE_MAX: f32 = 5.0;

/// Clamp a requested uniform scale into `[SIZE_MIN, SIZE_MAX]`
pub fn clamp_size(size: f32) -> f32 {
    size.clamp(SIZE_MIN, SIZE_MAX)
}

/// Session-only placement of a scene object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    pub position: Point3<f32>,
    pub scale: Vector3<f32>,
}

impl ObjectTransform {
    pub fn at(position: Point3<f32>) -> Self {
        Self {
            position,
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn set_uniform_scale(&mut self, size: f32) {
        self.scale = Vector3::repeat(size);
    }

    pub fn translate(&mut self, delta: &Vector3<f32>) {
        self.position += delta;
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::translation_matrix(self.position.x, self.position.y, self.position.z)
            * Transform::scale_matrix(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}
