//! Uniform block layouts handed to the renderer.
//!
//! All structures use `#[repr(C)]` and implement `bytemuck::Pod`, so a
//! renderer can upload them with `bytemuck::bytes_of` directly. Layouts
//! follow std140 rules:
//! - `Mat4` is 64 bytes (16 floats)
//! - `Vec3` is 12 bytes but must be aligned to 16 bytes
//!
//! Shaders see these as `vertex_world_to_clip`, `vertex_model_to_world`
//! and `normal_model_to_world`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::camera::FpsCamera;
use crate::transform::normal_matrix;

/// Per-frame camera data.
///
/// # Memory Layout (std140)
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 64   | world_to_view |
/// | 64     | 64   | view_to_clip |
/// | 128    | 64   | world_to_clip |
/// | 192    | 12   | camera_position |
/// | 204    | 4    | _padding |
///
/// Total size: 208 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    /// View matrix (world space to camera space).
    pub world_to_view: Mat4,
    /// Projection matrix (camera space to clip space).
    pub view_to_clip: Mat4,
    /// Pre-computed `view_to_clip * world_to_view`.
    pub world_to_clip: Mat4,
    /// Camera position in world space, for lighting.
    pub camera_position: Vec3,
    /// Padding to align structure to 16 bytes.
    pub _padding: f32,
}

impl CameraUniforms {
    /// Snapshot the matrices of `camera`.
    pub fn from_camera(camera: &FpsCamera) -> Self {
        let world_to_view = camera.world_to_view();
        let view_to_clip = camera.view_to_clip();
        Self {
            world_to_view,
            view_to_clip,
            world_to_clip: view_to_clip * world_to_view,
            camera_position: camera.position(),
            _padding: 0.0,
        }
    }

    /// Size of the struct in bytes.
    #[inline]
    pub const fn size() -> usize {
        size_of::<Self>()
    }
}

/// Per-node transform data.
///
/// # Memory Layout (std140)
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 64   | model_to_world |
/// | 64     | 64   | normal_model_to_world |
///
/// Total size: 128 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    /// World matrix of the node.
    pub model_to_world: Mat4,
    /// Inverse transpose of the world matrix; identity when singular.
    pub normal_model_to_world: Mat4,
}

impl ObjectUniforms {
    /// Build object uniforms from a world matrix.
    pub fn new(model_to_world: Mat4) -> Self {
        Self {
            model_to_world,
            normal_model_to_world: normal_matrix(model_to_world),
        }
    }

    /// Size of the struct in bytes.
    #[inline]
    pub const fn size() -> usize {
        size_of::<Self>()
    }
}
