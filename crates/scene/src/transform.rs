//! Translate/rotate/scale transform for scene objects.
//!
//! This module provides the [`Transform`] struct, which stores a
//! translation, a rotation and a scale and composes them on demand into
//! the model matrix
//!
//! ```text
//! M = T * R * S
//! ```
//!
//! so a point is scaled first, then rotated, then translated. The matrix is
//! never stored; it is rebuilt from the three components every time it is
//! queried. Hierarchies are handled by the scene graph, which multiplies
//! parent world matrices with child local matrices during traversal.
//!
//! Rotations compose in call order: `rotate_x(a)` followed by `rotate_y(b)`
//! rotates about X first and then about the parent Y axis. The
//! `pre_rotate_*` family applies the new rotation in the local frame
//! instead.
//!
//! # Example
//!
//! ```
//! use orrery_scene::Transform;
//! use glam::Vec3;
//!
//! let mut transform = Transform::new();
//! transform.set_translation(Vec3::new(1.0, 0.0, 0.0))?;
//! transform.set_uniform_scale(2.0)?;
//!
//! let p = transform.matrix().transform_point3(Vec3::X);
//! assert!((p - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-6);
//! # Ok::<(), orrery_scene::SceneError>(())
//! ```

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::error::{
    SceneError, SceneResult, ensure_direction, ensure_finite, ensure_finite_vec3,
};

/// A transform representing translation, rotation, and scale.
///
/// All setters reject non-finite input with
/// [`SceneError::InvalidValue`] and leave the transform untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create an identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with the given translation.
    pub fn with_translation(mut self, translation: Vec3) -> SceneResult<Self> {
        self.set_translation(translation)?;
        Ok(self)
    }

    /// Create a transform with the given rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> SceneResult<Self> {
        self.set_rotation_quat(rotation)?;
        Ok(self)
    }

    /// Create a transform with the given per-axis scale.
    pub fn with_scale(mut self, scale: Vec3) -> SceneResult<Self> {
        self.set_scale(scale)?;
        Ok(self)
    }

    /// Create a transform with the given uniform scale.
    pub fn with_uniform_scale(mut self, scale: f32) -> SceneResult<Self> {
        self.set_uniform_scale(scale)?;
        Ok(self)
    }

    /// Assemble a transform from components that are finite by construction.
    pub(crate) fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        debug_assert!(translation.is_finite() && rotation.is_finite() && scale.is_finite());
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Reset to the identity transform.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Translation component.
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Rotation component.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Scale component.
    pub fn scale_factors(&self) -> Vec3 {
        self.scale
    }

    // Absolute transformations

    /// Replace the translation.
    pub fn set_translation(&mut self, translation: Vec3) -> SceneResult<()> {
        self.translation = ensure_finite_vec3("translation", translation)?;
        Ok(())
    }

    /// Replace the scale with a per-axis scale.
    pub fn set_scale(&mut self, scale: Vec3) -> SceneResult<()> {
        self.scale = ensure_finite_vec3("scale", scale)?;
        Ok(())
    }

    /// Replace the scale with the same factor on all three axes.
    pub fn set_uniform_scale(&mut self, scale: f32) -> SceneResult<()> {
        self.set_scale(Vec3::splat(ensure_finite("uniform scale", scale)?))
    }

    /// Replace the rotation with a quaternion (normalized on the way in).
    pub fn set_rotation_quat(&mut self, rotation: Quat) -> SceneResult<()> {
        if !rotation.is_finite() || rotation.length_squared() <= f32::EPSILON {
            return Err(SceneError::invalid("rotation", rotation));
        }
        self.rotation = rotation.normalize();
        Ok(())
    }

    /// Replace the rotation with `angle` radians around `axis`.
    pub fn set_rotation(&mut self, angle: f32, axis: Vec3) -> SceneResult<()> {
        self.rotation = axis_angle(angle, axis)?;
        Ok(())
    }

    /// Replace the rotation with `angle` radians around the X axis.
    pub fn set_rotation_x(&mut self, angle: f32) -> SceneResult<()> {
        self.set_rotation(angle, Vec3::X)
    }

    /// Replace the rotation with `angle` radians around the Y axis.
    pub fn set_rotation_y(&mut self, angle: f32) -> SceneResult<()> {
        self.set_rotation(angle, Vec3::Y)
    }

    /// Replace the rotation with `angle` radians around the Z axis.
    pub fn set_rotation_z(&mut self, angle: f32) -> SceneResult<()> {
        self.set_rotation(angle, Vec3::Z)
    }

    // Relative transformations

    /// Add `offset` to the translation.
    pub fn translate(&mut self, offset: Vec3) -> SceneResult<()> {
        ensure_finite_vec3("offset", offset)?;
        self.translation = ensure_finite_vec3("translation", self.translation + offset)?;
        Ok(())
    }

    /// Multiply the current scale component-wise by `factor`.
    pub fn scale(&mut self, factor: Vec3) -> SceneResult<()> {
        ensure_finite_vec3("scale factor", factor)?;
        self.scale = ensure_finite_vec3("scale", self.scale * factor)?;
        Ok(())
    }

    /// Multiply the current scale on all axes by `factor`.
    pub fn scale_uniform(&mut self, factor: f32) -> SceneResult<()> {
        self.scale(Vec3::splat(ensure_finite("scale factor", factor)?))
    }

    /// Rotate by `angle` radians around `axis`, after the current rotation.
    pub fn rotate(&mut self, angle: f32, axis: Vec3) -> SceneResult<()> {
        self.rotation = (axis_angle(angle, axis)? * self.rotation).normalize();
        Ok(())
    }

    /// Rotate around the X axis, after the current rotation.
    pub fn rotate_x(&mut self, angle: f32) -> SceneResult<()> {
        self.rotate(angle, Vec3::X)
    }

    /// Rotate around the Y axis, after the current rotation.
    pub fn rotate_y(&mut self, angle: f32) -> SceneResult<()> {
        self.rotate(angle, Vec3::Y)
    }

    /// Rotate around the Z axis, after the current rotation.
    pub fn rotate_z(&mut self, angle: f32) -> SceneResult<()> {
        self.rotate(angle, Vec3::Z)
    }

    /// Rotate by `angle` radians around `axis` expressed in the local frame,
    /// i.e. before the current rotation.
    pub fn pre_rotate(&mut self, angle: f32, axis: Vec3) -> SceneResult<()> {
        self.rotation = (self.rotation * axis_angle(angle, axis)?).normalize();
        Ok(())
    }

    /// Rotate around the local X axis.
    pub fn pre_rotate_x(&mut self, angle: f32) -> SceneResult<()> {
        self.pre_rotate(angle, Vec3::X)
    }

    /// Rotate around the local Y axis.
    pub fn pre_rotate_y(&mut self, angle: f32) -> SceneResult<()> {
        self.pre_rotate(angle, Vec3::Y)
    }

    /// Rotate around the local Z axis.
    pub fn pre_rotate_z(&mut self, angle: f32) -> SceneResult<()> {
        self.pre_rotate(angle, Vec3::Z)
    }

    /// Orient the transform so that its front (`-Z`) points along `front`
    /// and its up vector lies in the plane of `front` and `up`.
    pub fn look_towards(&mut self, front: Vec3, up: Vec3) -> SceneResult<()> {
        let front = ensure_direction("front direction", front)?;
        let up = ensure_direction("up direction", up)?;

        let right = front.cross(up);
        if right.length_squared() <= f32::EPSILON {
            return Err(SceneError::invalid("up direction (parallel to front)", up));
        }
        let right = right.normalize();
        let up = right.cross(front);

        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -front)).normalize();
        Ok(())
    }

    /// Orient the transform so that its front points at `target`.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) -> SceneResult<()> {
        let target = ensure_finite_vec3("look-at target", target)?;
        self.look_towards(target - self.translation, up)
    }

    /// Get the composed model matrix `T * R * S`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Get the inverse of [`Transform::matrix`].
    ///
    /// Returns `None` when a scale component is zero.
    pub fn inverse_matrix(&self) -> Option<Mat4> {
        if self.scale.cmpeq(Vec3::ZERO).any() {
            return None;
        }
        Some(
            Mat4::from_scale(self.scale.recip())
                * Mat4::from_quat(self.rotation.conjugate())
                * Mat4::from_translation(-self.translation),
        )
    }

    /// Translation part as a matrix.
    pub fn translation_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
    }

    /// Rotation part as a matrix.
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }

    /// Scale part as a matrix.
    pub fn scale_matrix(&self) -> Mat4 {
        Mat4::from_scale(self.scale)
    }

    /// Get the normal matrix (inverse transpose of the model matrix).
    ///
    /// See [`normal_matrix`] for the non-invertible fallback.
    pub fn normal_matrix(&self) -> Mat4 {
        normal_matrix(self.matrix())
    }

    /// Get the front (`-Z`) direction vector.
    pub fn front(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the back (`+Z`) direction vector.
    pub fn back(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Get the right direction vector.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the left direction vector.
    pub fn left(&self) -> Vec3 {
        self.rotation * Vec3::NEG_X
    }

    /// Get the up direction vector.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Get the down direction vector.
    pub fn down(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Y
    }
}

/// Inverse transpose of `model`, for transforming normals.
///
/// # Non-invertible transforms
///
/// If the matrix is not invertible (e.g., contains zero scale),
/// the identity matrix is returned as a fallback to avoid NaN/Inf values.
pub fn normal_matrix(model: Mat4) -> Mat4 {
    const EPSILON: f32 = 1e-6;
    let det = model.determinant();

    if !det.is_finite() || det.abs() < EPSILON {
        Mat4::IDENTITY
    } else {
        model.inverse().transpose()
    }
}

fn axis_angle(angle: f32, axis: Vec3) -> SceneResult<Quat> {
    let angle = ensure_finite("rotation angle", angle)?;
    let axis = ensure_direction("rotation axis", axis)?;
    Ok(Quat::from_axis_angle(axis, angle))
}
