//! Error types for scene and simulation operations.

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::graph::NodeId;
use crate::simulation::BodyId;

/// Error type for scene graph, transform, camera and body operations.
///
/// Every fallible setter validates before storing anything, so an `Err`
/// always means the target was left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// A numeric input was non-finite or outside its domain.
    #[error("invalid value for {what}: {value}")]
    InvalidValue {
        /// Which parameter was rejected.
        what: &'static str,
        /// The rejected value, formatted.
        value: String,
    },

    /// Attaching `child` under `parent` would make a node its own ancestor.
    #[error("attaching {child} under {parent} would create a cycle")]
    CycleDetected {
        /// Node that was to receive the child.
        parent: NodeId,
        /// Node that was to be attached.
        child: NodeId,
    },

    /// The node id is unknown or refers to a removed node.
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    /// The body id is unknown or refers to a removed body.
    #[error("body {0} does not exist")]
    BodyNotFound(BodyId),
}

impl SceneError {
    pub(crate) fn invalid(what: &'static str, value: impl std::fmt::Debug) -> Self {
        Self::InvalidValue {
            what,
            value: format!("{value:?}"),
        }
    }
}

/// Result type alias for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

pub(crate) fn ensure_finite(what: &'static str, value: f32) -> SceneResult<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SceneError::invalid(what, value))
    }
}

pub(crate) fn ensure_finite_vec3(what: &'static str, value: Vec3) -> SceneResult<Vec3> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SceneError::invalid(what, value))
    }
}

pub(crate) fn ensure_positive(what: &'static str, value: f32) -> SceneResult<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SceneError::invalid(what, value))
    }
}

pub(crate) fn ensure_positive_vec3(what: &'static str, value: Vec3) -> SceneResult<Vec3> {
    if value.is_finite() && value.min_element() > 0.0 {
        Ok(value)
    } else {
        Err(SceneError::invalid(what, value))
    }
}

pub(crate) fn ensure_positive_vec2(what: &'static str, value: Vec2) -> SceneResult<Vec2> {
    if value.is_finite() && value.min_element() > 0.0 {
        Ok(value)
    } else {
        Err(SceneError::invalid(what, value))
    }
}

/// Finite, non-zero direction, returned normalized.
pub(crate) fn ensure_direction(what: &'static str, value: Vec3) -> SceneResult<Vec3> {
    if value.is_finite() && value.length_squared() > f32::EPSILON {
        Ok(value.normalize())
    } else {
        Err(SceneError::invalid(what, value))
    }
}
