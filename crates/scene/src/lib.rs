//! Scene graph and celestial simulation.
//!
//! This crate provides:
//! - Transform hierarchy stored in an arena ([`SceneGraph`])
//! - First-person camera and controller
//! - Orbiting and spinning bodies driven by a [`Simulation`]
//! - Draw submission to a [`RenderBackend`]

mod arena;
pub mod camera;
pub mod celestial;
pub mod error;
pub mod graph;
pub mod node;
pub mod render;
pub mod simulation;
pub mod transform;
pub mod uniforms;

pub use camera::{CameraInput, FpsCamera, FpsController};
pub use celestial::{CelestialBody, OrbitConfig, RingConfig, SpinConfig};
pub use error::{SceneError, SceneResult};
pub use graph::{Ancestors, NodeId, SceneGraph, Traversal, Visit};
pub use node::{DrawMode, GeometryHandle, Node, ProgramHandle, TextureBinding, TextureHandle};
pub use render::{DrawCall, RenderBackend, RenderStats, submit};
pub use simulation::{BodyId, Simulation, SimulationConfig, TickReport};
pub use transform::Transform;
pub use uniforms::{CameraUniforms, ObjectUniforms};
