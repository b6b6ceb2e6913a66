//! Hand-off from the scene graph to a renderer.
//!
//! [`submit`] walks a subtree once per frame and turns every drawable node
//! into a [`DrawCall`] for a [`RenderBackend`]. A node is drawable when it
//! has geometry and a program, either its own or one inherited from the
//! nearest ancestor. Nodes that are not drawable are skipped, their children
//! are still visited.

use tracing::trace;

use crate::camera::FpsCamera;
use crate::error::SceneResult;
use crate::graph::{NodeId, SceneGraph};
use crate::node::{DrawMode, GeometryHandle, ProgramHandle, TextureBinding};
use crate::uniforms::{CameraUniforms, ObjectUniforms};

/// Everything a backend needs to draw one node.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    /// Node being drawn.
    pub node: NodeId,
    /// Vertex data to bind.
    pub geometry: GeometryHandle,
    /// Number of vertices in `geometry`.
    pub vertices_nb: usize,
    /// `0` means non-indexed drawing.
    pub indices_nb: usize,
    /// Primitive topology.
    pub draw_mode: DrawMode,
    /// Program already made current through [`RenderBackend::select_program`].
    pub program: ProgramHandle,
    /// Textures to bind, by sampler name.
    pub textures: &'a [TextureBinding],
    /// Raw material constants, uploaded as-is.
    pub material: &'a [u8],
    /// World and normal matrices of the node.
    pub object: ObjectUniforms,
}

/// Receiver of draw submissions.
///
/// Implemented by the GPU renderer; the scene never touches GPU state
/// itself.
pub trait RenderBackend {
    /// Called once per [`submit`] before any draw.
    fn set_camera(&mut self, _camera: &CameraUniforms) {}

    /// Make `program` current. Only called when it differs from the
    /// previously selected one.
    fn select_program(&mut self, program: ProgramHandle);

    /// Draw one node with the current program.
    fn draw(&mut self, call: &DrawCall<'_>);
}

/// Counters for one [`submit`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Nodes handed to [`RenderBackend::draw`].
    pub drawn: usize,
    /// Nodes visited but not drawn.
    pub skipped: usize,
    /// Calls to [`RenderBackend::select_program`].
    pub program_switches: usize,
}

/// Draw the subtree rooted at `root` as seen from `camera`.
///
/// Fails only if `root` is not in `graph`.
pub fn submit<B>(
    graph: &SceneGraph,
    root: NodeId,
    camera: &FpsCamera,
    backend: &mut B,
) -> SceneResult<RenderStats>
where
    B: RenderBackend + ?Sized,
{
    let traversal = graph.traverse(root)?;
    backend.set_camera(&CameraUniforms::from_camera(camera));

    let mut stats = RenderStats::default();
    let mut current = None;
    for visit in traversal {
        let node = visit.node;
        let (Some(geometry), Some(program)) = (node.geometry(), visit.program) else {
            stats.skipped += 1;
            continue;
        };

        if current != Some(program) {
            backend.select_program(program);
            current = Some(program);
            stats.program_switches += 1;
        }

        backend.draw(&DrawCall {
            node: visit.id,
            geometry,
            vertices_nb: node.vertices_nb(),
            indices_nb: node.indices_nb(),
            draw_mode: node.draw_mode(),
            program,
            textures: node.textures(),
            material: node.material_constants(),
            object: ObjectUniforms::new(visit.world),
        });
        stats.drawn += 1;
    }

    trace!(
        drawn = stats.drawn,
        skipped = stats.skipped,
        switches = stats.program_switches,
        "submitted frame"
    );
    Ok(stats)
}
