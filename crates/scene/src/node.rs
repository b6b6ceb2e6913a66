//! Scene node payload: geometry, material, program and local transform.
//!
//! Handles stored here are plain ids into resource tables owned by the
//! renderer. The scene never dereferences them.

use bytemuck::Pod;

use crate::graph::NodeId;
use crate::transform::Transform;

/// Opaque id of a geometry (vertex array) owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u32);

/// Opaque id of a shader program owned by the program manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Opaque id of a texture owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Primitive topology used to draw a node's geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    /// Indexed or non-indexed triangle list
    #[default]
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Line list
    Lines,
    /// Point list
    Points,
}

/// A texture bound to a named sampler of the node's program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureBinding {
    /// Sampler name in the shader, e.g. `diffuse_texture`.
    pub name: String,
    /// Texture to bind.
    pub texture: TextureHandle,
}

/// A node of the scene graph.
///
/// A node without geometry or without a (resolved) program draws nothing,
/// but its children are still drawn.
#[derive(Clone, Debug, Default)]
pub struct Node {
    name: String,

    // Geometry data
    geometry: Option<GeometryHandle>,
    vertices_nb: usize,
    indices_nb: usize,
    draw_mode: DrawMode,

    // Shading data
    material: Vec<u8>,
    program: Option<ProgramHandle>,
    textures: Vec<TextureBinding>,

    transform: Transform,

    // Links, maintained by the graph
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    /// Create an empty node with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Node name; not required to be unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Geometry drawn by this node, if any.
    pub fn geometry(&self) -> Option<GeometryHandle> {
        self.geometry
    }

    /// Set the geometry and its element counts.
    pub fn set_geometry(
        &mut self,
        geometry: GeometryHandle,
        vertices_nb: usize,
        indices_nb: usize,
    ) {
        self.geometry = Some(geometry);
        self.vertices_nb = vertices_nb;
        self.indices_nb = indices_nb;
    }

    /// Remove the geometry; the node becomes a pure grouping node.
    pub fn clear_geometry(&mut self) {
        self.geometry = None;
        self.vertices_nb = 0;
        self.indices_nb = 0;
    }

    /// Number of vertices in the geometry.
    pub fn vertices_nb(&self) -> usize {
        self.vertices_nb
    }

    /// Number of indices to draw. Zero means a non-indexed draw.
    pub fn indices_nb(&self) -> usize {
        self.indices_nb
    }

    /// Override how many indices are drawn.
    pub fn set_indices_nb(&mut self, indices_nb: usize) {
        self.indices_nb = indices_nb;
    }

    /// Primitive topology.
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Set the primitive topology.
    pub fn set_draw_mode(&mut self, draw_mode: DrawMode) {
        self.draw_mode = draw_mode;
    }

    /// Raw material constants, passed through to the renderer unchanged.
    pub fn material_constants(&self) -> &[u8] {
        &self.material
    }

    /// Store a plain-old-data value as this node's material constants.
    pub fn set_material_constants<T: Pod>(&mut self, constants: &T) {
        self.material = bytemuck::bytes_of(constants).to_vec();
    }

    /// Store raw bytes as this node's material constants.
    pub fn set_material_bytes(&mut self, bytes: impl Into<Vec<u8>>) {
        self.material = bytes.into();
    }

    /// Read the material constants back as `T`.
    ///
    /// Returns `None` if the stored blob does not have the size of `T`.
    pub fn material_as<T: Pod>(&self) -> Option<T> {
        bytemuck::try_pod_read_unaligned(&self.material).ok()
    }

    /// Program set on this node. `None` means "inherit from the parent".
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    /// Set or clear the program of this node.
    pub fn set_program(&mut self, program: Option<ProgramHandle>) {
        self.program = program;
    }

    /// Textures bound when drawing this node, in binding-unit order.
    pub fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }

    /// Bind `texture` to the sampler `name`, replacing any previous binding
    /// with the same name.
    pub fn add_texture(&mut self, name: impl Into<String>, texture: TextureHandle) {
        let name = name.into();
        match self.textures.iter_mut().find(|binding| binding.name == name) {
            Some(binding) => binding.texture = texture,
            None => self.textures.push(TextureBinding { name, texture }),
        }
    }

    /// Local transform relative to the parent.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable access to the local transform.
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Replace the local transform.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Parent node, if attached.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in draw order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Number of children.
    pub fn children_nb(&self) -> usize {
        self.children.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;
    use glam::Vec4;

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct PhongConstants {
        diffuse: Vec4,
        shininess: f32,
        _pad: [f32; 3],
    }

    #[test]
    fn test_new_node_is_empty() {
        let node = Node::new("sun");
        assert_eq!(node.name(), "sun");
        assert!(node.geometry().is_none());
        assert!(node.program().is_none());
        assert!(node.children().is_empty());
        assert!(node.parent().is_none());
        assert_eq!(*node.transform(), Transform::default());
    }

    #[test]
    fn test_geometry_setters() {
        let mut node = Node::new("sphere");
        node.set_geometry(GeometryHandle(7), 100, 300);
        assert_eq!(node.geometry(), Some(GeometryHandle(7)));
        assert_eq!(node.vertices_nb(), 100);
        assert_eq!(node.indices_nb(), 300);

        node.set_indices_nb(60);
        assert_eq!(node.indices_nb(), 60);

        node.clear_geometry();
        assert!(node.geometry().is_none());
        assert_eq!(node.indices_nb(), 0);
    }

    #[test]
    fn test_material_constants_round_trip() {
        let constants = PhongConstants {
            diffuse: Vec4::new(0.8, 0.2, 0.1, 1.0),
            shininess: 32.0,
            _pad: [0.0; 3],
        };

        let mut node = Node::new("earth");
        node.set_material_constants(&constants);
        assert_eq!(node.material_constants().len(), size_of::<PhongConstants>());
        assert_eq!(node.material_as::<PhongConstants>(), Some(constants));
        assert_eq!(node.material_as::<f32>(), None);
    }

    #[test]
    fn test_add_texture_replaces_same_name() {
        let mut node = Node::new("saturn");
        node.add_texture("diffuse_texture", TextureHandle(1));
        node.add_texture("normal_map", TextureHandle(2));
        node.add_texture("diffuse_texture", TextureHandle(3));

        assert_eq!(node.textures().len(), 2);
        assert_eq!(node.textures()[0].texture, TextureHandle(3));
        assert_eq!(node.textures()[1].name, "normal_map");
    }
}
