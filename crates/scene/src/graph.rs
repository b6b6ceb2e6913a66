//! Scene graph: an arena of [`Node`]s linked into a tree.
//!
//! Nodes are addressed by [`NodeId`], a generational index, so ids of
//! removed nodes are rejected instead of aliasing newer nodes. A parent owns
//! its children: removing a node removes its whole subtree.
//!
//! The graph never contains a cycle. [`SceneGraph::attach`] walks the parent
//! chain of the prospective parent (O(depth)) and refuses with
//! [`SceneError::CycleDetected`] if the child is found there.
//!
//! # Example
//!
//! ```
//! use orrery_scene::SceneGraph;
//! use glam::Vec3;
//!
//! let mut graph = SceneGraph::new();
//! let world = graph.create_node("world");
//! let sun = graph.create_node("sun");
//! graph.attach(world, sun)?;
//! graph.get_mut(sun)?.transform_mut().set_translation(Vec3::X)?;
//!
//! let names: Vec<_> = graph.traverse(world)?.map(|v| v.node.name().to_owned()).collect();
//! assert_eq!(names, ["world", "sun"]);
//! # Ok::<(), orrery_scene::SceneError>(())
//! ```

use std::fmt;

use glam::Mat4;
use tracing::{debug, trace};

use crate::arena::{Arena, Index};
use crate::error::{SceneError, SceneResult};
use crate::node::{Node, ProgramHandle};

/// Stable handle to a node in a [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tree of scene nodes stored in a flat arena.
#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    nodes: Arena<Node>,
}

impl SceneGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty, unattached node.
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.insert_node(Node::new(name))
    }

    /// Insert a prepared node as a new root.
    ///
    /// Any links the node carried are discarded.
    pub fn insert_node(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.children.clear();
        let id = NodeId(self.nodes.insert(node));
        trace!(node = %id, "created node");
        id
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    /// Borrow a node.
    pub fn get(&self, id: NodeId) -> SceneResult<&Node> {
        self.nodes.get(id.0).ok_or(SceneError::NodeNotFound(id))
    }

    /// Mutably borrow a node.
    ///
    /// Links are not reachable through this borrow; use
    /// [`SceneGraph::attach`] and [`SceneGraph::detach`].
    pub fn get_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(SceneError::NodeNotFound(id))
    }

    /// Parent of `id`, if attached.
    pub fn parent(&self, id: NodeId) -> SceneResult<Option<NodeId>> {
        Ok(self.get(id)?.parent)
    }

    /// Children of `id` in draw order.
    pub fn children(&self, id: NodeId) -> SceneResult<&[NodeId]> {
        Ok(&self.get(id)?.children)
    }

    /// Nodes without a parent.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| NodeId(index))
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> SceneResult<Ancestors<'_>> {
        let next = self.get(id)?.parent;
        Ok(Ancestors { graph: self, next })
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> SceneResult<bool> {
        self.get(ancestor)?;
        Ok(self.ancestors(id)?.any(|a| a == ancestor))
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// A child that already has a parent is moved. Fails with
    /// [`SceneError::CycleDetected`] if `child` is `parent` or one of its
    /// ancestors; the tree is unchanged on failure.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        let current = self.get(child)?.parent;
        self.get(parent)?;

        if parent == child || self.is_ancestor(child, parent)? {
            return Err(SceneError::CycleDetected { parent, child });
        }
        if current == Some(parent) {
            return Ok(());
        }

        self.unlink(child);
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        debug!(%parent, %child, "attached node");
        Ok(())
    }

    /// Detach `child` from its parent, making it a root.
    ///
    /// The subtree stays alive and keeps its local transforms.
    pub fn detach(&mut self, child: NodeId) -> SceneResult<()> {
        self.get(child)?;
        self.unlink(child);
        debug!(%child, "detached node");
        Ok(())
    }

    /// Remove `id` and its whole subtree. Returns how many nodes were removed.
    pub fn remove(&mut self, id: NodeId) -> SceneResult<usize> {
        self.get(id)?;
        self.unlink(id);

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current.0) {
                stack.extend(node.children);
                removed += 1;
            }
        }

        debug!(node = %id, removed, "removed subtree");
        Ok(removed)
    }

    /// World matrix of `id`: the product of all ancestor local matrices
    /// with its own, root first.
    pub fn world_matrix(&self, id: NodeId) -> SceneResult<Mat4> {
        let mut world = self.get(id)?.transform().matrix();
        for ancestor in self.ancestors(id)? {
            world = self.get(ancestor)?.transform().matrix() * world;
        }
        Ok(world)
    }

    /// Program used to draw `id`: its own, or the nearest ancestor's.
    pub fn resolved_program(&self, id: NodeId) -> SceneResult<Option<ProgramHandle>> {
        if let Some(program) = self.get(id)?.program() {
            return Ok(Some(program));
        }
        for ancestor in self.ancestors(id)? {
            if let Some(program) = self.get(ancestor)?.program() {
                return Ok(Some(program));
            }
        }
        Ok(None)
    }

    /// Depth-first, parent-before-child walk of the subtree rooted at `root`.
    ///
    /// If `root` has ancestors, their transforms and programs are taken into
    /// account.
    pub fn traverse(&self, root: NodeId) -> SceneResult<Traversal<'_>> {
        let (parent_world, inherited) = match self.parent(root)? {
            Some(parent) => (self.world_matrix(parent)?, self.resolved_program(parent)?),
            None => (Mat4::IDENTITY, None),
        };
        Ok(Traversal {
            graph: self,
            stack: vec![Pending {
                id: root,
                parent_world,
                inherited,
                depth: 0,
            }],
        })
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(child.0).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.retain(|&c| c != child);
        }
    }
}

/// Iterator over the parent chain of a node.
pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.graph.nodes.get(current.0).and_then(|node| node.parent);
        Some(current)
    }
}

/// One node reached by a [`Traversal`].
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    /// Id of the visited node.
    pub id: NodeId,
    /// The visited node.
    pub node: &'a Node,
    /// Model-to-world matrix of the node.
    pub world: Mat4,
    /// Program to draw with, inherited from the nearest ancestor if unset.
    pub program: Option<ProgramHandle>,
    /// Distance from the traversal root.
    pub depth: usize,
}

#[derive(Debug)]
struct Pending {
    id: NodeId,
    parent_world: Mat4,
    inherited: Option<ProgramHandle>,
    depth: usize,
}

/// Depth-first iterator created by [`SceneGraph::traverse`].
pub struct Traversal<'a> {
    graph: &'a SceneGraph,
    stack: Vec<Pending>,
}

impl<'a> Iterator for Traversal<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Visit<'a>> {
        let pending = self.stack.pop()?;
        let graph: &'a SceneGraph = self.graph;
        let node = graph.nodes.get(pending.id.0)?;

        let world = pending.parent_world * node.transform().matrix();
        let program = node.program().or(pending.inherited);

        // Reversed so the first child is popped first
        self.stack
            .extend(node.children.iter().rev().map(|&child| Pending {
                id: child,
                parent_world: world,
                inherited: program,
                depth: pending.depth + 1,
            }));

        Some(Visit {
            id: pending.id,
            node,
            world,
            program,
            depth: pending.depth,
        })
    }
}
