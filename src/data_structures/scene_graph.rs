//! Scene graph and hierarchical scene organization.
//!
//! A [`SceneGraph`] is an arena of [`SceneNode`]s linked by parent/child
//! handles. It also owns the material table and the texture store of the
//! scene so that a whole loaded fragment can be moved into another graph in
//! one piece (see [`SceneGraph::append`]).
//!
//! The graph is device-free: renderers read local transforms, visibility,
//! materials and textures from here and upload what changed.

use std::{collections::BTreeSet, sync::Arc};

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    data_structures::{
        geometry::Geometry,
        instance::Instance,
        material::{Material, MaterialId},
        texture::{TextureId, TextureStore},
    },
    pick::Aabb,
};

/// Stable handle of a node inside one [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Light component of a node (point/spot lights, emissive light panels).
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub transform: Instance,
    pub visible: bool,
    /// Local-space bounds of the node's own geometry, `None` for groups.
    pub bounds: Option<Aabb>,
    /// Triangles for exact hit testing. Meshes without them are hit as boxes.
    pub geometry: Option<Arc<Geometry>>,
    pub material: Option<MaterialId>,
    pub light: Option<Light>,
}

impl SceneNode {
    fn new(name: Option<&str>, parent: Option<NodeId>, transform: Instance) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()).map(str::to_string),
            parent,
            children: Vec::new(),
            transform,
            visible: true,
            bounds: None,
            geometry: None,
            material: None,
            light: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_mesh(&self) -> bool {
        self.bounds.is_some()
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
    materials: Vec<Material>,
    dirty_materials: BTreeSet<MaterialId>,
    textures: TextureStore,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node below `parent` (or as a new root). Empty names count as unnamed.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: Option<&str>,
        transform: Instance,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = match parent {
            Some(p) if p.0 < self.nodes.len() => Some(p),
            Some(p) => {
                log::warn!("Parent {:?} does not exist, inserting {:?} as a root.", p, id);
                None
            }
            None => None,
        };
        self.nodes.push(SceneNode::new(name, parent, transform));
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Attach geometry bounds and a material to an existing node.
    pub fn set_mesh(&mut self, id: NodeId, bounds: Aabb, material: Option<MaterialId>) {
        if let Some(node) = self.node_mut(id) {
            node.bounds = Some(bounds);
            node.material = material;
        }
    }

    /// Attach triangles and a material. Bounds are derived from the positions.
    pub fn set_geometry(&mut self, id: NodeId, geometry: Geometry, material: Option<MaterialId>) {
        let Some(bounds) = geometry.bounds() else {
            log::warn!("Ignoring empty geometry for {:?}", id);
            return;
        };
        if let Some(node) = self.node_mut(id) {
            node.bounds = Some(bounds);
            node.geometry = Some(Arc::new(geometry));
            node.material = material;
        }
    }

    pub fn set_light(&mut self, id: NodeId, light: Light) {
        if let Some(node) = self.node_mut(id) {
            node.light = Some(light);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }

    /// `id` followed by its parent, grandparent and so on up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.node(id).map(|_| id),
        }
    }

    /// `id` and everything below it in depth-first pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            visited.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        visited
    }

    /// World transform of a node: the product of all local transforms from the root down.
    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        self.ancestors(id)
            .filter_map(|ancestor| self.node(ancestor))
            .fold(Matrix4::identity(), |child_to_world, node| {
                node.transform.to_matrix() * child_to_world
            })
    }

    /// A node is rendered only if it and every ancestor is visible.
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut ancestors = self.ancestors(id).peekable();
        ancestors.peek().is_some()
            && ancestors.all(|ancestor| self.nodes[ancestor.0].visible)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    /// Flag a material so that the renderer re-uploads it on the next frame.
    pub fn mark_material_dirty(&mut self, id: MaterialId) {
        self.dirty_materials.insert(id);
    }

    /// Materials changed since the last call, in ascending id order.
    pub fn take_dirty_materials(&mut self) -> Vec<MaterialId> {
        std::mem::take(&mut self.dirty_materials).into_iter().collect()
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureStore {
        &mut self.textures
    }

    /**
     * Moves all nodes, materials and textures of `other` into `self`.
     *
     * Handles inside `other` are shifted so they stay valid, the roots of
     * `other` become roots of `self` and are returned in their original order.
     */
    pub fn append(&mut self, other: SceneGraph) -> Vec<NodeId> {
        let node_offset = self.nodes.len();
        let material_offset = self.materials.len();
        let texture_offset = self.textures.append(other.textures);

        let shift_node = |id: NodeId| NodeId(id.0 + node_offset);
        let shift_material = |id: MaterialId| MaterialId(id.0 + material_offset);

        self.materials
            .extend(other.materials.into_iter().map(|mut material| {
                material.color_map = material
                    .color_map
                    .map(|TextureId(idx)| TextureId(idx + texture_offset));
                material
            }));
        self.dirty_materials
            .extend(other.dirty_materials.into_iter().map(shift_material));
        self.nodes.extend(other.nodes.into_iter().map(|mut node| {
            node.parent = node.parent.map(shift_node);
            node.children = node.children.into_iter().map(shift_node).collect();
            node.material = node.material.map(shift_material);
            node
        }));
        let roots: Vec<NodeId> = other.roots.into_iter().map(shift_node).collect();
        self.roots.extend(roots.iter().copied());
        roots
    }
}

/// Iterator over a node and its ancestors, see [`SceneGraph::ancestors`].
pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.graph.node(current).and_then(SceneNode::parent);
        Some(current)
    }
}
