use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;

use crate::assets::{Appearance, AppearanceId, Shape, ShapeId};
use crate::error::{SceneError, SceneResult};
use crate::scene_graph::light::Light;
use crate::scene_graph::node::{Node, NodeId};
use crate::scene_graph::renderable::Renderable;

/// A tree of nodes rooted at an implicit "Scene" node, plus the shapes and
/// appearances their renderables share.
///
/// Nodes are created detached and only take part in traversal once they are
/// reachable from [`Scene::root`]. World matrices are cached per node and
/// invalidated top-down whenever a node's local transform or parent changes.
pub struct Scene {
    nodes: Arena<Node>,
    shapes: Arena<Shape>,
    appearances: Arena<Appearance>,
    root: NodeId,
}

impl Scene {
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::new("Scene"));

        Self {
            nodes,
            shapes: Arena::new(),
            appearances: Arena::new(),
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Adds a detached node.
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        node.parent_id = None;
        node.child_ids.clear();
        node.disposed = false;
        node.transform.invalidate_local();
        self.nodes.alloc(node)
    }

    /// Adds a node and attaches it under `parent` in one step.
    pub fn spawn(&mut self, parent: NodeId, node: Node) -> SceneResult<NodeId> {
        self.node_ref(parent)?;
        let id = self.add_node(node);
        self.attach(parent, id)?;
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).filter(|node| !node.disposed)
    }

    fn node_ref(&self, id: NodeId) -> SceneResult<&Node> {
        self.node(id).ok_or(SceneError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        self.nodes
            .get_mut(id)
            .filter(|node| !node.disposed)
            .ok_or(SceneError::UnknownNode(id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| !node.disposed && node.name == name)
            .map(|(id, _)| id)
    }

    /// True when `ancestor` is `node` itself or appears on its parent chain.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|node| node.parent_id);
        }
        false
    }

    /// True when the node is reachable from the root.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.node(id).is_some() && self.is_ancestor_or_self(self.root, id)
    }

    /// Appends `child` to `parent`'s children, moving it away from any
    /// previous parent. Fails without touching the graph if `child` is
    /// `parent` or one of its ancestors.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.node_ref(parent)?;
        self.node_ref(child)?;

        if child == self.root {
            return Err(SceneError::RootNode("attached under another node"));
        }

        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }

        self.unlink_from_parent(child);

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.child_ids.push(child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent_id = Some(parent);
        }

        self.invalidate_hierarchy(child);
        Ok(())
    }

    /// Removes the node from its parent's children. The node and its subtree
    /// stay valid with unchanged local transforms. Returns whether the node
    /// had a parent.
    pub fn detach(&mut self, id: NodeId) -> SceneResult<bool> {
        self.node_ref(id)?;
        let was_attached = self.unlink_from_parent(id);
        if was_attached {
            self.invalidate_hierarchy(id);
        }
        Ok(was_attached)
    }

    fn unlink_from_parent(&mut self, id: NodeId) -> bool {
        let Some(old_parent_id) = self.nodes.get_mut(id).and_then(|node| node.parent_id.take())
        else {
            return false;
        };

        if let Some(old_parent) = self.nodes.get_mut(old_parent_id) {
            if let Some(index) = old_parent.child_ids.iter().position(|&c| c == id) {
                old_parent.child_ids.remove(index);
            }
        }

        true
    }

    /// Invalidates world transforms for a node and all its descendants
    pub fn invalidate_hierarchy(&self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                node.transform.invalidate_world();
                stack.extend(node.child_ids.iter().copied());
            }
        }
    }

    /// World matrix of a node: its local matrix composed with every ancestor's
    /// up to the top of its (sub)tree. Clean cached matrices on the way are
    /// reused; recomputed ones are cached.
    pub fn world_matrix(&self, id: NodeId) -> SceneResult<Mat4> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        let mut parent_world = Mat4::IDENTITY;

        while let Some(current_id) = current {
            let node = self.node_ref(current_id)?;
            if !node.transform.is_world_dirty() {
                parent_world = node.transform.cached_world_matrix();
                break;
            }
            chain.push(node);
            current = node.parent_id;
        }

        for node in chain.into_iter().rev() {
            parent_world = parent_world * node.transform.local_matrix();
            node.transform.set_world_matrix(parent_world);
        }

        Ok(parent_world)
    }

    pub fn world_position(&self, id: NodeId) -> SceneResult<Vec3> {
        Ok(self.world_matrix(id)?.w_axis.truncate())
    }

    /// Refreshes every dirty world matrix of the live graph, top-down.
    pub fn update_world_transforms(&self) {
        let mut stack = vec![(self.root, Mat4::IDENTITY)];

        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };

            if node.transform.is_world_dirty() {
                node.transform
                    .set_world_matrix(parent_world * node.transform.local_matrix());
            }

            let world = node.transform.cached_world_matrix();
            for &child_id in node.child_ids.iter().rev() {
                stack.push((child_id, world));
            }
        }
    }

    /// Live nodes in depth-first pre-order, children in insertion order.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        self.subtree(self.root)
    }

    /// The node and its descendants in depth-first pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];

        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.child_ids.iter().rev().copied());
        }

        order
    }

    /// Detaches the node and tombstones it with its whole subtree. Returns the
    /// number of disposed nodes.
    pub fn dispose_subtree(&mut self, id: NodeId) -> SceneResult<usize> {
        if id == self.root {
            return Err(SceneError::RootNode("disposed"));
        }

        self.node_ref(id)?;
        self.unlink_from_parent(id);

        let subtree = self.subtree(id);
        for &node_id in &subtree {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.disposed = true;
                node.renderable = None;
                node.light = None;
                node.child_ids.clear();
                node.parent_id = None;
            }
        }

        log::debug!("Disposed {} node(s)", subtree.len());
        Ok(subtree.len())
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> SceneResult<()> {
        self.node_mut(id)?.transform.set_translation(position);
        self.invalidate_hierarchy(id);
        Ok(())
    }

    pub fn translate(&mut self, id: NodeId, delta: Vec3) -> SceneResult<()> {
        self.node_mut(id)?.transform.translate(delta);
        self.invalidate_hierarchy(id);
        Ok(())
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) -> SceneResult<()> {
        self.node_mut(id)?.transform.set_rotation(rotation);
        self.invalidate_hierarchy(id);
        Ok(())
    }

    /// Euler angles in radians, XYZ order.
    pub fn set_rotation_euler(&mut self, id: NodeId, x: f32, y: f32, z: f32) -> SceneResult<()> {
        self.node_mut(id)?.transform.set_rotation_euler(x, y, z);
        self.invalidate_hierarchy(id);
        Ok(())
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec3) -> SceneResult<()> {
        self.node_mut(id)?.transform.set_scale(scale);
        self.invalidate_hierarchy(id);
        Ok(())
    }

    pub fn set_uniform_scale(&mut self, id: NodeId, scale: f32) -> SceneResult<()> {
        self.set_scale(id, Vec3::splat(scale))
    }

    pub fn set_transform(
        &mut self,
        id: NodeId,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> SceneResult<()> {
        self.node_mut(id)?
            .transform
            .set_transform(translation, rotation, scale);
        self.invalidate_hierarchy(id);
        Ok(())
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> SceneResult<()> {
        self.node_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> SceneResult<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    /// Rotates the node in place so its -Z axis points at `target`, computed
    /// from its current world position. Has to be re-issued after the node
    /// or the target moves.
    pub fn look_at(&mut self, id: NodeId, target: Vec3) -> SceneResult<()> {
        let eye = self.world_position(id)?;
        let forward = target - eye;
        if forward.length_squared() <= f32::EPSILON {
            return Ok(());
        }

        let up = if forward.normalize().cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };

        let world_rotation = Quat::from_mat4(&Mat4::look_at_rh(eye, target, up).inverse());

        let parent_rotation = match self.node_ref(id)?.parent_id {
            Some(parent_id) => {
                let (_, rotation, _) = self.world_matrix(parent_id)?.to_scale_rotation_translation();
                rotation
            }
            None => Quat::IDENTITY,
        };

        self.set_rotation(id, parent_rotation.inverse() * world_rotation)
    }

    pub fn set_renderable(&mut self, id: NodeId, renderable: Option<Renderable>) -> SceneResult<()> {
        if let Some(renderable) = renderable {
            self.shape(renderable.shape)
                .ok_or(SceneError::UnknownResource("shape"))?;
            self.appearance(renderable.appearance)
                .ok_or(SceneError::UnknownResource("appearance"))?;
        }

        self.node_mut(id)?.renderable = renderable;
        Ok(())
    }

    /// Swaps the shape of an existing renderable, keeping its appearance.
    pub fn set_shape(&mut self, id: NodeId, shape: ShapeId) -> SceneResult<()> {
        self.shape(shape).ok_or(SceneError::UnknownResource("shape"))?;
        let node = self.node_mut(id)?;
        match node.renderable.as_mut() {
            Some(renderable) => {
                renderable.shape = shape;
                Ok(())
            }
            None => Err(SceneError::UnknownResource("renderable")),
        }
    }

    pub fn set_light(&mut self, id: NodeId, light: Option<Light>) -> SceneResult<()> {
        self.node_mut(id)?.light = light;
        Ok(())
    }

    pub fn light_mut(&mut self, id: NodeId) -> Option<&mut Light> {
        self.node_mut(id).ok().and_then(|node| node.light.as_mut())
    }

    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        self.shapes.alloc(shape)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id).filter(|shape| !shape.is_released())
    }

    /// Shapes that still hold vertex data.
    pub fn shape_count(&self) -> usize {
        self.shapes.iter().filter(|(_, shape)| !shape.is_released()).count()
    }

    pub fn add_appearance(&mut self, appearance: Appearance) -> AppearanceId {
        self.appearances.alloc(appearance)
    }

    pub fn appearance(&self, id: AppearanceId) -> Option<&Appearance> {
        self.appearances
            .get(id)
            .filter(|appearance| !appearance.disposed)
    }

    pub fn appearance_mut(&mut self, id: AppearanceId) -> Option<&mut Appearance> {
        self.appearances
            .get_mut(id)
            .filter(|appearance| !appearance.disposed)
    }

    fn live_renderables(&self) -> impl Iterator<Item = Renderable> + '_ {
        self.live_nodes()
            .into_iter()
            .filter_map(|id| self.node(id).and_then(|node| node.renderable))
    }

    /// Releases a shape's vertex data. Refused while a live renderable uses it.
    pub fn dispose_shape(&mut self, id: ShapeId) -> SceneResult<()> {
        self.shape(id).ok_or(SceneError::UnknownResource("shape"))?;

        let count = self
            .live_renderables()
            .filter(|renderable| renderable.shape == id)
            .count();
        if count > 0 {
            return Err(SceneError::ResourceInUse {
                kind: "shape",
                count,
            });
        }

        if let Some(shape) = self.shapes.get_mut(id) {
            shape.release();
        }
        Ok(())
    }

    /// Disposes an appearance. Refused while a live renderable uses it.
    pub fn dispose_appearance(&mut self, id: AppearanceId) -> SceneResult<()> {
        self.appearance(id)
            .ok_or(SceneError::UnknownResource("appearance"))?;

        let count = self
            .live_renderables()
            .filter(|renderable| renderable.appearance == id)
            .count();
        if count > 0 {
            return Err(SceneError::ResourceInUse {
                kind: "appearance",
                count,
            });
        }

        if let Some(appearance) = self.appearances.get_mut(id) {
            appearance.disposed = true;
        }
        Ok(())
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
