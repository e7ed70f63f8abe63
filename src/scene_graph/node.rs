use glam::Vec3;
use id_arena::Id;

use crate::scene_graph::light::Light;
use crate::scene_graph::renderable::Renderable;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Transform;

pub type NodeId = Id<Node>;

pub struct Node {
    pub name: String,
    pub(crate) transform: Transform,
    pub(crate) visible: bool,
    pub(crate) renderable: Option<Renderable>,
    pub(crate) light: Option<Light>,
    pub(crate) parent_id: Option<NodeId>,
    pub(crate) child_ids: Vec<NodeId>,
    pub(crate) disposed: bool,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.set_translation(position);
        self
    }

    pub fn with_renderable(mut self, renderable: Renderable) -> Self {
        self.renderable = Some(renderable);
        self
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.light = Some(light);
        self
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn renderable(&self) -> Option<&Renderable> {
        self.renderable.as_ref()
    }

    pub fn light(&self) -> Option<&Light> {
        self.light.as_ref()
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    pub fn child_ids(&self) -> &[NodeId] {
        &self.child_ids
    }

    pub fn parent<'a>(&self, scene: &'a Scene) -> Option<&'a Node> {
        self.parent_id.and_then(|id| scene.node(id))
    }

    pub fn children<'a, 'b>(&'a self, scene: &'b Scene) -> impl Iterator<Item = &'b Node> + 'b
    where
        'a: 'b,
    {
        self.child_ids.iter().filter_map(move |id| scene.node(*id))
    }
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            visible: true,
            renderable: None,
            light: None,
            parent_id: None,
            child_ids: Vec::new(),
            disposed: false,
        }
    }
}
