use std::cmp::Ordering;

use glam::{Mat3, Mat4, Vec3};

use crate::assets::{AppearanceId, ShapeId, TextureId, TextureMaps, TextureStore};
use crate::error::SceneResult;
use crate::math::frustum::Frustum;
use crate::scene_graph::{Light, LightKind, NodeId, Scene};
use crate::stage::Stage;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub shape: ShapeId,
    pub appearance: AppearanceId,
    pub world: Mat4,
    pub normal_matrix: Mat3,
    /// Maps whose texture is ready; pending or failed ones are `None`.
    pub maps: TextureMaps,
    pub blended: bool,
    /// Distance in front of the camera along its view axis.
    pub view_depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawLight {
    pub node: NodeId,
    pub kind: LightKind,
    /// Linear RGB.
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    /// Unit vector the light shines along; up for hemisphere lights.
    pub direction: Vec3,
}

/// Renderer-independent snapshot of what a frame shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    /// Opaque items in traversal order, then blended items back to front.
    pub items: Vec<DrawItem>,
    pub lights: Vec<DrawLight>,
    pub culled: usize,
    /// Renderables whose shape or appearance has been disposed.
    pub skipped: usize,
    /// Maps that fell back because their texture is not ready yet.
    pub fallback_maps: usize,
}

impl DrawList {
    pub fn prepare(stage: &Stage) -> SceneResult<DrawList> {
        let scene = &stage.scene;
        scene.update_world_transforms();

        let view = stage.camera.view_matrix(scene)?;
        let projection = stage.camera.projection_matrix();
        let frustum = Frustum::from_view_projection(projection * view);

        let mut list = DrawList {
            view,
            projection,
            camera_position: stage.camera.position(scene)?,
            ..Default::default()
        };
        let mut blended = Vec::new();

        for id in visible_nodes(scene) {
            let Some(node) = scene.node(id) else {
                continue;
            };
            let world = node.transform().cached_world_matrix();

            if let Some(light) = node.light() {
                list.lights.push(resolve_light(id, light, world));
            }

            let Some(renderable) = node.renderable() else {
                continue;
            };

            let (Some(shape), Some(appearance)) = (
                scene.shape(renderable.shape),
                scene.appearance(renderable.appearance),
            ) else {
                log::warn!("Skipping {:?} ({}): shape or appearance was disposed", id, node.name);
                list.skipped += 1;
                continue;
            };

            let mut bounds = shape.bounds().transform(&world);
            if appearance.maps.displacement.is_some() {
                bounds.radius += appearance.displacement_scale.abs() + appearance.displacement_bias.abs();
            }
            if !bounds.intersects_frustum(&frustum) {
                list.culled += 1;
                continue;
            }

            let (maps, missing) = resolve_maps(&appearance.maps, &stage.textures);
            list.fallback_maps += missing;

            let item = DrawItem {
                node: id,
                shape: renderable.shape,
                appearance: renderable.appearance,
                world,
                normal_matrix: Mat3::from_mat4(world).inverse().transpose(),
                maps,
                blended: appearance.is_blended(),
                view_depth: -view.transform_point3(bounds.center).z,
            };

            if item.blended {
                blended.push(item);
            } else {
                list.items.push(item);
            }
        }

        blended.sort_by(|a, b| {
            b.view_depth
                .partial_cmp(&a.view_depth)
                .unwrap_or(Ordering::Equal)
        });
        list.items.extend(blended);

        Ok(list)
    }

    pub fn opaque(&self) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(|item| !item.blended)
    }

    pub fn blended(&self) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(|item| item.blended)
    }
}

/// Pre-order walk of the live graph that skips hidden subtrees.
fn visible_nodes(scene: &Scene) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack = vec![scene.root()];

    while let Some(id) = stack.pop() {
        let Some(node) = scene.node(id) else {
            continue;
        };
        if !node.visible() {
            continue;
        }

        result.push(id);
        stack.extend(node.child_ids().iter().rev());
    }

    result
}

fn resolve_light(node: NodeId, light: &Light, world: Mat4) -> DrawLight {
    let kind = light.kind;
    let position = world.w_axis.truncate();
    let towards = |target: Vec3| (target - position).try_normalize().unwrap_or(Vec3::NEG_Y);

    let direction = match kind {
        LightKind::Directional { target }
        | LightKind::Spot { target, .. }
        | LightKind::RectArea { target, .. } => towards(target),
        LightKind::Hemisphere { .. } => position.try_normalize().unwrap_or(Vec3::Y),
        LightKind::Ambient | LightKind::Point { .. } => Vec3::ZERO,
    };

    DrawLight {
        node,
        kind,
        color: light.color.to_linear(),
        intensity: light.intensity,
        position,
        direction,
    }
}

fn resolve_maps(maps: &TextureMaps, textures: &TextureStore) -> (TextureMaps, usize) {
    let mut missing = 0;
    let mut ready = |map: Option<TextureId>| -> Option<TextureId> {
        let id = map?;
        match textures.get(id).and_then(|texture| texture.image()) {
            Some(_) => Some(id),
            None => {
                missing += 1;
                None
            }
        }
    };

    let resolved = TextureMaps {
        color: ready(maps.color),
        alpha: ready(maps.alpha),
        ambient_occlusion: ready(maps.ambient_occlusion),
        roughness: ready(maps.roughness),
        metalness: ready(maps.metalness),
        normal: ready(maps.normal),
        displacement: ready(maps.displacement),
    };

    (resolved, missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{shapes, Appearance, Color, TextureImage, TextureState};
    use crate::config::HarnessConfig;
    use crate::scene_graph::{Node, Renderable};

    fn create_stage() -> Stage {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        stage
            .camera
            .set_position(&mut stage.scene, Vec3::new(0.0, 0.0, 5.0))
            .unwrap();
        stage
    }

    fn add_cube(stage: &mut Stage, position: Vec3, appearance: Appearance) -> NodeId {
        let shape = stage.scene.add_shape(shapes::cube(1.0).unwrap());
        let appearance = stage.scene.add_appearance(appearance);
        let root = stage.scene.root();
        stage
            .scene
            .spawn(
                root,
                Node::new("cube")
                    .with_position(position)
                    .with_renderable(Renderable::new(shape, appearance)),
            )
            .unwrap()
    }

    #[test]
    fn test_items_follow_traversal_and_hidden_subtrees_drop() {
        let mut stage = create_stage();
        let a = add_cube(&mut stage, Vec3::new(-1.0, 0.0, 0.0), Appearance::default());
        let b = add_cube(&mut stage, Vec3::new(1.0, 0.0, 0.0), Appearance::default());

        let list = DrawList::prepare(&stage).unwrap();
        let nodes: Vec<_> = list.items.iter().map(|item| item.node).collect();
        assert_eq!(nodes, vec![a, b]);

        stage.scene.set_visible(a, false).unwrap();
        let list = DrawList::prepare(&stage).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].node, b);
    }

    #[test]
    fn test_objects_behind_camera_are_culled() {
        let mut stage = create_stage();
        add_cube(&mut stage, Vec3::new(0.0, 0.0, 20.0), Appearance::default());
        add_cube(&mut stage, Vec3::ZERO, Appearance::default());

        let list = DrawList::prepare(&stage).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.culled, 1);
    }

    #[test]
    fn test_blended_items_sorted_back_to_front_after_opaque() {
        let mut stage = create_stage();
        let near = add_cube(
            &mut stage,
            Vec3::new(0.0, 0.0, 2.0),
            Appearance::basic(Color::WHITE).with_opacity(0.5),
        );
        let opaque = add_cube(&mut stage, Vec3::ZERO, Appearance::default());
        let far = add_cube(
            &mut stage,
            Vec3::new(0.0, 0.0, -3.0),
            Appearance::basic(Color::WHITE).with_opacity(0.5),
        );

        let list = DrawList::prepare(&stage).unwrap();
        let nodes: Vec<_> = list.items.iter().map(|item| item.node).collect();
        assert_eq!(nodes, vec![opaque, far, near]);
        assert_eq!(list.opaque().count(), 1);
        assert_eq!(list.blended().count(), 2);
    }

    #[test]
    fn test_pending_texture_falls_back_then_resolves() {
        let mut stage = create_stage();
        let texture = stage.textures.insert_pending("door");
        let node = add_cube(
            &mut stage,
            Vec3::ZERO,
            Appearance::basic(Color::WHITE).with_color_map(texture),
        );

        let list = DrawList::prepare(&stage).unwrap();
        assert_eq!(list.items[0].maps.color, None);
        assert_eq!(list.fallback_maps, 1);

        stage
            .textures
            .complete(texture, Ok(TextureImage::solid(Color::from_hex(0x808080))));
        assert!(matches!(
            stage.textures.get(texture).unwrap().state(),
            TextureState::Ready(_)
        ));

        let list = DrawList::prepare(&stage).unwrap();
        assert_eq!(list.items[0].node, node);
        assert_eq!(list.items[0].maps.color, Some(texture));
        assert_eq!(list.fallback_maps, 0);
    }

    #[test]
    fn test_lights_resolve_world_position_and_direction() {
        let mut stage = create_stage();
        let root = stage.scene.root();
        let group = stage
            .scene
            .spawn(root, Node::new("group").with_position(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
        let mut light = Light::directional(Color::WHITE, 1.0);
        light.set_target(Vec3::new(0.0, 1.0, 0.0));
        stage
            .scene
            .spawn(
                group,
                Node::new("sun")
                    .with_position(Vec3::new(0.0, 2.0, 0.0))
                    .with_light(light),
            )
            .unwrap();

        let list = DrawList::prepare(&stage).unwrap();
        assert_eq!(list.lights.len(), 1);
        let sun = list.lights[0];
        assert!(sun.position.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-5));
        assert!(sun.direction.abs_diff_eq(Vec3::NEG_Y, 1e-5));
    }

    #[test]
    fn test_disposed_resources_are_skipped() {
        let mut stage = create_stage();
        let node = add_cube(&mut stage, Vec3::ZERO, Appearance::default());
        let appearance = stage.scene.node(node).unwrap().renderable().unwrap().appearance;
        stage.scene.detach(node).unwrap();
        stage.scene.dispose_appearance(appearance).unwrap();
        let root = stage.scene.root();
        stage.scene.attach(root, node).unwrap();

        let list = DrawList::prepare(&stage).unwrap();
        assert!(list.items.is_empty());
        assert_eq!(list.skipped, 1);
    }
}
