use std::f32::consts::PI;

use glam::Vec3;

use crate::assets::{shapes, Appearance, AppearanceId, Color};
use crate::controls::OrbitControls;
use crate::debug_panel::DebugPanel;
use crate::lessons::{orbit, setup_camera, spawn_mesh, LessonRun};
use crate::scene_graph::{Light, Node, NodeId};
use crate::stage::Stage;

fn light_intensity(stage: &Stage, light: NodeId) -> f32 {
    stage
        .scene
        .node(light)
        .and_then(|node| node.light())
        .map_or(0.0, |light| light.intensity)
}

fn set_light_intensity(stage: &mut Stage, light: NodeId, value: f32) -> anyhow::Result<()> {
    stage
        .scene
        .light_mut(light)
        .ok_or_else(|| anyhow::anyhow!("Node has no light"))?
        .intensity = value;
    Ok(())
}

fn position_axis(stage: &Stage, node: NodeId, axis: usize) -> f32 {
    stage
        .scene
        .node(node)
        .map_or(0.0, |node| node.transform().translation()[axis])
}

fn set_position_axis(stage: &mut Stage, node: NodeId, axis: usize, value: f32) -> anyhow::Result<()> {
    let mut position = stage
        .scene
        .node(node)
        .ok_or_else(|| anyhow::anyhow!("Light node was disposed"))?
        .transform()
        .translation();
    position[axis] = value;
    Ok(stage.scene.set_position(node, position)?)
}

fn material_slider(
    panel: &mut DebugPanel,
    label: &str,
    appearance: AppearanceId,
    get: fn(&Appearance) -> f32,
    set: fn(&mut Appearance, f32),
) {
    panel.slider(
        label,
        0.0,
        1.0,
        0.001,
        move |stage| stage.scene.appearance(appearance).map_or(0.0, get),
        move |stage, value| {
            let appearance = stage
                .scene
                .appearance_mut(appearance)
                .ok_or_else(|| anyhow::anyhow!("Appearance was disposed"))?;
            set(appearance, value);
            Ok(())
        },
    );
}

/// A sphere on a plane under ambient, directional and spot lights. Drop
/// shadows are not rendered, only the core shading they would sit on.
pub fn build(stage: &mut Stage, mut panel: DebugPanel) -> anyhow::Result<LessonRun> {
    let root = stage.scene.root();

    let ambient = stage.scene.spawn(
        root,
        Node::new("Ambient light").with_light(Light::ambient(Color::WHITE, 1.0)),
    )?;
    let directional = stage.scene.spawn(
        root,
        Node::new("Directional light")
            .with_position(Vec3::new(2.0, 2.0, -1.0))
            .with_light(Light::directional(Color::WHITE, 1.5)),
    )?;
    stage.scene.spawn(
        root,
        Node::new("Spot light")
            .with_position(Vec3::new(0.0, 2.0, 2.0))
            .with_light(Light::spot(Color::WHITE, 3.6, 10.0, PI * 0.3, 0.0)),
    )?;

    let appearance = stage.scene.add_appearance(
        Appearance::standard(Color::WHITE)
            .named("Shared")
            .with_roughness_metalness(0.7, 0.0),
    );
    let sphere_shape = stage.scene.add_shape(shapes::sphere(0.5, 32, 32)?);
    let plane_shape = stage.scene.add_shape(shapes::plane(5.0, 5.0, 1, 1)?);

    spawn_mesh(stage, root, "Sphere", sphere_shape, appearance)?;
    let plane = spawn_mesh(stage, root, "Plane", plane_shape, appearance)?;
    stage.scene.set_rotation_euler(plane, -PI * 0.5, 0.0, 0.0)?;
    stage.scene.set_position(plane, Vec3::new(0.0, -0.5, 0.0))?;

    setup_camera(stage, Vec3::new(1.0, 1.0, 2.0))?;

    for (label, light) in [("ambient intensity", ambient), ("directional intensity", directional)] {
        panel.slider(
            label,
            0.0,
            3.0,
            0.001,
            move |stage| light_intensity(stage, light),
            move |stage, value| set_light_intensity(stage, light, value),
        );
    }
    for (label, axis) in [("directional x", 0), ("directional y", 1), ("directional z", 2)] {
        panel.slider(
            label,
            -5.0,
            5.0,
            0.001,
            move |stage| position_axis(stage, directional, axis),
            move |stage, value| set_position_axis(stage, directional, axis, value),
        );
    }
    material_slider(&mut panel, "metalness", appearance, |a| a.metalness, |a, v| a.metalness = v);
    material_slider(&mut panel, "roughness", appearance, |a| a.roughness, |a, v| a.roughness = v);

    Ok(LessonRun::new(panel, orbit(OrbitControls::damped())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::render::DrawList;
    use crate::scene_graph::LightKind;

    #[test]
    fn test_directional_light_follows_position_sliders() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        let mut run = build(&mut stage, DebugPanel::new("Shadows")).unwrap();

        let list = DrawList::prepare(&stage).unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.lights.len(), 3);

        assert!(run.panel.set_value(&mut stage, "directional x", -2.0));
        assert!(run.panel.set_value(&mut stage, "directional z", 9.0));
        let list = DrawList::prepare(&stage).unwrap();
        let directional = list
            .lights
            .iter()
            .find(|light| matches!(light.kind, LightKind::Directional { .. }))
            .unwrap();
        assert!(directional.position.distance(Vec3::new(-2.0, 2.0, 5.0)) < 1e-4);
        assert!(directional.direction.distance(Vec3::new(2.0, -2.0, -5.0).normalize()) < 1e-4);
    }

    #[test]
    fn test_material_sliders_share_one_appearance() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        let mut run = build(&mut stage, DebugPanel::new("Shadows")).unwrap();

        assert!((run.panel.value(&stage, "roughness").unwrap() - 0.7).abs() < 1e-6);
        assert!(run.panel.set_value(&mut stage, "metalness", 0.5));

        let list = DrawList::prepare(&stage).unwrap();
        assert_eq!(list.items[0].appearance, list.items[1].appearance);
        let appearance = stage.scene.appearance(list.items[0].appearance).unwrap();
        assert!((appearance.metalness - 0.5).abs() < 1e-4);
    }
}
