use std::f32::consts::PI;

use glam::Vec3;

use crate::assets::{shapes, Appearance, Color};
use crate::controls::OrbitControls;
use crate::debug_panel::DebugPanel;
use crate::lessons::{orbit, setup_camera, spawn_mesh, LessonRun};
use crate::scene_graph::{Light, LightKind, Node, NodeId};
use crate::stage::Stage;

fn intensity(stage: &Stage, light: NodeId) -> f32 {
    stage
        .scene
        .node(light)
        .and_then(|node| node.light())
        .map_or(0.0, |light| light.intensity)
}

fn set_intensity(stage: &mut Stage, light: NodeId, value: f32) -> anyhow::Result<()> {
    let light = stage
        .scene
        .light_mut(light)
        .ok_or_else(|| anyhow::anyhow!("Node has no light"))?;
    light.intensity = value;
    Ok(())
}

/// One of each light type over a few standard-shaded shapes.
pub fn build(stage: &mut Stage, mut panel: DebugPanel) -> anyhow::Result<LessonRun> {
    let root = stage.scene.root();

    let ambient = stage.scene.spawn(
        root,
        Node::new("Ambient light").with_light(Light::ambient(Color::WHITE, 1.0)),
    )?;
    let directional = stage.scene.spawn(
        root,
        Node::new("Directional light")
            .with_position(Vec3::new(1.0, 0.25, 0.0))
            .with_light(Light::directional(Color::from_hex(0x00fffc), 0.9)),
    )?;
    stage.scene.spawn(
        root,
        Node::new("Hemisphere light").with_light(Light::hemisphere(
            Color::from_hex(0xff0000),
            Color::from_hex(0x0000ff),
            0.9,
        )),
    )?;
    stage.scene.spawn(
        root,
        Node::new("Point light")
            .with_position(Vec3::new(1.0, -0.5, 1.0))
            .with_light(Light::point(Color::from_hex(0xff9000), 1.5, 10.0, 2.0)),
    )?;
    stage.scene.spawn(
        root,
        Node::new("Rect area light")
            .with_position(Vec3::new(-1.5, 0.0, 1.5))
            .with_light(Light::rect_area(Color::from_hex(0x4e00ff), 6.0, 1.0, 1.0)),
    )?;

    let mut spot_light = Light::spot(Color::from_hex(0x78ff00), 4.5, 10.0, PI * 0.1, 0.25);
    if let LightKind::Spot { decay, .. } = &mut spot_light.kind {
        *decay = 1.0;
    }
    let spot = stage.scene.spawn(
        root,
        Node::new("Spot light")
            .with_position(Vec3::new(0.0, 2.0, 3.0))
            .with_light(spot_light),
    )?;

    let appearance = stage.scene.add_appearance(
        Appearance::standard(Color::WHITE)
            .named("Shared")
            .with_roughness_metalness(0.4, 0.0),
    );
    let sphere_shape = stage.scene.add_shape(shapes::sphere(0.5, 32, 32)?);
    let cube_shape = stage.scene.add_shape(shapes::cube(0.75)?);
    let torus_shape = stage.scene.add_shape(shapes::torus(0.3, 0.2, 32, 64)?);
    let plane_shape = stage.scene.add_shape(shapes::plane(5.0, 5.0, 1, 1)?);

    let sphere = spawn_mesh(stage, root, "Sphere", sphere_shape, appearance)?;
    stage.scene.set_position(sphere, Vec3::new(-1.5, 0.0, 0.0))?;
    let cube = spawn_mesh(stage, root, "Cube", cube_shape, appearance)?;
    let torus = spawn_mesh(stage, root, "Torus", torus_shape, appearance)?;
    stage.scene.set_position(torus, Vec3::new(1.5, 0.0, 0.0))?;
    let plane = spawn_mesh(stage, root, "Plane", plane_shape, appearance)?;
    stage.scene.set_position(plane, Vec3::new(0.0, -0.65, 0.0))?;
    stage.scene.set_rotation_euler(plane, -PI * 0.5, 0.0, 0.0)?;

    setup_camera(stage, Vec3::new(1.0, 1.0, 2.0))?;

    for (label, light) in [
        ("ambient intensity", ambient),
        ("directional intensity", directional),
    ] {
        panel.slider(
            label,
            0.0,
            3.0,
            0.001,
            move |stage| intensity(stage, light),
            move |stage, value| set_intensity(stage, light, value),
        );
    }
    panel.toggle(
        "spot visible",
        move |stage| stage.scene.node(spot).is_some_and(|node| node.visible()),
        move |stage, visible| Ok(stage.scene.set_visible(spot, visible)?),
    );

    let mut controls = orbit(OrbitControls::damped());
    Ok(LessonRun::new(panel, move |tick| {
        let elapsed = tick.elapsed() as f32;
        for node in [sphere, cube, torus] {
            tick.stage
                .scene
                .set_rotation_euler(node, 0.15 * elapsed, 0.1 * elapsed, 0.0)?;
        }
        controls(tick)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::render::DrawList;

    #[test]
    fn test_every_light_reaches_the_draw_list() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        let mut run = build(&mut stage, DebugPanel::new("Lights")).unwrap();

        let list = DrawList::prepare(&stage).unwrap();
        assert_eq!(list.lights.len(), 6);
        assert_eq!(list.items.len(), 4);

        let rect_area = list
            .lights
            .iter()
            .find(|light| matches!(light.kind, LightKind::RectArea { .. }))
            .unwrap();
        assert!(rect_area.direction.distance(Vec3::new(1.0, 0.0, -1.0).normalize()) < 1e-5);

        let directional = list
            .lights
            .iter()
            .find(|light| matches!(light.kind, LightKind::Directional { .. }))
            .unwrap();
        assert!(directional.direction.distance(Vec3::new(-1.0, -0.25, 0.0).normalize()) < 1e-5);

        assert!(run.panel.set_toggle(&mut stage, "spot visible", false));
        assert!(run.panel.set_value(&mut stage, "ambient intensity", 0.5));
        assert!(run.panel.set_value(&mut stage, "directional intensity", 8.0));
        let list = DrawList::prepare(&stage).unwrap();
        assert_eq!(list.lights.len(), 5);
        let ambient = list
            .lights
            .iter()
            .find(|light| matches!(light.kind, LightKind::Ambient))
            .unwrap();
        assert_eq!(ambient.intensity, 0.5);
        let directional = list
            .lights
            .iter()
            .find(|light| matches!(light.kind, LightKind::Directional { .. }))
            .unwrap();
        assert_eq!(directional.intensity, 3.0);
    }
}
