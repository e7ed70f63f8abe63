use glam::Vec3;

use crate::assets::{shapes, Appearance, Color};
use crate::debug_panel::DebugPanel;
use crate::lessons::{setup_camera, spawn_mesh, LessonRun};
use crate::scene_graph::Node;
use crate::stage::Stage;

/// Three cubes inside a group that is moved, stretched and turned as one.
pub fn build(stage: &mut Stage, mut panel: DebugPanel) -> anyhow::Result<LessonRun> {
    let root = stage.scene.root();
    let group = stage.scene.spawn(root, Node::new("Group"))?;
    stage.scene.set_transform(
        group,
        Vec3::new(0.0, 1.0, 0.0),
        glam::Quat::from_rotation_y(1.0),
        Vec3::new(1.0, 2.0, 1.0),
    )?;

    let cube = stage.scene.add_shape(shapes::cube(1.0)?);
    let cubes = [
        ("Red cube", 0xff0000, 0.0),
        ("Green cube", 0x00ff00, -2.0),
        ("Blue cube", 0x0000ff, 2.0),
    ];
    for (name, color, x) in cubes {
        let appearance = stage
            .scene
            .add_appearance(Appearance::basic(Color::from_hex(color)).named(name));
        let node = spawn_mesh(stage, group, name, cube, appearance)?;
        stage.scene.set_position(node, Vec3::new(x, 0.0, 0.0))?;
    }

    setup_camera(stage, Vec3::new(0.0, 0.0, 3.0))?;

    panel.slider(
        "group rotation",
        -std::f32::consts::PI,
        std::f32::consts::PI,
        0.01,
        move |stage| {
            stage
                .scene
                .node(group)
                .map_or(0.0, |node| node.transform().rotation_euler().y)
        },
        move |stage, angle| Ok(stage.scene.set_rotation_euler(group, 0.0, angle, 0.0)?),
    );

    Ok(LessonRun::still(panel))
}
