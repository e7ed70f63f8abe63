use glam::Vec3;
use rand::Rng;

use crate::assets::{shapes, Appearance, Color, Shape};
use crate::controls::OrbitControls;
use crate::debug_panel::DebugPanel;
use crate::error::SceneResult;
use crate::lessons::{orbit, setup_camera, spawn_mesh, LessonRun};
use crate::stage::Stage;

const TRIANGLE_COUNT: usize = 50;

/// `count` triangles with corners scattered through a 4 unit cube.
fn random_triangles(count: usize) -> SceneResult<Shape> {
    let mut rng = rand::thread_rng();
    let positions: Vec<Vec3> = (0..count * 3)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
            )
        })
        .collect();

    shapes::triangle_soup(&positions)
}

pub fn build(stage: &mut Stage, mut panel: DebugPanel) -> anyhow::Result<LessonRun> {
    let root = stage.scene.root();
    let shape = stage.scene.add_shape(random_triangles(TRIANGLE_COUNT)?);
    let appearance = stage.scene.add_appearance(
        Appearance::basic(Color::from_hex(0xff0000))
            .named("Triangles")
            .with_wireframe(true),
    );
    let mesh = spawn_mesh(stage, root, "Triangles", shape, appearance)?;

    setup_camera(stage, Vec3::new(0.0, 0.0, 3.0))?;

    panel
        .toggle(
            "wireframe",
            move |stage| {
                stage
                    .scene
                    .appearance(appearance)
                    .is_some_and(|appearance| appearance.wireframe)
            },
            move |stage, wireframe| {
                if let Some(appearance) = stage.scene.appearance_mut(appearance) {
                    appearance.wireframe = wireframe;
                }
                Ok(())
            },
        )
        .action("scatter", move |stage| {
            let previous = stage.scene.node(mesh).and_then(|node| node.renderable()).map(|r| r.shape);
            let shape = stage.scene.add_shape(random_triangles(TRIANGLE_COUNT)?);
            stage.scene.set_shape(mesh, shape)?;
            if let Some(previous) = previous {
                stage.scene.dispose_shape(previous)?;
            }
            Ok(())
        });

    Ok(LessonRun::new(panel, orbit(OrbitControls::damped())))
}
