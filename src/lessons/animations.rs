use glam::Vec3;

use crate::assets::{shapes, Appearance, Color};
use crate::debug_panel::DebugPanel;
use crate::lessons::{setup_camera, spawn_mesh, LessonRun};
use crate::stage::Stage;

/// A red cube watched by a camera circling in the xy plane.
pub fn build(stage: &mut Stage, panel: DebugPanel) -> anyhow::Result<LessonRun> {
    let root = stage.scene.root();
    let shape = stage.scene.add_shape(shapes::cube(1.0)?);
    let appearance = stage
        .scene
        .add_appearance(Appearance::basic(Color::from_hex(0xff0000)));
    let cube = spawn_mesh(stage, root, "Cube", shape, appearance)?;

    let camera_z = 3.5;
    setup_camera(stage, Vec3::new(1.0, 1.0, camera_z))?;

    Ok(LessonRun::new(panel, move |tick| {
        let elapsed = tick.elapsed() as f32;
        let stage = &mut *tick.stage;

        let position = Vec3::new(elapsed.cos(), elapsed.sin(), camera_z);
        stage.camera.set_position(&mut stage.scene, position)?;

        let target = stage.scene.world_position(cube)?;
        stage.camera.look_at(&mut stage.scene, target)?;
        Ok(())
    }))
}
