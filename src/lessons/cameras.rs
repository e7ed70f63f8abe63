use std::f32::consts::TAU;

use glam::Vec3;

use crate::assets::{shapes, Appearance, Color};
use crate::camera::Projection;
use crate::debug_panel::DebugPanel;
use crate::lessons::{setup_camera, spawn_mesh, LessonRun};
use crate::stage::Stage;

/// The camera orbits the cube following the cursor.
pub fn build(stage: &mut Stage, mut panel: DebugPanel) -> anyhow::Result<LessonRun> {
    let root = stage.scene.root();
    let shape = stage.scene.add_shape(shapes::box_shape(1.0, 1.0, 1.0, 5, 5, 5)?);
    let appearance = stage
        .scene
        .add_appearance(Appearance::basic(Color::from_hex(0xff0000)));
    let cube = spawn_mesh(stage, root, "Cube", shape, appearance)?;

    setup_camera(stage, Vec3::new(0.0, 0.0, 3.0))?;

    panel.toggle(
        "orthographic",
        |stage| matches!(stage.camera.projection(), Projection::Orthographic { .. }),
        |stage, orthographic| {
            let aspect = stage.viewport.aspect();
            if orthographic {
                stage
                    .camera
                    .set_orthographic(-aspect, aspect, 1.0, -1.0, 0.1, 100.0)?;
            } else {
                stage.camera.set_perspective(75.0, aspect, 0.1, 100.0)?;
            }
            Ok(())
        },
    );

    Ok(LessonRun::new(panel, move |tick| {
        let stage = &mut *tick.stage;
        let cursor = stage.pointer.cursor;

        let position = Vec3::new(
            (cursor.x * TAU).sin() * 3.0,
            cursor.y * 5.0,
            (cursor.x * TAU).cos() * 3.0,
        );
        stage.camera.set_position(&mut stage.scene, position)?;

        let target = stage.scene.world_position(cube)?;
        stage.camera.look_at(&mut stage.scene, target)?;
        Ok(())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::frame_loop::{FrameLoop, ManualScheduler};
    use crate::render::RecordingRenderer;
    use std::time::Duration;

    #[test]
    fn test_cursor_drives_camera() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        let run = build(&mut stage, DebugPanel::new("Cameras")).unwrap();
        let mut renderer = RecordingRenderer::default();
        let mut frame_loop = FrameLoop::new(ManualScheduler::default(), Duration::from_millis(100));
        frame_loop.start(run.update).unwrap();

        let viewport = stage.viewport;
        stage.pointer.move_to(600.0, 150.0, &viewport);
        frame_loop.tick(&mut stage, &mut renderer, Duration::ZERO);

        // Cursor at (0.25, 0.25): a quarter turn around y, lifted 1.25.
        let position = stage.camera.position(&stage.scene).unwrap();
        assert!(position.distance(Vec3::new(3.0, 1.25, 0.0)) < 1e-4, "{position}");
    }

    #[test]
    fn test_orthographic_toggle() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        let mut run = build(&mut stage, DebugPanel::new("Cameras")).unwrap();

        assert!(run.panel.set_toggle(&mut stage, "orthographic", true));
        assert!(matches!(
            stage.camera.projection(),
            Projection::Orthographic { .. }
        ));
        assert!(run.panel.set_toggle(&mut stage, "orthographic", false));
        assert!(matches!(stage.camera.projection(), Projection::Perspective { .. }));
    }
}
