use std::cell::Cell;
use std::f32::consts::TAU;
use std::rc::Rc;

use glam::{Quat, Vec3};

use crate::assets::{shapes, Appearance, Color};
use crate::controls::OrbitControls;
use crate::debug_panel::DebugPanel;
use crate::lessons::{orbit, setup_camera, spawn_mesh, LessonRun};
use crate::stage::Stage;

/// Seconds a spin takes for one full turn.
const SPIN_DURATION: f32 = 1.0;

/// A wireframe cube with every property a debug panel can reach.
pub fn build(stage: &mut Stage, mut panel: DebugPanel) -> anyhow::Result<LessonRun> {
    let root = stage.scene.root();
    let shape = stage
        .scene
        .add_shape(shapes::box_shape(1.0, 1.0, 1.0, 2, 2, 2)?);
    let appearance = stage.scene.add_appearance(
        Appearance::basic(Color::from_css("#3a63a6")?)
            .named("Cube")
            .with_wireframe(true),
    );
    let cube = spawn_mesh(stage, root, "Cube", shape, appearance)?;

    setup_camera(stage, Vec3::new(1.0, 1.0, 2.0))?;

    let spin_left = Rc::new(Cell::new(0.0f32));
    let subdivisions = Rc::new(Cell::new(2u32));

    panel.set_visible(false);
    panel
        .slider(
            "elevation",
            -3.0,
            3.0,
            0.01,
            move |stage| {
                stage
                    .scene
                    .node(cube)
                    .map_or(0.0, |node| node.transform().translation().y)
            },
            move |stage, y| {
                let position = stage
                    .scene
                    .node(cube)
                    .map_or(Vec3::ZERO, |node| node.transform().translation());
                Ok(stage.scene.set_position(cube, position.with_y(y))?)
            },
        )
        .toggle(
            "visible",
            move |stage| stage.scene.node(cube).is_some_and(|node| node.visible()),
            move |stage, visible| Ok(stage.scene.set_visible(cube, visible)?),
        )
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
        .color(
            "color",
            move |stage| {
                stage
                    .scene
                    .appearance(appearance)
                    .map_or(Color::WHITE, |appearance| appearance.color)
            },
            move |stage, color| {
                if let Some(appearance) = stage.scene.appearance_mut(appearance) {
                    appearance.color = color;
                }
                Ok(())
            },
        );

    let spin = spin_left.clone();
    panel.action("spin", move |_| {
        spin.set(SPIN_DURATION);
        Ok(())
    });

    let current = subdivisions.clone();
    panel.slider(
        "subdivision",
        1.0,
        20.0,
        1.0,
        move |_| current.get() as f32,
        move |stage, value| {
            let segments = value as u32;
            if segments == subdivisions.get() {
                return Ok(());
            }

            let previous = stage
                .scene
                .node(cube)
                .and_then(|node| node.renderable())
                .map(|renderable| renderable.shape);
            let shape = stage.scene.add_shape(shapes::box_shape(
                1.0, 1.0, 1.0, segments, segments, segments,
            )?);
            if let Err(error) = stage.scene.set_shape(cube, shape) {
                stage.scene.dispose_shape(shape)?;
                return Err(error.into());
            }
            if let Some(previous) = previous {
                stage.scene.dispose_shape(previous)?;
            }
            subdivisions.set(segments);
            Ok(())
        },
    );

    let mut controls = orbit(OrbitControls::damped());
    Ok(LessonRun::new(panel, move |tick| {
        let left = spin_left.get();
        if left > 0.0 {
            let step = (tick.delta() as f32).min(left);
            spin_left.set(left - step);

            let scene = &mut tick.stage.scene;
            let rotation = scene
                .node(cube)
                .map_or(Quat::IDENTITY, |node| node.transform().rotation());
            scene.set_rotation(cube, rotation * Quat::from_rotation_y(TAU * step / SPIN_DURATION))?;
        }

        controls(tick)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::frame_loop::{FrameLoop, ManualScheduler};
    use crate::render::RecordingRenderer;
    use std::time::Duration;

    fn setup() -> (Stage, LessonRun) {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        let run = build(&mut stage, DebugPanel::new("Debug UI")).unwrap();
        (stage, run)
    }

    #[test]
    fn test_panel_starts_hidden() {
        let (_, run) = setup();
        assert!(!run.panel.is_visible());
    }

    #[test]
    fn test_subdivision_rebuilds_box() {
        let (mut stage, mut run) = setup();
        let cube = stage.scene.find_by_name("Cube").unwrap();
        let first = stage.scene.node(cube).unwrap().renderable().unwrap().shape;
        assert_eq!(stage.scene.shape(first).unwrap().triangle_count(), 6 * 2 * 2 * 2);

        assert!(run.panel.set_value(&mut stage, "subdivision", 4.4));
        let second = stage.scene.node(cube).unwrap().renderable().unwrap().shape;
        assert_eq!(stage.scene.shape(second).unwrap().triangle_count(), 6 * 4 * 4 * 2);
        assert!(stage.scene.shape(first).is_none());
        assert_eq!(run.panel.value(&stage, "subdivision"), Some(4.0));
    }

    #[test]
    fn test_failed_subdivision_releases_new_box() {
        let (mut stage, mut run) = setup();
        let cube = stage.scene.find_by_name("Cube").unwrap();
        stage.scene.set_renderable(cube, None).unwrap();
        let shapes = stage.scene.shape_count();

        assert!(!run.panel.set_value(&mut stage, "subdivision", 6.0));
        assert_eq!(stage.scene.shape_count(), shapes);
        assert_eq!(run.panel.value(&stage, "subdivision"), Some(2.0));
    }

    #[test]
    fn test_spin_turns_once_over_a_second() {
        let (mut stage, mut run) = setup();
        let cube = stage.scene.find_by_name("Cube").unwrap();
        let mut renderer = RecordingRenderer::default();
        let mut frame_loop = FrameLoop::new(ManualScheduler::default(), Duration::from_millis(100));

        assert!(run.panel.trigger(&mut stage, "spin"));
        let update = std::mem::replace(&mut run.update, Box::new(|_| Ok(())));
        frame_loop.start(update).unwrap();

        let mut now = Duration::ZERO;
        frame_loop.tick(&mut stage, &mut renderer, now);
        for _ in 0..5 {
            now += Duration::from_millis(100);
            frame_loop.tick(&mut stage, &mut renderer, now);
        }

        // Half a second in, half a turn.
        let rotation = stage.scene.node(cube).unwrap().transform().rotation();
        let turned = rotation * Vec3::X;
        assert!(turned.distance(Vec3::NEG_X) < 1e-3, "{turned}");
    }

    #[test]
    fn test_elevation_and_color() {
        let (mut stage, mut run) = setup();
        let cube = stage.scene.find_by_name("Cube").unwrap();

        assert!(run.panel.set_value(&mut stage, "elevation", 1.234));
        let y = stage.scene.world_position(cube).unwrap().y;
        assert!((y - 1.23).abs() < 1e-4);

        assert!(run.panel.set_color(&mut stage, "color", Color::from_hex(0x00ff00)));
        let appearance = stage.scene.node(cube).unwrap().renderable().unwrap().appearance;
        assert_eq!(stage.scene.appearance(appearance).unwrap().color.to_hex(), 0x00ff00);
    }
}
