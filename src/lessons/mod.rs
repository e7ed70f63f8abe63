//! The lesson scenes. Each one populates a fresh stage and returns the
//! per-tick update plus its debug panel.

use glam::Vec3;

use crate::assets::{AppearanceId, ColorSpace, ShapeId, TextureId, TextureSettings};
use crate::controls::OrbitControls;
use crate::debug_panel::DebugPanel;
use crate::error::SceneResult;
use crate::frame_loop::{Tick, UpdateFn};
use crate::scene_graph::{Node, NodeId, Renderable};
use crate::stage::Stage;

mod animations;
mod cameras;
mod debug_ui;
mod geometries;
mod haunted_house;
mod lights;
mod materials;
mod shadows;
mod textures;
mod transforms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LessonKind {
    Transforms,
    Animations,
    Cameras,
    Geometries,
    DebugUi,
    Textures,
    Materials,
    Lights,
    Shadows,
    HauntedHouse,
}

impl LessonKind {
    pub fn title(self) -> &'static str {
        match self {
            LessonKind::Transforms => "Transform objects",
            LessonKind::Animations => "Animations",
            LessonKind::Cameras => "Cameras",
            LessonKind::Geometries => "Geometries",
            LessonKind::DebugUi => "Debug UI",
            LessonKind::Textures => "Textures",
            LessonKind::Materials => "Materials",
            LessonKind::Lights => "Lights",
            LessonKind::Shadows => "Shadows",
            LessonKind::HauntedHouse => "Haunted house",
        }
    }
}

pub struct LessonRun {
    pub update: UpdateFn,
    pub panel: DebugPanel,
}

impl LessonRun {
    fn new(panel: DebugPanel, update: impl FnMut(&mut Tick<'_>) -> anyhow::Result<()> + 'static) -> Self {
        Self {
            update: Box::new(update),
            panel,
        }
    }

    fn still(panel: DebugPanel) -> Self {
        Self::new(panel, |_| Ok(()))
    }
}

/// Populates `stage` with the scene of `kind`.
pub fn build(kind: LessonKind, stage: &mut Stage) -> anyhow::Result<LessonRun> {
    log::info!("Building lesson {}", kind.title());
    let panel = DebugPanel::new(kind.title());

    match kind {
        LessonKind::Transforms => transforms::build(stage, panel),
        LessonKind::Animations => animations::build(stage, panel),
        LessonKind::Cameras => cameras::build(stage, panel),
        LessonKind::Geometries => geometries::build(stage, panel),
        LessonKind::DebugUi => debug_ui::build(stage, panel),
        LessonKind::Textures => textures::build(stage, panel),
        LessonKind::Materials => materials::build(stage, panel),
        LessonKind::Lights => lights::build(stage, panel),
        LessonKind::Shadows => shadows::build(stage, panel),
        LessonKind::HauntedHouse => haunted_house::build(stage, panel),
    }
}

/// The lessons' usual camera: 75° vertical fov, near 0.1, far 100, aimed
/// at the origin.
fn setup_camera(stage: &mut Stage, position: Vec3) -> SceneResult<()> {
    let aspect = stage.viewport.aspect();
    stage.camera.set_perspective(75.0, aspect, 0.1, 100.0)?;
    stage.camera.set_position(&mut stage.scene, position)?;
    stage.camera.look_at(&mut stage.scene, Vec3::ZERO)
}

fn spawn_mesh(
    stage: &mut Stage,
    parent: NodeId,
    name: &str,
    shape: ShapeId,
    appearance: AppearanceId,
) -> SceneResult<NodeId> {
    stage.scene.spawn(
        parent,
        Node::new(name).with_renderable(Renderable::new(shape, appearance)),
    )
}

fn load_texture(stage: &mut Stage, path: &str, settings: TextureSettings) -> TextureId {
    let id = stage.textures.load(path);
    if let Some(current) = stage.textures.settings_mut(id) {
        *current = settings;
    }
    id
}

fn color_texture(stage: &mut Stage, path: &str, settings: TextureSettings) -> TextureId {
    load_texture(
        stage,
        path,
        TextureSettings {
            color_space: ColorSpace::Srgb,
            ..settings
        },
    )
}

/// Feeds pointer input to damped orbit controls every tick.
fn orbit(mut controls: OrbitControls) -> impl FnMut(&mut Tick<'_>) -> anyhow::Result<()> {
    move |tick| {
        let stage = &mut *tick.stage;
        controls.consume_pointer(&mut stage.pointer, &stage.viewport);
        controls.update(&mut stage.scene, &stage.camera)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::render::DrawList;
    use clap::ValueEnum;

    #[test]
    fn test_every_lesson_builds_and_prepares() {
        for kind in LessonKind::value_variants() {
            let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
            let run = build(*kind, &mut stage).unwrap();
            assert_eq!(run.panel.title(), kind.title());

            let list = DrawList::prepare(&stage).unwrap();
            assert!(!list.items.is_empty(), "{:?} has nothing to draw", kind);
        }
    }

    #[test]
    fn test_lesson_names_on_the_command_line() {
        assert_eq!(
            LessonKind::from_str("haunted-house", false).unwrap(),
            LessonKind::HauntedHouse
        );
        assert_eq!(LessonKind::from_str("debug-ui", false).unwrap(), LessonKind::DebugUi);
    }
}
