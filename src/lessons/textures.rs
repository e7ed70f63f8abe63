use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::assets::{shapes, Appearance, Color, Filter, TextureId, TextureSettings, Wrap};
use crate::controls::OrbitControls;
use crate::debug_panel::DebugPanel;
use crate::lessons::{color_texture, load_texture, orbit, setup_camera, spawn_mesh, LessonRun};
use crate::stage::Stage;

pub(crate) const DOOR_MAPS: [&str; 6] = [
    "textures/door/alpha.jpg",
    "textures/door/height.jpg",
    "textures/door/normal.jpg",
    "textures/door/ambientOcclusion.jpg",
    "textures/door/metalness.jpg",
    "textures/door/roughness.jpg",
];

fn with_settings(stage: &mut Stage, texture: TextureId, change: impl FnOnce(&mut TextureSettings)) {
    if let Some(settings) = stage.textures.settings_mut(texture) {
        change(settings);
    }
}

fn settings(stage: &Stage, texture: TextureId) -> TextureSettings {
    stage
        .textures
        .get(texture)
        .map(|texture| texture.settings)
        .unwrap_or_default()
}

/// A cube wearing the door color map, repeated, shifted and rotated.
pub fn build(stage: &mut Stage, mut panel: DebugPanel) -> anyhow::Result<LessonRun> {
    let color = color_texture(
        stage,
        "textures/door/color.jpg",
        TextureSettings {
            repeat: Vec2::new(2.0, 3.0),
            wrap_s: Wrap::Repeat,
            wrap_t: Wrap::Repeat,
            offset: Vec2::splat(0.5),
            rotation: PI * 0.25,
            center: Vec2::splat(0.5),
            ..Default::default()
        },
    );
    // Loaded for the progress report only.
    for path in DOOR_MAPS {
        load_texture(stage, path, TextureSettings::default());
    }

    let root = stage.scene.root();
    let shape = stage.scene.add_shape(shapes::cube(1.0)?);
    let appearance = stage
        .scene
        .add_appearance(Appearance::basic(Color::WHITE).with_color_map(color));
    spawn_mesh(stage, root, "Cube", shape, appearance)?;

    setup_camera(stage, Vec3::new(1.0, 1.0, 1.0))?;

    panel
        .slider(
            "rotation",
            -PI,
            PI,
            0.01,
            move |stage| settings(stage, color).rotation,
            move |stage, rotation| {
                with_settings(stage, color, |settings| settings.rotation = rotation);
                Ok(())
            },
        )
        .slider(
            "repeat x",
            0.1,
            8.0,
            0.1,
            move |stage| settings(stage, color).repeat.x,
            move |stage, x| {
                with_settings(stage, color, |settings| settings.repeat.x = x);
                Ok(())
            },
        )
        .slider(
            "repeat y",
            0.1,
            8.0,
            0.1,
            move |stage| settings(stage, color).repeat.y,
            move |stage, y| {
                with_settings(stage, color, |settings| settings.repeat.y = y);
                Ok(())
            },
        )
        .toggle(
            "nearest filter",
            move |stage| settings(stage, color).mag_filter == Filter::Nearest,
            move |stage, nearest| {
                let filter = if nearest { Filter::Nearest } else { Filter::Linear };
                with_settings(stage, color, |settings| {
                    settings.mag_filter = filter;
                    settings.min_filter = filter;
                });
                Ok(())
            },
        );

    Ok(LessonRun::new(panel, orbit(OrbitControls::damped())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ColorSpace;
    use crate::config::HarnessConfig;

    #[test]
    fn test_color_map_placement() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        let mut run = build(&mut stage, DebugPanel::new("Textures")).unwrap();
        assert_eq!(stage.textures.progress().total, 7);

        let cube = stage.scene.find_by_name("Cube").unwrap();
        let appearance = stage.scene.node(cube).unwrap().renderable().unwrap().appearance;
        let color = stage.scene.appearance(appearance).unwrap().maps.color.unwrap();

        let placed = settings(&stage, color);
        assert_eq!(placed.color_space, ColorSpace::Srgb);
        assert_eq!(placed.repeat, Vec2::new(2.0, 3.0));
        assert_eq!(placed.wrap_s, Wrap::Repeat);

        assert!(run.panel.set_toggle(&mut stage, "nearest filter", true));
        assert_eq!(settings(&stage, color).min_filter, Filter::Nearest);
    }
}
