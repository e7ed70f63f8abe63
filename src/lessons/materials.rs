use glam::Vec3;

use crate::assets::{shapes, Appearance, AppearanceId, Color, ShadingModel, Side, TextureMaps, TextureSettings};
use crate::controls::OrbitControls;
use crate::debug_panel::DebugPanel;
use crate::lessons::{color_texture, load_texture, orbit, setup_camera, spawn_mesh, LessonRun};
use crate::scene_graph::{Light, Node};
use crate::stage::Stage;

const SHADING_MODELS: [ShadingModel; 4] = [
    ShadingModel::Basic,
    ShadingModel::Lambert,
    ShadingModel::Standard,
    ShadingModel::Normal,
];

fn edit(stage: &mut Stage, id: AppearanceId, change: impl FnOnce(&mut Appearance)) -> anyhow::Result<()> {
    let appearance = stage
        .scene
        .appearance_mut(id)
        .ok_or_else(|| anyhow::anyhow!("Appearance was disposed"))?;
    change(appearance);
    Ok(())
}

fn read<T: Default>(stage: &Stage, id: AppearanceId, get: impl FnOnce(&Appearance) -> T) -> T {
    stage.scene.appearance(id).map(get).unwrap_or_default()
}

fn door_maps(stage: &mut Stage) -> TextureMaps {
    TextureMaps {
        color: Some(color_texture(stage, "textures/door/color.jpg", TextureSettings::default())),
        alpha: Some(load_texture(stage, "textures/door/alpha.jpg", TextureSettings::default())),
        ambient_occlusion: Some(load_texture(
            stage,
            "textures/door/ambientOcclusion.jpg",
            TextureSettings::default(),
        )),
        roughness: Some(load_texture(stage, "textures/door/roughness.jpg", TextureSettings::default())),
        metalness: Some(load_texture(stage, "textures/door/metalness.jpg", TextureSettings::default())),
        normal: Some(load_texture(stage, "textures/door/normal.jpg", TextureSettings::default())),
        displacement: Some(load_texture(stage, "textures/door/height.jpg", TextureSettings::default())),
    }
}

/// Sphere, plane and torus sharing one appearance that the panel reshapes.
pub fn build(stage: &mut Stage, mut panel: DebugPanel) -> anyhow::Result<LessonRun> {
    let root = stage.scene.root();
    let appearance = stage
        .scene
        .add_appearance(Appearance::lambert(Color::WHITE).named("Shared"));

    let sphere_shape = stage.scene.add_shape(shapes::sphere(0.5, 16, 16)?);
    let plane_shape = stage.scene.add_shape(shapes::plane(1.0, 1.0, 1, 1)?);
    let torus_shape = stage.scene.add_shape(shapes::torus(0.3, 0.2, 16, 32)?);

    let sphere = spawn_mesh(stage, root, "Sphere", sphere_shape, appearance)?;
    stage.scene.set_position(sphere, Vec3::new(-1.5, 0.0, 0.0))?;
    let plane = spawn_mesh(stage, root, "Plane", plane_shape, appearance)?;
    let torus = spawn_mesh(stage, root, "Torus", torus_shape, appearance)?;
    stage.scene.set_position(torus, Vec3::new(1.5, 0.0, 0.0))?;

    stage.scene.spawn(
        root,
        Node::new("Ambient light").with_light(Light::ambient(Color::WHITE, 1.0)),
    )?;
    stage.scene.spawn(
        root,
        Node::new("Point light")
            .with_position(Vec3::new(2.0, 3.0, 4.0))
            .with_light(Light::point(Color::WHITE, 30.0, 0.0, 2.0)),
    )?;

    setup_camera(stage, Vec3::new(1.0, 1.0, 2.0))?;

    let maps = door_maps(stage);

    panel
        .slider(
            "shading",
            0.0,
            3.0,
            1.0,
            move |stage| {
                let shading = read(stage, appearance, |a| Some(a.shading)).unwrap_or(ShadingModel::Lambert);
                SHADING_MODELS.iter().position(|m| *m == shading).unwrap_or(0) as f32
            },
            move |stage, index| {
                let shading = SHADING_MODELS[(index as usize).min(SHADING_MODELS.len() - 1)];
                edit(stage, appearance, |a| a.shading = shading)
            },
        )
        .slider(
            "roughness",
            0.0,
            1.0,
            0.0001,
            move |stage| read(stage, appearance, |a| a.roughness),
            move |stage, roughness| edit(stage, appearance, |a| a.roughness = roughness),
        )
        .slider(
            "metalness",
            0.0,
            1.0,
            0.0001,
            move |stage| read(stage, appearance, |a| a.metalness),
            move |stage, metalness| edit(stage, appearance, |a| a.metalness = metalness),
        )
        .slider(
            "opacity",
            0.0,
            1.0,
            0.01,
            move |stage| read(stage, appearance, |a| a.opacity),
            move |stage, opacity| {
                edit(stage, appearance, |a| {
                    a.opacity = opacity;
                    a.transparent = opacity < 1.0 || a.maps.alpha.is_some();
                })
            },
        )
        .slider(
            "displacement scale",
            0.0,
            1.0,
            0.0001,
            move |stage| read(stage, appearance, |a| a.displacement_scale),
            move |stage, scale| edit(stage, appearance, |a| a.displacement_scale = scale),
        )
        .toggle(
            "wireframe",
            move |stage| read(stage, appearance, |a| a.wireframe),
            move |stage, wireframe| edit(stage, appearance, |a| a.wireframe = wireframe),
        )
        .toggle(
            "double sided",
            move |stage| read(stage, appearance, |a| a.side == Side::Double),
            move |stage, double| {
                let side = if double { Side::Double } else { Side::Front };
                edit(stage, appearance, |a| a.side = side)
            },
        )
        .toggle(
            "door maps",
            move |stage| read(stage, appearance, |a| a.maps.color.is_some()),
            move |stage, enabled| {
                edit(stage, appearance, |a| {
                    if enabled {
                        a.maps = maps;
                        a.transparent = true;
                        a.displacement_scale = 0.1;
                    } else {
                        a.maps = TextureMaps::default();
                        a.transparent = a.opacity < 1.0;
                        a.displacement_scale = 1.0;
                    }
                })
            },
        );

    let mut controls = orbit(OrbitControls::damped());
    Ok(LessonRun::new(panel, move |tick| {
        let elapsed = tick.elapsed() as f32;
        for node in [sphere, plane, torus] {
            tick.stage
                .scene
                .set_rotation_euler(node, -0.15 * elapsed, 0.1 * elapsed, 0.0)?;
        }
        controls(tick)
    }))
}
