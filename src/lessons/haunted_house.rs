use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use rand::Rng;

use crate::assets::{shapes, Appearance, AppearanceId, Color, TextureMaps, TextureSettings, Wrap};
use crate::controls::OrbitControls;
use crate::debug_panel::DebugPanel;
use crate::lessons::{color_texture, load_texture, orbit, setup_camera, spawn_mesh, LessonRun};
use crate::scene_graph::{Light, Node, NodeId};
use crate::stage::Stage;

const GRAVE_COUNT: usize = 30;

/// Angular speed and orbit radius of each ghost light.
const GHOSTS: [(&str, u32, f32, f32); 3] = [
    ("Ghost 1", 0x8800ff, 0.5, 4.0),
    ("Ghost 2", 0xff0088, -0.38, 5.0),
    ("Ghost 3", 0xff0000, 0.23, 6.0),
];

/// Loads the diffuse, ARM and normal maps of a surface. ARM packs ambient
/// occlusion, roughness and metalness into one texture.
fn arm_surface(stage: &mut Stage, dir: &str, name: &str, settings: TextureSettings) -> TextureMaps {
    let path = |suffix: &str| format!("textures/haunted-house/{dir}/{name}_{suffix}_1k.jpg");
    let arm = load_texture(stage, &path("arm"), settings);

    TextureMaps {
        color: Some(color_texture(stage, &path("diff"), settings)),
        ambient_occlusion: Some(arm),
        roughness: Some(arm),
        metalness: Some(arm),
        normal: Some(load_texture(stage, &path("nor_gl"), settings)),
        ..Default::default()
    }
}

/// Ghost height at `angle`: three sines at unrelated frequencies.
fn ghost_height(angle: f32) -> f32 {
    angle.sin() * (angle * 2.34).sin() * (angle * 3.45).sin()
}

fn displacement_slider(
    panel: &mut DebugPanel,
    label: &str,
    min: f32,
    appearance: AppearanceId,
    get: fn(&Appearance) -> f32,
    set: fn(&mut Appearance, f32),
) {
    panel.slider(
        label,
        min,
        1.0,
        0.001,
        move |stage| stage.scene.appearance(appearance).map_or(0.0, get),
        move |stage, value| {
            let floor = stage
                .scene
                .appearance_mut(appearance)
                .ok_or_else(|| anyhow::anyhow!("Floor appearance was disposed"))?;
            set(floor, value);
            Ok(())
        },
    );
}

pub fn build(stage: &mut Stage, mut panel: DebugPanel) -> anyhow::Result<LessonRun> {
    let root = stage.scene.root();

    // Floor
    let floor_settings = TextureSettings::default().repeating(8.0, 8.0);
    let mut floor_maps = arm_surface(stage, "floor", "coast_sand_rocks_02", floor_settings);
    floor_maps.alpha = Some(load_texture(
        stage,
        "textures/haunted-house/floor/alpha.jpg",
        TextureSettings::default(),
    ));
    floor_maps.displacement = Some(load_texture(
        stage,
        "textures/haunted-house/floor/coast_sand_rocks_02_disp_1k.jpg",
        floor_settings,
    ));

    let mut floor_appearance = Appearance::standard(Color::WHITE)
        .named("Floor")
        .with_maps(floor_maps);
    floor_appearance.transparent = true;
    floor_appearance.displacement_scale = 0.3;
    floor_appearance.displacement_bias = -0.2;
    let floor_appearance = stage.scene.add_appearance(floor_appearance);
    let floor_shape = stage.scene.add_shape(shapes::plane(20.0, 20.0, 100, 100)?);
    let floor = spawn_mesh(stage, root, "Floor", floor_shape, floor_appearance)?;
    stage.scene.set_rotation_euler(floor, -PI * 0.5, 0.0, 0.0)?;

    // House
    let house = stage.scene.spawn(root, Node::new("House"))?;

    let wall_maps = arm_surface(stage, "wall", "castle_brick_broken_06", TextureSettings::default());
    let walls_appearance = stage
        .scene
        .add_appearance(Appearance::standard(Color::WHITE).named("Walls").with_maps(wall_maps));
    let walls_shape = stage
        .scene
        .add_shape(shapes::box_shape(4.0, 2.5, 4.0, 1, 1, 1)?);
    let walls = spawn_mesh(stage, house, "Walls", walls_shape, walls_appearance)?;
    stage.scene.set_position(walls, Vec3::new(0.0, 2.5 / 2.0, 0.0))?;

    let roof_settings = TextureSettings {
        repeat: Vec2::new(3.0, 1.0),
        wrap_s: Wrap::Repeat,
        ..Default::default()
    };
    let roof_maps = arm_surface(stage, "roof", "roof_slates_02", roof_settings);
    let roof_appearance = stage
        .scene
        .add_appearance(Appearance::standard(Color::WHITE).named("Roof").with_maps(roof_maps));
    let roof_shape = stage.scene.add_shape(shapes::cone(3.5, 1.5, 4)?);
    let roof = spawn_mesh(stage, house, "Roof", roof_shape, roof_appearance)?;
    stage.scene.set_position(roof, Vec3::new(0.0, 2.5 + 0.75, 0.0))?;
    stage.scene.set_rotation_euler(roof, 0.0, PI * 0.25, 0.0)?;

    let door_path = |name: &str| format!("textures/door/{name}.jpg");
    let door_maps = TextureMaps {
        color: Some(color_texture(stage, &door_path("color"), TextureSettings::default())),
        alpha: Some(load_texture(stage, &door_path("alpha"), TextureSettings::default())),
        ambient_occlusion: Some(load_texture(
            stage,
            &door_path("ambientOcclusion"),
            TextureSettings::default(),
        )),
        displacement: Some(load_texture(stage, &door_path("height"), TextureSettings::default())),
        normal: Some(load_texture(stage, &door_path("normal"), TextureSettings::default())),
        metalness: Some(load_texture(stage, &door_path("metalness"), TextureSettings::default())),
        roughness: Some(load_texture(stage, &door_path("roughness"), TextureSettings::default())),
    };
    let mut door_appearance = Appearance::standard(Color::WHITE)
        .named("Door")
        .with_maps(door_maps);
    door_appearance.transparent = true;
    door_appearance.displacement_scale = 0.15;
    door_appearance.displacement_bias = -0.04;
    let door_appearance = stage.scene.add_appearance(door_appearance);
    let door_shape = stage.scene.add_shape(shapes::plane(2.2, 2.2, 100, 100)?);
    let door = spawn_mesh(stage, house, "Door", door_shape, door_appearance)?;
    stage.scene.set_position(door, Vec3::new(0.0, 1.0, 2.0 + 0.01))?;

    let bush_settings = TextureSettings {
        repeat: Vec2::new(2.0, 1.0),
        wrap_s: Wrap::Repeat,
        ..Default::default()
    };
    let bush_maps = arm_surface(stage, "bush", "leaves_forest_ground", bush_settings);
    let bush_appearance = stage.scene.add_appearance(
        Appearance::standard(Color::from_css("#ccffcc")?)
            .named("Bush")
            .with_maps(bush_maps),
    );
    let bush_shape = stage.scene.add_shape(shapes::sphere(1.0, 16, 16)?);
    let bushes = [
        (0.5, Vec3::new(0.8, 0.2, 2.2)),
        (0.25, Vec3::new(1.4, 0.1, 2.1)),
        (0.4, Vec3::new(-0.8, 0.1, 2.2)),
        (0.15, Vec3::new(-1.0, 0.05, 2.6)),
    ];
    for (index, (scale, position)) in bushes.into_iter().enumerate() {
        let bush = spawn_mesh(stage, house, &format!("Bush {}", index + 1), bush_shape, bush_appearance)?;
        stage.scene.set_uniform_scale(bush, scale)?;
        stage.scene.set_position(bush, position)?;
        stage.scene.set_rotation_euler(bush, -0.75, 0.0, 0.0)?;
    }

    // Graves
    let grave_settings = TextureSettings {
        repeat: Vec2::new(0.3, 0.4),
        ..Default::default()
    };
    let grave_maps = arm_surface(stage, "grave", "plastered_stone_wall", grave_settings);
    let grave_appearance = stage
        .scene
        .add_appearance(Appearance::standard(Color::WHITE).named("Grave").with_maps(grave_maps));
    let grave_shape = stage
        .scene
        .add_shape(shapes::box_shape(0.6, 0.8, 0.2, 1, 1, 1)?);
    let graves = stage.scene.spawn(root, Node::new("Graves"))?;

    let mut rng = rand::thread_rng();
    for index in 0..GRAVE_COUNT {
        let angle = rng.gen_range(0.0..TAU);
        let radius = rng.gen_range(3.0..7.0);
        let position = Vec3::new(
            angle.sin() * radius,
            rng.gen_range(0.0..0.4),
            angle.cos() * radius,
        );

        let grave = spawn_mesh(stage, graves, &format!("Grave {}", index + 1), grave_shape, grave_appearance)?;
        stage.scene.set_position(grave, position)?;
        stage.scene.set_rotation_euler(
            grave,
            rng.gen_range(-0.2..0.2),
            rng.gen_range(-0.2..0.2),
            rng.gen_range(-0.2..0.2),
        )?;
    }

    // Lights
    let moonlight = Color::from_css("#86cdff")?;
    stage.scene.spawn(
        root,
        Node::new("Ambient light").with_light(Light::ambient(moonlight, 0.275)),
    )?;
    stage.scene.spawn(
        root,
        Node::new("Directional light")
            .with_position(Vec3::new(3.0, 2.0, -8.0))
            .with_light(Light::directional(moonlight, 1.0)),
    )?;
    stage.scene.spawn(
        house,
        Node::new("Door light")
            .with_position(Vec3::new(0.0, 2.2, 2.5))
            .with_light(Light::point(Color::from_css("#ff7d46")?, 5.0, 0.0, 2.0)),
    )?;

    let mut ghosts: Vec<(NodeId, f32, f32)> = Vec::with_capacity(GHOSTS.len());
    for (name, color, speed, radius) in GHOSTS {
        let ghost = stage.scene.spawn(
            root,
            Node::new(name).with_light(Light::point(Color::from_hex(color), 6.0, 0.0, 2.0)),
        )?;
        ghosts.push((ghost, speed, radius));
    }

    setup_camera(stage, Vec3::new(4.0, 2.0, 5.0))?;

    displacement_slider(
        &mut panel,
        "floor displacement scale",
        0.0,
        floor_appearance,
        |a| a.displacement_scale,
        |a, value| a.displacement_scale = value,
    );
    displacement_slider(
        &mut panel,
        "floor displacement bias",
        -1.0,
        floor_appearance,
        |a| a.displacement_bias,
        |a, value| a.displacement_bias = value,
    );

    let mut controls = orbit(OrbitControls::damped());
    Ok(LessonRun::new(panel, move |tick| {
        let elapsed = tick.elapsed() as f32;
        for &(ghost, speed, radius) in &ghosts {
            let angle = elapsed * speed;
            let position = Vec3::new(angle.cos() * radius, ghost_height(angle), angle.sin() * radius);
            tick.stage.scene.set_position(ghost, position)?;
        }
        controls(tick)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::frame_loop::{FrameLoop, ManualScheduler};
    use crate::render::{RecordingRenderer, Renderer};
    use std::time::Duration;

    #[test]
    fn test_scene_layout() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        build(&mut stage, DebugPanel::new("Haunted house")).unwrap();

        let graves = stage.scene.find_by_name("Graves").unwrap();
        let graves = stage.scene.node(graves).unwrap().child_ids().to_vec();
        assert_eq!(graves.len(), GRAVE_COUNT);
        for grave in graves {
            let position = stage.scene.world_position(grave).unwrap();
            let radius = Vec2::new(position.x, position.z).length();
            assert!((3.0..=7.0).contains(&radius), "{position}");
            assert!((0.0..=0.4).contains(&position.y));
        }

        let door_light = stage.scene.find_by_name("Door light").unwrap();
        let house = stage.scene.find_by_name("House").unwrap();
        assert_eq!(stage.scene.node(door_light).unwrap().parent_id(), Some(house));
    }

    #[test]
    fn test_ghosts_orbit() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        let run = build(&mut stage, DebugPanel::new("Haunted house")).unwrap();
        let mut renderer = RecordingRenderer::default();
        let mut frame_loop = FrameLoop::new(ManualScheduler::default(), Duration::from_millis(100));
        frame_loop.start(run.update).unwrap();

        let mut now = Duration::ZERO;
        frame_loop.tick(&mut stage, &mut renderer, now);
        for _ in 0..20 {
            now += Duration::from_millis(100);
            frame_loop.tick(&mut stage, &mut renderer, now);
        }

        let ghost = stage.scene.find_by_name("Ghost 2").unwrap();
        let position = stage.scene.world_position(ghost).unwrap();
        let angle = -2.0 * 0.38f32;
        assert!((Vec2::new(position.x, position.z).length() - 5.0).abs() < 1e-3);
        assert!((position.y - ghost_height(angle)).abs() < 1e-4);

        let list = renderer.last_frame().unwrap();
        assert_eq!(list.lights.len(), 6);
        assert!(renderer.frames() >= 21);
        assert_eq!(renderer.output_size(), (800, 600));
    }

    #[test]
    fn test_transparent_surfaces_draw_last() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        build(&mut stage, DebugPanel::new("Haunted house")).unwrap();

        let list = crate::render::DrawList::prepare(&stage).unwrap();
        let floor = stage.scene.find_by_name("Floor").unwrap();
        let door = stage.scene.find_by_name("Door").unwrap();
        let blended: Vec<_> = list.blended().map(|item| item.node).collect();
        assert!(!blended.is_empty());
        assert!(blended.iter().all(|node| *node == floor || *node == door));
    }
}
