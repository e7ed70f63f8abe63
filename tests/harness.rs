use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use glam::{Mat4, Quat, Vec3};
use lessongine::assets::{shapes, Appearance, Color, TextureImage};
use lessongine::camera::{Camera, Projection};
use lessongine::config::HarnessConfig;
use lessongine::frame_loop::{FrameLoop, LoopState, ManualScheduler};
use lessongine::render::{RecordingRenderer, Renderer};
use lessongine::scene_graph::{Node, Renderable, Scene};
use lessongine::stage::Stage;
use lessongine::SceneError;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn setup() -> (Stage, RecordingRenderer, FrameLoop<ManualScheduler>) {
    let stage = Stage::new(&HarnessConfig::default()).unwrap();
    let frame_loop = FrameLoop::new(ManualScheduler::default(), ms(100));
    (stage, RecordingRenderer::default(), frame_loop)
}

/// Delivers ticks the way a display would, `step` apart, while the loop
/// keeps asking for them.
fn drive(
    frame_loop: &mut FrameLoop<ManualScheduler>,
    stage: &mut Stage,
    renderer: &mut RecordingRenderer,
    times: &[u64],
) -> usize {
    let mut delivered = 0;
    for &time in times {
        if !frame_loop.scheduler_mut().take_request() {
            break;
        }
        if frame_loop.tick(stage, renderer, ms(time)) {
            delivered += 1;
        }
    }
    delivered
}

#[test]
fn test_resize_is_visible_to_the_next_tick() {
    let (mut stage, mut renderer, mut frame_loop) = setup();
    frame_loop.start(|_| Ok(())).unwrap();
    drive(&mut frame_loop, &mut stage, &mut renderer, &[0]);
    assert_eq!(renderer.output_size(), (800, 600));

    stage.resize(&mut renderer, 1920, 1080, 1.0).unwrap();
    drive(&mut frame_loop, &mut stage, &mut renderer, &[16]);

    let aspect = *renderer.rendered_aspects().last().unwrap();
    assert!((aspect - 1920.0 / 1080.0).abs() < 1e-6);
    assert_eq!(renderer.output_size(), (1920, 1080));
    assert_eq!(renderer.resizes().last(), Some(&(1920, 1080)));

    let projection = stage.camera.projection_matrix();
    let ratio = projection.y_axis.y / projection.x_axis.x;
    assert!((ratio - 1920.0 / 1080.0).abs() < 1e-4);
}

#[test]
fn test_high_density_displays_are_capped() {
    let (mut stage, mut renderer, _) = setup();
    stage.resize(&mut renderer, 1920, 1080, 3.0).unwrap();
    assert_eq!(renderer.output_size(), (3840, 2160));
    assert_eq!(renderer.pixel_ratio(), 2.0);
}

#[test]
fn test_elapsed_is_the_sum_of_deltas() {
    let (mut stage, mut renderer, mut frame_loop) = setup();
    let deltas = Rc::new(RefCell::new(Vec::new()));
    let seen = deltas.clone();
    frame_loop
        .start(move |tick| {
            seen.borrow_mut().push((tick.delta(), tick.elapsed()));
            Ok(())
        })
        .unwrap();

    let times = [1_000, 1_016, 1_033, 1_050, 1_300, 1_316];
    drive(&mut frame_loop, &mut stage, &mut renderer, &times);

    let deltas = deltas.borrow();
    assert_eq!(deltas.len(), times.len());
    assert_eq!(deltas[0].0, 0.0);
    // The 250ms stall is reported as the configured maximum.
    assert!((deltas[4].0 - 0.1).abs() < 1e-9);

    let sum: f64 = deltas.iter().map(|(delta, _)| delta).sum();
    let (_, elapsed) = deltas[deltas.len() - 1];
    assert!((sum - elapsed).abs() < 1e-9);
    assert!((frame_loop.clock().elapsed() - elapsed).abs() < 1e-12);
}

#[test]
fn test_stop_inside_update_ends_the_loop() {
    let (mut stage, mut renderer, mut frame_loop) = setup();
    let count = Rc::new(RefCell::new(0u32));
    let counter = count.clone();
    frame_loop
        .start(move |tick| {
            *counter.borrow_mut() += 1;
            if *counter.borrow() == 3 {
                tick.stop();
            }
            Ok(())
        })
        .unwrap();

    let times: Vec<u64> = (0..10).map(|i| i * 16).collect();
    let delivered = drive(&mut frame_loop, &mut stage, &mut renderer, &times);

    assert_eq!(delivered, 3);
    assert_eq!(*count.borrow(), 3);
    assert_eq!(frame_loop.state(), LoopState::Stopped);
    assert!(!frame_loop.tick(&mut stage, &mut renderer, ms(1_000)));
    assert_eq!(renderer.frames(), 3);
}

#[test]
fn test_starting_twice_keeps_the_first_loop() {
    let (mut stage, mut renderer, mut frame_loop) = setup();
    let first = Rc::new(RefCell::new(0u32));
    let counter = first.clone();
    frame_loop
        .start(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        })
        .unwrap();

    assert_eq!(frame_loop.start(|_| Ok(())), Err(SceneError::AlreadyRunning));
    drive(&mut frame_loop, &mut stage, &mut renderer, &[0, 16]);
    assert_eq!(*first.borrow(), 2);
}

#[test]
fn test_invalid_camera_keeps_default_projection() {
    let mut scene = Scene::new();
    let mut camera = Camera::new(&mut scene);

    let result = camera.set_perspective(50.0, 1.0, 5.0, 1.0);
    assert!(matches!(result, Err(SceneError::InvalidParameter(_))));
    assert_eq!(camera.projection(), Projection::default());

    assert!(Camera::perspective(&mut scene, 75.0, 4.0 / 3.0, 5.0, 1.0).is_err());
}

#[test]
fn test_attaching_an_ancestor_is_a_cycle() {
    let mut scene = Scene::new();
    let root = scene.root();
    let a = scene.spawn(root, Node::new("A")).unwrap();
    let b = scene.spawn(a, Node::new("B")).unwrap();
    let c = scene.spawn(b, Node::new("C")).unwrap();

    assert!(matches!(scene.attach(b, a), Err(SceneError::Cycle { .. })));
    assert!(matches!(scene.attach(c, a), Err(SceneError::Cycle { .. })));
    assert!(matches!(scene.attach(a, a), Err(SceneError::Cycle { .. })));

    assert_eq!(scene.node(b).unwrap().parent_id(), Some(a));
    assert_eq!(scene.node(a).unwrap().parent_id(), Some(root));
}

#[test]
fn test_world_transforms_compose_at_any_depth() {
    for depth in [1usize, 2, 5] {
        let mut scene = Scene::new();
        let mut parent = scene.root();
        let mut expected = Mat4::IDENTITY;

        for level in 0..depth {
            let f = level as f32 + 1.0;
            let translation = Vec3::new(f, -0.5 * f, 0.25);
            let rotation = Quat::from_euler(glam::EulerRot::XYZ, 0.1 * f, 0.2, -0.3 * f);
            let scale = Vec3::new(1.0 + 0.1 * f, 1.0, 0.9);

            let node = scene.spawn(parent, Node::new(format!("Level {level}"))).unwrap();
            scene.set_transform(node, translation, rotation, scale).unwrap();

            expected *= Mat4::from_scale_rotation_translation(scale, rotation, translation);
            parent = node;
        }

        let world = scene.world_matrix(parent).unwrap();
        assert!(world.abs_diff_eq(expected, 1e-4), "depth {depth}");
    }
}

#[test]
fn test_detach_and_reattach_round_trip() {
    let (mut stage, _, _) = setup();
    let root = stage.scene.root();
    let shape = stage.scene.add_shape(shapes::cube(1.0).unwrap());
    let appearance = stage.scene.add_appearance(Appearance::basic(Color::WHITE));

    let group = stage.scene.spawn(root, Node::new("Group")).unwrap();
    stage.scene.set_position(group, Vec3::new(0.0, 1.0, -5.0)).unwrap();
    let child = stage
        .scene
        .spawn(
            group,
            Node::new("Child").with_renderable(Renderable::new(shape, appearance)),
        )
        .unwrap();
    stage.scene.set_rotation_euler(child, 0.0, 1.0, 0.0).unwrap();
    let before = stage.scene.world_matrix(child).unwrap();

    assert!(stage.scene.detach(group).unwrap());
    let list = lessongine::render::DrawList::prepare(&stage).unwrap();
    assert!(list.items.iter().all(|item| item.node != child));

    stage.scene.attach(root, group).unwrap();
    let after = stage.scene.world_matrix(child).unwrap();
    assert!(before.abs_diff_eq(after, 1e-6));

    let list = lessongine::render::DrawList::prepare(&stage).unwrap();
    assert!(list.items.iter().any(|item| item.node == child));
}

#[test]
fn test_pending_texture_renders_then_resolves() {
    let (mut stage, mut renderer, mut frame_loop) = setup();
    let root = stage.scene.root();
    let texture = stage.textures.insert_pending("late");
    let shape = stage.scene.add_shape(shapes::cube(1.0).unwrap());
    let appearance = stage
        .scene
        .add_appearance(Appearance::basic(Color::WHITE).with_color_map(texture));
    stage
        .scene
        .spawn(
            root,
            Node::new("Cube")
                .with_position(Vec3::new(0.0, 0.0, -3.0))
                .with_renderable(Renderable::new(shape, appearance)),
        )
        .unwrap();

    frame_loop.start(|_| Ok(())).unwrap();
    drive(&mut frame_loop, &mut stage, &mut renderer, &[0]);
    let first = renderer.last_frame().unwrap();
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.items[0].maps.color, None);
    assert_eq!(first.fallback_maps, 1);

    stage
        .textures
        .complete(texture, Ok(TextureImage::solid(Color::from_hex(0xff8800))));
    drive(&mut frame_loop, &mut stage, &mut renderer, &[16]);
    let second = renderer.last_frame().unwrap();
    assert_eq!(second.items[0].maps.color, Some(texture));
    assert_eq!(second.fallback_maps, 0);
    assert!(stage.textures.progress().is_finished());
}
