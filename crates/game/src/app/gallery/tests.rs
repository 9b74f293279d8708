use super::*;
use std::time::Duration;

use gallery_engine::app::{run_headless, EntityId, FrameDriver, FRAME_PHASE_ORDER};

const FRAME: Duration = Duration::from_micros(16_667);
const DT: f64 = 1.0 / 60.0;

fn gallery_driver(config: GalleryConfig) -> FrameDriver {
    let room = config.room;
    FrameDriver::new(
        build_scene(config),
        SceneWorld::with_room(room),
        Duration::from_millis(250),
    )
}

fn loaded_scene() -> (GalleryScene, SceneWorld) {
    let config = GalleryConfig::default();
    let mut world = SceneWorld::with_room(config.room);
    let mut scene = GalleryScene::new(config);
    scene.load(&mut world);
    world.apply_pending();
    (scene, world)
}

fn step_scene(scene: &mut GalleryScene, world: &mut SceneWorld, frames: u64) {
    let input = InputSnapshot::empty();
    for frame_index in 0..frames {
        let frame = FrameTime {
            delta_seconds: DT,
            elapsed_seconds: (frame_index + 1) as f64 * DT,
            frame_index,
            clamped: false,
        };
        for phase in FRAME_PHASE_ORDER {
            scene.update_phase(phase, &frame, &input, world);
        }
    }
}

fn entity_positions(world: &SceneWorld) -> Vec<DVec3> {
    world
        .entities()
        .iter()
        .map(|entity| entity.transform.position)
        .collect()
}

fn walker_entity(scene: &GalleryScene, index: usize) -> EntityId {
    let handle = scene.handles.walkers[index];
    match scene.animator.get(handle) {
        Some(Behavior::Walker(walker)) => walker.entity,
        other => panic!("expected walker, got {other:?}"),
    }
}

fn hold(actions: &[InputAction]) -> InputSnapshot {
    actions
        .iter()
        .fold(InputSnapshot::empty(), |snapshot, action| {
            snapshot.with_action_down(*action, true)
        })
}

#[test]
fn load_spawns_every_exhibit_group() {
    let (scene, world) = loaded_scene();
    let config = GalleryConfig::default();

    assert_eq!(scene.handles.walkers.len(), 2);
    assert_eq!(scene.handles.cameras.len(), 2);
    assert_eq!(scene.handles.visitors.len(), SMART_VISITOR_SPAWNS.len());
    assert!(scene.handles.guard.is_some());
    assert!(scene.handles.warden.is_some());
    assert!(scene.handles.greeter.is_some());
    assert!(scene.handles.clock.is_some());
    assert!(scene.handles.hologram.is_some());
    assert!(scene.handles.robot.is_some());
    assert!(scene.handles.conversation.is_some());
    assert!(scene.handles.flock.is_some());
    assert!(scene.handles.butterflies.is_some());
    assert!(scene.handles.fish.is_some());
    assert!(scene.handles.jellyfish.is_some());
    // water, four torches, three light shafts, hologram
    assert_eq!(scene.handles.uniforms.len(), 9);

    assert_eq!(world.entities_of_kind(EntityKind::Artwork).count(), 7);
    assert_eq!(
        world.entities_of_kind(EntityKind::Bird).count(),
        config.flock.count
    );
    assert_eq!(
        world.entities_of_kind(EntityKind::Butterfly).count(),
        config.butterflies.count
    );
    assert_eq!(
        world.entities_of_kind(EntityKind::Fish).count(),
        config.aquarium.fish_count
    );
    assert_eq!(world.entities_of_kind(EntityKind::SecurityCamera).count(), 2);
}

#[test]
fn guard_warden_and_greeter_carry_hidden_indicators() {
    let (_, world) = loaded_scene();
    let greeter = world
        .entities()
        .iter()
        .find(|entity| entity.debug_name == "greeter")
        .expect("greeter");
    let ai_entities = [EntityKind::Guard, EntityKind::Warden]
        .into_iter()
        .map(|kind| world.entities_of_kind(kind).next().expect("ai entity"))
        .chain([greeter]);
    for entity in ai_entities {
        let part = entity
            .find_part(INDICATOR_PART_NAME)
            .and_then(|id| entity.part(id))
            .expect("indicator part");
        assert!(!part.visible);
    }
}

#[test]
fn fish_start_inside_the_tank() {
    let (_, world) = loaded_scene();
    let config = GalleryConfig::default();
    let aquarium = config.aquarium;
    let center = aquarium_center(config.room, &aquarium);
    let half = aquarium.half_extents();
    for fish in world.entities_of_kind(EntityKind::Fish) {
        let offset = (fish.transform.position - center).abs();
        assert!(offset.cmple(half + DVec3::splat(1e-9)).all(), "{offset:?}");
    }
}

#[test]
fn every_frame_runs_phases_in_order() {
    let mut driver = gallery_driver(GalleryConfig::default());
    driver.step(FRAME, &InputSnapshot::empty());
    assert_eq!(driver.last_frame_order(), FRAME_PHASE_ORDER.as_slice());
}

#[test]
fn walkers_follow_their_paths_on_the_floor() {
    let (mut scene, mut world) = loaded_scene();
    let standing = walker_entity(&scene, 0);
    let start = floor_points(RoomBounds::default(), &STANDING_VISITOR_PATH)[0];

    step_scene(&mut scene, &mut world, 120);

    let position = world.find_entity(standing).expect("walker").transform.position;
    assert!(position.distance(start) > 0.01, "{position:?}");
    assert_eq!(position.y, 0.0);
}

#[test]
fn flock_stays_inside_the_room() {
    let mut driver = gallery_driver(GalleryConfig::default());
    let input = InputSnapshot::empty();
    for _ in 0..600 {
        driver.step(FRAME, &input);
    }
    let room = driver.world().room();
    for bird in driver.world().entities_of_kind(EntityKind::Bird) {
        assert!(room.contains(bird.transform.position), "{:?}", bird.transform.position);
    }
}

#[test]
fn guard_chases_a_player_standing_next_to_it() {
    let mut driver = gallery_driver(GalleryConfig::default());
    driver.load();
    let title = driver.debug_title().expect("title");
    assert!(title.contains("guard: patrol"), "{title}");

    let guard_start = floor_points(RoomBounds::default(), &GUARD_PATROL)[0];
    driver.world_mut().player_mut().position =
        DVec3::new(guard_start.x + 0.5, PLAYER_EYE_HEIGHT, guard_start.z);
    driver.step(FRAME, &InputSnapshot::empty());

    let title = driver.debug_title().expect("title");
    assert!(title.contains("guard: chasing"), "{title}");
}

#[test]
fn hologram_clock_tracks_elapsed_time() {
    let mut driver = gallery_driver(GalleryConfig::default());
    let input = InputSnapshot::empty();
    for _ in 0..30 {
        driver.step(FRAME, &input);
    }
    let hologram = driver
        .world()
        .entities()
        .iter()
        .find(|entity| entity.debug_name == "hologram")
        .expect("hologram");
    let elapsed = driver.elapsed().as_secs_f64();
    let time = hologram.materials()[0].uniforms.time;
    assert!((time - elapsed).abs() < 1e-9);

    let spin = |name| {
        let part = hologram.find_part(name).and_then(|id| hologram.part(id));
        part.expect("hologram part").transform.rotation.y
    };
    assert!((spin("projection") - elapsed * 0.5).abs() < 1e-9);
    assert!((spin("particles") - elapsed * 0.3).abs() < 1e-9);
}

#[test]
fn wall_clock_shows_the_configured_time() {
    let mut config = GalleryConfig::default();
    config.kinetic.clock_start_seconds = Some(3.0 * 3_600.0);
    let mut driver = gallery_driver(config);
    let input = InputSnapshot::empty();
    for _ in 0..90 {
        driver.step(FRAME, &input);
    }
    let clock = driver
        .world()
        .entities()
        .iter()
        .find(|entity| entity.debug_name == "wall_clock")
        .expect("wall clock");
    let hand = |name| {
        let part = clock.find_part(name).and_then(|id| clock.part(id));
        part.expect("hand").transform.rotation.z
    };
    assert!((hand("hour_hand") + FRAC_PI_2).abs() < 1e-9);
    assert!((hand("minute_hand") + TAU / 3_600.0).abs() < 1e-9);
    assert!((hand("second_hand") + TAU / 60.0).abs() < 1e-9);
}

#[test]
fn greeter_looks_at_then_waves_to_a_player_who_walks_up() {
    let mut driver = gallery_driver(GalleryConfig::default());
    driver.load();
    let title = driver.debug_title().expect("title");
    assert!(title.contains("greeter: idle"), "{title}");

    let spot = room_point(RoomBounds::default(), GREETER_SPAWN);
    driver.world_mut().player_mut().position = DVec3::new(spot.x - 1.0, PLAYER_EYE_HEIGHT, spot.z);
    driver.step(FRAME, &InputSnapshot::empty());
    let title = driver.debug_title().expect("title");
    assert!(title.contains("greeter: observing"), "{title}");

    for _ in 0..40 {
        driver.step(FRAME, &InputSnapshot::empty());
    }
    let title = driver.debug_title().expect("title");
    assert!(title.contains("greeter: waving"), "{title}");
}

#[test]
fn layout_stretches_with_the_room() {
    let room = RoomBounds::default();
    assert_eq!(room_point(room, [8.0, -6.0]), DVec3::new(8.0, 0.0, -6.0));

    let small = RoomBounds {
        width: 10.0,
        depth: 8.0,
        height: 4.0,
    };
    assert_eq!(room_point(small, [8.0, -6.0]), DVec3::new(4.0, 0.0, -3.2));
    let tank = aquarium_center(small, &GalleryConfig::default().aquarium);
    assert!(tank.x + GalleryConfig::default().aquarium.half_extents().x < small.half_width());
}

#[test]
fn small_room_keeps_every_entity_inside_the_walls() {
    let config = GalleryConfig::from_json_str(
        r#"{ "room": { "width": 10.0, "depth": 8.0, "height": 4.0 } }"#,
        std::path::Path::new("small_room.json"),
    )
    .expect("small room");
    let mut driver = gallery_driver(config);
    driver.load();
    let room = driver.world().room();
    let (limit_x, limit_z) = player_bounds(room);
    let player = driver.world().player().position;
    assert!(player.x.abs() <= limit_x && player.z.abs() <= limit_z, "{player:?}");

    let input = hold(&[InputAction::MoveForward, InputAction::StrafeRight]);
    for _ in 0..600 {
        driver.step(FRAME, &input);
        let world = driver.world();
        for entity in world.entities() {
            let position = entity.transform.position;
            assert!(
                position.x.abs() <= room.half_width() && position.z.abs() <= room.half_depth(),
                "{} outside the walls at {position:?}",
                entity.debug_name
            );
        }
    }
    let player = driver.world().player().position;
    assert!(player.x.abs() <= limit_x && player.z.abs() <= limit_z, "{player:?}");
}

#[test]
fn overlay_toggle_hides_minimap_but_keeps_refreshing() {
    let mut driver = gallery_driver(GalleryConfig::default());
    driver.step(FRAME, &InputSnapshot::empty());
    assert!(driver.world().minimap().is_visible());

    driver.step(
        FRAME,
        &InputSnapshot::empty().with_overlay_toggle_pressed(true),
    );
    assert!(!driver.world().minimap().is_visible());
    assert_eq!(
        driver.world().minimap().markers().len(),
        driver.world().entity_count() + 1
    );

    driver.step(FRAME, &InputSnapshot::empty());
    assert!(!driver.world().minimap().is_visible());
}

#[test]
fn same_seed_replays_the_same_frames() {
    let mut first = gallery_driver(GalleryConfig::default());
    let mut second = gallery_driver(GalleryConfig::default());
    let input = InputSnapshot::empty();
    for _ in 0..120 {
        first.step(FRAME, &input);
        second.step(FRAME, &input);
    }
    assert_eq!(entity_positions(first.world()), entity_positions(second.world()));
}

#[test]
fn reset_restores_the_initial_layout() {
    let mut fresh = gallery_driver(GalleryConfig::default());
    fresh.load();

    let mut driver = gallery_driver(GalleryConfig::default());
    let input = InputSnapshot::empty().with_action_down(InputAction::MoveForward, true);
    for _ in 0..90 {
        driver.step(FRAME, &input);
    }
    assert_ne!(driver.world().player().position, fresh.world().player().position);

    driver.step(FRAME, &InputSnapshot::empty().with_reset_pressed(true));
    assert_eq!(driver.world().entity_count(), fresh.world().entity_count());
    assert_eq!(entity_positions(driver.world()), entity_positions(fresh.world()));
    assert_eq!(driver.world().player(), fresh.world().player());
}

#[test]
fn headless_run_reports_frames_and_time() {
    let mut driver = gallery_driver(GalleryConfig::default());
    let summary = run_headless(&mut driver, 30, FRAME);
    assert_eq!(summary.frames_run, 30);
    assert_eq!(summary.clamped_frames, 0);
    assert!(!summary.quit_requested);
    assert!(summary.entity_count > 0);
    assert!((summary.elapsed_seconds - 30.0 * FRAME.as_secs_f64()).abs() < 1e-9);
}

#[test]
fn long_frames_are_clamped() {
    let mut driver = gallery_driver(GalleryConfig::default());
    let outcome = driver.step(Duration::from_secs(2), &InputSnapshot::empty());
    assert!(outcome.frame.clamped);
    assert!((outcome.frame.delta_seconds - 0.25).abs() < 1e-12);
    assert_eq!(driver.clamped_frames(), 1);
}

#[test]
fn player_walks_forward_and_settles_near_move_speed() {
    let mut camera = PlayerCamera {
        position: DVec3::new(0.0, PLAYER_EYE_HEIGHT, 0.0),
        yaw: 0.0,
        velocity: DVec3::ZERO,
    };
    let input = hold(&[InputAction::MoveForward]);
    for _ in 0..120 {
        update_player(&mut camera, &input, DT, RoomBounds::default());
    }
    assert!(camera.position.z > 5.0, "{:?}", camera.position);
    assert!(camera.position.x.abs() < 1e-9);
    let speed = camera.velocity.length();
    assert!(speed > 4.0 && speed < PLAYER_MOVE_SPEED, "{speed}");
}

#[test]
fn player_is_clamped_to_the_walls_at_eye_height() {
    let mut camera = PlayerCamera {
        position: DVec3::new(9.0, 3.0, 0.0),
        yaw: FRAC_PI_2,
        velocity: DVec3::ZERO,
    };
    let input = hold(&[InputAction::MoveForward, InputAction::StrafeRight]);
    for _ in 0..240 {
        update_player(&mut camera, &input, DT, RoomBounds::default());
    }
    assert_eq!(camera.position.x, 9.5);
    assert_eq!(camera.position.z, 7.0);
    assert_eq!(camera.position.y, PLAYER_EYE_HEIGHT);

    let small = RoomBounds {
        width: 10.0,
        depth: 8.0,
        height: 4.0,
    };
    for _ in 0..240 {
        update_player(&mut camera, &input, DT, small);
    }
    assert_eq!(camera.position.x, 4.5);
    assert_eq!(camera.position.z, 3.5);
}

#[test]
fn player_turns_with_keys_and_mouse() {
    let mut camera = PlayerCamera::default();
    let start = camera.yaw;
    update_player(&mut camera, &hold(&[InputAction::TurnLeft]), 0.5, RoomBounds::default());
    assert!((camera.yaw - (start + PLAYER_TURN_SPEED * 0.5)).abs() < 1e-12);

    let yaw = camera.yaw;
    update_player(
        &mut camera,
        &InputSnapshot::empty().with_look_delta(-0.2),
        DT,
        RoomBounds::default(),
    );
    assert!((camera.yaw - (yaw - 0.2)).abs() < 1e-12);
}

#[test]
fn zero_delta_leaves_the_player_untouched() {
    let mut camera = PlayerCamera::default();
    let before = camera;
    update_player(
        &mut camera,
        &hold(&[InputAction::MoveForward]),
        0.0,
        RoomBounds::default(),
    );
    assert_eq!(camera, before);
}

#[test]
fn missing_behaviours_render_as_dash() {
    assert_eq!(ai_state_label(None), "-");
    assert_eq!(ai_state_label(Some(AiState::Warning)), "warning");
    assert_eq!(ai_state_label(Some(AiState::Waving)), "waving");
}
