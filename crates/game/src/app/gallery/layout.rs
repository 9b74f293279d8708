const ARTWORK_HEIGHT: f64 = 1.5;
const ARTWORK_WALL_INSET: f64 = 0.15;
const CAMERA_CORNER_INSET: f64 = 0.5;
/// Floor half extents the layout coordinates below are drawn for. Other rooms
/// stretch them to fit.
const LAYOUT_HALF_EXTENTS: [f64; 2] = [10.0, 7.5];
const GUARD_PATROL: [[f64; 2]; 4] = [[-8.0, -6.0], [8.0, -6.0], [8.0, 6.0], [-8.0, 6.0]];
const ROBOT_PATROL: [[f64; 2]; 6] = [
    [-7.0, -5.0],
    [-7.0, 5.0],
    [0.0, 5.0],
    [7.0, 5.0],
    [7.0, -5.0],
    [0.0, -5.0],
];
const ROBOT_SPEED: f64 = 1.0;
const STANDING_VISITOR_PATH: [[f64; 2]; 8] = [
    [-5.0, 3.0],
    [-7.0, 0.0],
    [-7.0, -3.0],
    [0.0, -5.0],
    [7.0, -3.0],
    [7.0, 0.0],
    [5.0, 4.0],
    [-5.0, 3.0],
];
const WALKING_VISITOR_PATH: [[f64; 2]; 8] = [
    [-8.0, -5.5],
    [-5.0, -3.0],
    [-5.0, 0.0],
    [0.0, 0.0],
    [5.0, 0.0],
    [5.0, -3.0],
    [0.0, 4.5],
    [-8.0, -5.5],
];
const SMART_VISITOR_SPAWNS: [[f64; 2]; 2] = [[3.0, 2.0], [-2.0, -3.0]];
const GREETER_SPAWN: [f64; 2] = [6.0, -2.5];
const CONVERSATION_CENTER: [f64; 2] = [-3.0, 4.5];
const CONVERSATION_RADIUS: f64 = 0.8;
const WARDEN_ORIGIN: [f64; 2] = [-6.0, -4.0];
const WARDEN_PATROL_SPAN: f64 = 5.0;
const RING_SCULPTURE_POSITION: [f64; 3] = [0.0, 1.5, -2.0];
const ORBITAL_RINGS_POSITION: [f64; 3] = [4.0, 1.0, 0.0];
const GEAR_TRAIN_POSITION: [f64; 3] = [-4.0, 0.0, 0.0];
const AQUARIUM_POSITION: [f64; 2] = [8.0, 4.5];
const AQUARIUM_WALL_CLEARANCE: f64 = 0.1;
const HOLOGRAM_POSITION: [f64; 3] = [-8.0, 1.2, 4.5];
const CLOCK_POSITION_X: f64 = 3.5;
const CLOCK_HEIGHT: f64 = 2.6;
const CLOCK_WALL_INSET: f64 = 0.1;
const CLOCK_MARKERS: usize = 12;
const TORCH_HEIGHT: f64 = 2.5;
const TORCH_WALL_INSET: f64 = 0.2;
const TORCH_Z: [f64; 2] = [-5.0, 5.0];
const ARTWORK_BACK_X: [f64; 3] = [-7.0, 0.0, 7.0];
const ARTWORK_SIDE_Z: [f64; 2] = [-3.0, 3.0];
const LIGHT_SHAFT_X: [f64; 3] = [-5.0, 0.0, 5.0];
const JELLYFISH_TENTACLES: usize = 4;

/// Behaviour handles the scene reads back for its title and tests.
#[derive(Debug, Default)]
struct GalleryHandles {
    walkers: Vec<BehaviorHandle>,
    cameras: Vec<BehaviorHandle>,
    guard: Option<BehaviorHandle>,
    visitors: Vec<BehaviorHandle>,
    warden: Option<BehaviorHandle>,
    greeter: Option<BehaviorHandle>,
    robot: Option<BehaviorHandle>,
    conversation: Option<BehaviorHandle>,
    flock: Option<BehaviorHandle>,
    butterflies: Option<BehaviorHandle>,
    fish: Option<BehaviorHandle>,
    jellyfish: Option<BehaviorHandle>,
    clock: Option<BehaviorHandle>,
    hologram: Option<BehaviorHandle>,
    uniforms: Vec<BehaviorHandle>,
    artworks: Vec<DVec3>,
}

/// Spawns the whole room and registers one behaviour per animated group.
/// Registration order is update order inside a phase.
fn spawn_gallery(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
) -> Result<GalleryHandles, PathError> {
    let mut handles = GalleryHandles {
        artworks: spawn_artworks(config.room, world),
        ..GalleryHandles::default()
    };

    spawn_walkers(config, world, animator, &mut handles)?;
    spawn_security_cameras(config, world, animator, &mut handles)?;
    spawn_cleaning_robot(config, world, animator, &mut handles)?;
    spawn_conversation(config.room, world, animator, &mut handles);
    spawn_sculptures(config, world, animator);
    spawn_wall_clock(config, world, animator, &mut handles);

    spawn_flock(config, world, animator, &mut handles);
    spawn_butterflies(config, world, animator, &mut handles);
    spawn_aquarium(config, world, animator, &mut handles);

    spawn_guard(config, world, animator, &mut handles)?;
    spawn_visitors(config, world, animator, &mut handles);
    spawn_warden(config, world, animator, &mut handles)?;
    spawn_greeter(config, world, animator, &mut handles);

    spawn_shader_effects(config, world, animator, &mut handles);

    let wildlife = [
        handles.flock,
        handles.butterflies,
        handles.fish,
        handles.jellyfish,
    ];
    let ai = [
        handles.guard,
        handles.warden,
        handles.greeter,
        handles.robot,
        handles.conversation,
    ];
    let exhibits = [handles.clock, handles.hologram];
    debug!(
        behaviors = animator.len(),
        walkers = handles.walkers.len(),
        cameras = handles.cameras.len(),
        visitors = handles.visitors.len(),
        wildlife_groups = wildlife.iter().flatten().count(),
        ai_actors = ai.iter().flatten().count(),
        exhibits = exhibits.iter().flatten().count(),
        uniforms = handles.uniforms.len(),
        artworks = handles.artworks.len(),
        "gallery_layout_spawned"
    );
    Ok(handles)
}

/// Maps a layout floor coordinate into `room`.
fn room_point(room: RoomBounds, [x, z]: [f64; 2]) -> DVec3 {
    let [layout_x, layout_z] = LAYOUT_HALF_EXTENTS;
    DVec3::new(
        x * room.half_width() / layout_x,
        0.0,
        z * room.half_depth() / layout_z,
    )
}

fn room_position(room: RoomBounds, [x, y, z]: [f64; 3]) -> DVec3 {
    room_point(room, [x, z]) + DVec3::Y * y
}

fn floor_points(room: RoomBounds, points: &[[f64; 2]]) -> Vec<DVec3> {
    points.iter().map(|point| room_point(room, *point)).collect()
}

fn centered<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>() - 0.5
}

fn humanoid_desc(
    kind: EntityKind,
    name: &'static str,
    transform: Transform,
) -> (EntityDesc, LimbRig) {
    let mut desc = EntityDesc::new(kind, name, transform);
    let rig = LimbRig {
        head: desc.add_part("head", Transform::at(DVec3::new(0.0, 1.7, 0.0))),
        left_arm: desc.add_part("left_arm", Transform::at(DVec3::new(-0.3, 1.3, 0.0))),
        right_arm: desc.add_part("right_arm", Transform::at(DVec3::new(0.3, 1.3, 0.0))),
        left_leg: desc.add_part("left_leg", Transform::at(DVec3::new(-0.1, 0.45, 0.0))),
        right_leg: desc.add_part("right_leg", Transform::at(DVec3::new(0.1, 0.45, 0.0))),
    };
    (desc, rig)
}

fn emissive_material(desc: &mut EntityDesc, name: &'static str, intensity: f64) -> MaterialId {
    let mut uniforms = ShaderUniformState::default();
    uniforms.emissive_intensity = intensity;
    desc.add_material(name, uniforms)
}

/// Wall paintings: three on the back wall, two on each side wall.
fn spawn_artworks(room: RoomBounds, world: &mut SceneWorld) -> Vec<DVec3> {
    let back_z = -room.half_depth() + ARTWORK_WALL_INSET;
    let left_x = -room.half_width() + ARTWORK_WALL_INSET;
    let right_x = room.half_width() - ARTWORK_WALL_INSET;
    let back = ARTWORK_BACK_X.map(|x| {
        let x = room_point(room, [x, 0.0]).x;
        (DVec3::new(x, ARTWORK_HEIGHT, back_z), 0.0)
    });
    let sides = ARTWORK_SIDE_Z.into_iter().flat_map(|z| {
        let z = room_point(room, [0.0, z]).z;
        [
            (DVec3::new(left_x, ARTWORK_HEIGHT, z), FRAC_PI_2),
            (DVec3::new(right_x, ARTWORK_HEIGHT, z), -FRAC_PI_2),
        ]
    });

    back.into_iter()
        .chain(sides)
        .map(|(position, yaw)| {
            world.spawn(EntityDesc::new(
                EntityKind::Artwork,
                "artwork",
                Transform::at(position).with_yaw(yaw),
            ));
            position
        })
        .collect()
}

fn spawn_walkers(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) -> Result<(), PathError> {
    let walker = &config.walker;
    let room = config.room;
    let routes = [
        (
            "standing_visitor",
            floor_points(room, &STANDING_VISITOR_PATH),
            walker.standing_speed,
            Vec::new(),
        ),
        (
            "walking_visitor",
            floor_points(room, &WALKING_VISITOR_PATH),
            walker.walking_speed,
            walker.pause_points.clone(),
        ),
    ];

    for (name, waypoints, speed, pause_points) in routes {
        let path = Path::new(waypoints)?;
        let (desc, rig) = humanoid_desc(
            EntityKind::Visitor,
            name,
            Transform::at(path.first()).with_yaw(FRAC_PI_4),
        );
        let entity = world.spawn(desc);
        let motion = EntityMotionState::new(speed)
            .with_pauses(pause_points, walker.pause_duration_seconds);
        handles
            .walkers
            .push(animator.register(Behavior::Walker(PathWalker {
                entity,
                rig,
                path,
                motion,
                cycle_rate: walker.cycle_rate,
            })));
    }
    Ok(())
}

fn camera_desc(name: &'static str, position: DVec3, yaw: f64) -> EntityDesc {
    let mut desc = EntityDesc::new(
        EntityKind::SecurityCamera,
        name,
        Transform::at(position).with_yaw(yaw),
    );
    desc.add_part("body", Transform::default());
    desc.add_part("lens", Transform::at(DVec3::new(0.11, 0.0, 0.0)));
    desc.add_part("status_light", Transform::at(DVec3::new(-0.06, 0.06, 0.0)));
    desc
}

/// One camera rides a rail under the ceiling; a second one is bolted into the
/// far corner.
fn spawn_security_cameras(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) -> Result<(), PathError> {
    let room = config.room;
    let settings = config.security_camera;
    let height = room.height - settings.ceiling_offset;
    let x = room.half_width() - settings.wall_inset;
    let z = room.half_depth() - settings.wall_inset;
    let rail = Path::new(vec![
        DVec3::new(-x, height, -z),
        DVec3::new(x, height, -z),
        DVec3::new(x, height, z),
        DVec3::new(-x, height, z),
        DVec3::new(-x, height, -z),
    ])?;

    let patrol = world.spawn(camera_desc(
        "patrol_camera",
        rail.first(),
        settings.fixed_center_yaw,
    ));
    handles
        .cameras
        .push(animator.register(Behavior::SecurityCamera(SecurityCamera {
            entity: patrol,
            mount: CameraMount::Patrol {
                path: rail,
                progress: 0.0,
                speed: settings.path_speed,
                heading: settings.fixed_center_yaw,
            },
            sweep_angle: settings.sweep_angle,
            sweep_speed: settings.sweep_speed,
            sweep_time: 0.0,
        })));

    let corner = DVec3::new(
        room.half_width() - CAMERA_CORNER_INSET,
        height,
        -room.half_depth() + CAMERA_CORNER_INSET,
    );
    let fixed = world.spawn(camera_desc(
        "corner_camera",
        corner,
        settings.fixed_center_yaw,
    ));
    handles
        .cameras
        .push(animator.register(Behavior::SecurityCamera(SecurityCamera {
            entity: fixed,
            mount: CameraMount::Fixed {
                center_yaw: settings.fixed_center_yaw,
            },
            sweep_angle: settings.sweep_angle,
            sweep_speed: settings.sweep_speed,
            sweep_time: 0.0,
        })));
    Ok(())
}

fn spawn_cleaning_robot(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) -> Result<(), PathError> {
    let route = WaypointRoute::looped(
        floor_points(config.room, &ROBOT_PATROL),
        config.guard.capture_radius,
    )?;
    let start = route.waypoints()[0];

    let mut desc = EntityDesc::new(EntityKind::Robot, "cleaning_robot", Transform::at(start));
    desc.add_part("body", Transform::at(DVec3::new(0.0, 0.2, 0.0)));
    let head = desc.add_part("head", Transform::at(DVec3::new(0.0, 0.5, 0.0)));
    let wheels = [[-0.2, -0.2], [0.2, -0.2], [-0.2, 0.2], [0.2, 0.2]]
        .into_iter()
        .map(|[x, z]| {
            let mut transform = Transform::at(DVec3::new(x, 0.1, z));
            transform.rotation.z = FRAC_PI_2;
            desc.add_part("wheel", transform)
        })
        .collect();
    let entity = world.spawn(desc);

    handles.robot = Some(animator.register(Behavior::Robot(CleaningRobot {
        entity,
        route,
        wheels,
        head,
        speed: ROBOT_SPEED,
        position: start,
        yaw: 0.0,
        state: AiState::Patrol,
    })));
    Ok(())
}

/// Two or three visitors in a ring, facing the centre.
fn spawn_conversation(
    room: RoomBounds,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) {
    let count = 2 + animator.rng_mut().gen_range(0..2);
    let center = room_point(room, CONVERSATION_CENTER);

    let members = (0..count)
        .map(|index| {
            let angle = index as f64 / count as f64 * TAU;
            let offset = DVec3::new(angle.cos(), 0.0, angle.sin()) * CONVERSATION_RADIUS;
            let (desc, _) = humanoid_desc(
                EntityKind::Visitor,
                "conversing_visitor",
                Transform::at(center + offset).with_yaw(PI - angle),
            );
            ConversationMember {
                entity: world.spawn(desc),
                phase: index as f64 * PI,
                base_height: center.y,
            }
        })
        .collect();

    handles.conversation = Some(animator.register(Behavior::Conversation(
        ConversationGroup::new(members, 0.0),
    )));
}

fn spawn_sculptures(config: &GalleryConfig, world: &mut SceneWorld, animator: &mut Animator) {
    let kinetic = config.kinetic;
    let room = config.room;

    let mut desc = EntityDesc::new(
        EntityKind::Sculpture,
        "ring_sculpture",
        Transform::at(room_position(room, RING_SCULPTURE_POSITION)),
    );
    let outer_ring = desc.add_part("outer_ring", Transform::default());
    let mut middle = Transform::default();
    middle.rotation.x = FRAC_PI_2;
    let middle_ring = desc.add_part("middle_ring", middle);
    let sphere = desc.add_part("sphere", Transform::default());
    let ring_materials = [
        emissive_material(&mut desc, "outer_ring", 0.2),
        emissive_material(&mut desc, "middle_ring", 0.2),
    ];
    let sphere_material = emissive_material(&mut desc, "sphere", 0.3);
    let entity = world.spawn(desc);
    animator.register(Behavior::RingSculpture(RingSculpture {
        entity,
        outer_ring,
        middle_ring,
        sphere,
        ring_materials,
        sphere_material,
        rotation_speed: kinetic.ring_sculpture_speed,
        glow: kinetic.glow,
    }));

    let mut desc = EntityDesc::new(
        EntityKind::Sculpture,
        "orbital_rings",
        Transform::at(room_position(room, ORBITAL_RINGS_POSITION)),
    );
    desc.add_part("base", Transform::default());
    let rng = animator.rng_mut();
    let rings = (0..kinetic.orbital_ring_count)
        .map(|index| {
            let mut transform = Transform::at(DVec3::new(0.0, 0.1 + index as f64 * 0.2, 0.0));
            transform.rotation.x = FRAC_PI_2;
            OrbitalRing {
                part: desc.add_part("ring", transform),
                axis: if rng.gen_bool(0.5) { RingAxis::X } else { RingAxis::Y },
                speed: 0.5 + rng.gen::<f64>() * 0.5,
                phase: rng.gen::<f64>() * TAU,
            }
        })
        .collect();
    let sphere = desc.add_part(
        "sphere",
        Transform::at(DVec3::new(0.0, kinetic.orbital_sphere_height, 0.0)),
    );
    let entity = world.spawn(desc);
    animator.register(Behavior::OrbitalRings(OrbitalRings {
        entity,
        rings,
        sphere,
        sphere_height: kinetic.orbital_sphere_height,
    }));

    let mut desc = EntityDesc::new(
        EntityKind::Sculpture,
        "gear_train",
        Transform::at(room_position(room, GEAR_TRAIN_POSITION)),
    );
    let gears = (0..kinetic.gear_count)
        .map(|index| {
            let offset = DVec3::new(index as f64 * 0.6 - 0.6, 1.5 + index as f64 * 0.3, 0.0);
            Gear {
                part: desc.add_part("gear", Transform::at(offset)),
                rotation_speed: GearTrain::alternating_speed(index),
            }
        })
        .collect();
    let entity = world.spawn(desc);
    animator.register(Behavior::Gears(GearTrain { entity, gears }));
}

/// Analog clock above the back wall paintings, set to the configured time of
/// day or the host clock.
fn spawn_wall_clock(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) {
    let room = config.room;
    let position = DVec3::new(
        room_point(room, [CLOCK_POSITION_X, 0.0]).x,
        CLOCK_HEIGHT,
        -room.half_depth() + CLOCK_WALL_INSET,
    );
    let mut desc = EntityDesc::new(EntityKind::Exhibit, "wall_clock", Transform::at(position));
    desc.add_part("face", Transform::default());
    for index in 0..CLOCK_MARKERS {
        let angle = index as f64 / CLOCK_MARKERS as f64 * TAU;
        let offset = DVec3::new(angle.sin() * 0.4, angle.cos() * 0.4, 0.01);
        desc.add_part("marker", Transform::at(offset));
    }
    let hand = Transform::at(DVec3::new(0.0, 0.0, 0.02));
    let hour_hand = desc.add_part("hour_hand", hand);
    let minute_hand = desc.add_part("minute_hand", hand);
    let second_hand = desc.add_part("second_hand", hand);
    let entity = world.spawn(desc);

    let start_seconds = config
        .kinetic
        .clock_start_seconds
        .unwrap_or_else(wall_clock_seconds);
    debug!(entity = entity.0, start_seconds, "wall_clock_set");
    handles.clock = Some(animator.register(Behavior::Clock(WallClock {
        entity,
        hour_hand,
        minute_hand,
        second_hand,
        start_seconds,
    })));
}

fn winged_desc(
    kind: EntityKind,
    name: &'static str,
    position: DVec3,
) -> (EntityDesc, [PartId; 2]) {
    let mut desc = EntityDesc::new(kind, name, Transform::at(position));
    desc.add_part("body", Transform::default());
    let left = desc.add_part("left_wing", Transform::at(DVec3::new(-0.05, 0.0, 0.0)));
    let right = desc.add_part("right_wing", Transform::at(DVec3::new(0.05, 0.0, 0.0)));
    (desc, [left, right])
}

/// Birds start in the upper part of the room, inside the middle 80% of the
/// floor.
fn spawn_flock(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) {
    let room = config.room;
    let rng = animator.rng_mut();
    let birds = (0..config.flock.count)
        .map(|_| {
            let position = DVec3::new(
                centered(rng) * room.width * 0.8,
                room.height * 0.6 + rng.gen::<f64>() * room.height * 0.3,
                centered(rng) * room.depth * 0.8,
            );
            let velocity = DVec3::new(
                centered(rng) * 0.05,
                centered(rng) * 0.02,
                centered(rng) * 0.05,
            );
            let (desc, [left_wing, right_wing]) = winged_desc(EntityKind::Bird, "bird", position);
            Bird {
                entity: world.spawn(desc),
                left_wing,
                right_wing,
                position,
                velocity,
                wing_phase: rng.gen::<f64>() * TAU,
                rotation: DVec3::ZERO,
            }
        })
        .collect();

    handles.flock = Some(animator.register(Behavior::Flock(Flock::new(birds, config.flock))));
}

fn spawn_butterflies(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) {
    let room = config.room;
    let rng = animator.rng_mut();
    let butterflies = (0..config.butterflies.count)
        .map(|_| {
            let position = DVec3::new(
                centered(rng) * room.width * 0.6,
                0.5 + rng.gen::<f64>() * 2.0,
                centered(rng) * room.depth * 0.6,
            );
            let velocity = DVec3::new(
                centered(rng) * 0.02,
                centered(rng) * 0.01,
                centered(rng) * 0.02,
            );
            let (desc, [left_wing, right_wing]) =
                winged_desc(EntityKind::Butterfly, "butterfly", position);
            Butterfly {
                entity: world.spawn(desc),
                left_wing,
                right_wing,
                position,
                velocity,
                wing_phase: rng.gen::<f64>() * TAU,
                wander_angle: rng.gen::<f64>() * TAU,
                rotation: DVec3::ZERO,
            }
        })
        .collect();

    handles.butterflies = Some(animator.register(Behavior::Butterflies(ButterflySwarm {
        butterflies,
        config: config.butterflies,
    })));
}

/// Tank centre for the layout spot, pulled in so the whole tank clears the
/// walls.
fn aquarium_center(room: RoomBounds, aquarium: &AquariumConfig) -> DVec3 {
    let spot = room_point(room, AQUARIUM_POSITION);
    let half = aquarium.half_extents();
    let limit_x = (room.half_width() - half.x - AQUARIUM_WALL_CLEARANCE).max(0.0);
    let limit_z = (room.half_depth() - half.z - AQUARIUM_WALL_CLEARANCE).max(0.0);
    DVec3::new(
        spot.x.clamp(-limit_x, limit_x),
        aquarium.water_center_height,
        spot.z.clamp(-limit_z, limit_z),
    )
}

/// Tank on a stand with a school of fish and a couple of jellyfish. The water
/// shader clock accumulates frame deltas.
fn spawn_aquarium(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) {
    let aquarium = config.aquarium;
    let half = aquarium.half_extents();
    let tank_center = aquarium_center(config.room, &aquarium);

    let mut desc = EntityDesc::new(
        EntityKind::Exhibit,
        "aquarium",
        Transform::at(DVec3::new(tank_center.x, 0.0, tank_center.z)),
    );
    desc.add_part("stand", Transform::at(DVec3::new(0.0, 0.4, 0.0)));
    desc.add_part("tank", Transform::at(DVec3::new(0.0, tank_center.y, 0.0)));
    let water = desc.add_material("water", ShaderUniformState::default());
    let tank = world.spawn(desc);
    handles.uniforms.push(animator.register(Behavior::Ticker(
        UniformTicker::new(tank, water, UniformMode::Accumulate)
            .with_wrap_period(config.uniforms.wrap_period),
    )));

    let rng = animator.rng_mut();
    let fish = (0..aquarium.fish_count)
        .map(|_| {
            let offset = DVec3::new(
                centered(rng) * 1.5,
                -0.3 + centered(rng),
                centered(rng) * 0.5,
            )
            .clamp(-half, half);
            let velocity = DVec3::new(
                centered(rng) * 0.01,
                centered(rng) * 0.005,
                centered(rng) * 0.01,
            );
            let position = tank_center + offset;
            let mut desc = EntityDesc::new(EntityKind::Fish, "fish", Transform::at(position));
            desc.add_part("body", Transform::default());
            let tail = desc.add_part("tail", Transform::at(DVec3::new(0.0, 0.0, -0.1)));
            Fish {
                entity: world.spawn(desc),
                tail,
                position,
                velocity,
                rotation: DVec3::ZERO,
            }
        })
        .collect();

    let jellies = (0..aquarium.jellyfish_count)
        .map(|_| {
            let position =
                tank_center + DVec3::new(centered(rng) * half.x, centered(rng) * half.y, 0.0);
            let mut desc =
                EntityDesc::new(EntityKind::Jellyfish, "jellyfish", Transform::at(position));
            let bell = desc.add_part("bell", Transform::default());
            let tentacles = (0..JELLYFISH_TENTACLES)
                .map(|index| {
                    let angle = index as f64 / JELLYFISH_TENTACLES as f64 * TAU;
                    let offset = DVec3::new(angle.cos() * 0.04, -0.08, angle.sin() * 0.04);
                    desc.add_part("tentacle", Transform::at(offset))
                })
                .collect();
            Jellyfish {
                entity: world.spawn(desc),
                bell,
                tentacles,
                position,
                drift: DVec3::ZERO,
                pulse_phase: rng.gen::<f64>() * TAU,
            }
        })
        .collect();

    handles.fish = Some(animator.register(Behavior::Fish(FishSchool {
        tank_center,
        fish,
        config: aquarium,
    })));
    handles.jellyfish = Some(animator.register(Behavior::Jellyfish(JellyfishTank {
        tank_center,
        jellies,
        config: aquarium,
    })));
}

fn guard_desc(
    kind: EntityKind,
    name: &'static str,
    position: DVec3,
) -> (EntityDesc, LimbRig, PartId) {
    let (mut desc, rig) = humanoid_desc(kind, name, Transform::at(position));
    desc.add_part("cap", Transform::at(DVec3::new(0.0, 2.0, 0.0)));
    let indicator = desc.add_hidden_part(
        INDICATOR_PART_NAME,
        Transform::at(DVec3::new(0.0, 2.3, 0.0)),
    );
    (desc, rig, indicator)
}

fn spawn_guard(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) -> Result<(), PathError> {
    let route = WaypointRoute::looped(
        floor_points(config.room, &GUARD_PATROL),
        config.guard.capture_radius,
    )?;
    let start = route.waypoints()[0];
    let (desc, _, indicator) = guard_desc(EntityKind::Guard, "guard", start);
    let entity = world.spawn(desc);

    handles.guard = Some(animator.register(Behavior::Guard(
        Guard::new(entity, route, start, config.guard).with_indicator(indicator),
    )));
    Ok(())
}

fn spawn_visitors(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) {
    for spawn in SMART_VISITOR_SPAWNS {
        let position = room_point(config.room, spawn);
        let (desc, rig) = humanoid_desc(EntityKind::Visitor, "visitor", Transform::at(position));
        let entity = world.spawn(desc);
        let visitor =
            Visitor::new(entity, position, config.visitor, animator.rng_mut()).with_rig(rig);
        handles
            .visitors
            .push(animator.register(Behavior::Visitor(visitor)));
    }
}

/// Square beat starting at its origin; watches every wall painting.
fn spawn_warden(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) -> Result<(), PathError> {
    let [x, z] = WARDEN_ORIGIN;
    let span = WARDEN_PATROL_SPAN;
    let route = WaypointRoute::looped(
        floor_points(
            config.room,
            &[[x, z], [x + span, z], [x + span, z + span], [x, z + span]],
        ),
        config.warden.capture_radius,
    )?;
    let start = route.waypoints()[0];
    let (desc, _, indicator) = guard_desc(EntityKind::Warden, "warden", start);
    let entity = world.spawn(desc);

    handles.warden = Some(animator.register(Behavior::Warden(
        Warden::new(entity, route, handles.artworks.clone(), start, config.warden)
            .with_indicator(indicator),
    )));
    Ok(())
}

fn spawn_greeter(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) {
    let position = room_point(config.room, GREETER_SPAWN);
    let (mut desc, _) = humanoid_desc(EntityKind::Visitor, "greeter", Transform::at(position));
    let indicator = desc.add_hidden_part(
        INDICATOR_PART_NAME,
        Transform::at(DVec3::new(0.0, config.greeter.indicator_height, 0.0)),
    );
    let entity = world.spawn(desc);
    handles.greeter = Some(animator.register(Behavior::Greeter(
        Greeter::new(entity, position, config.greeter).with_indicator(indicator),
    )));
}

/// Torch flames flicker, light shafts shimmer and the hologram spins while
/// its scanlines read the absolute clock.
fn spawn_shader_effects(
    config: &GalleryConfig,
    world: &mut SceneWorld,
    animator: &mut Animator,
    handles: &mut GalleryHandles,
) {
    let room = config.room;
    let uniforms = config.uniforms;
    let torch_x = room.half_width() - TORCH_WALL_INSET;

    let torch_z = TORCH_Z.map(|z| room_point(room, [0.0, z]).z);
    let torches = [-torch_x, torch_x]
        .into_iter()
        .flat_map(|x| torch_z.map(|z| DVec3::new(x, TORCH_HEIGHT, z)));
    for (index, position) in torches.enumerate() {
        let mut desc = EntityDesc::new(EntityKind::Exhibit, "torch", Transform::at(position));
        desc.add_part("flame", Transform::default());
        let flame = emissive_material(&mut desc, "flame", uniforms.torch_flicker.base);
        let entity = world.spawn(desc);
        handles.uniforms.push(animator.register(Behavior::Oscillator(UniformOscillator {
            entity,
            material: flame,
            channel: UniformChannel::Emissive,
            wave: Oscillation {
                phase: uniforms.torch_flicker.phase + index as f64,
                ..uniforms.torch_flicker
            },
        })));
    }

    for (index, x) in LIGHT_SHAFT_X.into_iter().enumerate() {
        let x = room_point(room, [x, 0.0]).x;
        let position = DVec3::new(x, room.height * 0.5, -room.half_depth() * 0.5);
        let mut desc = EntityDesc::new(EntityKind::Exhibit, "light_shaft", Transform::at(position));
        let mut haze = ShaderUniformState::default();
        haze.opacity = uniforms.light_shaft.base;
        let material = desc.add_material("haze", haze);
        let entity = world.spawn(desc);
        handles.uniforms.push(animator.register(Behavior::Oscillator(UniformOscillator {
            entity,
            material,
            channel: UniformChannel::Opacity,
            wave: Oscillation {
                phase: uniforms.light_shaft.phase + index as f64,
                ..uniforms.light_shaft
            },
        })));
    }

    let mut desc = EntityDesc::new(
        EntityKind::Exhibit,
        "hologram",
        Transform::at(room_position(room, HOLOGRAM_POSITION)),
    );
    desc.add_part("base", Transform::at(DVec3::new(0.0, -1.0, 0.0)));
    let projection = desc.add_part("projection", Transform::default());
    let particles = desc.add_part("particles", Transform::default());
    let scanlines = desc.add_material("scanlines", ShaderUniformState::default());
    let entity = world.spawn(desc);
    handles.hologram = Some(animator.register(Behavior::Hologram(HologramProjector {
        entity,
        projection,
        particles,
        projection_spin: config.kinetic.hologram_spin,
        particle_spin: config.kinetic.hologram_particle_spin,
    })));
    handles.uniforms.push(animator.register(Behavior::Ticker(
        UniformTicker::new(entity, scanlines, UniformMode::Absolute)
            .with_wrap_period(uniforms.wrap_period),
    )));
}
