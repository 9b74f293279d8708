//! Per-frame behaviour updaters for everything that moves or glows in the
//! gallery, and the [`Animator`] that runs them phase by phase.

mod ai;
mod flock;
mod geometry;
mod kinetic;
mod motion;
mod path;
mod uniforms;
mod wildlife;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::app::{FramePhase, FrameTime, SceneWorld, FRAME_PHASE_ORDER};

pub use ai::{
    move_towards, random_route, AiState, CleaningRobot, ConversationGroup, ConversationMember,
    Greeter, GreeterConfig, Guard, GuardConfig, RouteStep, Visitor, VisitorConfig, Warden,
    WardenConfig, WaypointRoute,
};
pub use flock::{Bird, Flock, FlockConfig, FlockIntegration};
pub use geometry::{
    clamp_length, forward_from_yaw, horizontal_distance, look_rotation, yaw_from_direction,
    yaw_towards, RoomBounds,
};
pub use kinetic::{
    wall_clock_seconds, Gear, GearTrain, HologramProjector, KineticConfig, OrbitalRing,
    OrbitalRings, RingAxis, RingSculpture, WallClock,
};
pub use motion::{
    sample_with_heading, wrap_progress, CameraMount, EntityMotionState, LimbRig, MotionStep,
    PathWalker, SecurityCamera, IDLE_SWAY_AMPLITUDE, LIMB_SWING_AMPLITUDE, LOOK_AHEAD,
    PAUSE_POINT_TOLERANCE,
};
pub use path::{Path, PathError, MIN_PATH_WAYPOINTS};
pub use uniforms::{
    wrap_phase, Oscillation, UniformChannel, UniformMode, UniformOscillator, UniformTicker,
};
pub use wildlife::{
    AquariumConfig, Butterfly, ButterflyConfig, ButterflySwarm, Fish, FishSchool, Jellyfish,
    JellyfishTank,
};

/// Rate the per-frame tuning constants were authored at.
pub const REFERENCE_HZ: f64 = 60.0;

/// Converts per-frame constants into a step of `dt` seconds.
pub fn frame_scale(dt: f64) -> f64 {
    dt * REFERENCE_HZ
}

/// One registered updater.
#[derive(Debug, Clone)]
pub enum Behavior {
    Walker(PathWalker),
    SecurityCamera(SecurityCamera),
    Robot(CleaningRobot),
    Conversation(ConversationGroup),
    RingSculpture(RingSculpture),
    OrbitalRings(OrbitalRings),
    Gears(GearTrain),
    Clock(WallClock),
    Hologram(HologramProjector),
    Flock(Flock),
    Butterflies(ButterflySwarm),
    Fish(FishSchool),
    Jellyfish(JellyfishTank),
    Guard(Guard),
    Visitor(Visitor),
    Warden(Warden),
    Greeter(Greeter),
    Ticker(UniformTicker),
    Oscillator(UniformOscillator),
}

impl Behavior {
    pub fn phase(&self) -> FramePhase {
        match self {
            Self::Walker(_)
            | Self::SecurityCamera(_)
            | Self::Robot(_)
            | Self::Conversation(_)
            | Self::RingSculpture(_)
            | Self::OrbitalRings(_)
            | Self::Gears(_)
            | Self::Clock(_)
            | Self::Hologram(_) => FramePhase::Actors,
            Self::Flock(_) | Self::Butterflies(_) | Self::Fish(_) | Self::Jellyfish(_) => {
                FramePhase::Wildlife
            }
            Self::Guard(_) | Self::Visitor(_) | Self::Warden(_) | Self::Greeter(_) => {
                FramePhase::Ai
            }
            Self::Ticker(_) | Self::Oscillator(_) => FramePhase::Uniforms,
        }
    }

    pub fn ai_state(&self) -> Option<AiState> {
        match self {
            Self::Guard(guard) => Some(guard.state),
            Self::Visitor(visitor) => Some(visitor.state),
            Self::Warden(warden) => Some(warden.state),
            Self::Greeter(greeter) => Some(greeter.state),
            Self::Conversation(group) => Some(group.state),
            Self::Robot(robot) => Some(robot.state),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BehaviorHandle(usize);

/// Owns every behaviour of the loaded scene and the seeded RNG the random
/// ones draw from. Behaviours of one phase run in registration order.
#[derive(Debug)]
pub struct Animator {
    behaviors: Vec<Behavior>,
    by_phase: [Vec<usize>; FRAME_PHASE_ORDER.len()],
    seed: u64,
    rng: StdRng,
}

impl Animator {
    pub fn new(seed: u64) -> Self {
        Self {
            behaviors: Vec::new(),
            by_phase: Default::default(),
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn register(&mut self, behavior: Behavior) -> BehaviorHandle {
        let index = self.behaviors.len();
        self.by_phase[behavior.phase().index()].push(index);
        self.behaviors.push(behavior);
        BehaviorHandle(index)
    }

    pub fn get(&self, handle: BehaviorHandle) -> Option<&Behavior> {
        self.behaviors.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: BehaviorHandle) -> Option<&mut Behavior> {
        self.behaviors.get_mut(handle.0)
    }

    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    pub fn phase_len(&self, phase: FramePhase) -> usize {
        self.by_phase[phase.index()].len()
    }

    /// Drops every behaviour and reseeds, so a reloaded scene replays the same
    /// random choices.
    pub fn clear(&mut self) {
        self.behaviors.clear();
        for indices in &mut self.by_phase {
            indices.clear();
        }
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    pub fn run_phase(&mut self, phase: FramePhase, frame: &FrameTime, world: &mut SceneWorld) {
        let Self {
            behaviors,
            by_phase,
            rng,
            ..
        } = self;
        let room = world.room();
        let player = world.player().position;
        let dt = frame.delta_seconds;

        for &index in &by_phase[phase.index()] {
            match &mut behaviors[index] {
                Behavior::Walker(walker) => {
                    if walker.update(dt, world) == MotionStep::PauseEntered {
                        debug!(
                            entity = walker.entity.0,
                            progress = walker.motion.path_progress,
                            "walker_paused"
                        );
                    }
                }
                Behavior::SecurityCamera(camera) => camera.update(dt, world),
                Behavior::Robot(robot) => robot.update(frame, world),
                Behavior::Conversation(group) => group.update(frame, rng, world),
                Behavior::RingSculpture(sculpture) => sculpture.update(frame, world),
                Behavior::OrbitalRings(rings) => rings.update(frame, world),
                Behavior::Gears(gears) => gears.update(frame, world),
                Behavior::Clock(clock) => clock.update(frame, world),
                Behavior::Hologram(projector) => projector.update(frame, world),
                Behavior::Flock(flock) => flock.update(frame, room, world),
                Behavior::Butterflies(swarm) => swarm.update(frame, room, rng, world),
                Behavior::Fish(school) => school.update(frame, rng, world),
                Behavior::Jellyfish(tank) => tank.update(frame, rng, world),
                Behavior::Guard(guard) => guard.update(frame, player, world),
                Behavior::Visitor(visitor) => visitor.update(frame, player, room, rng, world),
                Behavior::Warden(warden) => warden.update(frame, player, world),
                Behavior::Greeter(greeter) => greeter.update(frame, player, room, rng, world),
                Behavior::Ticker(ticker) => ticker.tick(frame, world),
                Behavior::Oscillator(oscillator) => oscillator.tick(frame, world),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{
        EntityDesc, EntityId, EntityKind, MaterialId, PartId, ShaderUniformState, Transform,
    };
    use glam::DVec3;

    fn frame(delta_seconds: f64, elapsed_seconds: f64) -> FrameTime {
        FrameTime {
            delta_seconds,
            elapsed_seconds,
            ..FrameTime::default()
        }
    }

    fn spawn_with_material(world: &mut SceneWorld) -> (EntityId, MaterialId) {
        let mut desc = EntityDesc::new(EntityKind::Exhibit, "hologram", Transform::default());
        let material = desc.add_material("hologram", ShaderUniformState::default());
        let id = world.spawn(desc);
        world.apply_pending();
        (id, material)
    }

    fn swarm(world: &mut SceneWorld) -> ButterflySwarm {
        let butterflies = (0..4)
            .map(|index| {
                let mut desc =
                    EntityDesc::new(EntityKind::Butterfly, "butterfly", Transform::default());
                let left_wing = desc.add_part("left_wing", Transform::default());
                let right_wing = desc.add_part("right_wing", Transform::default());
                Butterfly {
                    entity: world.spawn(desc),
                    left_wing,
                    right_wing,
                    position: DVec3::new(index as f64, 1.5, 0.0),
                    velocity: DVec3::new(0.01, 0.0, 0.01),
                    wing_phase: 0.0,
                    wander_angle: 0.0,
                    rotation: DVec3::ZERO,
                }
            })
            .collect();
        world.apply_pending();
        ButterflySwarm {
            butterflies,
            config: ButterflyConfig::default(),
        }
    }

    #[test]
    fn frame_scale_counts_reference_frames() {
        assert!((frame_scale(1.0 / 60.0) - 1.0).abs() < 1e-12);
        assert_eq!(frame_scale(0.5), 30.0);
        assert_eq!(frame_scale(0.0), 0.0);
    }

    #[test]
    fn behaviors_are_bucketed_by_phase() {
        let mut world = SceneWorld::default();
        let (id, material) = spawn_with_material(&mut world);
        let mut animator = Animator::new(7);
        let ticker = UniformTicker::new(id, material, UniformMode::Accumulate);
        animator.register(Behavior::Ticker(ticker));
        animator.register(Behavior::Butterflies(swarm(&mut world)));
        animator.register(Behavior::Gears(GearTrain {
            entity: id,
            gears: vec![Gear {
                part: PartId(0),
                rotation_speed: 1.0,
            }],
        }));

        assert_eq!(animator.len(), 3);
        assert_eq!(animator.phase_len(FramePhase::Uniforms), 1);
        assert_eq!(animator.phase_len(FramePhase::Wildlife), 1);
        assert_eq!(animator.phase_len(FramePhase::Actors), 1);
        assert_eq!(animator.phase_len(FramePhase::Ai), 0);
        assert_eq!(animator.phase_len(FramePhase::Camera), 0);
    }

    #[test]
    fn run_phase_only_touches_that_phase() {
        let mut world = SceneWorld::default();
        let (id, material) = spawn_with_material(&mut world);
        let mut animator = Animator::new(7);
        let ticker = UniformTicker::new(id, material, UniformMode::Accumulate);
        animator.register(Behavior::Ticker(ticker));

        let tick = frame(0.5, 0.5);
        animator.run_phase(FramePhase::Actors, &tick, &mut world);
        let uniforms = world.find_entity(id).and_then(|e| e.material(material)).expect("material");
        assert_eq!(uniforms.uniforms.time, 0.0);

        animator.run_phase(FramePhase::Uniforms, &tick, &mut world);
        animator.run_phase(FramePhase::Uniforms, &tick, &mut world);
        let uniforms = world.find_entity(id).and_then(|e| e.material(material)).expect("material");
        assert_eq!(uniforms.uniforms.time, 1.0);
        assert!(uniforms.uniforms.is_dirty());
    }

    #[test]
    fn same_seed_replays_the_same_wildlife() {
        let run = || {
            let mut world = SceneWorld::default();
            let mut animator = Animator::new(99);
            let handle = animator.register(Behavior::Butterflies(swarm(&mut world)));
            for step in 0..120 {
                let tick = frame(1.0 / 60.0, step as f64 / 60.0);
                animator.run_phase(FramePhase::Wildlife, &tick, &mut world);
            }
            match animator.get(handle) {
                Some(Behavior::Butterflies(swarm)) => swarm
                    .butterflies
                    .iter()
                    .map(|butterfly| butterfly.position)
                    .collect::<Vec<_>>(),
                other => panic!("unexpected behavior {other:?}"),
            }
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn clear_drops_behaviors_and_reseeds() {
        let mut world = SceneWorld::default();
        let mut animator = Animator::new(3);
        animator.register(Behavior::Butterflies(swarm(&mut world)));
        let first: f64 = rand::Rng::gen(animator.rng_mut());
        animator.clear();
        assert!(animator.is_empty());
        assert_eq!(animator.phase_len(FramePhase::Wildlife), 0);
        let replay: f64 = rand::Rng::gen(animator.rng_mut());
        assert_eq!(first, replay);
    }

    #[test]
    fn ai_state_is_exposed_for_state_machines_only() {
        let mut world = SceneWorld::default();
        let (id, material) = spawn_with_material(&mut world);
        let ticker = Behavior::Ticker(UniformTicker::new(id, material, UniformMode::Absolute));
        assert_eq!(ticker.ai_state(), None);

        let route = WaypointRoute::looped(vec![DVec3::ZERO, DVec3::X], 0.2).expect("route");
        let guard = Behavior::Guard(Guard::new(id, route, DVec3::ZERO, GuardConfig::default()));
        assert_eq!(guard.ai_state(), Some(AiState::Patrol));
        assert_eq!(guard.phase(), FramePhase::Ai);

        let greeter = Behavior::Greeter(Greeter::new(id, DVec3::ZERO, GreeterConfig::default()));
        assert_eq!(greeter.ai_state(), Some(AiState::Idle));
        assert_eq!(greeter.phase(), FramePhase::Ai);
    }

    #[test]
    fn clock_and_hologram_run_with_the_actors() {
        let mut world = SceneWorld::default();
        let mut desc = EntityDesc::new(EntityKind::Exhibit, "hologram", Transform::default());
        let projection = desc.add_part("projection", Transform::default());
        let particles = desc.add_part("particles", Transform::default());
        let id = world.spawn(desc);
        world.apply_pending();
        let mut animator = Animator::new(1);
        let hologram = Behavior::Hologram(HologramProjector {
            entity: id,
            projection,
            particles,
            projection_spin: 0.5,
            particle_spin: 0.3,
        });
        assert_eq!(hologram.ai_state(), None);
        animator.register(hologram);
        let clock = Behavior::Clock(WallClock {
            entity: id,
            hour_hand: PartId(0),
            minute_hand: PartId(1),
            second_hand: PartId(2),
            start_seconds: 0.0,
        });
        assert_eq!(clock.phase(), FramePhase::Actors);
        assert_eq!(animator.phase_len(FramePhase::Actors), 1);

        animator.run_phase(FramePhase::Ai, &frame(0.5, 2.0), &mut world);
        let entity = world.find_entity(id).expect("hologram");
        assert_eq!(entity.part(projection).expect("part").transform.rotation.y, 0.0);

        animator.run_phase(FramePhase::Actors, &frame(0.5, 2.0), &mut world);
        let entity = world.find_entity(id).expect("hologram");
        assert!((entity.part(projection).expect("part").transform.rotation.y - 1.0).abs() < 1e-12);
    }
}
