//! Distance-triggered NPC state machines. Every state has a way back out, so
//! none of them can get stuck.

use glam::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{EntityId, FrameTime, PartId, SceneWorld};

use super::frame_scale;
use super::geometry::{
    forward_from_yaw, horizontal_distance, yaw_from_direction, yaw_towards, RoomBounds,
};
use super::motion::{LimbRig, LIMB_SWING_AMPLITUDE};
use super::path::{Path, PathError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiState {
    Idle,
    Walking,
    Observing,
    Fleeing,
    Patrol,
    Alert,
    Chasing,
    Warning,
    Conversing,
    Waving,
}

const INDICATOR_FLASH_RATE: f64 = 10.0;

fn indicator_lit(elapsed_seconds: f64) -> bool {
    (elapsed_seconds * INDICATOR_FLASH_RATE).sin() > 0.0
}

/// Waypoint list walked point to point, advancing once within the capture
/// radius.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointRoute {
    path: Path,
    index: usize,
    looped: bool,
    capture_radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteStep {
    /// Moved toward the current waypoint; `yaw` is `None` if already on it.
    Moved { position: DVec3, yaw: Option<f64> },
    /// Captured a waypoint this frame without moving.
    Reached { index: usize },
    /// One-shot route with every waypoint captured.
    Finished,
}

impl WaypointRoute {
    pub fn looped(waypoints: Vec<DVec3>, capture_radius: f64) -> Result<Self, PathError> {
        Ok(Self {
            path: Path::new(waypoints)?,
            index: 0,
            looped: true,
            capture_radius,
        })
    }

    pub fn one_shot(waypoints: Vec<DVec3>, capture_radius: f64) -> Result<Self, PathError> {
        Ok(Self {
            looped: false,
            ..Self::looped(waypoints, capture_radius)?
        })
    }

    pub fn target(&self) -> Option<DVec3> {
        self.path.waypoint(self.index)
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn waypoints(&self) -> &[DVec3] {
        self.path.waypoints()
    }

    /// Moves at most `max_step` toward the current waypoint in the horizontal
    /// plane. Height is taken from the mover.
    pub fn steer(&mut self, position: DVec3, max_step: f64) -> RouteStep {
        if self.index >= self.path.len() {
            if !self.looped {
                return RouteStep::Finished;
            }
            self.index = 0;
        }
        let Some(target) = self.target() else {
            return RouteStep::Finished;
        };

        if horizontal_distance(position, target) < self.capture_radius {
            let reached = self.index;
            self.index += 1;
            if self.index >= self.path.len() && !self.looped {
                return RouteStep::Finished;
            }
            return RouteStep::Reached { index: reached };
        }

        let target = DVec3::new(target.x, position.y, target.z);
        RouteStep::Moved {
            position: move_towards(position, target, max_step),
            yaw: yaw_towards(position, target),
        }
    }
}

/// Horizontal step toward `target` that never overshoots it.
pub fn move_towards(position: DVec3, target: DVec3, max_step: f64) -> DVec3 {
    let offset = DVec3::new(target.x - position.x, 0.0, target.z - position.z);
    let distance = offset.length();
    if distance <= max_step || distance == 0.0 {
        DVec3::new(target.x, position.y, target.z)
    } else {
        position + offset / distance * max_step
    }
}

/// Probability that an event rolled once per reference frame fires during a
/// step of `dt` seconds.
fn chance_over(per_frame: f64, dt: f64) -> f64 {
    1.0 - (1.0 - per_frame).powf(frame_scale(dt))
}

const WALL_MARGIN: f64 = 0.5;

/// Pulls a point at least [`WALL_MARGIN`] away from every wall, keeping its
/// height.
fn clamp_to_floor(room: RoomBounds, point: DVec3) -> DVec3 {
    let min = room.min() + DVec3::splat(WALL_MARGIN);
    let max = room.max() - DVec3::splat(WALL_MARGIN);
    DVec3::new(
        point.x.clamp(min.x, max.x.max(min.x)),
        point.y,
        point.z.clamp(min.z, max.z.max(min.z)),
    )
}

fn write_pose(world: &mut SceneWorld, entity: EntityId, position: DVec3, yaw: f64) {
    if let Some(entity) = world.find_entity_mut(entity) {
        entity.transform.position = position;
        entity.transform.rotation.y = yaw;
    }
}

fn set_indicator(world: &mut SceneWorld, entity: EntityId, indicator: Option<PartId>, lit: bool) {
    let Some(indicator) = indicator else {
        return;
    };
    if let Some(entity) = world.find_entity_mut(entity) {
        entity.set_part_visible(indicator, lit);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub patrol_speed: f64,
    pub chase_speed_multiplier: f64,
    pub alert_radius: f64,
    pub chase_radius: f64,
    pub alert_hold_seconds: f64,
    pub capture_radius: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            patrol_speed: 2.0,
            chase_speed_multiplier: 1.5,
            alert_radius: 4.0,
            chase_radius: 2.0,
            alert_hold_seconds: 5.0,
            capture_radius: 0.2,
        }
    }
}

/// Patrols a loop, turns to watch a nearby player and chases one that gets too
/// close.
#[derive(Debug, Clone)]
pub struct Guard {
    pub entity: EntityId,
    pub indicator: Option<PartId>,
    pub route: WaypointRoute,
    pub position: DVec3,
    pub yaw: f64,
    pub state: AiState,
    pub alert_timer: f64,
    pub config: GuardConfig,
}

impl Guard {
    pub fn new(
        entity: EntityId,
        route: WaypointRoute,
        position: DVec3,
        config: GuardConfig,
    ) -> Self {
        Self {
            entity,
            indicator: None,
            route,
            position,
            yaw: 0.0,
            state: AiState::Patrol,
            alert_timer: 0.0,
            config,
        }
    }

    pub fn with_indicator(mut self, indicator: PartId) -> Self {
        self.indicator = Some(indicator);
        self
    }

    /// Transition rule alone: returns the next state and alert timer.
    pub fn next_state(
        config: &GuardConfig,
        state: AiState,
        alert_timer: f64,
        distance: f64,
        dt: f64,
    ) -> (AiState, f64) {
        if distance < config.chase_radius {
            (AiState::Chasing, config.alert_hold_seconds)
        } else if distance < config.alert_radius {
            if state == AiState::Chasing {
                (AiState::Chasing, alert_timer)
            } else {
                (AiState::Alert, alert_timer)
            }
        } else if matches!(state, AiState::Alert | AiState::Chasing) {
            let remaining = alert_timer - dt;
            if remaining <= 0.0 {
                (AiState::Patrol, remaining)
            } else {
                (state, remaining)
            }
        } else {
            (state, alert_timer)
        }
    }

    pub fn update(&mut self, frame: &FrameTime, player: DVec3, world: &mut SceneWorld) {
        let dt = frame.delta_seconds;
        let distance = horizontal_distance(self.position, player);
        let (next, timer) =
            Self::next_state(&self.config, self.state, self.alert_timer, distance, dt);
        self.alert_timer = timer;
        if next != self.state {
            info!(
                entity = self.entity.0,
                from = ?self.state,
                to = ?next,
                distance,
                "guard_state_changed"
            );
            self.state = next;
        }

        let lit = match self.state {
            AiState::Alert => {
                if let Some(yaw) = yaw_towards(self.position, player) {
                    self.yaw = yaw;
                }
                indicator_lit(frame.elapsed_seconds)
            }
            AiState::Chasing => {
                let step = self.config.patrol_speed * self.config.chase_speed_multiplier * dt;
                if let Some(yaw) = yaw_towards(self.position, player) {
                    self.yaw = yaw;
                }
                self.position = move_towards(self.position, player, step);
                true
            }
            _ => {
                self.patrol(dt);
                false
            }
        };

        write_pose(world, self.entity, self.position, self.yaw);
        set_indicator(world, self.entity, self.indicator, lit);
    }

    fn patrol(&mut self, dt: f64) {
        if let RouteStep::Moved { position, yaw } =
            self.route.steer(self.position, self.config.patrol_speed * dt)
        {
            self.position = position;
            if let Some(yaw) = yaw {
                self.yaw = yaw;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorConfig {
    pub speed: f64,
    pub detection_radius: f64,
    pub personal_space: f64,
    pub idle_min_seconds: f64,
    pub idle_jitter_seconds: f64,
    pub route_min_points: usize,
    pub route_max_points: usize,
    /// Random route points fall within `±extent/2` on each axis.
    pub route_extent: [f64; 2],
    pub capture_radius: f64,
    pub cycle_rate: f64,
}

impl Default for VisitorConfig {
    fn default() -> Self {
        Self {
            speed: 1.5,
            detection_radius: 5.0,
            personal_space: 1.5,
            idle_min_seconds: 3.0,
            idle_jitter_seconds: 2.0,
            route_min_points: 3,
            route_max_points: 5,
            route_extent: [15.0, 10.0],
            capture_radius: 0.2,
            cycle_rate: 5.0,
        }
    }
}

/// Wanders between random routes, watches a nearby player and backs away from
/// one that crowds it.
#[derive(Debug, Clone)]
pub struct Visitor {
    pub entity: EntityId,
    pub rig: Option<LimbRig>,
    pub position: DVec3,
    pub yaw: f64,
    pub state: AiState,
    pub idle_time: f64,
    pub max_idle_time: f64,
    pub route: Option<WaypointRoute>,
    pub walk_cycle_phase: f64,
    pub config: VisitorConfig,
}

impl Visitor {
    pub fn new<R: Rng + ?Sized>(
        entity: EntityId,
        position: DVec3,
        config: VisitorConfig,
        rng: &mut R,
    ) -> Self {
        Self {
            entity,
            rig: None,
            position,
            yaw: 0.0,
            state: AiState::Idle,
            idle_time: 0.0,
            max_idle_time: roll_idle_time(&config, rng),
            route: None,
            walk_cycle_phase: 0.0,
            config,
        }
    }

    pub fn with_rig(mut self, rig: LimbRig) -> Self {
        self.rig = Some(rig);
        self
    }

    /// Proximity rule alone; timers and routes are handled by `update`.
    pub fn proximity_state(config: &VisitorConfig, state: AiState, distance: f64) -> AiState {
        if distance < config.personal_space {
            AiState::Fleeing
        } else if distance < config.detection_radius {
            AiState::Observing
        } else if matches!(state, AiState::Fleeing | AiState::Observing) {
            AiState::Idle
        } else {
            state
        }
    }

    pub fn update<R: Rng + ?Sized>(
        &mut self,
        frame: &FrameTime,
        player: DVec3,
        room: RoomBounds,
        rng: &mut R,
        world: &mut SceneWorld,
    ) {
        let dt = frame.delta_seconds;
        let distance = horizontal_distance(self.position, player);
        let next = Self::proximity_state(&self.config, self.state, distance);
        if next != self.state {
            if next == AiState::Idle {
                self.idle_time = 0.0;
            }
            self.change_state(next);
        }

        let mut moving = false;
        match self.state {
            AiState::Idle => {
                self.idle_time += dt;
                if self.idle_time >= self.max_idle_time {
                    self.route = random_route(&self.config, room, rng).ok();
                    self.change_state(AiState::Walking);
                }
            }
            AiState::Walking => {
                let step = self.config.speed * dt;
                let outcome = match self.route.as_mut() {
                    Some(route) => route.steer(self.position, step),
                    None => RouteStep::Finished,
                };
                match outcome {
                    RouteStep::Moved { position, yaw } => {
                        self.position = position;
                        if let Some(yaw) = yaw {
                            self.yaw = yaw;
                        }
                        moving = true;
                    }
                    RouteStep::Reached { .. } => {}
                    RouteStep::Finished => {
                        self.route = None;
                        self.idle_time = 0.0;
                        self.max_idle_time = roll_idle_time(&self.config, rng);
                        self.change_state(AiState::Idle);
                    }
                }
            }
            AiState::Observing => {
                if let Some(yaw) = yaw_towards(self.position, player) {
                    self.yaw = yaw;
                }
            }
            AiState::Fleeing => {
                let away = DVec3::new(self.position.x - player.x, 0.0, self.position.z - player.z);
                if let Some(yaw) = yaw_from_direction(away) {
                    self.yaw = yaw;
                }
                let fled = self.position + forward_from_yaw(self.yaw) * self.config.speed * dt;
                self.position = clamp_to_floor(room, fled);
                moving = true;
            }
            _ => {}
        }

        if moving {
            self.walk_cycle_phase += dt * self.config.cycle_rate;
        } else {
            self.walk_cycle_phase = 0.0;
        }
        write_pose(world, self.entity, self.position, self.yaw);
        if let Some(rig) = self.rig {
            let swing = self.walk_cycle_phase.sin() * LIMB_SWING_AMPLITUDE;
            rig.apply_swing(world, self.entity, swing);
        }
    }

    fn change_state(&mut self, next: AiState) {
        debug!(
            entity = self.entity.0,
            from = ?self.state,
            to = ?next,
            "visitor_state_changed"
        );
        self.state = next;
    }
}

fn roll_idle_time<R: Rng + ?Sized>(config: &VisitorConfig, rng: &mut R) -> f64 {
    config.idle_min_seconds + rng.gen::<f64>() * config.idle_jitter_seconds.max(0.0)
}

/// Random one-shot route; points outside the room are pulled back inside the
/// wall margin.
pub fn random_route<R: Rng + ?Sized>(
    config: &VisitorConfig,
    room: RoomBounds,
    rng: &mut R,
) -> Result<WaypointRoute, PathError> {
    let low = config.route_min_points.max(2);
    let high = config.route_max_points.max(low);
    let count = rng.gen_range(low..=high);
    let [extent_x, extent_z] = config.route_extent;
    let points = (0..count)
        .map(|_| {
            let point = DVec3::new(
                (rng.gen::<f64>() - 0.5) * extent_x,
                0.0,
                (rng.gen::<f64>() - 0.5) * extent_z,
            );
            clamp_to_floor(room, point)
        })
        .collect();
    WaypointRoute::one_shot(points, config.capture_radius)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub speed: f64,
    pub follow_speed_multiplier: f64,
    pub warning_distance: f64,
    pub detection_radius: f64,
    pub capture_radius: f64,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            speed: 1.2,
            follow_speed_multiplier: 1.5,
            warning_distance: 1.5,
            detection_radius: 6.0,
            capture_radius: 0.5,
        }
    }
}

/// Guard who watches the artworks: follows a player who gets too close to one
/// and stops to warn them.
#[derive(Debug, Clone)]
pub struct Warden {
    pub entity: EntityId,
    pub indicator: Option<PartId>,
    pub route: WaypointRoute,
    pub artworks: Vec<DVec3>,
    pub position: DVec3,
    pub yaw: f64,
    pub state: AiState,
    pub config: WardenConfig,
}

impl Warden {
    pub fn new(
        entity: EntityId,
        route: WaypointRoute,
        artworks: Vec<DVec3>,
        position: DVec3,
        config: WardenConfig,
    ) -> Self {
        Self {
            entity,
            indicator: None,
            route,
            artworks,
            position,
            yaw: 0.0,
            state: AiState::Patrol,
            config,
        }
    }

    pub fn with_indicator(mut self, indicator: PartId) -> Self {
        self.indicator = Some(indicator);
        self
    }

    pub fn artwork_threatened(&self, player: DVec3) -> bool {
        self.artworks
            .iter()
            .any(|artwork| horizontal_distance(player, *artwork) < self.config.warning_distance)
    }

    pub fn next_state(
        config: &WardenConfig,
        state: AiState,
        distance: f64,
        threatened: bool,
    ) -> AiState {
        match state {
            AiState::Patrol if threatened && distance < config.detection_radius => AiState::Chasing,
            AiState::Chasing => {
                if !threatened && distance > config.detection_radius * 1.5 {
                    AiState::Patrol
                } else if distance < config.warning_distance * 2.0 {
                    AiState::Warning
                } else {
                    AiState::Chasing
                }
            }
            AiState::Warning if distance > config.warning_distance * 3.0 => AiState::Patrol,
            other => other,
        }
    }

    pub fn update(&mut self, frame: &FrameTime, player: DVec3, world: &mut SceneWorld) {
        let dt = frame.delta_seconds;
        let distance = horizontal_distance(self.position, player);
        let threatened = self.artwork_threatened(player);

        let lit = match self.state {
            AiState::Chasing => {
                let step = self.config.speed * self.config.follow_speed_multiplier * dt;
                if let Some(yaw) = yaw_towards(self.position, player) {
                    self.yaw = yaw;
                }
                self.position = move_towards(self.position, player, step);
                false
            }
            AiState::Warning => {
                if let Some(yaw) = yaw_towards(self.position, player) {
                    self.yaw = yaw;
                }
                indicator_lit(frame.elapsed_seconds)
            }
            _ => {
                let step = self.config.speed * dt;
                if let RouteStep::Moved { position, yaw } = self.route.steer(self.position, step) {
                    self.position = position;
                    if let Some(yaw) = yaw {
                        self.yaw = yaw;
                    }
                }
                false
            }
        };

        let next = Self::next_state(&self.config, self.state, distance, threatened);
        let lit = if next == self.state {
            lit
        } else {
            info!(
                entity = self.entity.0,
                from = ?self.state,
                to = ?next,
                distance,
                "warden_state_changed"
            );
            self.state = next;
            next == AiState::Warning
        };

        write_pose(world, self.entity, self.position, self.yaw);
        set_indicator(world, self.entity, self.indicator, lit);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreeterConfig {
    pub detection_radius: f64,
    pub personal_space: f64,
    /// Time spent watching before a close player gets a wave.
    pub look_before_wave_seconds: f64,
    pub wave_seconds: f64,
    pub wander_after_seconds: f64,
    pub wander_chance_per_frame: f64,
    /// Wander targets fall within `±extent/2` of the current spot.
    pub wander_extent: f64,
    pub walk_speed: f64,
    pub arrive_radius: f64,
    pub indicator_height: f64,
    pub bob_amplitude: f64,
    pub bob_rate: f64,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            detection_radius: 5.0,
            personal_space: 2.0,
            look_before_wave_seconds: 0.5,
            wave_seconds: 2.0,
            wander_after_seconds: 5.0,
            wander_chance_per_frame: 0.01,
            wander_extent: 4.0,
            walk_speed: 0.6,
            arrive_radius: 0.5,
            indicator_height: 2.5,
            bob_amplitude: 0.2,
            bob_rate: 10.0,
        }
    }
}

/// Friendly visitor: notices the player, waves when they come close and
/// otherwise drifts between nearby spots. An emotion marker floats over its
/// head while it pays attention.
#[derive(Debug, Clone)]
pub struct Greeter {
    pub entity: EntityId,
    pub indicator: Option<PartId>,
    pub position: DVec3,
    pub yaw: f64,
    pub state: AiState,
    pub state_time: f64,
    pub emotion_time: f64,
    pub wander_target: Option<DVec3>,
    pub config: GreeterConfig,
}

impl Greeter {
    pub fn new(entity: EntityId, position: DVec3, config: GreeterConfig) -> Self {
        Self {
            entity,
            indicator: None,
            position,
            yaw: 0.0,
            state: AiState::Idle,
            state_time: 0.0,
            emotion_time: 0.0,
            wander_target: None,
            config,
        }
    }

    pub fn with_indicator(mut self, indicator: PartId) -> Self {
        self.indicator = Some(indicator);
        self
    }

    pub fn update<R: Rng + ?Sized>(
        &mut self,
        frame: &FrameTime,
        player: DVec3,
        room: RoomBounds,
        rng: &mut R,
        world: &mut SceneWorld,
    ) {
        let dt = frame.delta_seconds;
        let config = self.config;
        self.state_time += dt;
        let distance = horizontal_distance(self.position, player);

        match self.state {
            AiState::Idle => {
                if distance < config.detection_radius {
                    self.change_state(AiState::Observing);
                } else if self.state_time > config.wander_after_seconds {
                    let chance = chance_over(config.wander_chance_per_frame, dt);
                    if rng.gen::<f64>() < chance {
                        self.wander_target = Some(self.roll_wander_target(room, rng));
                        self.change_state(AiState::Walking);
                    }
                }
            }
            AiState::Observing => {
                if let Some(yaw) = yaw_towards(self.position, player) {
                    self.yaw = yaw;
                }
                if distance < config.personal_space
                    && self.state_time > config.look_before_wave_seconds
                {
                    self.emotion_time = 0.0;
                    self.change_state(AiState::Waving);
                } else if distance > config.detection_radius * 1.5 {
                    self.change_state(AiState::Idle);
                }
            }
            AiState::Waving => {
                self.emotion_time += dt * config.bob_rate;
                if self.state_time > config.wave_seconds {
                    self.change_state(AiState::Observing);
                }
            }
            AiState::Walking => match self.wander_target {
                Some(target)
                    if horizontal_distance(self.position, target) > config.arrive_radius =>
                {
                    if let Some(yaw) = yaw_towards(self.position, target) {
                        self.yaw = yaw;
                    }
                    self.position = move_towards(self.position, target, config.walk_speed * dt);
                }
                _ => {
                    self.wander_target = None;
                    self.change_state(AiState::Idle);
                }
            },
            _ => self.change_state(AiState::Idle),
        }

        write_pose(world, self.entity, self.position, self.yaw);
        self.pose_indicator(world);
    }

    fn roll_wander_target<R: Rng + ?Sized>(&self, room: RoomBounds, rng: &mut R) -> DVec3 {
        let extent = self.config.wander_extent;
        let target = self.position
            + DVec3::new(
                (rng.gen::<f64>() - 0.5) * extent,
                0.0,
                (rng.gen::<f64>() - 0.5) * extent,
            );
        clamp_to_floor(room, target)
    }

    fn pose_indicator(&self, world: &mut SceneWorld) {
        let Some(indicator) = self.indicator else {
            return;
        };
        let Some(entity) = world.find_entity_mut(self.entity) else {
            return;
        };
        let attentive = matches!(self.state, AiState::Observing | AiState::Waving);
        entity.set_part_visible(indicator, attentive);
        if let Some(part) = entity.part_mut(indicator) {
            let bob = if self.state == AiState::Waving {
                self.emotion_time.sin() * self.config.bob_amplitude
            } else {
                0.0
            };
            part.transform.position.y = self.config.indicator_height + bob;
        }
    }

    fn change_state(&mut self, next: AiState) {
        debug!(
            entity = self.entity.0,
            from = ?self.state,
            to = ?next,
            "greeter_state_changed"
        );
        self.state = next;
        self.state_time = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversationMember {
    pub entity: EntityId,
    pub phase: f64,
    pub base_height: f64,
}

const NOD_AMPLITUDE: f64 = 0.1;
const BOB_AMPLITUDE: f64 = 0.05;
const CONVERSATION_RATE: f64 = 2.0;
const GLANCE_CHANCE_PER_FRAME: f64 = 0.01;

/// A cluster of visitors talking: they nod, bob, and now and then glance at
/// one another.
#[derive(Debug, Clone)]
pub struct ConversationGroup {
    pub members: Vec<ConversationMember>,
    pub time: f64,
    pub state: AiState,
}

impl ConversationGroup {
    pub fn new(members: Vec<ConversationMember>, start_time: f64) -> Self {
        Self {
            members,
            time: start_time,
            state: AiState::Conversing,
        }
    }

    pub fn update<R: Rng + ?Sized>(
        &mut self,
        frame: &FrameTime,
        rng: &mut R,
        world: &mut SceneWorld,
    ) {
        self.time += frame.delta_seconds;
        let glance_chance = chance_over(GLANCE_CHANCE_PER_FRAME, frame.delta_seconds);

        for index in 0..self.members.len() {
            let member = self.members[index];
            let wave = (self.time * CONVERSATION_RATE + member.phase).sin();

            let glance_at = if self.members.len() > 1 && rng.gen::<f64>() < glance_chance {
                let other = rng.gen_range(0..self.members.len());
                (other != index)
                    .then(|| world.find_entity(self.members[other].entity))
                    .flatten()
                    .map(|entity| entity.transform.position)
            } else {
                None
            };

            let Some(entity) = world.find_entity_mut(member.entity) else {
                continue;
            };
            entity.transform.rotation.x = wave * NOD_AMPLITUDE;
            entity.transform.position.y = member.base_height + wave * BOB_AMPLITUDE;
            let position = entity.transform.position;
            if let Some(yaw) = glance_at.and_then(|target| yaw_towards(position, target)) {
                entity.transform.rotation.y = yaw;
            }
        }
    }
}

const ROBOT_TIME_SCALE: f64 = 0.8;
const ROBOT_WHEEL_RATE: f64 = 5.0;
const ROBOT_HEAD_SWAY: f64 = 0.2;
const ROBOT_HEAD_RATE: f64 = 3.0;

/// Floor cleaner on a fixed loop.
#[derive(Debug, Clone)]
pub struct CleaningRobot {
    pub entity: EntityId,
    pub route: WaypointRoute,
    pub wheels: Vec<PartId>,
    pub head: PartId,
    pub speed: f64,
    pub position: DVec3,
    pub yaw: f64,
    pub state: AiState,
}

impl CleaningRobot {
    pub fn update(&mut self, frame: &FrameTime, world: &mut SceneWorld) {
        let dt = frame.delta_seconds;
        let step = self.speed * dt * ROBOT_TIME_SCALE;
        if let RouteStep::Moved { position, yaw } = self.route.steer(self.position, step) {
            self.position = position;
            if let Some(yaw) = yaw {
                self.yaw = yaw;
            }
        }

        write_pose(world, self.entity, self.position, self.yaw);
        let Some(entity) = world.find_entity_mut(self.entity) else {
            return;
        };
        for wheel in &self.wheels {
            if let Some(part) = entity.part_mut(*wheel) {
                part.transform.rotation.x += self.speed * dt * ROBOT_WHEEL_RATE;
            }
        }
        let sway = (frame.elapsed_seconds * ROBOT_HEAD_RATE).sin() * ROBOT_HEAD_SWAY;
        entity.set_part_rotation_y(self.head, sway);
    }
}
