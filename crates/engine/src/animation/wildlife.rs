use glam::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::app::{EntityId, FrameTime, PartId, SceneWorld};

use super::frame_scale;
use super::geometry::{clamp_length, look_rotation, RoomBounds};

/// Scales a velocity component by `factor` if the point sits past `limit` on
/// the side the velocity points to. Components already heading back are left
/// alone so a body outside the band does not flutter in place.
fn bounce_axis(offset: f64, limit: f64, velocity: &mut f64, factor: f64) {
    if (offset > limit && *velocity > 0.0) || (offset < -limit && *velocity < 0.0) {
        *velocity *= factor;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButterflyConfig {
    pub count: usize,
    pub wander_jitter: f64,
    pub wander_force: f64,
    pub vertical_force: f64,
    pub wall_margin: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub bounce: f64,
    pub max_speed: f64,
    pub facing_threshold: f64,
    pub wing_rate: f64,
    pub wing_amplitude: f64,
}

impl Default for ButterflyConfig {
    fn default() -> Self {
        Self {
            count: 10,
            wander_jitter: 0.05,
            wander_force: 0.001,
            vertical_force: 0.00025,
            wall_margin: 1.0,
            min_height: 0.3,
            max_height: 3.0,
            bounce: -0.5,
            max_speed: 0.05,
            facing_threshold: 0.01,
            wing_rate: 15.0,
            wing_amplitude: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Butterfly {
    pub entity: EntityId,
    pub left_wing: PartId,
    pub right_wing: PartId,
    pub position: DVec3,
    pub velocity: DVec3,
    pub wing_phase: f64,
    pub wander_angle: f64,
    pub rotation: DVec3,
}

/// Independent wanderers; they ignore each other.
#[derive(Debug, Clone)]
pub struct ButterflySwarm {
    pub butterflies: Vec<Butterfly>,
    pub config: ButterflyConfig,
}

impl ButterflySwarm {
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        frame: &FrameTime,
        room: RoomBounds,
        rng: &mut R,
        world: &mut SceneWorld,
    ) {
        self.step(frame.delta_seconds, room, rng);
        for butterfly in &self.butterflies {
            let Some(entity) = world.find_entity_mut(butterfly.entity) else {
                continue;
            };
            entity.transform.position = butterfly.position;
            entity.transform.rotation = butterfly.rotation;
            let wing_angle = butterfly.wing_phase.sin() * self.config.wing_amplitude;
            entity.set_part_rotation_z(butterfly.left_wing, wing_angle);
            entity.set_part_rotation_z(butterfly.right_wing, -wing_angle);
        }
    }

    pub fn step<R: Rng + ?Sized>(&mut self, dt: f64, room: RoomBounds, rng: &mut R) {
        let config = self.config;
        let scale = frame_scale(dt);
        let jitter = config.wander_jitter.abs();
        let vertical = config.vertical_force.abs();
        let mid_height = (config.min_height + config.max_height) * 0.5;
        let half_band = (config.max_height - config.min_height) * 0.5;

        for butterfly in &mut self.butterflies {
            if jitter > 0.0 {
                butterfly.wander_angle += rng.gen_range(-jitter..=jitter);
            }
            let lift = if vertical > 0.0 {
                rng.gen_range(-vertical..=vertical)
            } else {
                0.0
            };
            let wander = DVec3::new(
                butterfly.wander_angle.cos() * config.wander_force,
                lift,
                butterfly.wander_angle.sin() * config.wander_force,
            );
            butterfly.velocity += wander * scale;

            let position = butterfly.position;
            bounce_axis(
                position.x,
                room.half_width() - config.wall_margin,
                &mut butterfly.velocity.x,
                config.bounce,
            );
            bounce_axis(
                position.z,
                room.half_depth() - config.wall_margin,
                &mut butterfly.velocity.z,
                config.bounce,
            );
            bounce_axis(
                position.y - mid_height,
                half_band,
                &mut butterfly.velocity.y,
                config.bounce,
            );

            butterfly.velocity = clamp_length(butterfly.velocity, config.max_speed);
            butterfly.position = room.clamp(butterfly.position + butterfly.velocity * scale);
            butterfly.wing_phase += dt * config.wing_rate;

            if butterfly.velocity.length() > config.facing_threshold {
                if let Some(rotation) = look_rotation(butterfly.velocity) {
                    // Body lies along the velocity, wings up.
                    butterfly.rotation = rotation + DVec3::X * std::f64::consts::FRAC_PI_2;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AquariumConfig {
    pub fish_count: usize,
    pub jellyfish_count: usize,
    /// Half extents of the swimmable volume around the tank centre.
    pub tank_half_extents: [f64; 3],
    pub water_center_height: f64,
    pub fish_jitter: [f64; 3],
    pub bounce: f64,
    pub fish_max_speed: f64,
    pub facing_threshold: f64,
    pub tail_rate: f64,
    pub tail_amplitude: f64,
    pub jelly_pulse_rate: f64,
    pub jelly_bell_amplitude: f64,
    pub jelly_thrust: f64,
    pub jelly_sink_speed: f64,
    pub jelly_drift_jitter: f64,
    pub jelly_max_drift: f64,
    pub jelly_tentacle_sway: f64,
}

impl Default for AquariumConfig {
    fn default() -> Self {
        Self {
            fish_count: 8,
            jellyfish_count: 2,
            tank_half_extents: [0.9, 0.6, 0.3],
            water_center_height: 1.5,
            fish_jitter: [0.0005, 0.0002, 0.0005],
            bounce: -0.5,
            fish_max_speed: 0.02,
            facing_threshold: 0.001,
            tail_rate: 10.0,
            tail_amplitude: 0.3,
            jelly_pulse_rate: 2.5,
            jelly_bell_amplitude: 0.15,
            jelly_thrust: 0.35,
            jelly_sink_speed: 0.08,
            jelly_drift_jitter: 0.02,
            jelly_max_drift: 0.06,
            jelly_tentacle_sway: 0.25,
        }
    }
}

impl AquariumConfig {
    pub fn half_extents(&self) -> DVec3 {
        DVec3::from_array(self.tank_half_extents)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fish {
    pub entity: EntityId,
    pub tail: PartId,
    pub position: DVec3,
    pub velocity: DVec3,
    pub rotation: DVec3,
}

#[derive(Debug, Clone)]
pub struct FishSchool {
    pub tank_center: DVec3,
    pub fish: Vec<Fish>,
    pub config: AquariumConfig,
}

impl FishSchool {
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        frame: &FrameTime,
        rng: &mut R,
        world: &mut SceneWorld,
    ) {
        self.step(frame.delta_seconds, rng);
        let tail_angle =
            (frame.elapsed_seconds * self.config.tail_rate).sin() * self.config.tail_amplitude;
        for fish in &self.fish {
            let Some(entity) = world.find_entity_mut(fish.entity) else {
                continue;
            };
            entity.transform.position = fish.position;
            entity.transform.rotation = fish.rotation;
            entity.set_part_rotation_y(fish.tail, tail_angle);
        }
    }

    pub fn step<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) {
        let config = self.config;
        let scale = frame_scale(dt);
        let half = config.half_extents();
        let jitter = DVec3::from_array(config.fish_jitter).abs();

        for fish in &mut self.fish {
            let kick = DVec3::new(
                symmetric(rng, jitter.x),
                symmetric(rng, jitter.y),
                symmetric(rng, jitter.z),
            );
            fish.velocity += kick * scale;

            let local = fish.position - self.tank_center;
            for axis in 0..3 {
                bounce_axis(local[axis], half[axis], &mut fish.velocity[axis], config.bounce);
            }

            fish.velocity = clamp_length(fish.velocity, config.fish_max_speed);
            let moved = fish.position + fish.velocity * scale - self.tank_center;
            fish.position = self.tank_center + moved.clamp(-half, half);

            if fish.velocity.length() > config.facing_threshold {
                if let Some(rotation) = look_rotation(fish.velocity) {
                    fish.rotation = rotation;
                }
            }
        }
    }
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, magnitude: f64) -> f64 {
    if magnitude > 0.0 {
        rng.gen_range(-magnitude..=magnitude)
    } else {
        0.0
    }
}

/// Bell-pulse swimmer. Each pulse contracts the bell and pushes upward; between
/// pulses it sinks slowly while drifting sideways inside the tank.
#[derive(Debug, Clone, PartialEq)]
pub struct Jellyfish {
    pub entity: EntityId,
    pub bell: PartId,
    pub tentacles: Vec<PartId>,
    pub position: DVec3,
    /// Horizontal drift in units per second.
    pub drift: DVec3,
    pub pulse_phase: f64,
}

#[derive(Debug, Clone)]
pub struct JellyfishTank {
    pub tank_center: DVec3,
    pub jellies: Vec<Jellyfish>,
    pub config: AquariumConfig,
}

impl JellyfishTank {
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        frame: &FrameTime,
        rng: &mut R,
        world: &mut SceneWorld,
    ) {
        self.step(frame.delta_seconds, rng);
        let config = self.config;
        for jelly in &self.jellies {
            let Some(entity) = world.find_entity_mut(jelly.entity) else {
                continue;
            };
            entity.transform.position = jelly.position;
            let pulse = jelly.pulse_phase.sin();
            if let Some(bell) = entity.part_mut(jelly.bell) {
                let squeeze = pulse.max(0.0) * config.jelly_bell_amplitude;
                bell.transform.scale = DVec3::new(1.0 - squeeze, 1.0 + squeeze, 1.0 - squeeze);
            }
            for (index, tentacle) in jelly.tentacles.iter().enumerate() {
                let lag = index as f64 * 0.5;
                let sway = (jelly.pulse_phase - lag).sin() * config.jelly_tentacle_sway;
                entity.set_part_rotation_x(*tentacle, sway);
            }
        }
    }

    pub fn step<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) {
        let config = self.config;
        let half = config.half_extents();

        for jelly in &mut self.jellies {
            jelly.pulse_phase += dt * config.jelly_pulse_rate;
            let pulse = jelly.pulse_phase.sin();
            let rise = if pulse > 0.0 {
                config.jelly_thrust * pulse
            } else {
                -config.jelly_sink_speed
            };

            let jitter = config.jelly_drift_jitter.abs();
            jelly.drift.x += symmetric(rng, jitter) * dt;
            jelly.drift.z += symmetric(rng, jitter) * dt;
            jelly.drift.y = 0.0;
            jelly.drift = clamp_length(jelly.drift, config.jelly_max_drift);

            let travel = (jelly.drift + DVec3::Y * rise) * dt;
            let mut local = jelly.position - self.tank_center + travel;
            for axis in [0, 2] {
                if local[axis].abs() > half[axis] {
                    local[axis] = local[axis].clamp(-half[axis], half[axis]);
                    jelly.drift[axis] = -jelly.drift[axis];
                }
            }
            local.y = local.y.clamp(-half.y, half.y);
            jelly.position = self.tank_center + local;
        }
    }
}
