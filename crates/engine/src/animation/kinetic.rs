use std::f64::consts::TAU;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::app::{EntityId, FrameTime, MaterialId, PartId, SceneWorld};

use super::frame_scale;
use super::uniforms::{material_uniforms, Oscillation};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticConfig {
    pub ring_sculpture_speed: f64,
    pub orbital_ring_count: usize,
    pub orbital_sphere_height: f64,
    pub gear_count: usize,
    pub glow: Oscillation,
    /// Radians per second of the hologram's projection plane.
    pub hologram_spin: f64,
    pub hologram_particle_spin: f64,
    /// Time of day the wall clock starts at, in seconds past midnight.
    /// `None` reads the host clock (UTC) when the scene loads.
    pub clock_start_seconds: Option<f64>,
}

impl Default for KineticConfig {
    fn default() -> Self {
        Self {
            ring_sculpture_speed: 0.5,
            orbital_ring_count: 5,
            orbital_sphere_height: 0.5,
            gear_count: 3,
            glow: Oscillation {
                base: 0.3,
                amplitude: 0.3,
                rate: 2.0,
                phase: 0.0,
            },
            hologram_spin: 0.5,
            hologram_particle_spin: 0.3,
            clock_start_seconds: None,
        }
    }
}

/// Nested rings around a glowing sphere on a pedestal.
#[derive(Debug, Clone, PartialEq)]
pub struct RingSculpture {
    pub entity: EntityId,
    pub outer_ring: PartId,
    pub middle_ring: PartId,
    pub sphere: PartId,
    pub ring_materials: [MaterialId; 2],
    pub sphere_material: MaterialId,
    pub rotation_speed: f64,
    pub glow: Oscillation,
}

const SPHERE_GLOW_BOOST: f64 = 0.2;

impl RingSculpture {
    pub fn update(&self, frame: &FrameTime, world: &mut SceneWorld) {
        let spin = frame.delta_seconds * self.rotation_speed;
        if let Some(entity) = world.find_entity_mut(self.entity) {
            if let Some(part) = entity.part_mut(self.outer_ring) {
                part.transform.rotation.z += spin;
            }
            if let Some(part) = entity.part_mut(self.middle_ring) {
                part.transform.rotation.y += spin * 1.5;
            }
            if let Some(part) = entity.part_mut(self.sphere) {
                part.transform.rotation.y += spin * 2.0;
            }
        }

        let pulse = self.glow.value_at(frame.elapsed_seconds);
        for material in self.ring_materials {
            if let Some(uniforms) = material_uniforms(world, self.entity, material) {
                uniforms.emissive_intensity = pulse;
                uniforms.mark_dirty();
            }
        }
        if let Some(uniforms) = material_uniforms(world, self.entity, self.sphere_material) {
            uniforms.emissive_intensity = pulse + SPHERE_GLOW_BOOST;
            uniforms.mark_dirty();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingAxis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalRing {
    pub part: PartId,
    pub axis: RingAxis,
    pub speed: f64,
    pub phase: f64,
}

/// Rings spinning on one axis while wobbling on the other, with a bobbing
/// sphere above them.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalRings {
    pub entity: EntityId,
    pub rings: Vec<OrbitalRing>,
    pub sphere: PartId,
    pub sphere_height: f64,
}

impl OrbitalRings {
    pub fn update(&self, frame: &FrameTime, world: &mut SceneWorld) {
        let Some(entity) = world.find_entity_mut(self.entity) else {
            return;
        };
        let scale = frame_scale(frame.delta_seconds);
        let elapsed = frame.elapsed_seconds;

        for ring in &self.rings {
            let Some(part) = entity.part_mut(ring.part) else {
                continue;
            };
            let spin = ring.speed * 0.01 * scale;
            let wobble = (elapsed * ring.speed + ring.phase).sin() * 0.5;
            let rotation = &mut part.transform.rotation;
            match ring.axis {
                RingAxis::X => {
                    rotation.x += spin;
                    rotation.y = wobble;
                }
                RingAxis::Y => {
                    rotation.y += spin;
                    rotation.x = wobble;
                }
            }
        }

        if let Some(sphere) = entity.part_mut(self.sphere) {
            sphere.transform.position.y = self.sphere_height + (elapsed * 2.0).sin() * 0.1;
            sphere.transform.rotation.y += 0.02 * scale;
            sphere.transform.rotation.x += 0.01 * scale;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gear {
    pub part: PartId,
    /// Radians per second; sign gives the direction.
    pub rotation_speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GearTrain {
    pub entity: EntityId,
    pub gears: Vec<Gear>,
}

impl GearTrain {
    /// Meshing gears turn in alternating directions, each a little faster.
    pub fn alternating_speed(index: usize) -> f64 {
        let direction = if index % 2 == 0 { 1.0 } else { -1.0 };
        direction * (1.0 + index as f64 * 0.5)
    }

    pub fn update(&self, frame: &FrameTime, world: &mut SceneWorld) {
        let Some(entity) = world.find_entity_mut(self.entity) else {
            return;
        };
        for gear in &self.gears {
            if let Some(part) = entity.part_mut(gear.part) {
                part.transform.rotation.y += gear.rotation_speed * frame.delta_seconds;
            }
        }
    }
}

/// Projection plane and particle cloud turning about the vertical axis. Angles
/// follow the scene clock, so a reload starts them over.
#[derive(Debug, Clone, PartialEq)]
pub struct HologramProjector {
    pub entity: EntityId,
    pub projection: PartId,
    pub particles: PartId,
    pub projection_spin: f64,
    pub particle_spin: f64,
}

impl HologramProjector {
    pub fn update(&self, frame: &FrameTime, world: &mut SceneWorld) {
        let Some(entity) = world.find_entity_mut(self.entity) else {
            return;
        };
        let elapsed = frame.elapsed_seconds;
        entity.set_part_rotation_y(self.projection, elapsed * self.projection_spin);
        entity.set_part_rotation_y(self.particles, elapsed * self.particle_spin);
    }
}

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Analog wall clock. Hands turn clockwise, so each part is rotated by the
/// negated dial angle.
#[derive(Debug, Clone, PartialEq)]
pub struct WallClock {
    pub entity: EntityId,
    pub hour_hand: PartId,
    pub minute_hand: PartId,
    pub second_hand: PartId,
    /// Time of day when the scene clock read zero.
    pub start_seconds: f64,
}

impl WallClock {
    /// Dial angles `[hour, minute, second]` for a time of day. Hands move in
    /// whole-second ticks.
    pub fn hand_angles(seconds_of_day: f64) -> [f64; 3] {
        let total = seconds_of_day.rem_euclid(SECONDS_PER_DAY).floor();
        let seconds = total % 60.0;
        let minutes = (total / 60.0).floor() % 60.0;
        let hours = (total / 3_600.0).floor() % 12.0;
        [
            (hours + minutes / 60.0) / 12.0 * TAU,
            (minutes + seconds / 60.0) / 60.0 * TAU,
            seconds / 60.0 * TAU,
        ]
    }

    pub fn update(&self, frame: &FrameTime, world: &mut SceneWorld) {
        let Some(entity) = world.find_entity_mut(self.entity) else {
            return;
        };
        let angles = Self::hand_angles(self.start_seconds + frame.elapsed_seconds);
        let hands = [self.hour_hand, self.minute_hand, self.second_hand];
        for (hand, angle) in hands.into_iter().zip(angles) {
            entity.set_part_rotation_z(hand, -angle);
        }
    }
}

/// Seconds past midnight UTC on the host clock, or `0` if it reads before the
/// Unix epoch.
pub fn wall_clock_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_secs_f64().rem_euclid(SECONDS_PER_DAY))
        .unwrap_or(0.0)
}
