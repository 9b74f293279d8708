//! Boids for the gallery birds.
//!
//! Neighbour search is a plain O(n²) scan. That is fine for the fifteen or so
//! birds a room holds; a larger flock needs a spatial index first.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::app::{EntityId, FrameTime, PartId, SceneWorld};

use super::frame_scale;
use super::geometry::{clamp_length, look_rotation, RoomBounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlockIntegration {
    /// Per-frame tuning constants are scaled by [`frame_scale`], like every
    /// other frame-tuned updater.
    FrameScaled,
    /// One update equals one reference frame regardless of `dt`, so flight
    /// speed follows the frame rate. Applies to birds only.
    PerFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    pub count: usize,
    pub separation_distance: f64,
    pub alignment_distance: f64,
    pub cohesion_distance: f64,
    pub separation_weight: f64,
    pub alignment_blend: f64,
    pub cohesion_weight: f64,
    pub boundary_margin: f64,
    pub boundary_nudge: f64,
    pub max_speed: f64,
    pub facing_threshold: f64,
    pub wing_rate: f64,
    pub wing_amplitude: f64,
    pub integration: FlockIntegration,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            count: 15,
            separation_distance: 0.5,
            alignment_distance: 1.5,
            cohesion_distance: 2.0,
            separation_weight: 0.05,
            alignment_blend: 0.05,
            cohesion_weight: 0.02,
            boundary_margin: 2.0,
            boundary_nudge: 0.01,
            max_speed: 0.1,
            facing_threshold: 0.01,
            wing_rate: 10.0,
            wing_amplitude: 0.5,
            integration: FlockIntegration::FrameScaled,
        }
    }
}

impl FlockConfig {
    pub fn frame_scale(&self, dt: f64) -> f64 {
        match self.integration {
            FlockIntegration::FrameScaled => frame_scale(dt),
            FlockIntegration::PerFrame => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bird {
    pub entity: EntityId,
    pub left_wing: PartId,
    pub right_wing: PartId,
    pub position: DVec3,
    /// Displacement per reference frame.
    pub velocity: DVec3,
    pub wing_phase: f64,
    pub rotation: DVec3,
}

#[derive(Debug, Clone, Copy, Default)]
struct Neighbourhood {
    separation: DVec3,
    separation_count: u32,
    alignment: DVec3,
    alignment_count: u32,
    cohesion: DVec3,
    cohesion_count: u32,
}

#[derive(Debug, Clone)]
pub struct Flock {
    pub birds: Vec<Bird>,
    pub config: FlockConfig,
    snapshot: Vec<(DVec3, DVec3)>,
}

impl Flock {
    pub fn new(birds: Vec<Bird>, config: FlockConfig) -> Self {
        Self {
            snapshot: Vec::with_capacity(birds.len()),
            birds,
            config,
        }
    }

    /// Advances every bird by one frame and writes transforms and wing angles.
    pub fn update(&mut self, frame: &FrameTime, room: RoomBounds, world: &mut SceneWorld) {
        self.step(frame.delta_seconds, room);
        for bird in &self.birds {
            let Some(entity) = world.find_entity_mut(bird.entity) else {
                continue;
            };
            entity.transform.position = bird.position;
            entity.transform.rotation = bird.rotation;
            let wing_angle = bird.wing_phase.sin() * self.config.wing_amplitude;
            entity.set_part_rotation_z(bird.left_wing, wing_angle);
            entity.set_part_rotation_z(bird.right_wing, -wing_angle);
        }
    }

    pub fn step(&mut self, dt: f64, room: RoomBounds) {
        let config = self.config;
        let frame_scale = config.frame_scale(dt);

        // Neighbours are read from last frame's state.
        self.snapshot.clear();
        self.snapshot
            .extend(self.birds.iter().map(|bird| (bird.position, bird.velocity)));

        for (index, bird) in self.birds.iter_mut().enumerate() {
            let near = gather_neighbourhood(&self.snapshot, index, &config);
            let mut velocity = bird.velocity;

            if near.separation_count > 0 {
                let push = near.separation / near.separation_count as f64;
                velocity += push * config.separation_weight * frame_scale;
            }
            if near.alignment_count > 0 {
                let average = near.alignment / near.alignment_count as f64;
                let blend = 1.0 - (1.0 - config.alignment_blend).powf(frame_scale);
                velocity = velocity.lerp(average, blend);
            }
            if near.cohesion_count > 0 {
                let centroid = near.cohesion / near.cohesion_count as f64;
                let desired = (centroid - bird.position).normalize_or_zero();
                velocity += desired * config.cohesion_weight * frame_scale;
            }

            velocity += boundary_nudge(bird.position, room, &config) * frame_scale;
            velocity = clamp_length(velocity, config.max_speed);

            let (position, velocity) =
                contain(bird.position + velocity * frame_scale, velocity, room);
            bird.position = position;
            bird.velocity = velocity;

            if velocity.length() > config.facing_threshold {
                if let Some(rotation) = look_rotation(velocity) {
                    bird.rotation = rotation;
                }
            }
            bird.wing_phase += dt * config.wing_rate;
        }
    }
}

fn gather_neighbourhood(
    snapshot: &[(DVec3, DVec3)],
    index: usize,
    config: &FlockConfig,
) -> Neighbourhood {
    let (position, _) = snapshot[index];
    let mut near = Neighbourhood::default();
    for (other_index, (other_position, other_velocity)) in snapshot.iter().enumerate() {
        if other_index == index {
            continue;
        }
        let offset = position - *other_position;
        let distance = offset.length();

        // Coincident birds have no defined away-direction.
        if distance < config.separation_distance && distance > 0.0 {
            near.separation += offset / distance / distance;
            near.separation_count += 1;
        }
        if distance < config.alignment_distance {
            near.alignment += *other_velocity;
            near.alignment_count += 1;
        }
        if distance < config.cohesion_distance {
            near.cohesion += *other_position;
            near.cohesion_count += 1;
        }
    }
    near
}

fn boundary_nudge(position: DVec3, room: RoomBounds, config: &FlockConfig) -> DVec3 {
    let margin = config.boundary_margin;
    let nudge = config.boundary_nudge;
    let mut push = DVec3::ZERO;

    if position.x > room.half_width() - margin {
        push.x -= nudge;
    } else if position.x < -room.half_width() + margin {
        push.x += nudge;
    }
    if position.z > room.half_depth() - margin {
        push.z -= nudge;
    } else if position.z < -room.half_depth() + margin {
        push.z += nudge;
    }
    if position.y > room.height - margin {
        push.y -= nudge;
    } else if position.y < room.height * 0.5 {
        push.y += nudge;
    }
    push
}

/// Clamps into the room and turns any velocity component that crossed a wall
/// back inward.
fn contain(position: DVec3, mut velocity: DVec3, room: RoomBounds) -> (DVec3, DVec3) {
    let min = room.min();
    let max = room.max();
    let clamped = position.clamp(min, max);
    for axis in 0..3 {
        if position[axis] > max[axis] {
            velocity[axis] = -velocity[axis].abs();
        } else if position[axis] < min[axis] {
            velocity[axis] = velocity[axis].abs();
        }
    }
    (clamped, velocity)
}
