use serde::{Deserialize, Serialize};

use crate::app::{EntityId, FrameTime, MaterialId, SceneWorld, ShaderUniformState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniformMode {
    /// `time += dt`
    Accumulate,
    /// `time = elapsed`
    Absolute,
}

/// Advances the `time` uniform of one material each frame.
///
/// Without a wrap period the value grows for the whole session; the shaders
/// consuming it are periodic so that only costs precision after many hours.
/// A `wrap_period` that is a multiple of every shader period keeps it bounded.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformTicker {
    pub entity: EntityId,
    pub material: MaterialId,
    pub mode: UniformMode,
    pub wrap_period: Option<f64>,
}

impl UniformTicker {
    pub fn new(entity: EntityId, material: MaterialId, mode: UniformMode) -> Self {
        Self {
            entity,
            material,
            mode,
            wrap_period: None,
        }
    }

    pub fn with_wrap_period(mut self, wrap_period: Option<f64>) -> Self {
        self.wrap_period = wrap_period.filter(|period| period.is_finite() && *period > 0.0);
        self
    }

    pub fn next_time(&self, current: f64, frame: &FrameTime) -> f64 {
        let time = match self.mode {
            UniformMode::Accumulate => current + frame.delta_seconds,
            UniformMode::Absolute => frame.elapsed_seconds,
        };
        match self.wrap_period {
            Some(period) => wrap_phase(time, period),
            None => time,
        }
    }

    pub fn tick(&self, frame: &FrameTime, world: &mut SceneWorld) {
        let Some(uniforms) = material_uniforms(world, self.entity, self.material) else {
            return;
        };
        uniforms.time = self.next_time(uniforms.time, frame);
        uniforms.mark_dirty();
    }
}

pub fn wrap_phase(value: f64, period: f64) -> f64 {
    if period > 0.0 && value.is_finite() {
        value.rem_euclid(period)
    } else {
        value
    }
}

/// `base + sin(elapsed·rate + phase)·amplitude`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillation {
    pub base: f64,
    pub amplitude: f64,
    pub rate: f64,
    pub phase: f64,
}

impl Oscillation {
    pub fn value_at(&self, elapsed_seconds: f64) -> f64 {
        self.base + (elapsed_seconds * self.rate + self.phase).sin() * self.amplitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformChannel {
    Emissive,
    Opacity,
}

/// Drives an emissive or opacity uniform from the elapsed clock, e.g. a torch
/// flicker or a light shaft shimmer.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformOscillator {
    pub entity: EntityId,
    pub material: MaterialId,
    pub channel: UniformChannel,
    pub wave: Oscillation,
}

impl UniformOscillator {
    pub fn tick(&self, frame: &FrameTime, world: &mut SceneWorld) {
        let Some(uniforms) = material_uniforms(world, self.entity, self.material) else {
            return;
        };
        let value = self.wave.value_at(frame.elapsed_seconds);
        match self.channel {
            UniformChannel::Emissive => uniforms.emissive_intensity = value,
            UniformChannel::Opacity => uniforms.opacity = value.clamp(0.0, 1.0),
        }
        uniforms.mark_dirty();
    }
}

pub(crate) fn material_uniforms(
    world: &mut SceneWorld,
    entity: EntityId,
    material: MaterialId,
) -> Option<&mut ShaderUniformState> {
    world
        .find_entity_mut(entity)
        .and_then(|entity| entity.material_mut(material))
        .map(|material| &mut material.uniforms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{EntityDesc, EntityKind, Transform};

    fn frame(delta_seconds: f64, elapsed_seconds: f64) -> FrameTime {
        FrameTime {
            delta_seconds,
            elapsed_seconds,
            ..FrameTime::default()
        }
    }

    fn world_with_material() -> (SceneWorld, EntityId, MaterialId) {
        let mut world = SceneWorld::default();
        let mut desc = EntityDesc::new(EntityKind::Artwork, "painting", Transform::default());
        let material = desc.add_material("canvas", ShaderUniformState::default());
        let id = world.spawn(desc);
        world.apply_pending();
        (world, id, material)
    }

    #[test]
    fn accumulate_adds_delta_and_marks_dirty() {
        let (mut world, id, material) = world_with_material();
        let ticker = UniformTicker::new(id, material, UniformMode::Accumulate);
        ticker.tick(&frame(0.5, 10.0), &mut world);
        ticker.tick(&frame(0.25, 10.25), &mut world);
        let uniforms = world
            .find_entity(id)
            .and_then(|entity| entity.material(material))
            .expect("material")
            .uniforms;
        assert!((uniforms.time - 0.75).abs() < 1e-12);
        assert!(uniforms.is_dirty());
    }

    #[test]
    fn absolute_tracks_elapsed() {
        let ticker = UniformTicker::new(EntityId(0), MaterialId(0), UniformMode::Absolute);
        assert_eq!(ticker.next_time(123.0, &frame(0.016, 4.5)), 4.5);
    }

    #[test]
    fn wrap_period_bounds_the_phase() {
        let ticker = UniformTicker::new(EntityId(0), MaterialId(0), UniformMode::Accumulate)
            .with_wrap_period(Some(std::f64::consts::TAU));
        let mut time = 0.0;
        for _ in 0..10_000 {
            time = ticker.next_time(time, &frame(0.1, 0.0));
            assert!((0.0..std::f64::consts::TAU).contains(&time));
        }
    }

    #[test]
    fn non_positive_wrap_period_is_ignored() {
        let ticker = UniformTicker::new(EntityId(0), MaterialId(0), UniformMode::Accumulate)
            .with_wrap_period(Some(0.0));
        assert_eq!(ticker.wrap_period, None);
        assert_eq!(ticker.next_time(1e6, &frame(1.0, 0.0)), 1e6 + 1.0);
    }

    #[test]
    fn opacity_oscillator_stays_in_unit_range() {
        let (mut world, id, material) = world_with_material();
        let shimmer = UniformOscillator {
            entity: id,
            material,
            channel: UniformChannel::Opacity,
            wave: Oscillation {
                base: 0.12,
                amplitude: 0.3,
                rate: 1.0,
                phase: 2.0,
            },
        };
        for step in 0..200 {
            shimmer.tick(&frame(0.05, step as f64 * 0.05), &mut world);
            let opacity = world
                .find_entity(id)
                .and_then(|entity| entity.material(material))
                .expect("material")
                .uniforms
                .opacity;
            assert!((0.0..=1.0).contains(&opacity));
        }
    }

    #[test]
    fn missing_entity_is_ignored() {
        let mut world = SceneWorld::default();
        UniformTicker::new(EntityId(42), MaterialId(0), UniformMode::Absolute)
            .tick(&frame(0.1, 1.0), &mut world);
        assert_eq!(world.entity_count(), 0);
    }
}
