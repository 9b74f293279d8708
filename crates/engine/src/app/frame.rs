use std::time::Duration;

use tracing::{debug, info, warn};

use super::scene::{SceneRuntime, SceneWorld};
use super::{InputSnapshot, Scene, SceneCommand};

pub const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Timing handed to every updater for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    pub delta_seconds: f64,
    pub elapsed_seconds: f64,
    pub frame_index: u64,
    pub clamped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePhase {
    Camera,
    Actors,
    Wildlife,
    Ai,
    Uniforms,
    Overlay,
}

pub const FRAME_PHASE_ORDER: [FramePhase; 6] = [
    FramePhase::Camera,
    FramePhase::Actors,
    FramePhase::Wildlife,
    FramePhase::Ai,
    FramePhase::Uniforms,
    FramePhase::Overlay,
];

impl FramePhase {
    pub const fn index(self) -> usize {
        match self {
            FramePhase::Camera => 0,
            FramePhase::Actors => 1,
            FramePhase::Wildlife => 2,
            FramePhase::Ai => 3,
            FramePhase::Uniforms => 4,
            FramePhase::Overlay => 5,
        }
    }
}

/// Turns raw host deltas into clamped frame timing. Elapsed time is the sum of
/// clamped deltas, so it never runs ahead of what the updaters saw.
#[derive(Debug, Clone)]
pub struct FrameClock {
    max_frame_delta: Duration,
    elapsed: Duration,
    frame_index: u64,
}

impl FrameClock {
    pub fn new(max_frame_delta: Duration) -> Self {
        Self {
            max_frame_delta: normalize_non_zero_duration(max_frame_delta, DEFAULT_MAX_FRAME_DELTA),
            elapsed: Duration::ZERO,
            frame_index: 0,
        }
    }

    pub fn advance(&mut self, raw_delta: Duration) -> FrameTime {
        let delta = clamp_frame_delta(raw_delta, self.max_frame_delta);
        self.elapsed = self.elapsed.saturating_add(delta);
        let frame = FrameTime {
            delta_seconds: delta.as_secs_f64(),
            elapsed_seconds: self.elapsed.as_secs_f64(),
            frame_index: self.frame_index,
            clamped: delta < raw_delta,
        };
        self.frame_index = self.frame_index.saturating_add(1);
        frame
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn max_frame_delta(&self) -> Duration {
        self.max_frame_delta
    }
}

pub(crate) fn clamp_frame_delta(frame_delta: Duration, max_frame_delta: Duration) -> Duration {
    frame_delta.min(max_frame_delta)
}

pub(crate) fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub frame: FrameTime,
    pub command: SceneCommand,
}

/// Owns the scene and the clock; runs every phase once per frame, then renders.
pub struct FrameDriver {
    runtime: SceneRuntime,
    clock: FrameClock,
    last_frame_order: Vec<FramePhase>,
    clamped_frames: u64,
}

impl FrameDriver {
    pub fn new(scene: Box<dyn Scene>, world: SceneWorld, max_frame_delta: Duration) -> Self {
        Self {
            runtime: SceneRuntime::new(scene, world),
            clock: FrameClock::new(max_frame_delta),
            last_frame_order: Vec::with_capacity(FRAME_PHASE_ORDER.len()),
            clamped_frames: 0,
        }
    }

    pub fn load(&mut self) {
        if self.runtime.is_loaded() {
            return;
        }
        self.runtime.load();
        info!(
            entity_count = self.runtime.world().entity_count(),
            "scene_loaded"
        );
    }

    pub fn step(&mut self, raw_delta: Duration, input: &InputSnapshot) -> FrameOutcome {
        if !self.runtime.is_loaded() {
            self.load();
        }

        let frame = self.clock.advance(raw_delta);
        if frame.clamped {
            self.clamped_frames = self.clamped_frames.saturating_add(1);
            warn!(
                raw_delta_ms = raw_delta.as_millis() as u64,
                max_frame_delta_ms = self.clock.max_frame_delta().as_millis() as u64,
                frame_index = frame.frame_index,
                "frame_delta_clamped"
            );
        }

        self.last_frame_order.clear();
        for phase in FRAME_PHASE_ORDER {
            self.runtime.update_phase(phase, &frame, input);
            self.last_frame_order.push(phase);
        }
        self.runtime.apply_pending();
        self.runtime.render();

        let command = self.runtime.command(input);
        if command == SceneCommand::Reset {
            self.runtime.hard_reset();
            info!(
                entity_count = self.runtime.world().entity_count(),
                "scene_reset"
            );
        }

        FrameOutcome { frame, command }
    }

    pub fn world(&self) -> &SceneWorld {
        self.runtime.world()
    }

    pub fn world_mut(&mut self) -> &mut SceneWorld {
        self.runtime.world_mut()
    }

    pub fn last_frame_order(&self) -> &[FramePhase] {
        &self.last_frame_order
    }

    pub fn clamped_frames(&self) -> u64 {
        self.clamped_frames
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn debug_title(&self) -> Option<String> {
        self.runtime.debug_title()
    }

    pub fn shutdown(&mut self) {
        self.runtime.shutdown();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessSummary {
    pub frames_run: u64,
    pub elapsed_seconds: f64,
    pub clamped_frames: u64,
    pub entity_count: usize,
    pub quit_requested: bool,
}

/// Steps the driver with a fixed delta and empty input. Stops early on quit.
pub fn run_headless(
    driver: &mut FrameDriver,
    frames: u64,
    fixed_delta: Duration,
) -> HeadlessSummary {
    driver.load();
    let input = InputSnapshot::empty();
    let mut frames_run = 0;
    let mut quit_requested = false;
    for _ in 0..frames {
        let outcome = driver.step(fixed_delta, &input);
        frames_run += 1;
        if outcome.command == SceneCommand::Quit {
            quit_requested = true;
            break;
        }
    }
    let summary = HeadlessSummary {
        frames_run,
        elapsed_seconds: driver.elapsed().as_secs_f64(),
        clamped_frames: driver.clamped_frames(),
        entity_count: driver.world().entity_count(),
        quit_requested,
    };
    debug!(?summary, "headless_run_finished");
    driver.shutdown();
    summary
}
