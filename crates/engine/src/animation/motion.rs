use glam::DVec3;

use crate::app::{EntityId, PartId, SceneWorld};

use super::geometry::yaw_from_direction;
use super::path::Path;

/// Distance in `t` within which a pause point triggers.
pub const PAUSE_POINT_TOLERANCE: f64 = 0.01;
/// How far ahead along the path the facing sample is taken.
pub const LOOK_AHEAD: f64 = 0.01;
pub const LIMB_SWING_AMPLITUDE: f64 = 0.3;
pub const IDLE_SWAY_AMPLITUDE: f64 = 0.3;
const IDLE_SWAY_RATE: f64 = 2.0;

/// Per-walker animation state for following a looped [`Path`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMotionState {
    pub path_progress: f64,
    pub speed: f64,
    pub is_paused: bool,
    pub pause_elapsed: f64,
    pub pause_duration: f64,
    pub walk_cycle_phase: f64,
    pub pause_points: Vec<f64>,
    yaw: f64,
    // Index of the pause point that was last served; it stays disarmed until
    // progress leaves its tolerance window.
    served_pause_point: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionStep {
    Paused { head_sway: f64, resumed: bool },
    PauseEntered,
    Moved {
        position: DVec3,
        yaw: f64,
        leg_swing: f64,
    },
}

impl EntityMotionState {
    pub fn new(speed: f64) -> Self {
        Self {
            path_progress: 0.0,
            speed,
            is_paused: false,
            pause_elapsed: 0.0,
            pause_duration: 0.0,
            walk_cycle_phase: 0.0,
            pause_points: Vec::new(),
            yaw: 0.0,
            served_pause_point: None,
        }
    }

    pub fn with_pauses(mut self, pause_points: Vec<f64>, pause_duration: f64) -> Self {
        self.pause_points = pause_points;
        self.pause_duration = pause_duration.max(0.0);
        self
    }

    pub fn with_start_progress(mut self, progress: f64) -> Self {
        self.path_progress = wrap_progress(progress);
        self
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn advance(&mut self, path: &Path, dt: f64, cycle_rate: f64) -> MotionStep {
        if self.is_paused {
            self.pause_elapsed += dt;
            let resumed = self.pause_elapsed >= self.pause_duration;
            if resumed {
                self.is_paused = false;
                self.pause_elapsed = 0.0;
            }
            return MotionStep::Paused {
                head_sway: (self.pause_elapsed * IDLE_SWAY_RATE).sin() * IDLE_SWAY_AMPLITUDE,
                resumed,
            };
        }

        self.path_progress += self.speed * dt;

        if self.try_enter_pause() {
            return MotionStep::PauseEntered;
        }

        if self.path_progress >= 1.0 {
            self.path_progress = 0.0;
        }

        let (position, yaw) = sample_with_heading(path, self.path_progress);
        if let Some(yaw) = yaw {
            self.yaw = yaw;
        }

        self.walk_cycle_phase += dt * cycle_rate;
        MotionStep::Moved {
            position,
            yaw: self.yaw,
            leg_swing: self.walk_cycle_phase.sin() * LIMB_SWING_AMPLITUDE,
        }
    }

    fn try_enter_pause(&mut self) -> bool {
        if let Some(served) = self.served_pause_point {
            let still_inside = self
                .pause_points
                .get(served)
                .is_some_and(|point| (self.path_progress - point).abs() < PAUSE_POINT_TOLERANCE);
            if !still_inside {
                self.served_pause_point = None;
            }
        }

        let hit = self.pause_points.iter().position(|point| {
            (self.path_progress - point).abs() < PAUSE_POINT_TOLERANCE
        });
        match hit {
            Some(index) if self.served_pause_point != Some(index) => {
                self.is_paused = true;
                self.served_pause_point = Some(index);
                true
            }
            _ => false,
        }
    }
}

/// Position at `t` plus the yaw toward the look-ahead sample, if the two differ
/// horizontally.
pub fn sample_with_heading(path: &Path, t: f64) -> (DVec3, Option<f64>) {
    let current = path.sample(t);
    let ahead = path.sample((t + LOOK_AHEAD).min(1.0));
    (current, yaw_from_direction(ahead - current))
}

pub fn wrap_progress(progress: f64) -> f64 {
    if progress.is_finite() {
        progress.rem_euclid(1.0)
    } else {
        0.0
    }
}

/// Named limb handles of a humanoid rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimbRig {
    pub head: PartId,
    pub left_arm: PartId,
    pub right_arm: PartId,
    pub left_leg: PartId,
    pub right_leg: PartId,
}

impl LimbRig {
    /// Legs swing in opposition, arms at half amplitude against the legs.
    pub fn apply_swing(&self, world: &mut SceneWorld, entity: EntityId, leg_swing: f64) {
        let Some(entity) = world.find_entity_mut(entity) else {
            return;
        };
        entity.set_part_rotation_x(self.left_leg, leg_swing);
        entity.set_part_rotation_x(self.right_leg, -leg_swing);
        entity.set_part_rotation_x(self.left_arm, -leg_swing * 0.5);
        entity.set_part_rotation_x(self.right_arm, leg_swing * 0.5);
    }
}

/// Humanoid walking a closed path with optional pause points.
#[derive(Debug, Clone)]
pub struct PathWalker {
    pub entity: EntityId,
    pub rig: LimbRig,
    pub path: Path,
    pub motion: EntityMotionState,
    pub cycle_rate: f64,
}

impl PathWalker {
    pub fn update(&mut self, dt: f64, world: &mut SceneWorld) -> MotionStep {
        let step = self.motion.advance(&self.path, dt, self.cycle_rate);
        match step {
            MotionStep::Paused { head_sway, .. } => {
                if let Some(entity) = world.find_entity_mut(self.entity) {
                    entity.set_part_rotation_y(self.rig.head, head_sway);
                }
            }
            MotionStep::PauseEntered => {}
            MotionStep::Moved {
                position,
                yaw,
                leg_swing,
            } => {
                if let Some(entity) = world.find_entity_mut(self.entity) {
                    entity.transform.position = position;
                    entity.transform.rotation.y = yaw;
                }
                self.rig.apply_swing(world, self.entity, leg_swing);
            }
        }
        step
    }
}

#[derive(Debug, Clone)]
pub enum CameraMount {
    /// Rides a looped ceiling path, sweeping around its travel heading.
    Patrol {
        path: Path,
        progress: f64,
        speed: f64,
        heading: f64,
    },
    /// Bolted in place, sweeping around a fixed yaw.
    Fixed { center_yaw: f64 },
}

#[derive(Debug, Clone)]
pub struct SecurityCamera {
    pub entity: EntityId,
    pub mount: CameraMount,
    pub sweep_angle: f64,
    pub sweep_speed: f64,
    pub sweep_time: f64,
}

const PATROL_SWEEP_FACTOR: f64 = 0.3;
const FIXED_SWEEP_FACTOR: f64 = 0.5;

impl SecurityCamera {
    pub fn update(&mut self, dt: f64, world: &mut SceneWorld) {
        self.sweep_time += dt * self.sweep_speed;
        let sweep = self.sweep_time.sin() * self.sweep_angle;

        let (position, yaw) = match &mut self.mount {
            CameraMount::Patrol {
                path,
                progress,
                speed,
                heading,
            } => {
                *progress += *speed * dt;
                if *progress >= 1.0 {
                    *progress = 0.0;
                }
                let (position, yaw) = sample_with_heading(path, *progress);
                if let Some(yaw) = yaw {
                    *heading = yaw;
                }
                (Some(position), *heading + sweep * PATROL_SWEEP_FACTOR)
            }
            CameraMount::Fixed { center_yaw } => (None, *center_yaw + sweep * FIXED_SWEEP_FACTOR),
        };

        if let Some(entity) = world.find_entity_mut(self.entity) {
            if let Some(position) = position {
                entity.transform.position = position;
            }
            entity.transform.rotation.y = yaw;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{EntityDesc, EntityKind, Transform};

    const EPS: f64 = 1e-9;

    fn l_path() -> Path {
        Path::new(vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(10.0, 0.0, 0.0),
            DVec3::new(10.0, 0.0, 10.0),
        ])
        .expect("valid path")
    }

    fn square_loop() -> Path {
        Path::new(vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(4.0, 0.0, 0.0),
            DVec3::new(4.0, 0.0, 4.0),
            DVec3::new(0.0, 0.0, 4.0),
            DVec3::new(0.0, 0.0, 0.0),
        ])
        .expect("valid path")
    }

    fn spawn_humanoid(world: &mut SceneWorld) -> (EntityId, LimbRig) {
        let mut desc = EntityDesc::new(EntityKind::Visitor, "walker", Transform::default());
        let rig = LimbRig {
            head: desc.add_part("head", Transform::default()),
            left_arm: desc.add_part("left_arm", Transform::default()),
            right_arm: desc.add_part("right_arm", Transform::default()),
            left_leg: desc.add_part("left_leg", Transform::default()),
            right_leg: desc.add_part("right_leg", Transform::default()),
        };
        let id = world.spawn(desc);
        world.apply_pending();
        (id, rig)
    }

    #[test]
    fn five_one_second_steps_reach_path_midpoint() {
        let path = l_path();
        let mut motion = EntityMotionState::new(0.1);
        let mut last = None;
        for _ in 0..5 {
            last = Some(motion.advance(&path, 1.0, 5.0));
        }
        assert!((motion.path_progress - 0.5).abs() < EPS);
        let Some(MotionStep::Moved { position, .. }) = last else {
            panic!("expected movement, got {last:?}");
        };
        assert!((position - DVec3::new(10.0, 0.0, 0.0)).abs().max_element() < EPS);
    }

    #[test]
    fn progress_wraps_to_zero_and_visits_waypoints_in_order() {
        let path = square_loop();
        let mut motion = EntityMotionState::new(0.0625);
        let mut corners_seen = Vec::new();
        let mut wraps = 0;
        let mut previous = motion.path_progress;
        for _ in 0..16 {
            let step = motion.advance(&path, 1.0, 5.0);
            if motion.path_progress < previous {
                wraps += 1;
            }
            previous = motion.path_progress;
            if let MotionStep::Moved { position, .. } = step {
                let hit = path
                    .waypoints()
                    .iter()
                    .position(|waypoint| (position - *waypoint).length() < 1e-6);
                if let Some(index) = hit {
                    corners_seen.push(index);
                }
            }
        }
        assert_eq!(wraps, 1);
        assert_eq!(corners_seen, vec![1, 2, 3, 0]);
    }

    #[test]
    fn pause_freezes_progress_until_duration_elapses() {
        let path = l_path();
        let mut motion = EntityMotionState::new(0.1).with_pauses(vec![0.3], 2.0);

        for _ in 0..3 {
            motion.advance(&path, 1.0, 5.0);
        }
        assert!(motion.is_paused);
        let frozen = motion.path_progress;

        let step = motion.advance(&path, 0.5, 5.0);
        assert!(matches!(step, MotionStep::Paused { resumed: false, .. }));
        assert_eq!(motion.path_progress, frozen);
        motion.advance(&path, 1.0, 5.0);
        assert_eq!(motion.path_progress, frozen);

        let step = motion.advance(&path, 0.5, 5.0);
        assert!(matches!(step, MotionStep::Paused { resumed: true, .. }));
        assert!(!motion.is_paused);
        assert_eq!(motion.pause_elapsed, 0.0);
        assert_eq!(motion.path_progress, frozen);
    }

    #[test]
    fn served_pause_point_is_not_reentered_on_resume() {
        let path = l_path();
        let mut motion = EntityMotionState::new(0.001).with_pauses(vec![0.0105], 0.1);
        let mut pauses = 0;
        for _ in 0..40 {
            if motion.advance(&path, 1.0, 5.0) == MotionStep::PauseEntered {
                pauses += 1;
            }
        }
        assert_eq!(pauses, 1);
        assert!(motion.path_progress > 0.02);
    }

    #[test]
    fn stationary_path_keeps_previous_yaw() {
        let path = Path::new(vec![DVec3::new(1.0, 0.0, 1.0), DVec3::new(1.0, 2.0, 1.0)])
            .expect("valid path");
        let mut motion = EntityMotionState::new(0.1);
        for _ in 0..3 {
            let step = motion.advance(&path, 1.0, 5.0);
            let MotionStep::Moved { yaw, .. } = step else {
                panic!("expected movement");
            };
            assert!(yaw.is_finite());
            assert_eq!(yaw, 0.0);
        }
    }

    #[test]
    fn walker_faces_travel_direction_and_swings_limbs_in_opposition() {
        let mut world = SceneWorld::default();
        let (id, rig) = spawn_humanoid(&mut world);
        let mut walker = PathWalker {
            entity: id,
            rig,
            path: l_path(),
            motion: EntityMotionState::new(0.05),
            cycle_rate: 5.0,
        };
        walker.update(0.5, &mut world);

        let entity = world.find_entity(id).expect("walker");
        assert!((entity.transform.rotation.y - std::f64::consts::FRAC_PI_2).abs() < EPS);
        let left = entity.part(rig.left_leg).expect("leg").transform.rotation.x;
        let right = entity.part(rig.right_leg).expect("leg").transform.rotation.x;
        let left_arm = entity.part(rig.left_arm).expect("arm").transform.rotation.x;
        assert!(left > 0.0);
        assert!((left + right).abs() < EPS);
        assert!((left_arm + left * 0.5).abs() < EPS);
    }

    #[test]
    fn fixed_camera_sweeps_around_center_yaw() {
        let mut world = SceneWorld::default();
        let id = world.spawn(EntityDesc::new(
            EntityKind::SecurityCamera,
            "camera",
            Transform::default(),
        ));
        world.apply_pending();
        let mut camera = SecurityCamera {
            entity: id,
            mount: CameraMount::Fixed { center_yaw: -0.5 },
            sweep_angle: std::f64::consts::FRAC_PI_3,
            sweep_speed: 0.5,
            sweep_time: 0.0,
        };
        let mut max_offset: f64 = 0.0;
        for _ in 0..400 {
            camera.update(0.05, &mut world);
            let yaw = world.find_entity(id).expect("camera").transform.rotation.y;
            max_offset = max_offset.max((yaw + 0.5).abs());
        }
        let limit = std::f64::consts::FRAC_PI_3 * 0.5;
        assert!(max_offset <= limit + EPS);
        assert!(max_offset > limit * 0.9);
    }

    #[test]
    fn patrolling_camera_moves_along_ceiling_path() {
        let mut world = SceneWorld::default();
        let id = world.spawn(EntityDesc::new(
            EntityKind::SecurityCamera,
            "camera",
            Transform::default(),
        ));
        world.apply_pending();
        let path = Path::new(vec![
            DVec3::new(-9.0, 3.7, -6.5),
            DVec3::new(9.0, 3.7, -6.5),
            DVec3::new(9.0, 3.7, 6.5),
        ])
        .expect("valid path");
        let mut camera = SecurityCamera {
            entity: id,
            mount: CameraMount::Patrol {
                path,
                progress: 0.0,
                speed: 0.01,
                heading: 0.0,
            },
            sweep_angle: std::f64::consts::FRAC_PI_3,
            sweep_speed: 0.5,
            sweep_time: 0.0,
        };
        camera.update(1.0, &mut world);
        let position = world.find_entity(id).expect("camera").transform.position;
        assert!((position.y - 3.7).abs() < EPS);
        assert!(position.x > -9.0);
    }
}
