use glam::DVec3;
use thiserror::Error;

pub const MIN_PATH_WAYPOINTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path needs at least {MIN_PATH_WAYPOINTS} waypoints, got {actual}")]
    TooFewWaypoints { actual: usize },
}

/// Piecewise-linear route through waypoints, parametrized by `t ∈ [0, 1]`
/// with every segment taking an equal share of `t` regardless of its length.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    waypoints: Vec<DVec3>,
}

impl Path {
    pub fn new(waypoints: Vec<DVec3>) -> Result<Self, PathError> {
        if waypoints.len() < MIN_PATH_WAYPOINTS {
            return Err(PathError::TooFewWaypoints {
                actual: waypoints.len(),
            });
        }
        Ok(Self { waypoints })
    }

    pub fn waypoints(&self) -> &[DVec3] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn first(&self) -> DVec3 {
        self.waypoints[0]
    }

    pub fn last(&self) -> DVec3 {
        self.waypoints[self.waypoints.len() - 1]
    }

    pub fn waypoint(&self, index: usize) -> Option<DVec3> {
        self.waypoints.get(index).copied()
    }

    pub fn sample(&self, t: f64) -> DVec3 {
        sample_path(&self.waypoints, t)
    }
}

/// Segment `floor(t·(N−1))`, local fraction `frac(t·(N−1))`, upper index
/// clamped to the last waypoint. Looping is the caller's job.
pub(crate) fn sample_path(waypoints: &[DVec3], t: f64) -> DVec3 {
    let last = waypoints.len() - 1;
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * last as f64;
    let index = (scaled.floor() as usize).min(last);
    let next_index = (index + 1).min(last);
    let local_t = scaled.fract();
    let from = waypoints[index];
    let to = waypoints[next_index];
    DVec3::new(
        lerp(from.x, to.x, local_t),
        lerp(from.y, to.y, local_t),
        lerp(from.z, to.z, local_t),
    )
}

pub(crate) fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
