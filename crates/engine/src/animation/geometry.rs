use glam::DVec3;
use serde::{Deserialize, Serialize};

const DIRECTION_EPSILON_SQ: f64 = 1e-18;

/// Axis-aligned room volume centred on the origin in x/z, floor at `y = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomBounds {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Default for RoomBounds {
    fn default() -> Self {
        Self {
            width: 20.0,
            depth: 15.0,
            height: 4.0,
        }
    }
}

impl RoomBounds {
    pub fn half_width(&self) -> f64 {
        self.width * 0.5
    }

    pub fn half_depth(&self) -> f64 {
        self.depth * 0.5
    }

    pub fn min(&self) -> DVec3 {
        DVec3::new(-self.half_width(), 0.0, -self.half_depth())
    }

    pub fn max(&self) -> DVec3 {
        DVec3::new(self.half_width(), self.height, self.half_depth())
    }

    pub fn contains(&self, point: DVec3) -> bool {
        let min = self.min();
        let max = self.max();
        point.cmpge(min).all() && point.cmple(max).all()
    }

    pub fn clamp(&self, point: DVec3) -> DVec3 {
        point.clamp(self.min(), self.max())
    }
}

/// Yaw that faces along `direction` in the horizontal plane, `atan2(dx, dz)`.
/// `None` when the horizontal component has no length.
pub fn yaw_from_direction(direction: DVec3) -> Option<f64> {
    let flat = DVec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() <= DIRECTION_EPSILON_SQ {
        return None;
    }
    let flat = flat.normalize();
    Some(flat.x.atan2(flat.z))
}

pub fn yaw_towards(from: DVec3, to: DVec3) -> Option<f64> {
    yaw_from_direction(to - from)
}

/// Euler rotation (pitch, yaw, 0) that points the local +Z axis along
/// `direction`. `None` for a zero-length direction.
pub fn look_rotation(direction: DVec3) -> Option<DVec3> {
    if direction.length_squared() <= DIRECTION_EPSILON_SQ {
        return None;
    }
    let dir = direction.normalize();
    let yaw = dir.x.atan2(dir.z);
    let pitch = -dir.y.clamp(-1.0, 1.0).asin();
    Some(DVec3::new(pitch, yaw, 0.0))
}

/// Unit vector in the horizontal plane for a yaw using the `atan2(dx, dz)`
/// convention.
pub fn forward_from_yaw(yaw: f64) -> DVec3 {
    DVec3::new(yaw.sin(), 0.0, yaw.cos())
}

pub fn clamp_length(vector: DVec3, max_length: f64) -> DVec3 {
    let length_sq = vector.length_squared();
    if length_sq > max_length * max_length && length_sq > 0.0 {
        vector * (max_length / length_sq.sqrt())
    } else {
        vector
    }
}

pub fn horizontal_distance(a: DVec3, b: DVec3) -> f64 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    (dx * dx + dz * dz).sqrt()
}
