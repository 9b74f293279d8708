use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use gallery_engine::animation::{
    forward_from_yaw, wall_clock_seconds, AiState, Animator, AquariumConfig, Behavior,
    BehaviorHandle, Bird, Butterfly, ButterflySwarm, CameraMount, CleaningRobot,
    ConversationGroup, ConversationMember, EntityMotionState, Fish, FishSchool, Flock, Gear,
    GearTrain, Greeter, Guard, HologramProjector, Jellyfish, JellyfishTank, LimbRig, OrbitalRing,
    OrbitalRings, Oscillation, Path, PathError, PathWalker, RingAxis, RingSculpture, RoomBounds,
    SecurityCamera, UniformChannel, UniformMode, UniformOscillator, UniformTicker, Visitor,
    WallClock, Warden, WaypointRoute,
};
use gallery_engine::app::{
    EntityDesc, EntityKind, FramePhase, FrameTime, InputAction, InputSnapshot, MaterialId, PartId,
    PlayerCamera, Scene, SceneWorld, ShaderUniformState, Transform, INDICATOR_PART_NAME,
    PLAYER_EYE_HEIGHT,
};
use gallery_engine::config::GalleryConfig;
use gallery_engine::DVec3;
use rand::Rng;
use tracing::{debug, error, info};

include!("layout.rs");
include!("controls.rs");
include!("scene_impl.rs");

pub(crate) fn build_scene(config: GalleryConfig) -> Box<dyn Scene> {
    Box::new(GalleryScene::new(config))
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
