mod frame;
mod input;
mod loop_runner;
mod metrics;
mod overlay;
mod rendering;
mod scene;

pub use frame::{
    run_headless, FrameClock, FrameDriver, FrameOutcome, FramePhase, FrameTime, HeadlessSummary,
    DEFAULT_MAX_FRAME_DELTA, FRAME_PHASE_ORDER,
};
pub use input::InputAction;
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use overlay::{
    HudData, MarkerKind, MinimapMarker, MinimapModel, INDICATOR_PART_NAME, MINIMAP_HEIGHT,
    MINIMAP_PADDING, MINIMAP_WIDTH,
};
pub use rendering::{MinimapLayout, Renderer, Viewport};
pub use scene::{
    Entity, EntityDesc, EntityId, EntityKind, InputSnapshot, Material, MaterialId, Part, PartId,
    PlayerCamera, Scene, SceneCommand, SceneWorld, ShaderUniformState, Transform,
    PLAYER_EYE_HEIGHT,
};
