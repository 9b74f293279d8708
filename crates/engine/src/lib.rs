use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod animation;
pub mod app;
pub mod config;

pub use animation::{Animator, Behavior, BehaviorHandle, RoomBounds};
pub use app::{
    run_app, run_app_with_metrics, run_headless, AppError, Entity, EntityDesc, EntityId,
    EntityKind, FrameDriver, FrameOutcome, FramePhase, FrameTime, HeadlessSummary, InputAction,
    InputSnapshot, LoopConfig, LoopMetricsSnapshot, MetricsHandle, PlayerCamera, Scene,
    SceneCommand, SceneWorld, Transform, FRAME_PHASE_ORDER, SLOW_FRAME_ENV_VAR,
};
pub use config::{ConfigError, GalleryConfig, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};
pub use glam::DVec3;

pub const ROOT_ENV_VAR: &str = "GALLERY_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    /// `GALLERY_CONFIG` when set, otherwise `assets/gallery.json`.
    pub config_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "GALLERY_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/gallery\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets_dir = root.join("assets");
    let config_path = match read_env_path(CONFIG_ENV_VAR)? {
        Some(path) if path.is_absolute() => path,
        Some(path) => root.join(path),
        None => assets_dir.join(DEFAULT_CONFIG_FILE),
    };

    Ok(AppPaths {
        root,
        assets_dir,
        config_path,
    })
}

fn read_env_path(var: &'static str) -> Result<Option<PathBuf>, StartupError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(PathBuf::from(value))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(StartupError::EnvVar { var, source }),
    }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    if let Some(raw) = read_env_path(ROOT_ENV_VAR)? {
        let normalized = normalize_path(&raw);
        return if is_repo_marker(&normalized) {
            Ok(normalized)
        } else {
            Err(StartupError::InvalidEnvRoot { path: normalized })
        };
    }

    let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
    let exe_dir = exe
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

    find_repo_root(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
        start_dir: normalize_path(&exe_dir),
        env_var: ROOT_ENV_VAR,
    })
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
