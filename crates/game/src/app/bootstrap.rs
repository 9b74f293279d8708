use gallery_engine::app::{FrameDriver, LoopConfig, SceneWorld};
use gallery_engine::config::GalleryConfig;
use gallery_engine::{resolve_app_paths, AppError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gallery;

const HEADLESS_FRAMES_ENV_VAR: &str = "GALLERY_HEADLESS_FRAMES";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) driver: FrameDriver,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    info!("=== Gallery Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "app_root_resolved");
    let gallery_config = GalleryConfig::load_or_default(&paths.config_path)?;

    let config = LoopConfig {
        headless_frames: parse_headless_frames(std::env::var(HEADLESS_FRAMES_ENV_VAR).ok()),
        ..LoopConfig::default()
    };
    let world = SceneWorld::with_room(gallery_config.room);
    let driver = FrameDriver::new(
        gallery::build_scene(gallery_config),
        world,
        config.max_frame_delta,
    );

    Ok(AppWiring { config, driver })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_headless_frames(raw: Option<String>) -> Option<u64> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<u64>() {
        Ok(frames) if frames > 0 => Some(frames),
        _ => {
            warn!(
                var = HEADLESS_FRAMES_ENV_VAR,
                value = %raw,
                "invalid_headless_frames_ignored"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_frames_parse_positive_counts_only() {
        assert_eq!(parse_headless_frames(None), None);
        assert_eq!(parse_headless_frames(Some("  ".to_string())), None);
        assert_eq!(parse_headless_frames(Some("120".to_string())), Some(120));
        assert_eq!(parse_headless_frames(Some(" 5 ".to_string())), Some(5));
        assert_eq!(parse_headless_frames(Some("0".to_string())), None);
        assert_eq!(parse_headless_frames(Some("many".to_string())), None);
    }
}
