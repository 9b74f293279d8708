use std::f64::consts::{FRAC_PI_3, FRAC_PI_4};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::animation::{
    AquariumConfig, ButterflyConfig, FlockConfig, GreeterConfig, GuardConfig, KineticConfig,
    Oscillation, RoomBounds, VisitorConfig, WardenConfig,
};

pub const CONFIG_ENV_VAR: &str = "GALLERY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "gallery.json";
/// Smallest room (width, depth, height) the exhibit layout still fits in.
pub const MIN_ROOM_SIZE: [f64; 3] = [8.0, 6.0, 3.0];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config '{path}' at '{field}': {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value '{field}': {reason}")]
    Validation { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    pub standing_speed: f64,
    pub walking_speed: f64,
    pub cycle_rate: f64,
    pub pause_points: Vec<f64>,
    pub pause_duration_seconds: f64,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            standing_speed: 0.015,
            walking_speed: 0.02,
            cycle_rate: 5.0,
            pause_points: vec![0.25, 0.6],
            pause_duration_seconds: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityCameraConfig {
    pub path_speed: f64,
    pub sweep_angle: f64,
    pub sweep_speed: f64,
    /// Distance below the ceiling the patrol rail hangs at.
    pub ceiling_offset: f64,
    pub wall_inset: f64,
    pub fixed_center_yaw: f64,
}

impl Default for SecurityCameraConfig {
    fn default() -> Self {
        Self {
            path_speed: 0.01,
            sweep_angle: FRAC_PI_3,
            sweep_speed: 0.5,
            ceiling_offset: 0.3,
            wall_inset: 1.0,
            fixed_center_yaw: -FRAC_PI_4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniformsConfig {
    /// Wraps accumulated shader time; `None` lets it grow for the session.
    pub wrap_period: Option<f64>,
    pub torch_flicker: Oscillation,
    pub light_shaft: Oscillation,
}

impl Default for UniformsConfig {
    fn default() -> Self {
        Self {
            wrap_period: None,
            torch_flicker: Oscillation {
                base: 1.8,
                amplitude: 0.4,
                rate: 10.0,
                phase: 0.0,
            },
            light_shaft: Oscillation {
                base: 0.12,
                amplitude: 0.03,
                rate: 1.0,
                phase: 0.0,
            },
        }
    }
}

/// Every tunable of the gallery scene. Missing sections and fields fall back
/// to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    pub seed: u64,
    pub room: RoomBounds,
    pub walker: WalkerConfig,
    pub security_camera: SecurityCameraConfig,
    pub flock: FlockConfig,
    pub butterflies: ButterflyConfig,
    pub aquarium: AquariumConfig,
    pub kinetic: KineticConfig,
    pub guard: GuardConfig,
    pub visitor: VisitorConfig,
    pub warden: WardenConfig,
    pub greeter: GreeterConfig,
    pub uniforms: UniformsConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            seed: 0x6A11_E7E5,
            room: RoomBounds::default(),
            walker: WalkerConfig::default(),
            security_camera: SecurityCameraConfig::default(),
            flock: FlockConfig::default(),
            butterflies: ButterflyConfig::default(),
            aquarium: AquariumConfig::default(),
            kinetic: KineticConfig::default(),
            guard: GuardConfig::default(),
            visitor: VisitorConfig::default(),
            warden: WardenConfig::default(),
            greeter: GreeterConfig::default(),
            uniforms: UniformsConfig::default(),
        }
    }
}

impl GalleryConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }

    /// Like [`GalleryConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(raw) => {
                let config = Self::from_json_str(&raw, path)?;
                info!(path = %path.display(), seed = config.seed, "config_loaded");
                Ok(config)
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config_defaulted");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// `origin` is only used in error messages.
    pub fn from_json_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: Self =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
                let field = error.path().to_string();
                ConfigError::Parse {
                    path: origin.to_path_buf(),
                    field,
                    source: error.into_inner(),
                }
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let room = &self.room;
        require_positive("room.width", room.width)?;
        require_positive("room.depth", room.depth)?;
        require_positive("room.height", room.height)?;
        let [min_width, min_depth, min_height] = MIN_ROOM_SIZE;
        for (field, value, min) in [
            ("room.width", room.width, min_width),
            ("room.depth", room.depth, min_depth),
            ("room.height", room.height, min_height),
        ] {
            if value < min {
                return Err(invalid(field, format!("expected at least {min}, got {value}")));
            }
        }

        let walker = &self.walker;
        require_positive("walker.standing_speed", walker.standing_speed)?;
        require_positive("walker.walking_speed", walker.walking_speed)?;
        require_non_negative("walker.cycle_rate", walker.cycle_rate)?;
        require_non_negative("walker.pause_duration_seconds", walker.pause_duration_seconds)?;
        if let Some(point) = walker
            .pause_points
            .iter()
            .find(|point| !(0.0..1.0).contains(*point))
        {
            return Err(invalid(
                "walker.pause_points",
                format!("expected values in [0, 1), got {point}"),
            ));
        }

        let camera = &self.security_camera;
        require_non_negative("security_camera.path_speed", camera.path_speed)?;
        require_non_negative("security_camera.sweep_angle", camera.sweep_angle)?;
        require_non_negative("security_camera.sweep_speed", camera.sweep_speed)?;
        require_finite("security_camera.fixed_center_yaw", camera.fixed_center_yaw)?;
        if camera.ceiling_offset < 0.0 || camera.ceiling_offset >= room.height {
            return Err(invalid(
                "security_camera.ceiling_offset",
                format!("expected [0, room.height), got {}", camera.ceiling_offset),
            ));
        }
        let max_inset = room.half_width().min(room.half_depth());
        if camera.wall_inset < 0.0 || camera.wall_inset >= max_inset {
            return Err(invalid(
                "security_camera.wall_inset",
                format!("expected [0, {max_inset}), got {}", camera.wall_inset),
            ));
        }

        let flock = &self.flock;
        require_positive("flock.separation_distance", flock.separation_distance)?;
        require_positive("flock.alignment_distance", flock.alignment_distance)?;
        require_positive("flock.cohesion_distance", flock.cohesion_distance)?;
        require_positive("flock.max_speed", flock.max_speed)?;
        require_non_negative("flock.boundary_margin", flock.boundary_margin)?;
        if !(0.0..=1.0).contains(&flock.alignment_blend) {
            return Err(invalid(
                "flock.alignment_blend",
                format!("expected [0, 1], got {}", flock.alignment_blend),
            ));
        }

        let butterflies = &self.butterflies;
        require_positive("butterflies.max_speed", butterflies.max_speed)?;
        if butterflies.min_height >= butterflies.max_height {
            return Err(invalid(
                "butterflies.min_height",
                format!(
                    "must be below max_height ({} >= {})",
                    butterflies.min_height, butterflies.max_height
                ),
            ));
        }

        let aquarium = &self.aquarium;
        if aquarium
            .tank_half_extents
            .iter()
            .any(|extent| !extent.is_finite() || *extent <= 0.0)
        {
            return Err(invalid(
                "aquarium.tank_half_extents",
                format!("expected positive extents, got {:?}", aquarium.tank_half_extents),
            ));
        }
        require_positive("aquarium.fish_max_speed", aquarium.fish_max_speed)?;
        require_positive("aquarium.jelly_max_drift", aquarium.jelly_max_drift)?;

        let guard = &self.guard;
        require_positive("guard.patrol_speed", guard.patrol_speed)?;
        require_positive("guard.chase_speed_multiplier", guard.chase_speed_multiplier)?;
        require_positive("guard.alert_radius", guard.alert_radius)?;
        require_positive("guard.chase_radius", guard.chase_radius)?;
        require_positive("guard.capture_radius", guard.capture_radius)?;
        require_non_negative("guard.alert_hold_seconds", guard.alert_hold_seconds)?;
        if guard.chase_radius >= guard.alert_radius {
            return Err(invalid(
                "guard.chase_radius",
                format!(
                    "must be below alert_radius ({} >= {})",
                    guard.chase_radius, guard.alert_radius
                ),
            ));
        }

        let visitor = &self.visitor;
        require_positive("visitor.speed", visitor.speed)?;
        require_positive("visitor.detection_radius", visitor.detection_radius)?;
        require_positive("visitor.personal_space", visitor.personal_space)?;
        require_positive("visitor.capture_radius", visitor.capture_radius)?;
        require_non_negative("visitor.idle_min_seconds", visitor.idle_min_seconds)?;
        require_non_negative("visitor.idle_jitter_seconds", visitor.idle_jitter_seconds)?;
        if visitor.personal_space >= visitor.detection_radius {
            return Err(invalid(
                "visitor.personal_space",
                format!(
                    "must be below detection_radius ({} >= {})",
                    visitor.personal_space, visitor.detection_radius
                ),
            ));
        }
        if visitor.route_min_points < 2 || visitor.route_min_points > visitor.route_max_points {
            return Err(invalid(
                "visitor.route_min_points",
                format!(
                    "expected 2 <= route_min_points <= route_max_points, got {}..={}",
                    visitor.route_min_points, visitor.route_max_points
                ),
            ));
        }

        let warden = &self.warden;
        require_positive("warden.speed", warden.speed)?;
        require_positive("warden.follow_speed_multiplier", warden.follow_speed_multiplier)?;
        require_positive("warden.warning_distance", warden.warning_distance)?;
        require_positive("warden.detection_radius", warden.detection_radius)?;
        require_positive("warden.capture_radius", warden.capture_radius)?;
        if warden.warning_distance >= warden.detection_radius {
            return Err(invalid(
                "warden.warning_distance",
                format!(
                    "must be below detection_radius ({} >= {})",
                    warden.warning_distance, warden.detection_radius
                ),
            ));
        }

        let kinetic = &self.kinetic;
        require_finite("kinetic.hologram_spin", kinetic.hologram_spin)?;
        require_finite("kinetic.hologram_particle_spin", kinetic.hologram_particle_spin)?;
        if let Some(start) = kinetic.clock_start_seconds {
            require_non_negative("kinetic.clock_start_seconds", start)?;
        }

        let greeter = &self.greeter;
        require_positive("greeter.detection_radius", greeter.detection_radius)?;
        require_positive("greeter.personal_space", greeter.personal_space)?;
        require_positive("greeter.walk_speed", greeter.walk_speed)?;
        require_positive("greeter.arrive_radius", greeter.arrive_radius)?;
        require_non_negative("greeter.wave_seconds", greeter.wave_seconds)?;
        require_non_negative("greeter.wander_after_seconds", greeter.wander_after_seconds)?;
        require_non_negative("greeter.wander_extent", greeter.wander_extent)?;
        if greeter.personal_space >= greeter.detection_radius {
            return Err(invalid(
                "greeter.personal_space",
                format!(
                    "must be below detection_radius ({} >= {})",
                    greeter.personal_space, greeter.detection_radius
                ),
            ));
        }
        if !(0.0..=1.0).contains(&greeter.wander_chance_per_frame) {
            return Err(invalid(
                "greeter.wander_chance_per_frame",
                format!("expected [0, 1], got {}", greeter.wander_chance_per_frame),
            ));
        }

        if let Some(period) = self.uniforms.wrap_period {
            require_positive("uniforms.wrap_period", period)?;
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Validation { field, reason }
}

fn require_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("expected finite number, got {value}")))
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected positive number, got {value}")))
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected non-negative number, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        GalleryConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let raw = r#"{ "seed": 7, "guard": { "alert_radius": 6.0 }, "room": { "width": 30.0 } }"#;
        let config = GalleryConfig::from_json_str(raw, Path::new("inline")).expect("parse");
        assert_eq!(config.seed, 7);
        assert_eq!(config.guard.alert_radius, 6.0);
        assert_eq!(config.guard.chase_radius, GuardConfig::default().chase_radius);
        assert_eq!(config.room.width, 30.0);
        assert_eq!(config.room.depth, RoomBounds::default().depth);
        assert_eq!(config.flock, FlockConfig::default());
    }

    #[test]
    fn parse_error_reports_field_path() {
        let raw = r#"{ "flock": { "max_speed": "fast" } }"#;
        let error = GalleryConfig::from_json_str(raw, Path::new("gallery.json"))
            .expect_err("type mismatch");
        match error {
            ConfigError::Parse { field, .. } => assert_eq!(field, "flock.max_speed"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_section_is_rejected() {
        let raw = r#"{ "weather": { "rain": true } }"#;
        assert!(matches!(
            GalleryConfig::from_json_str(raw, Path::new("inline")),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn chase_radius_must_be_inside_alert_radius() {
        let raw = r#"{ "guard": { "chase_radius": 5.0, "alert_radius": 4.0 } }"#;
        let error = GalleryConfig::from_json_str(raw, Path::new("inline")).expect_err("invalid");
        assert!(matches!(
            error,
            ConfigError::Validation {
                field: "guard.chase_radius",
                ..
            }
        ));
    }

    #[test]
    fn room_too_small_for_the_layout_is_rejected() {
        let raw = r#"{ "room": { "width": 10.0, "depth": 5.0, "height": 4.0 } }"#;
        let error = GalleryConfig::from_json_str(raw, Path::new("inline")).expect_err("invalid");
        assert!(matches!(
            error,
            ConfigError::Validation {
                field: "room.depth",
                ..
            }
        ));

        let raw = r#"{ "room": { "width": 10.0, "depth": 8.0, "height": 4.0 } }"#;
        let config = GalleryConfig::from_json_str(raw, Path::new("inline")).expect("fits");
        assert_eq!(config.room.width, 10.0);
    }

    #[test]
    fn greeter_personal_space_must_be_inside_detection() {
        let mut config = GalleryConfig::default();
        config.greeter.personal_space = config.greeter.detection_radius;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation {
                field: "greeter.personal_space",
                ..
            })
        ));
    }

    #[test]
    fn non_positive_speed_is_rejected() {
        let mut config = GalleryConfig::default();
        config.visitor.speed = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation {
                field: "visitor.speed",
                ..
            })
        ));
    }

    #[test]
    fn pause_points_must_lie_on_the_path() {
        let mut config = GalleryConfig::default();
        config.walker.pause_points = vec![0.2, 1.5];
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "seed": 42, "flock": {{ "count": 3 }} }}"#).expect("write");
        let config = GalleryConfig::load(file.path()).expect("load");
        assert_eq!(config.seed, 42);
        assert_eq!(config.flock.count, 3);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let config = GalleryConfig::load_or_default(&path).expect("defaults");
        assert_eq!(config, GalleryConfig::default());
        assert!(matches!(
            GalleryConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn config_round_trips_through_pretty_json() {
        let config = GalleryConfig::default();
        let json = serde_json::to_string_pretty(&config).expect("encode");
        let decoded = GalleryConfig::from_json_str(&json, Path::new("inline")).expect("decode");
        assert_eq!(decoded, config);
    }
}
