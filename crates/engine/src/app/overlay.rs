use glam::DVec3;

use crate::animation::{forward_from_yaw, RoomBounds};

use super::metrics::LoopMetricsSnapshot;
use super::scene::{Entity, EntityKind, PlayerCamera};

pub const MINIMAP_WIDTH: u32 = 180;
pub const MINIMAP_HEIGHT: u32 = 130;
/// Inset of the room outline inside the minimap canvas, in minimap pixels.
pub const MINIMAP_PADDING: f64 = 10.0;
pub const PLAYER_HEADING_LENGTH: f64 = 15.0;
pub const INDICATOR_PART_NAME: &str = "indicator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Player,
    Visitor,
    Guard,
    /// A guard or warden whose alert indicator is lit.
    GuardAlerted,
    Robot,
    SecurityCamera,
    Wildlife,
    Exhibit,
    Artwork,
}

impl MarkerKind {
    fn for_entity(entity: &Entity) -> Self {
        match entity.kind {
            EntityKind::Visitor => Self::Visitor,
            EntityKind::Guard | EntityKind::Warden => {
                let lit = entity
                    .find_part(INDICATOR_PART_NAME)
                    .and_then(|part| entity.part(part))
                    .is_some_and(|part| part.visible);
                if lit {
                    Self::GuardAlerted
                } else {
                    Self::Guard
                }
            }
            EntityKind::Robot => Self::Robot,
            EntityKind::SecurityCamera => Self::SecurityCamera,
            EntityKind::Bird | EntityKind::Butterfly | EntityKind::Fish | EntityKind::Jellyfish => {
                Self::Wildlife
            }
            EntityKind::Sculpture | EntityKind::Exhibit => Self::Exhibit,
            EntityKind::Artwork => Self::Artwork,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapMarker {
    pub kind: MarkerKind,
    pub position: DVec3,
    pub yaw: f64,
}

/// Top-down view model of the room. The player marker is always last so it
/// draws on top.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapModel {
    room: RoomBounds,
    markers: Vec<MinimapMarker>,
    visible: bool,
}

impl Default for MinimapModel {
    fn default() -> Self {
        Self {
            room: RoomBounds::default(),
            markers: Vec::new(),
            visible: true,
        }
    }
}

impl MinimapModel {
    pub fn refresh_from(&mut self, entities: &[Entity], player: &PlayerCamera, room: RoomBounds) {
        self.room = room;
        self.markers.clear();
        self.markers.extend(
            entities
                .iter()
                .filter(|entity| entity.visible)
                .map(|entity| MinimapMarker {
                    kind: MarkerKind::for_entity(entity),
                    position: entity.transform.position,
                    yaw: entity.transform.rotation.y,
                }),
        );
        self.markers.push(MinimapMarker {
            kind: MarkerKind::Player,
            position: player.position,
            yaw: player.yaw,
        });
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    pub fn markers(&self) -> &[MinimapMarker] {
        &self.markers
    }

    pub fn player(&self) -> Option<&MinimapMarker> {
        self.markers
            .last()
            .filter(|marker| marker.kind == MarkerKind::Player)
    }

    pub fn room(&self) -> RoomBounds {
        self.room
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// Room x/z to minimap pixels; +x right, +z down.
    pub fn project(&self, position: DVec3) -> (f64, f64) {
        let scale_x = (MINIMAP_WIDTH as f64 - 2.0 * MINIMAP_PADDING) / self.room.width;
        let scale_z = (MINIMAP_HEIGHT as f64 - 2.0 * MINIMAP_PADDING) / self.room.depth;
        (
            MINIMAP_PADDING + (position.x + self.room.half_width()) * scale_x,
            MINIMAP_PADDING + (position.z + self.room.half_depth()) * scale_z,
        )
    }

    /// End point of the facing line drawn from a marker.
    pub fn heading_tip(&self, marker: &MinimapMarker, length: f64) -> (f64, f64) {
        let (x, z) = self.project(marker.position);
        let forward = forward_from_yaw(marker.yaw);
        (x + forward.x * length, z + forward.z * length)
    }
}

/// Text shown in the corner panel while the overlay is visible.
#[derive(Debug, Clone, PartialEq)]
pub struct HudData {
    pub metrics: LoopMetricsSnapshot,
    pub render_fps_cap: Option<u32>,
    pub entity_count: usize,
    pub elapsed_seconds: f64,
    pub title: Option<String>,
}

impl HudData {
    pub fn lines(&self) -> Vec<String> {
        let cap = match self.render_fps_cap {
            Some(cap) => cap.to_string(),
            None => "off".to_string(),
        };
        let mut lines = vec![
            format!("fps: {:.1} cap: {cap}", self.metrics.fps),
            format!(
                "frame: {:.2} ms max: {:.1}",
                self.metrics.frame_time_ms, self.metrics.worst_frame_time_ms
            ),
            format!("clamped: {}", self.metrics.clamped_frames),
            format!("entities: {}", self.entity_count),
            format!("time: {:.1} s", self.elapsed_seconds),
        ];
        if let Some(title) = &self.title {
            lines.push(title.clone());
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{EntityDesc, SceneWorld, Transform};

    fn approx(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn room_corners_project_onto_outline() {
        let model = MinimapModel::default();
        let room = model.room();
        assert!(approx(
            model.project(DVec3::new(-room.half_width(), 0.0, -room.half_depth())),
            (MINIMAP_PADDING, MINIMAP_PADDING)
        ));
        assert!(approx(
            model.project(DVec3::new(room.half_width(), 0.0, room.half_depth())),
            (
                MINIMAP_WIDTH as f64 - MINIMAP_PADDING,
                MINIMAP_HEIGHT as f64 - MINIMAP_PADDING
            )
        ));
        assert!(approx(model.project(DVec3::new(0.0, 3.0, 0.0)), (90.0, 65.0)));
    }

    #[test]
    fn refresh_lists_entities_then_player() {
        let mut world = SceneWorld::default();
        world.spawn(EntityDesc::new(
            EntityKind::Robot,
            "robot",
            Transform::at(DVec3::new(1.0, 0.0, 2.0)),
        ));
        let mut guard = EntityDesc::new(EntityKind::Guard, "guard", Transform::default());
        let indicator = guard.add_hidden_part(INDICATOR_PART_NAME, Transform::default());
        let guard_id = world.spawn(guard);
        world.apply_pending();
        world.refresh_minimap();

        let kinds: Vec<MarkerKind> = world.minimap().markers().iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![MarkerKind::Robot, MarkerKind::Guard, MarkerKind::Player]
        );
        let player = world.minimap().player().expect("player marker");
        assert_eq!(player.position, world.player().position);

        world
            .find_entity_mut(guard_id)
            .expect("guard")
            .set_part_visible(indicator, true);
        world.refresh_minimap();
        assert_eq!(world.minimap().markers()[1].kind, MarkerKind::GuardAlerted);
    }

    #[test]
    fn clearing_the_world_drops_markers() {
        let mut world = SceneWorld::default();
        world.refresh_minimap();
        assert_eq!(world.minimap().markers().len(), 1);
        world.clear();
        assert!(world.minimap().markers().is_empty());
        assert!(world.minimap().player().is_none());
    }

    #[test]
    fn heading_tip_follows_yaw() {
        let model = MinimapModel::default();
        let marker = MinimapMarker {
            kind: MarkerKind::Player,
            position: DVec3::ZERO,
            yaw: 0.0,
        };
        let (x, z) = model.heading_tip(&marker, PLAYER_HEADING_LENGTH);
        assert!(approx((x, z), (90.0, 65.0 + PLAYER_HEADING_LENGTH)));
    }

    #[test]
    fn hud_lines_include_clamp_count_and_title() {
        let hud = HudData {
            metrics: LoopMetricsSnapshot {
                fps: 59.94,
                clamped_frames: 3,
                ..LoopMetricsSnapshot::default()
            },
            render_fps_cap: None,
            entity_count: 12,
            elapsed_seconds: 4.25,
            title: Some("guard: patrol".to_string()),
        };
        let lines = hud.lines();
        assert_eq!(lines[0], "fps: 59.9 cap: off");
        assert_eq!(lines[2], "clamped: 3");
        assert_eq!(lines.last().map(String::as_str), Some("guard: patrol"));
    }
}
