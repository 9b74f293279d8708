use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::overlay::{
    HudData, MarkerKind, MinimapModel, MINIMAP_HEIGHT, MINIMAP_PADDING, MINIMAP_WIDTH,
    PLAYER_HEADING_LENGTH,
};

use super::font::{draw_text, text_width_px, GLYPH_HEIGHT};
use super::raster::{clear, draw_line, draw_rect_outline, fill_circle, fill_rect_clipped, Rgba};
use super::transform::{MinimapLayout, Viewport};

const CLEAR_COLOR: Rgba = [12, 13, 16, 255];
const MINIMAP_BG_COLOR: Rgba = [26, 26, 26, 255];
const ROOM_OUTLINE_COLOR: Rgba = [76, 175, 80, 255];
const PLAYER_COLOR: Rgba = [255, 215, 0, 255];
const HUD_PANEL_COLOR: Rgba = [10, 12, 16, 230];
const HUD_BORDER_COLOR: Rgba = [92, 106, 126, 255];
const HUD_TEXT_COLOR: Rgba = [236, 242, 248, 255];
const WINDOW_MARGIN_PX: u32 = 16;
const MARKER_RADIUS: f64 = 3.0;
const PLAYER_RADIUS: f64 = 5.0;
const MARKER_HEADING_LENGTH: f64 = 6.0;
const HUD_TEXT_SCALE: i32 = 2;
const HUD_INSET_PX: i32 = 8;

fn marker_color(kind: MarkerKind) -> Rgba {
    match kind {
        MarkerKind::Player => PLAYER_COLOR,
        MarkerKind::Visitor => [100, 181, 246, 255],
        MarkerKind::Guard => [33, 150, 243, 255],
        MarkerKind::GuardAlerted => [244, 67, 54, 255],
        MarkerKind::Robot => [158, 158, 158, 255],
        MarkerKind::SecurityCamera => [255, 152, 0, 255],
        MarkerKind::Wildlife => [129, 199, 132, 255],
        MarkerKind::Exhibit => [186, 104, 200, 255],
        MarkerKind::Artwork => [255, 0, 0, 255],
    }
}

/// Marker kinds that get a short facing line.
fn shows_heading(kind: MarkerKind) -> bool {
    matches!(
        kind,
        MarkerKind::Visitor | MarkerKind::Guard | MarkerKind::GuardAlerted | MarkerKind::Robot
    )
}

/// Presents the top-down minimap and HUD panel through `pixels`.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render(
        &mut self,
        minimap: &MinimapModel,
        hud: Option<&HudData>,
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        let size = (self.viewport.width, self.viewport.height);
        let frame = self.pixels.frame_mut();
        clear(frame, CLEAR_COLOR);
        if minimap.is_visible() {
            let layout = MinimapLayout::fit(self.viewport, WINDOW_MARGIN_PX);
            draw_minimap(frame, size, &layout, minimap);
        }
        if let Some(hud) = hud {
            draw_hud(frame, size, hud);
        }
        self.pixels.render()
    }
}

pub(crate) fn draw_minimap(
    frame: &mut [u8],
    size: (u32, u32),
    layout: &MinimapLayout,
    model: &MinimapModel,
) {
    let (left, top) = layout.to_screen((0.0, 0.0));
    let (right, bottom) = layout.to_screen((MINIMAP_WIDTH as f64, MINIMAP_HEIGHT as f64));
    fill_rect_clipped(frame, size, (left, top, right - left, bottom - top), MINIMAP_BG_COLOR);

    let (room_left, room_top) = layout.to_screen((MINIMAP_PADDING, MINIMAP_PADDING));
    let (room_right, room_bottom) = layout.to_screen((
        MINIMAP_WIDTH as f64 - MINIMAP_PADDING,
        MINIMAP_HEIGHT as f64 - MINIMAP_PADDING,
    ));
    let outline = (
        room_left,
        room_top,
        room_right - room_left,
        room_bottom - room_top,
    );
    draw_rect_outline(frame, size, outline, layout.scaled(1.0), ROOM_OUTLINE_COLOR);

    for marker in model.markers() {
        let color = marker_color(marker.kind);
        let centre = layout.to_screen(model.project(marker.position));
        let (radius, heading) = match marker.kind {
            MarkerKind::Player => (PLAYER_RADIUS, Some(PLAYER_HEADING_LENGTH)),
            kind if shows_heading(kind) => (MARKER_RADIUS, Some(MARKER_HEADING_LENGTH)),
            _ => (MARKER_RADIUS, None),
        };
        fill_circle(frame, size, centre, layout.scaled(radius), color);
        if let Some(length) = heading {
            let tip = layout.to_screen(model.heading_tip(marker, length));
            draw_line(frame, size, centre, tip, layout.scaled(1.0), color);
        }
    }
}

fn draw_hud(frame: &mut [u8], size: (u32, u32), hud: &HudData) {
    let lines = hud.lines();
    let line_height = (GLYPH_HEIGHT + 2) * HUD_TEXT_SCALE;
    let widest = lines
        .iter()
        .map(|line| text_width_px(line, HUD_TEXT_SCALE))
        .max()
        .unwrap_or(0);
    let panel = (
        0,
        0,
        widest + HUD_INSET_PX * 2,
        lines.len() as i32 * line_height + HUD_INSET_PX * 2,
    );
    fill_rect_clipped(frame, size, panel, HUD_PANEL_COLOR);
    draw_rect_outline(frame, size, panel, 1, HUD_BORDER_COLOR);

    let mut y = HUD_INSET_PX;
    for line in &lines {
        draw_text(frame, size, (HUD_INSET_PX, y), HUD_TEXT_SCALE, line, HUD_TEXT_COLOR);
        y += line_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{EntityDesc, EntityKind, LoopMetricsSnapshot, SceneWorld, Transform};
    use glam::DVec3;

    fn pixel(frame: &[u8], width: u32, at: (i32, i32)) -> Rgba {
        let offset = (at.1 as usize * width as usize + at.0 as usize) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn renderer_type_is_non_generic() {
        fn assert_sized<T: Sized>() {}
        assert_sized::<Renderer>();
    }

    #[test]
    fn minimap_draws_player_over_other_markers() {
        let mut world = SceneWorld::default();
        world.spawn(EntityDesc::new(
            EntityKind::Robot,
            "robot",
            Transform::at(DVec3::new(0.0, 0.0, 8.0)),
        ));
        world.spawn(EntityDesc::new(
            EntityKind::Artwork,
            "painting",
            Transform::at(DVec3::new(-5.0, 2.0, -7.0)),
        ));
        world.apply_pending();
        world.refresh_minimap();

        let size = (360, 260);
        let mut frame = vec![0u8; (size.0 * size.1 * 4) as usize];
        let layout = MinimapLayout::fit(
            Viewport {
                width: size.0,
                height: size.1,
            },
            0,
        );
        let model = world.minimap();
        draw_minimap(&mut frame, size, &layout, model);

        let player_at = layout.to_screen(model.project(world.player().position));
        assert_eq!(pixel(&frame, size.0, player_at), PLAYER_COLOR);
        let artwork_at = layout.to_screen(model.project(DVec3::new(-5.0, 0.0, -7.0)));
        assert_eq!(
            pixel(&frame, size.0, artwork_at),
            marker_color(MarkerKind::Artwork)
        );
        let outline_at = layout.to_screen((MINIMAP_PADDING, 60.0));
        assert_eq!(pixel(&frame, size.0, outline_at), ROOM_OUTLINE_COLOR);
    }

    #[test]
    fn hud_panel_fits_small_frames_without_panicking() {
        let hud = HudData {
            metrics: LoopMetricsSnapshot::default(),
            render_fps_cap: Some(60),
            entity_count: 3,
            elapsed_seconds: 1.0,
            title: None,
        };
        let size = (20, 10);
        let mut frame = vec![0u8; 20 * 10 * 4];
        draw_hud(&mut frame, size, &hud);
        assert_eq!(pixel(&frame, size.0, (0, 0)), HUD_BORDER_COLOR);
    }
}
