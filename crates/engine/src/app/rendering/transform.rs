use crate::app::overlay::{MINIMAP_HEIGHT, MINIMAP_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Placement of the minimap canvas inside the window: uniformly scaled to fit
/// and centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapLayout {
    pub origin_x: f64,
    pub origin_y: f64,
    pub scale: f64,
}

impl MinimapLayout {
    pub fn fit(viewport: Viewport, margin_px: u32) -> Self {
        let usable_w = viewport.width.saturating_sub(margin_px * 2).max(1) as f64;
        let usable_h = viewport.height.saturating_sub(margin_px * 2).max(1) as f64;
        let scale = (usable_w / MINIMAP_WIDTH as f64).min(usable_h / MINIMAP_HEIGHT as f64);
        Self {
            origin_x: (viewport.width as f64 - MINIMAP_WIDTH as f64 * scale) * 0.5,
            origin_y: (viewport.height as f64 - MINIMAP_HEIGHT as f64 * scale) * 0.5,
            scale,
        }
    }

    pub fn to_screen(&self, minimap_px: (f64, f64)) -> (i32, i32) {
        (
            (self.origin_x + minimap_px.0 * self.scale).round() as i32,
            (self.origin_y + minimap_px.1 * self.scale).round() as i32,
        )
    }

    pub fn scaled(&self, minimap_px: f64) -> i32 {
        (minimap_px * self.scale).round().max(1.0) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_centre_maps_to_viewport_centre() {
        let layout = MinimapLayout::fit(
            Viewport {
                width: 800,
                height: 600,
            },
            0,
        );
        let centre = (MINIMAP_WIDTH as f64 * 0.5, MINIMAP_HEIGHT as f64 * 0.5);
        assert_eq!(layout.to_screen(centre), (400, 300));
    }

    #[test]
    fn fit_uses_the_tighter_axis() {
        let layout = MinimapLayout::fit(
            Viewport {
                width: 1280,
                height: 720,
            },
            20,
        );
        assert!((layout.scale - 680.0 / MINIMAP_HEIGHT as f64).abs() < 1e-12);
        let (right, bottom) = layout.to_screen((MINIMAP_WIDTH as f64, MINIMAP_HEIGHT as f64));
        assert!(right <= 1280 - 20);
        assert_eq!(bottom, 700);
    }

    #[test]
    fn degenerate_viewport_keeps_positive_scale() {
        let layout = MinimapLayout::fit(
            Viewport {
                width: 0,
                height: 0,
            },
            10,
        );
        assert!(layout.scale > 0.0);
        assert_eq!(layout.scaled(0.01), 1);
    }
}
