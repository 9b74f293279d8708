//! Clipped drawing into an RGBA8 frame buffer.

pub(crate) type Rgba = [u8; 4];

pub(crate) fn write_pixel_rgba_clipped(
    frame: &mut [u8],
    width: usize,
    x: i32,
    y: i32,
    color: Rgba,
) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

pub(crate) fn clear(frame: &mut [u8], color: Rgba) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&color);
    }
}

/// `rect` is `(left, top, width, height)` in pixels.
pub(crate) fn fill_rect_clipped(
    frame: &mut [u8],
    size: (u32, u32),
    rect: (i32, i32, i32, i32),
    color: Rgba,
) {
    let (width, height) = size;
    let (left, top, rect_width, rect_height) = rect;
    let start_x = left.max(0);
    let start_y = top.max(0);
    let end_x = left.saturating_add(rect_width).min(width as i32);
    let end_y = top.saturating_add(rect_height).min(height as i32);
    for y in start_y..end_y {
        for x in start_x..end_x {
            write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    }
}

pub(crate) fn draw_rect_outline(
    frame: &mut [u8],
    size: (u32, u32),
    rect: (i32, i32, i32, i32),
    thickness: i32,
    color: Rgba,
) {
    let (left, top, width, height) = rect;
    if width <= 0 || height <= 0 {
        return;
    }
    let t = thickness.max(1);
    fill_rect_clipped(frame, size, (left, top, width, t), color);
    fill_rect_clipped(frame, size, (left, top + height - t, width, t), color);
    fill_rect_clipped(frame, size, (left, top, t, height), color);
    fill_rect_clipped(frame, size, (left + width - t, top, t, height), color);
}

pub(crate) fn fill_circle(
    frame: &mut [u8],
    size: (u32, u32),
    center: (i32, i32),
    radius: i32,
    color: Rgba,
) {
    let (cx, cy) = center;
    let radius = radius.max(0);
    let radius_sq = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius_sq {
                write_pixel_rgba_clipped(frame, size.0 as usize, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Bresenham line, `thickness` pixels wide.
pub(crate) fn draw_line(
    frame: &mut [u8],
    size: (u32, u32),
    from: (i32, i32),
    to: (i32, i32),
    thickness: i32,
    color: Rgba,
) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let step_x = if x < to.0 { 1 } else { -1 };
    let step_y = if y < to.1 { 1 } else { -1 };
    let mut error = dx + dy;
    let half = (thickness.max(1) - 1) / 2;
    loop {
        let dot = (x - half, y - half, thickness.max(1), thickness.max(1));
        fill_rect_clipped(frame, size, dot, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = [255, 0, 0, 255];

    fn lit(frame: &[u8], width: usize, x: usize, y: usize) -> bool {
        frame[(y * width + x) * 4] == 255
    }

    fn count_lit(frame: &[u8]) -> usize {
        frame.chunks_exact(4).filter(|pixel| pixel[0] == 255).count()
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        write_pixel_rgba_clipped(&mut frame, 4, -1, 0, RED);
        write_pixel_rgba_clipped(&mut frame, 4, 4, 0, RED);
        write_pixel_rgba_clipped(&mut frame, 4, 0, 4, RED);
        assert_eq!(count_lit(&frame), 0);
        write_pixel_rgba_clipped(&mut frame, 4, 3, 3, RED);
        assert!(lit(&frame, 4, 3, 3));
    }

    #[test]
    fn rect_is_clipped_to_frame() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        fill_rect_clipped(&mut frame, (4, 4), (-2, -2, 4, 4), RED);
        assert_eq!(count_lit(&frame), 4);
        assert!(lit(&frame, 4, 1, 1));
        assert!(!lit(&frame, 4, 2, 2));
    }

    #[test]
    fn outline_leaves_interior_untouched() {
        let mut frame = vec![0u8; 6 * 6 * 4];
        draw_rect_outline(&mut frame, (6, 6), (0, 0, 6, 6), 1, RED);
        assert_eq!(count_lit(&frame), 20);
        assert!(!lit(&frame, 6, 2, 2));
    }

    #[test]
    fn circle_is_symmetric() {
        let mut frame = vec![0u8; 9 * 9 * 4];
        fill_circle(&mut frame, (9, 9), (4, 4), 2, RED);
        assert_eq!(count_lit(&frame), 13);
        assert!(lit(&frame, 9, 2, 4) && lit(&frame, 9, 6, 4));
        assert!(lit(&frame, 9, 4, 2) && lit(&frame, 9, 4, 6));
        assert!(!lit(&frame, 9, 2, 2));
    }

    #[test]
    fn line_reaches_both_endpoints() {
        let mut frame = vec![0u8; 10 * 10 * 4];
        draw_line(&mut frame, (10, 10), (1, 8), (7, 2), 1, RED);
        assert!(lit(&frame, 10, 1, 8));
        assert!(lit(&frame, 10, 7, 2));
        assert_eq!(count_lit(&frame), 7);
    }
}
