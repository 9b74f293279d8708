//! 3x5 pixel font for the HUD panel. Lowercase renders as uppercase; anything
//! without a glyph renders as `?`.

use super::raster::fill_rect_clipped;

pub(crate) const GLYPH_WIDTH: i32 = 3;
pub(crate) const GLYPH_HEIGHT: i32 = 5;

/// Five rows of three bits, top row in the highest bits.
const fn pack(rows: [u16; 5]) -> u16 {
    (rows[0] << 12) | (rows[1] << 9) | (rows[2] << 6) | (rows[3] << 3) | rows[4]
}

const UNKNOWN: u16 = pack([0b111, 0b001, 0b010, 0b000, 0b010]);

fn glyph_bits(ch: char) -> u16 {
    match ch.to_ascii_uppercase() {
        ' ' => 0,
        '0' => pack([0b111, 0b101, 0b101, 0b101, 0b111]),
        '1' => pack([0b010, 0b110, 0b010, 0b010, 0b111]),
        '2' => pack([0b111, 0b001, 0b111, 0b100, 0b111]),
        '3' => pack([0b111, 0b001, 0b011, 0b001, 0b111]),
        '4' => pack([0b101, 0b101, 0b111, 0b001, 0b001]),
        '5' => pack([0b111, 0b100, 0b111, 0b001, 0b111]),
        '6' => pack([0b111, 0b100, 0b111, 0b101, 0b111]),
        '7' => pack([0b111, 0b001, 0b010, 0b010, 0b010]),
        '8' => pack([0b111, 0b101, 0b111, 0b101, 0b111]),
        '9' => pack([0b111, 0b101, 0b111, 0b001, 0b111]),
        'A' => pack([0b010, 0b101, 0b111, 0b101, 0b101]),
        'B' => pack([0b110, 0b101, 0b110, 0b101, 0b110]),
        'C' => pack([0b011, 0b100, 0b100, 0b100, 0b011]),
        'D' => pack([0b110, 0b101, 0b101, 0b101, 0b110]),
        'E' => pack([0b111, 0b100, 0b110, 0b100, 0b111]),
        'F' => pack([0b111, 0b100, 0b110, 0b100, 0b100]),
        'G' => pack([0b011, 0b100, 0b101, 0b101, 0b011]),
        'H' => pack([0b101, 0b101, 0b111, 0b101, 0b101]),
        'I' => pack([0b111, 0b010, 0b010, 0b010, 0b111]),
        'J' => pack([0b001, 0b001, 0b001, 0b101, 0b010]),
        'K' => pack([0b101, 0b101, 0b110, 0b101, 0b101]),
        'L' => pack([0b100, 0b100, 0b100, 0b100, 0b111]),
        'M' => pack([0b101, 0b111, 0b111, 0b101, 0b101]),
        'N' => pack([0b110, 0b101, 0b101, 0b101, 0b101]),
        'O' => pack([0b010, 0b101, 0b101, 0b101, 0b010]),
        'P' => pack([0b110, 0b101, 0b110, 0b100, 0b100]),
        'Q' => pack([0b010, 0b101, 0b101, 0b011, 0b001]),
        'R' => pack([0b110, 0b101, 0b110, 0b101, 0b101]),
        'S' => pack([0b011, 0b100, 0b010, 0b001, 0b110]),
        'T' => pack([0b111, 0b010, 0b010, 0b010, 0b010]),
        'U' => pack([0b101, 0b101, 0b101, 0b101, 0b111]),
        'V' => pack([0b101, 0b101, 0b101, 0b101, 0b010]),
        'W' => pack([0b101, 0b101, 0b111, 0b111, 0b101]),
        'X' => pack([0b101, 0b101, 0b010, 0b101, 0b101]),
        'Y' => pack([0b101, 0b101, 0b010, 0b010, 0b010]),
        'Z' => pack([0b111, 0b001, 0b010, 0b100, 0b111]),
        ':' => pack([0b000, 0b010, 0b000, 0b010, 0b000]),
        '.' => pack([0b000, 0b000, 0b000, 0b000, 0b010]),
        ',' => pack([0b000, 0b000, 0b000, 0b010, 0b100]),
        '-' => pack([0b000, 0b000, 0b111, 0b000, 0b000]),
        '_' => pack([0b000, 0b000, 0b000, 0b000, 0b111]),
        '=' => pack([0b000, 0b111, 0b000, 0b111, 0b000]),
        '/' => pack([0b001, 0b001, 0b010, 0b100, 0b100]),
        '%' => pack([0b101, 0b001, 0b010, 0b100, 0b101]),
        '(' => pack([0b001, 0b010, 0b010, 0b010, 0b001]),
        ')' => pack([0b100, 0b010, 0b010, 0b010, 0b100]),
        _ => UNKNOWN,
    }
}

fn glyph_pixel(bits: u16, col: i32, row: i32) -> bool {
    let shift = (GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH + (GLYPH_WIDTH - 1 - col);
    bits & (1 << shift) != 0
}

pub(crate) fn text_width_px(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * (GLYPH_WIDTH + 1) * scale
}

pub(crate) fn draw_text(
    frame: &mut [u8],
    size: (u32, u32),
    origin: (i32, i32),
    scale: i32,
    text: &str,
    color: [u8; 4],
) {
    let (mut x, y) = origin;
    for ch in text.chars() {
        let bits = glyph_bits(ch);
        for row in 0..GLYPH_HEIGHT {
            for col in 0..GLYPH_WIDTH {
                if glyph_pixel(bits, col, row) {
                    let rect = (x + col * scale, y + row * scale, scale, scale);
                    fill_rect_clipped(frame, size, rect, color);
                }
            }
        }
        x += (GLYPH_WIDTH + 1) * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn every_hud_character_has_a_glyph() {
        for ch in "0123456789abcdefghijklmnopqrstuvwxyz:.,-_=/%()".chars() {
            assert_ne!(glyph_bits(ch), UNKNOWN, "missing glyph for {ch:?}");
        }
        assert_eq!(glyph_bits('~'), UNKNOWN);
        assert_eq!(glyph_bits(' '), 0);
    }

    #[test]
    fn packed_rows_read_back_top_to_bottom() {
        let seven = glyph_bits('7');
        assert!((0..3).all(|col| glyph_pixel(seven, col, 0)));
        assert!(glyph_pixel(seven, 2, 1));
        assert!(!glyph_pixel(seven, 0, 1));
        assert!(glyph_pixel(seven, 1, 4));
    }

    #[test]
    fn text_clipped_at_frame_edges_never_panics() {
        let size = (8, 6);
        let mut frame = vec![0u8; 8 * 6 * 4];
        draw_text(&mut frame, size, (-5, -3), 2, "fps 60", WHITE);
        draw_text(&mut frame, size, (6, 4), 3, "zz", WHITE);
        assert_eq!(frame.len(), 8 * 6 * 4);
    }

    #[test]
    fn scaled_glyph_fills_scale_squares() {
        let size = (16, 16);
        let mut frame = vec![0u8; 16 * 16 * 4];
        draw_text(&mut frame, size, (0, 0), 2, "-", WHITE);
        let lit = frame.chunks_exact(4).filter(|pixel| pixel[0] == 255).count();
        assert_eq!(lit, 3 * 2 * 2);
        assert_eq!(text_width_px("abc", 2), 24);
    }
}
