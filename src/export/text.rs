//! Text rendering for card faces.
//!
//! Two typefaces share one interface:
//!
//! - [`Typeface::Outline`] renders a fetched TTF through ab_glyph with
//!   anti-aliased coverage.
//! - [`Typeface::Bitmap`] renders the embedded Spleen 12×24 bitmap font,
//!   nearest-neighbour scaled. It is the fallback when a card font could not
//!   be fetched, so a card always exports even offline.

use ab_glyph::{Font, FontArc, ScaleFont};
use image::{Rgba, RgbaImage};
use spleen_font::{FONT_12X24, PSF2Font};

use super::draw::blend_pixel;

const SPLEEN_WIDTH: usize = 12;
const SPLEEN_HEIGHT: usize = 24;

/// A font ready to draw at any pixel height.
#[derive(Clone)]
pub enum Typeface {
    Outline(FontArc),
    Bitmap,
}

impl Typeface {
    pub fn is_outline(&self) -> bool {
        matches!(self, Typeface::Outline(_))
    }

    /// Width of `text` at `px` pixel height.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        match self {
            Typeface::Outline(font) => {
                let scaled = font.as_scaled(px);
                let mut width = 0.0;
                let mut previous = None;
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    if let Some(prev) = previous {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    previous = Some(id);
                }
                width
            }
            Typeface::Bitmap => text.chars().count() as f32 * bitmap_cell_width(px),
        }
    }

    /// Draw one line of text with its line box starting at (`x`, `top`).
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, x: f32, top: f32, px: f32, color: Rgba<u8>) {
        match self {
            Typeface::Outline(font) => draw_outline(canvas, font, text, x, top, px, color),
            Typeface::Bitmap => draw_bitmap(canvas, text, x, top, px, color),
        }
    }
}

fn bitmap_cell_width(px: f32) -> f32 {
    px * SPLEEN_WIDTH as f32 / SPLEEN_HEIGHT as f32
}

fn draw_outline(
    canvas: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    x: f32,
    top: f32,
    px: f32,
    color: Rgba<u8>,
) {
    let scaled = font.as_scaled(px);
    let baseline = top + scaled.ascent();
    let mut caret = x;
    let mut previous = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(px, ab_glyph::point(caret, baseline));
        caret += scaled.h_advance(id);
        previous = Some(id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px_x = bounds.min.x as i32 + gx as i32;
                let px_y = bounds.min.y as i32 + gy as i32;
                blend_pixel(canvas, px_x, px_y, color, coverage);
            });
        }
    }
}

/// Spleen 12×24 glyph as on/off cells, or `None` if the font lacks it.
fn bitmap_glyph(ch: char) -> Option<Vec<bool>> {
    let mut spleen = PSF2Font::new(FONT_12X24).ok()?;
    let utf8 = ch.to_string();
    let glyph = spleen.glyph_for_utf8(utf8.as_bytes())?;

    let mut cells = vec![false; SPLEEN_WIDTH * SPLEEN_HEIGHT];
    for (row_y, row) in glyph.enumerate() {
        for (col_x, on) in row.enumerate() {
            if row_y < SPLEEN_HEIGHT && col_x < SPLEEN_WIDTH {
                cells[row_y * SPLEEN_WIDTH + col_x] = on;
            }
        }
    }
    Some(cells)
}

/// Box outline for characters the bitmap font cannot draw.
fn missing_glyph() -> Vec<bool> {
    let mut cells = vec![false; SPLEEN_WIDTH * SPLEEN_HEIGHT];
    for x in 1..SPLEEN_WIDTH - 1 {
        cells[4 * SPLEEN_WIDTH + x] = true;
        cells[(SPLEEN_HEIGHT - 4) * SPLEEN_WIDTH + x] = true;
    }
    for y in 4..=SPLEEN_HEIGHT - 4 {
        cells[y * SPLEEN_WIDTH + 1] = true;
        cells[y * SPLEEN_WIDTH + SPLEEN_WIDTH - 2] = true;
    }
    cells
}

fn draw_bitmap(canvas: &mut RgbaImage, text: &str, x: f32, top: f32, px: f32, color: Rgba<u8>) {
    let cell_w = bitmap_cell_width(px);
    let dst_w = cell_w.round().max(1.0) as usize;
    let dst_h = px.round().max(1.0) as usize;

    for (i, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let cells = bitmap_glyph(ch).unwrap_or_else(missing_glyph);
        let origin_x = (x + i as f32 * cell_w).round() as i32;
        let origin_y = top.round() as i32;

        // Nearest-neighbour scale from 12×24 to the target cell
        for dy in 0..dst_h {
            let sy = dy * SPLEEN_HEIGHT / dst_h;
            for dx in 0..dst_w {
                let sx = dx * SPLEEN_WIDTH / dst_w;
                if cells[sy * SPLEEN_WIDTH + sx] {
                    blend_pixel(canvas, origin_x + dx as i32, origin_y + dy as i32, color, 1.0);
                }
            }
        }
    }
}

/// Greedy word wrap to `max_width`. Words wider than a line are split by
/// character.
pub fn wrap(typeface: &Typeface, text: &str, px: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if typeface.measure(&candidate, px) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if typeface.measure(word, px) <= max_width {
                line = word.to_string();
            } else {
                for ch in word.chars() {
                    line.push(ch);
                    if typeface.measure(&line, px) > max_width && line.chars().count() > 1 {
                        line.pop();
                        lines.push(std::mem::take(&mut line));
                        line.push(ch);
                    }
                }
            }
        }
        lines.push(line);
    }

    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
