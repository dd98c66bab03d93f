//! Card face rasterizer.
//!
//! Draws a face on a fixed 800×600 logical canvas, multiplied by the pixel
//! density. All layout constants below are in logical pixels.
//!
//! ```text
//! FRONT                                BACK
//! ┌──────────────────────────────┐    ┌───────────────────────┬──────────┐
//! │                              │    │ Dear Sam,             │ ┌┄┄┄┄┄┄┐ │
//! │        artwork (cover)       │    │                       │ ┊STAMP ┊ │
//! │                              │    │ "message, wrapped in  │ └┄┄┄┄┄┄┘ │
//! │▓▓▓▓▓▓▓▓▓▓ scrim ▓▓▓▓▓▓▓▓▓▓▓▓▓│    │  the chosen font"     │ ──────── │
//! │ Happy Christmas              │    │              Warmly,  │ ──────── │
//! └──────────────────────────────┘    │                  Ana  │ ──────── │
//!                                      └───────────────────────┴──────────┘
//! ```

use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use std::sync::Arc;

use super::draw::{dashed_rect, fill_rect, vertical_gradient};
use super::fonts::CardFonts;
use super::text::{Typeface, wrap};
use super::RenderOptions;
use crate::card::{CardFace, PostcardFont, PostcardRecord};
use crate::error::CardError;

/// Logical canvas width.
pub const CARD_WIDTH: u32 = 800;
/// Logical canvas height.
pub const CARD_HEIGHT: u32 = 600;
/// Upper bound on pixel density (4× is already 3200×2400).
pub const MAX_PIXEL_DENSITY: u32 = 4;

const PAPER: Rgba<u8> = Rgba([253, 251, 247, 255]);
const RED: Rgba<u8> = Rgba([185, 28, 28, 255]);
const INK: Rgba<u8> = Rgba([31, 41, 55, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 110]);
const DIVIDER: Rgba<u8> = Rgba([209, 213, 219, 255]);
const RULE: Rgba<u8> = Rgba([156, 163, 175, 255]);
const STAMP_TEXT: Rgba<u8> = Rgba([107, 114, 128, 255]);
const STAMP_FILL: Rgba<u8> = Rgba([249, 250, 251, 128]);
const NIGHT_TOP: Rgba<u8> = Rgba([15, 23, 42, 255]);
const NIGHT_BOTTOM: Rgba<u8> = Rgba([88, 28, 135, 255]);

const PADDING: f32 = 40.0;
const DIVIDER_X: f32 = 520.0;
const MESSAGE_SIZES: [f32; 6] = [24.0, 22.0, 20.0, 18.0, 16.0, 14.0];
const MESSAGE_LEADING: f32 = 1.625;
const TIGHT_LEADING: f32 = 1.25;

/// Everything needed to draw one face, already fetched and decoded.
#[derive(Clone)]
pub struct FaceScene {
    pub face: CardFace,
    pub record: PostcardRecord,
    pub background: Option<Arc<DynamicImage>>,
    pub fonts: Arc<CardFonts>,
}

/// Converts a prepared face into a bitmap.
pub trait Rasterizer: Send + Sync {
    fn render(&self, scene: &FaceScene, options: &RenderOptions) -> Result<RgbaImage, CardError>;
}

/// Built-in software rasterizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanvasRasterizer;

impl Rasterizer for CanvasRasterizer {
    fn render(&self, scene: &FaceScene, options: &RenderOptions) -> Result<RgbaImage, CardError> {
        let density = options.pixel_density;
        if density == 0 || density > MAX_PIXEL_DENSITY {
            return Err(CardError::Export(format!(
                "Unsupported pixel density {} (1-{})",
                density, MAX_PIXEL_DENSITY
            )));
        }

        let mut canvas = RgbaImage::from_pixel(CARD_WIDTH * density, CARD_HEIGHT * density, WHITE);
        let pen = Pen {
            scale: density as f32,
        };
        match scene.face {
            CardFace::Front => draw_front(&mut canvas, scene, pen),
            CardFace::Back => draw_back(&mut canvas, scene, pen),
        }
        Ok(canvas)
    }
}

/// Logical-to-device coordinate conversion.
#[derive(Clone, Copy)]
struct Pen {
    scale: f32,
}

impl Pen {
    fn px(self, logical: f32) -> i32 {
        (logical * self.scale).round() as i32
    }

    fn text(
        self,
        canvas: &mut RgbaImage,
        face: &Typeface,
        text: &str,
        x: f32,
        top: f32,
        size: f32,
        color: Rgba<u8>,
    ) {
        face.draw(canvas, text, x * self.scale, top * self.scale, size * self.scale, color);
    }

    fn measure(self, face: &Typeface, text: &str, size: f32) -> f32 {
        face.measure(text, size * self.scale) / self.scale
    }

    fn wrap(self, face: &Typeface, text: &str, size: f32, width: f32) -> Vec<String> {
        wrap(face, text, size * self.scale, width * self.scale)
    }
}

/// Scale and center-crop `image` to fill `width`×`height`.
fn cover(image: &DynamicImage, width: u32, height: u32) -> Option<RgbaImage> {
    let (iw, ih) = (image.width(), image.height());
    if iw == 0 || ih == 0 {
        return None;
    }
    let scale = (width as f32 / iw as f32).max(height as f32 / ih as f32);
    let crop_w = ((width as f32 / scale).round() as u32).clamp(1, iw);
    let crop_h = ((height as f32 / scale).round() as u32).clamp(1, ih);
    let x = (iw - crop_w) / 2;
    let y = (ih - crop_h) / 2;
    Some(
        image
            .crop_imm(x, y, crop_w, crop_h)
            .resize_exact(width, height, FilterType::Lanczos3)
            .to_rgba8(),
    )
}

fn draw_front(canvas: &mut RgbaImage, scene: &FaceScene, pen: Pen) {
    let (width, height) = canvas.dimensions();
    match scene.background.as_deref().and_then(|bg| cover(bg, width, height)) {
        Some(artwork) => *canvas = artwork,
        None => vertical_gradient(canvas, 0, height as i32, NIGHT_TOP, NIGHT_BOTTOM),
    }

    // Dark scrim under the headline
    let scrim_top = pen.px(CARD_HEIGHT as f32 - 220.0);
    vertical_gradient(
        canvas,
        scrim_top,
        height as i32,
        Rgba([0, 0, 0, 0]),
        Rgba([0, 0, 0, 204]),
    );

    let face = scene.fonts.typeface(PostcardFont::GreatVibes);
    let size = 60.0;
    let inset = 32.0;
    let lines = pen.wrap(&face, &scene.record.headline(), size, CARD_WIDTH as f32 - inset * 2.0);
    let line_height = size * TIGHT_LEADING;
    let mut top = CARD_HEIGHT as f32 - inset - line_height * lines.len() as f32;

    for line in &lines {
        pen.text(canvas, &face, line, inset + 2.0, top + 2.0, size, SHADOW);
        pen.text(canvas, &face, line, inset, top, size, WHITE);
        top += line_height;
    }
}

/// Message block laid out at the largest size that fits the column.
struct MessageLayout {
    size: f32,
    lines: Vec<String>,
}

fn layout_message(pen: Pen, face: &Typeface, message: &str, width: f32, max_height: f32) -> MessageLayout {
    let quoted = format!("\"{}\"", message);
    let mut layout = MessageLayout {
        size: 0.0,
        lines: Vec::new(),
    };
    for size in MESSAGE_SIZES {
        layout = MessageLayout {
            size,
            lines: pen.wrap(face, &quoted, size, width),
        };
        if layout.lines.len() as f32 * size * MESSAGE_LEADING <= max_height {
            return layout;
        }
    }

    // Still too tall at the smallest size: keep what fits and mark the cut.
    let max_lines = ((max_height / (layout.size * MESSAGE_LEADING)).floor() as usize).max(1);
    if layout.lines.len() > max_lines {
        layout.lines.truncate(max_lines);
        if let Some(last) = layout.lines.last_mut() {
            *last = ellipsize(pen, face, last, layout.size, width);
        }
    }
    layout
}

/// Drop trailing words from `line` until it fits `width` with "..." appended.
fn ellipsize(pen: Pen, face: &Typeface, line: &str, size: f32, width: f32) -> String {
    let mut words: Vec<&str> = line.split_whitespace().collect();
    while !words.is_empty() {
        let candidate = format!("{}...", words.join(" "));
        if pen.measure(face, &candidate, size) <= width {
            return candidate;
        }
        words.pop();
    }
    "...".to_string()
}

fn draw_back(canvas: &mut RgbaImage, scene: &FaceScene, pen: Pen) {
    let (width, height) = canvas.dimensions();
    fill_rect(canvas, 0, 0, width as i32, height as i32, PAPER);

    let record = &scene.record;
    let script = scene.fonts.typeface(PostcardFont::GreatVibes);
    let body = scene.fonts.typeface(record.font);

    // Left column: greeting, message, sign-off
    let column_x = PADDING;
    let column_w = DIVIDER_X - PADDING * 2.0;
    let greeting_size = 36.0;
    let closing_size = 30.0;
    let greeting_h = greeting_size * TIGHT_LEADING + 24.0;
    let closing_h = 40.0 + closing_size * TIGHT_LEADING * 2.0;
    let available = CARD_HEIGHT as f32 - PADDING * 2.0 - greeting_h - closing_h;

    let message = layout_message(pen, &body, &record.message, column_w, available);
    let message_line = message.size * MESSAGE_LEADING;
    let total = greeting_h + message_line * message.lines.len() as f32 + closing_h;
    let mut top = ((CARD_HEIGHT as f32 - total) / 2.0).max(PADDING);

    let greeting = format!("Dear {},", record.recipient);
    pen.text(canvas, &script, &greeting, column_x, top, greeting_size, RED);
    top += greeting_h;

    // Center each line within its leading box
    let half_leading = (message_line - message.size) / 2.0;
    for line in &message.lines {
        pen.text(canvas, &body, line, column_x, top + half_leading, message.size, INK);
        top += message_line;
    }

    top += 40.0;
    let right_edge = DIVIDER_X - PADDING;
    for line in ["Warmly,", record.sender.as_str()] {
        let w = pen.measure(&script, line, closing_size);
        pen.text(canvas, &script, line, right_edge - w, top, closing_size, RED);
        top += closing_size * TIGHT_LEADING;
    }

    // Divider
    fill_rect(
        canvas,
        pen.px(DIVIDER_X - 2.0),
        pen.px(PADDING),
        pen.px(2.0),
        pen.px(CARD_HEIGHT as f32 - PADDING * 2.0),
        DIVIDER,
    );

    // Right column: stamp box and address rules
    let right_x = DIVIDER_X + PADDING;
    let right_w = CARD_WIDTH as f32 - PADDING - right_x;
    let center_x = right_x + right_w / 2.0;
    let (stamp_w, stamp_h) = (96.0, 128.0);
    let stamp_x = center_x - stamp_w / 2.0;
    let stamp_y = PADDING + 48.0;

    fill_rect(
        canvas,
        pen.px(stamp_x),
        pen.px(stamp_y),
        pen.px(stamp_w),
        pen.px(stamp_h),
        STAMP_FILL,
    );
    dashed_rect(
        canvas,
        pen.px(stamp_x),
        pen.px(stamp_y),
        pen.px(stamp_w),
        pen.px(stamp_h),
        pen.px(2.0),
        pen.px(6.0),
        RULE,
    );
    let label_face = scene.fonts.typeface(PostcardFont::Nunito);
    let label_size = 14.0;
    let label_w = pen.measure(&label_face, "STAMP", label_size);
    pen.text(
        canvas,
        &label_face,
        "STAMP",
        center_x - label_w / 2.0,
        stamp_y + (stamp_h - label_size) / 2.0,
        label_size,
        STAMP_TEXT,
    );

    let mut rule_y = stamp_y + stamp_h + 64.0;
    for _ in 0..3 {
        rule_y += 24.0;
        fill_rect(canvas, pen.px(right_x), pen.px(rule_y), pen.px(right_w), pen.px(1.0).max(1), RULE);
        rule_y += 1.0 + 24.0;
    }
}
