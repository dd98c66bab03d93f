//! Raster primitives: alpha blending, fills, gradients, rules.

use image::{Rgba, RgbaImage};

/// Composite `color` over the pixel at (`x`, `y`), scaled by `coverage`.
///
/// Out-of-bounds coordinates are ignored. The canvas stays opaque.
#[inline]
pub fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let alpha = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        let blended = dst[c] as f32 * (1.0 - alpha) + color[c] as f32 * alpha;
        dst[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = 255;
}

pub fn fill_rect(canvas: &mut RgbaImage, x: i32, y: i32, width: i32, height: i32, color: Rgba<u8>) {
    for py in y.max(0)..(y + height).min(canvas.height() as i32) {
        for px in x.max(0)..(x + width).min(canvas.width() as i32) {
            blend_pixel(canvas, px, py, color, 1.0);
        }
    }
}

fn lerp_color(from: Rgba<u8>, to: Rgba<u8>, t: f32) -> Rgba<u8> {
    let mut out = [0u8; 4];
    for (c, value) in out.iter_mut().enumerate() {
        *value = (from[c] as f32 + (to[c] as f32 - from[c] as f32) * t).round() as u8;
    }
    Rgba(out)
}

/// Top-to-bottom gradient over rows `top..bottom`, blended over what is there.
pub fn vertical_gradient(canvas: &mut RgbaImage, top: i32, bottom: i32, from: Rgba<u8>, to: Rgba<u8>) {
    let span = (bottom - top).max(1) as f32;
    let width = canvas.width() as i32;
    for y in top.max(0)..bottom.min(canvas.height() as i32) {
        let color = lerp_color(from, to, (y - top) as f32 / span);
        fill_rect(canvas, 0, y, width, 1, color);
    }
}

/// Rectangle outline drawn as dashes of `dash` pixels.
pub fn dashed_rect(
    canvas: &mut RgbaImage,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    thickness: i32,
    dash: i32,
    color: Rgba<u8>,
) {
    let dash = dash.max(1);
    let mut offset = 0;
    while offset < width {
        let len = dash.min(width - offset);
        fill_rect(canvas, x + offset, y, len, thickness, color);
        fill_rect(canvas, x + offset, y + height - thickness, len, thickness, color);
        offset += dash * 2;
    }
    let mut offset = 0;
    while offset < height {
        let len = dash.min(height - offset);
        fill_rect(canvas, x, y + offset, thickness, len, color);
        fill_rect(canvas, x + width - thickness, y + offset, thickness, len, color);
        offset += dash * 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn test_blend_half_alpha() {
        let mut canvas = RgbaImage::from_pixel(1, 1, WHITE);
        blend_pixel(&mut canvas, 0, 0, Rgba([0, 0, 0, 255]), 0.5);
        let p = canvas.get_pixel(0, 0);
        assert!((p[0] as i32 - 128).abs() <= 1);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_blend_out_of_bounds_is_ignored() {
        let mut canvas = RgbaImage::from_pixel(2, 2, WHITE);
        blend_pixel(&mut canvas, -1, 0, Rgba([0, 0, 0, 255]), 1.0);
        blend_pixel(&mut canvas, 0, 2, Rgba([0, 0, 0, 255]), 1.0);
        assert!(canvas.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_gradient_endpoints() {
        let mut canvas = RgbaImage::from_pixel(4, 10, WHITE);
        vertical_gradient(&mut canvas, 0, 10, Rgba([0, 0, 0, 255]), Rgba([200, 200, 200, 255]));
        assert_eq!(canvas.get_pixel(0, 0)[0], 0);
        assert!(canvas.get_pixel(0, 9)[0] >= 170);
    }

    #[test]
    fn test_dashed_rect_leaves_gaps() {
        let mut canvas = RgbaImage::from_pixel(20, 20, WHITE);
        dashed_rect(&mut canvas, 0, 0, 20, 20, 1, 3, Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 0)[0], 0);
        assert_eq!(canvas.get_pixel(4, 0)[0], 255);
        assert_eq!(canvas.get_pixel(10, 10)[0], 255);
    }
}
