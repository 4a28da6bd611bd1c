// display compositing: point markers, mask overlay, watermark
//
// stateless helpers over RgbaImage; the session calls these to rebuild the
// on-screen frame after every mutation and every drawn optimization step.

use image::{Rgba, RgbaImage};

use crate::mask::MaskBuffer;
use crate::points::PointRegistry;

const SOURCE_COLOR: Rgba<u8> = Rgba([255, 0, 0, 90]);
const TARGET_COLOR: Rgba<u8> = Rgba([0, 0, 255, 90]);
const LINK_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);
const MASK_ALPHA: u8 = 45;

#[inline]
fn blend_px(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    let a = color.0[3] as u32;
    for c in 0..3 {
        let over = color.0[c] as u32;
        let under = dst.0[c] as u32;
        dst.0[c] = ((over * a + under * (255 - a) + 127) / 255) as u8;
    }
}

fn fill_circle(img: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
    let r2 = radius * radius;
    let x0 = (cx - radius).floor() as i64;
    let y0 = (cy - radius).floor() as i64;
    let x1 = (cx + radius).ceil() as i64;
    let y1 = (cy + radius).ceil() as i64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= r2 {
                blend_px(img, x, y, color);
            }
        }
    }
}

fn draw_line(img: &mut RgbaImage, from: [f32; 2], to: [f32; 2], width: f32, color: Rgba<u8>) {
    let dx = to[0] - from[0];
    let dy = to[1] - from[1];
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1.0 {
        return;
    }
    let steps = len.ceil() as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        fill_circle(
            img,
            from[0] + dx * t,
            from[1] + dy * t,
            width * 0.5,
            color,
        );
    }
}

/// draw every point pair: translucent red disc at the (possibly transient)
/// source, blue at the target, a yellow link between them once both exist.
/// marker radius scales with image width.
pub fn overlay_points(image: &RgbaImage, points: &PointRegistry) -> RgbaImage {
    profiling::scope!("overlay_points");
    let mut out = image.clone();
    let radius = (image.width() as f32 * 0.02).max(2.0);

    for (_, pair) in points.iter() {
        let start = pair.effective_start();
        if let (Some(s), Some(t)) = (start, pair.target) {
            draw_line(&mut out, s, t, 2.0, LINK_COLOR);
        }
        if let Some(s) = start {
            fill_circle(&mut out, s[0], s[1], radius, SOURCE_COLOR);
        }
        if let Some(t) = pair.target {
            fill_circle(&mut out, t[0], t[1], radius, TARGET_COLOR);
        }
    }
    out
}

/// translucent mask overlay: white over editable pixels, black over fixed
pub fn overlay_mask(image: &RgbaImage, mask: &MaskBuffer) -> RgbaImage {
    profiling::scope!("overlay_mask");
    let mut out = image.clone();
    let (w, h) = out.dimensions();
    let (mw, mh) = mask.dimensions();
    debug_assert_eq!((w, h), (mw, mh));
    for y in 0..h.min(mh) {
        for x in 0..w.min(mw) {
            let v = mask.get(x, y) * 255;
            blend_px(&mut out, x as i64, y as i64, Rgba([v, v, v, MASK_ALPHA]));
        }
    }
    out
}

// 5x7 bitmap glyphs for the "AI" corner tag, one row per byte, MSB left
const GLYPH_A: [u8; 7] = [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001];
const GLYPH_I: [u8; 7] = [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111];

/// stamp a small "AI" tag in the bottom-right corner of the frame
pub fn watermark(mut image: RgbaImage) -> RgbaImage {
    profiling::scope!("watermark");
    let (w, h) = image.dimensions();
    let scale = (w / 128).max(1);
    let glyph_w = 5 * scale;
    let glyph_h = 7 * scale;
    let margin = 2 * scale;
    if w < 2 * glyph_w + 3 * margin || h < glyph_h + 2 * margin {
        return image;
    }

    let x0 = w - 2 * glyph_w - 2 * margin;
    let y0 = h - glyph_h - margin;
    // darken a backing strip so the tag reads on any background
    for y in y0.saturating_sub(margin)..h {
        for x in x0.saturating_sub(margin)..w {
            blend_px(&mut image, x as i64, y as i64, Rgba([0, 0, 0, 70]));
        }
    }
    for (g, glyph) in [GLYPH_A, GLYPH_I].iter().enumerate() {
        let gx = x0 + g as u32 * (glyph_w + margin);
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..5u32 {
                if bits & (1 << (4 - col)) != 0 {
                    for sy in 0..scale {
                        for sx in 0..scale {
                            blend_px(
                                &mut image,
                                (gx + col * scale + sx) as i64,
                                (y0 + row as u32 * scale + sy) as i64,
                                Rgba([255, 255, 255, 200]),
                            );
                        }
                    }
                }
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::PointRegistry;

    #[test]
    fn test_overlay_points_marks_source() {
        let base = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let mut points = PointRegistry::new();
        points.register_click([50.0, 50.0]);

        let out = overlay_points(&base, &points);
        // red disc blended over black at the click position
        assert!(out.get_pixel(50, 50).0[0] > 50);
        // far corner untouched
        assert_eq!(out.get_pixel(5, 5), base.get_pixel(5, 5));
    }

    #[test]
    fn test_overlay_mask_brightens_editable_region() {
        let base = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        let mask = MaskBuffer::new_full(16, 16);
        let out = overlay_mask(&base, &mask);
        // white at alpha 45 over black
        let expected = ((255u32 * 45 + 127) / 255) as u8;
        assert_eq!(out.get_pixel(8, 8).0[0], expected);
    }

    #[test]
    fn test_watermark_changes_corner_only() {
        let base = RgbaImage::from_pixel(256, 256, Rgba([128, 128, 128, 255]));
        let out = watermark(base.clone());
        assert_ne!(out.get_pixel(250, 250), base.get_pixel(250, 250));
        assert_eq!(out.get_pixel(10, 10), base.get_pixel(10, 10));
    }

    #[test]
    fn test_watermark_skips_tiny_images() {
        let base = RgbaImage::from_pixel(8, 8, Rgba([10, 10, 10, 255]));
        let out = watermark(base.clone());
        assert_eq!(out, base);
    }
}
