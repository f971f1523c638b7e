//! Execute a display list into an RGBA buffer at the supersampling factor.
//!
//! Glyphs are painted as fixed-metric character cells, which keeps the
//! output deterministic across environments (faithful text rendering is the
//! hosting engine's job, not this crate's).

use crate::rendering::paint::PaintCommand;
use crate::rendering::PixelBuffer;
use image::Rgba;

/// Rasterize `commands` into a `width × height` CSS-pixel canvas scaled by
/// `supersample`. The ground is fully transparent.
pub fn rasterize_display_list(
    width: u32,
    height: u32,
    commands: &[PaintCommand],
    supersample: u32,
) -> PixelBuffer {
    let scale = supersample.max(1);
    let mut buffer = PixelBuffer::from_pixel(
        width * scale,
        height * scale,
        Rgba([0, 0, 0, 0]),
    );

    for command in commands {
        match command {
            PaintCommand::SolidRect {
                x,
                y,
                width,
                height,
                rgba,
            } => {
                fill_rect(
                    &mut buffer,
                    x * scale as i32,
                    y * scale as i32,
                    width * scale,
                    height * scale,
                    *rgba,
                );
            }
            PaintCommand::Text {
                x,
                y,
                lines,
                rgba,
                font_size,
                line_height,
            } => {
                draw_text(
                    &mut buffer,
                    x * scale as i32,
                    y * scale as i32,
                    lines,
                    *rgba,
                    font_size * scale,
                    line_height * scale,
                );
            }
        }
    }

    buffer
}

/// Source-over fill, clipped to the buffer
fn fill_rect(buffer: &mut PixelBuffer, x: i32, y: i32, width: u32, height: u32, rgba: [u8; 4]) {
    if rgba[3] == 0 {
        return;
    }
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = (x + width as i32).clamp(0, buffer.width() as i32) as u32;
    let y1 = (y + height as i32).clamp(0, buffer.height() as i32) as u32;
    for py in y0..y1 {
        for px in x0..x1 {
            let dst = buffer.get_pixel(px, py).0;
            buffer.put_pixel(px, py, Rgba(blend(rgba, dst)));
        }
    }
}

/// `src` over `dst`, both straight-alpha RGBA
fn blend(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as u32;
    if sa == 255 || dst[3] == 0 {
        return src;
    }
    let da = dst[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }
    let channel = |s: u8, d: u8| -> u8 {
        let s = s as u32;
        let d = d as u32;
        ((s * sa + d * da * (255 - sa) / 255) / out_a) as u8
    };
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        out_a as u8,
    ]
}

/// Paint wrapped lines as per-character cells
fn draw_text(
    buffer: &mut PixelBuffer,
    x: i32,
    y: i32,
    lines: &[String],
    rgba: [u8; 4],
    font_size: u32,
    line_height: u32,
) {
    let advance = (font_size / 2).max(2);
    let cell_width = advance.saturating_sub(advance / 4).max(1);
    let cell_height = font_size.saturating_sub(font_size / 8).max(1);
    for (row, line) in lines.iter().enumerate() {
        let pen_y = y + (row as u32 * line_height) as i32;
        let mut pen_x = x;
        for ch in line.chars() {
            if !ch.is_whitespace() {
                fill_rect(buffer, pen_x, pen_y, cell_width, cell_height, rgba);
            }
            pen_x += advance as i32;
        }
    }
}
