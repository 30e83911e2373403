// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Per-scanline compositor: renders one 640x200 BGRA8 frame from VGC state
//! at a cadence independent of the CPU clock.

use crate::font::FontRom;
use crate::palette;
use crate::sprite::SPRITE_COUNT;
use crate::vgc::copper::CopperTarget;
use crate::vgc::registers::{MODE_GRAPHICS, MODE_MIXED};
use crate::vgc::{Vgc, COLUMNS};

pub const OUTPUT_WIDTH: usize = 640;
pub const SCANLINES: usize = 200;
pub const SPRITE_SPACE_WIDTH: usize = 320;
pub const TEXT_CELL_PX: usize = 8;
pub const GFX_SCALE: usize = 4;

pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    /// BGRA8, row-major.
    pub data: Vec<u8>,
}

impl FrameBuffer {
    fn new() -> Self {
        Self {
            width: OUTPUT_WIDTH,
            height: SCANLINES,
            data: vec![0u8; OUTPUT_WIDTH * SCANLINES * 4],
        }
    }

    fn set(&mut self, x: usize, y: usize, color: palette::Rgb) {
        let i = (y * self.width + x) * 4;
        self.data[i] = color.2; // B
        self.data[i + 1] = color.1; // G
        self.data[i + 2] = color.0; // R
        self.data[i + 3] = 0xff; // A
    }
}

/// Host collaborator that receives a completed frame (the desktop window
/// toolkit owns presentation; this crate only produces pixels).
pub trait FrameSink {
    fn present(&mut self, frame: &FrameBuffer);
}

pub struct FrameResult {
    pub raster_irq: bool,
}

pub struct Compositor;

impl Compositor {
    /// Render one frame and hand it to `sink`. Returns whether the VGC's
    /// raster IRQ should fire for this frame.
    pub fn render_frame(vgc: &mut Vgc, font: &FontRom, sink: &mut dyn FrameSink) -> FrameResult {
        let compiled = vgc.copper.compile();
        let mut sprite_snapshot = vgc.sprites.regs;
        let mut working_mode = vgc.core.mode;
        let mut working_bg = vgc.core.bg_color;
        let mut working_scroll_x = vgc.core.scroll_x;
        let mut working_scroll_y = vgc.core.scroll_y;

        let cursor_blink_visible = (vgc.core.frame_counter / 30) % 2 == 0;
        let font_slot = vgc.aux.font_select as usize;

        let mut frame = FrameBuffer::new();
        let mut collision_ss: u8 = 0;
        let mut collision_sb: u8 = 0;

        for y in 0..SCANLINES {
            for ev in compiled.sprite_events_before(y) {
                apply_sprite_event(&mut sprite_snapshot, ev);
            }

            let mut layers = [[0u8; SPRITE_SPACE_WIDTH]; 3];
            let mut contributors = [0u16; SPRITE_SPACE_WIDTH];
            rasterize_sprites(&sprite_snapshot, &vgc.shapes, y, &mut layers, &mut contributors);

            let mut pixel_events = compiled.pixel_events_on(y).peekable();

            for x in 0..OUTPUT_WIDTH {
                while let Some(ev) = pixel_events.peek() {
                    if (ev.x as usize) > x {
                        break;
                    }
                    let ev = *pixel_events.next().unwrap();
                    match ev.target {
                        CopperTarget::Mode => working_mode = ev.value,
                        CopperTarget::BgColor => working_bg = ev.value,
                        CopperTarget::ScrollX => working_scroll_x = ev.value,
                        CopperTarget::ScrollY => working_scroll_y = ev.value,
                        CopperTarget::SpriteReg { .. } => {}
                    }
                }

                let sprite_x = x / 2;
                let behind = layers[0][sprite_x];
                let mid = layers[1][sprite_x];
                let front = layers[2][sprite_x];

                let (fg_or_gfx, is_cursor_cell) =
                    sample_base_layer(vgc, font, font_slot, working_mode, working_scroll_x, working_scroll_y, x, y);

                let mut color = vgc.palette_rgb(working_bg);
                if behind != 0 {
                    color = vgc.palette_rgb(behind);
                }
                if let Some(c) = fg_or_gfx {
                    color = vgc.palette_rgb(c);
                }
                if is_cursor_cell && cursor_blink_visible {
                    color = vgc.palette_rgb(vgc.core.bg_color);
                }
                if mid != 0 {
                    color = vgc.palette_rgb(mid);
                }
                if front != 0 {
                    color = vgc.palette_rgb(front);
                }
                frame.set(x, y, color);

                let contributor_mask = contributors[sprite_x];
                if contributor_mask.count_ones() >= 2 {
                    collision_ss |= collapse_mask(contributor_mask);
                }
                let graphics_active = matches!(working_mode, MODE_GRAPHICS | MODE_MIXED);
                if graphics_active && contributor_mask != 0 {
                    let gx = (x + working_scroll_x as usize) / GFX_SCALE;
                    let gy = (y + working_scroll_y as usize) / GFX_SCALE;
                    if vgc.graphics.get(gx as i32, gy as i32) != 0 {
                        collision_sb |= collapse_mask(contributor_mask);
                    }
                }
            }
        }

        vgc.core.sprite_sprite_collision.0 |= collision_ss;
        vgc.core.sprite_bg_collision.0 |= collision_sb;

        vgc.core.frame_counter = vgc.core.frame_counter.wrapping_add(1);
        sink.present(&frame);

        FrameResult {
            raster_irq: vgc.aux.raster_irq_enable,
        }
    }
}

/// Returns (Some(color) if the text/graphics layer paints this pixel, is_cursor_cell).
#[allow(clippy::too_many_arguments)]
fn sample_base_layer(
    vgc: &Vgc,
    font: &FontRom,
    font_slot: usize,
    mode: u8,
    scroll_x: u8,
    scroll_y: u8,
    x: usize,
    y: usize,
) -> (Option<u8>, bool) {
    let graphics_pixel = if matches!(mode, MODE_GRAPHICS | MODE_MIXED) {
        let gx = (x + scroll_x as usize) / GFX_SCALE;
        let gy = (y + scroll_y as usize) / GFX_SCALE;
        let c = vgc.graphics.get(gx as i32, gy as i32);
        if c != 0 {
            Some(c)
        } else {
            None
        }
    } else {
        None
    };
    if let Some(c) = graphics_pixel {
        return (Some(c), false);
    }
    if mode == MODE_GRAPHICS {
        return (None, false);
    }

    let col = x / TEXT_CELL_PX;
    let row = y / TEXT_CELL_PX;
    if col >= COLUMNS || row >= crate::vgc::ROWS {
        return (None, false);
    }
    let cell = row * COLUMNS + col;
    let glyph = vgc.screen_ram[cell];
    let cell_fg = vgc.color_ram[cell];
    let row_in_cell = y % TEXT_CELL_PX;
    let bits = font.glyph_row_in(font_slot, glyph, row_in_cell);
    let bit_index = 7 - (x % TEXT_CELL_PX);
    let pixel_on = (bits >> bit_index) & 1 != 0;
    let is_cursor_cell = col == vgc.core.cursor_x as usize && row == vgc.core.cursor_y as usize;
    if pixel_on {
        (Some(cell_fg), is_cursor_cell)
    } else {
        (None, is_cursor_cell)
    }
}

/// The sprite-sprite and sprite-background collision registers are each a
/// single byte while there are 16 live sprites; indices fold onto bits 0-7
/// (sprite N and sprite N+8 share a bit). See DESIGN.md's Open Question
/// decisions for the rationale.
fn collapse_mask(mask: u16) -> u8 {
    (mask as u8) | ((mask >> 8) as u8)
}

fn apply_sprite_event(snapshot: &mut [crate::sprite::SpriteReg; SPRITE_COUNT], ev: &crate::vgc::copper::CopperEvent) {
    if let CopperTarget::SpriteReg { sprite, offset } = ev.target {
        let sprite = sprite as usize;
        if sprite >= SPRITE_COUNT {
            return;
        }
        let r = &mut snapshot[sprite];
        match offset {
            0 => r.x = (r.x & 0xff00) | ev.value as u16,
            1 => r.x = (r.x & 0x00ff) | ((ev.value as u16) << 8),
            2 => r.y = (r.y & 0xff00) | ev.value as u16,
            3 => r.y = (r.y & 0x00ff) | ((ev.value as u16) << 8),
            4 => r.shape_index = ev.value,
            5 => r.flags = ev.value,
            6 => r.priority = ev.value.min(2),
            _ => {}
        }
    }
}

fn rasterize_sprites(
    snapshot: &[crate::sprite::SpriteReg; SPRITE_COUNT],
    shapes: &crate::sprite::ShapeStore,
    y: usize,
    layers: &mut [[u8; SPRITE_SPACE_WIDTH]; 3],
    contributors: &mut [u16; SPRITE_SPACE_WIDTH],
) {
    let gy = y / GFX_SCALE;
    for (idx, sprite) in snapshot.iter().enumerate() {
        if !sprite.enabled() {
            continue;
        }
        let sprite_y = sprite.y as usize;
        if gy < sprite_y || gy >= sprite_y + crate::sprite::SHAPE_HEIGHT {
            continue;
        }
        let local_row = gy - sprite_y;
        let row_pixels = shapes.row_pixels(sprite.shape_index as usize, local_row, sprite.flip_x(), sprite.flip_y());
        let priority = sprite.priority.min(2) as usize;
        for (px, &color) in row_pixels.iter().enumerate() {
            if color == 0 {
                continue;
            }
            let buf_x = sprite.x as usize + px;
            if buf_x >= SPRITE_SPACE_WIDTH {
                continue;
            }
            layers[priority][buf_x] = color;
            contributors[buf_x] |= 1 << idx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vgc::command::{CMD_SPRITE_DEFINE_ROW, CMD_SPRITE_ENABLE, CMD_SPRITE_SET_POSITION};

    struct NullSink;
    impl FrameSink for NullSink {
        fn present(&mut self, _frame: &FrameBuffer) {}
    }

    fn enable_sprite_at(vgc: &mut Vgc, sprite: u8, x: u16, y: u8) {
        vgc.core.params[0] = sprite;
        vgc.core.params[1] = 0;
        let bytes = [0xffu8; 8]; // every nibble pair = color 0xf
        vgc.core.params[2..10].copy_from_slice(&bytes);
        vgc.execute_command(CMD_SPRITE_DEFINE_ROW);

        vgc.core.params[0] = sprite;
        vgc.core.params[1] = (x & 0xff) as u8;
        vgc.core.params[2] = (x >> 8) as u8;
        vgc.core.params[3] = y;
        vgc.execute_command(CMD_SPRITE_SET_POSITION);

        vgc.core.params[0] = sprite;
        vgc.execute_command(CMD_SPRITE_ENABLE);
    }

    #[test]
    fn overlapping_sprites_set_collision_bits_then_clear_on_read() {
        let mut vgc = Vgc::new();
        let font = FontRom::new();
        enable_sprite_at(&mut vgc, 0, 10, 0);
        enable_sprite_at(&mut vgc, 3, 10, 0);
        let mut sink = NullSink;
        Compositor::render_frame(&mut vgc, &font, &mut sink);
        let first = vgc.core.sprite_sprite_collision.peek();
        assert_ne!(first & 0b0000_1001, 0);
        let cleared = vgc.core.sprite_sprite_collision.take();
        assert_eq!(cleared, first);
        assert_eq!(vgc.core.sprite_sprite_collision.peek(), 0);
    }

    #[test]
    fn render_does_not_panic_with_no_sprites() {
        let mut vgc = Vgc::new();
        let font = FontRom::new();
        let mut sink = NullSink;
        Compositor::render_frame(&mut vgc, &font, &mut sink);
    }
}
