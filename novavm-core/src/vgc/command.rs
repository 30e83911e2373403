// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! VGC command engine. The command port latches a 1-byte opcode; the 14
//! parameter registers are pre-loaded. Writing the opcode triggers
//! synchronous execution. Unknown opcodes are dropped silently, keeping
//! a bad BASIC `POKE` harmless instead of raising a register-level error.

use crate::palette::color_index;
use crate::vgc::Vgc;

pub const CMD_PLOT: u8 = 0x00;
pub const CMD_UNPLOT: u8 = 0x01;
pub const CMD_LINE: u8 = 0x02;
pub const CMD_CIRCLE: u8 = 0x03;
pub const CMD_RECT: u8 = 0x04;
pub const CMD_FILL: u8 = 0x05;
pub const CMD_CLEAR_GRAPHICS: u8 = 0x06;
pub const CMD_SET_GRAPHICS_COLOR: u8 = 0x07;

pub const CMD_SPRITE_DEFINE_PIXEL: u8 = 0x10;
pub const CMD_SPRITE_DEFINE_ROW: u8 = 0x11;
pub const CMD_SPRITE_CLEAR_SHAPE: u8 = 0x12;
pub const CMD_SPRITE_COPY_SHAPE: u8 = 0x13;
pub const CMD_SPRITE_SET_POSITION: u8 = 0x14;
pub const CMD_SPRITE_ENABLE: u8 = 0x15;
pub const CMD_SPRITE_DISABLE: u8 = 0x16;
pub const CMD_SPRITE_SET_FLIP: u8 = 0x17;
pub const CMD_SPRITE_SET_PRIORITY: u8 = 0x18;

pub const CMD_COPPER_SCHEDULE: u8 = 0x20;
pub const CMD_COPPER_CLEAR: u8 = 0x21;

impl Vgc {
    pub fn execute_command(&mut self, opcode: u8) {
        trace!(target: "vgc::cmd", "dispatch opcode 0x{:02x}", opcode);
        let p = self.core.params;
        match opcode {
            CMD_PLOT => {
                let (x, y) = (p[0] as i32, p[1] as i32);
                let color = self.draw_color;
                self.graphics.plot(x, y, color);
            }
            CMD_UNPLOT => {
                let (x, y) = (p[0] as i32, p[1] as i32);
                self.graphics.unplot(x, y);
            }
            CMD_LINE => {
                let (x0, y0, x1, y1) = (p[0] as i32, p[1] as i32, p[2] as i32, p[3] as i32);
                let color = self.draw_color;
                self.graphics.line(x0, y0, x1, y1, color);
            }
            CMD_CIRCLE => {
                let (cx, cy, r) = (p[0] as i32, p[1] as i32, p[2] as i32);
                let color = self.draw_color;
                self.graphics.circle(cx, cy, r, color);
            }
            CMD_RECT => {
                let (x0, y0, x1, y1) = (p[0] as i32, p[1] as i32, p[2] as i32, p[3] as i32);
                let color = self.draw_color;
                self.graphics.rect(x0, y0, x1, y1, color);
            }
            CMD_FILL => {
                let (x0, y0, x1, y1) = (p[0] as i32, p[1] as i32, p[2] as i32, p[3] as i32);
                let color = self.draw_color;
                self.graphics.fill(x0, y0, x1, y1, color);
            }
            CMD_CLEAR_GRAPHICS => self.graphics.clear(),
            CMD_SET_GRAPHICS_COLOR => self.draw_color = color_index(p[0]),

            CMD_SPRITE_DEFINE_PIXEL => {
                let sprite = p[0] as usize;
                if sprite < crate::sprite::SPRITE_COUNT {
                    self.shapes.define_pixel(
                        self.sprites.regs[sprite].shape_index as usize,
                        p[1] as usize,
                        p[2] as usize,
                        p[3],
                    );
                }
            }
            CMD_SPRITE_DEFINE_ROW => {
                let sprite = p[0] as usize;
                if sprite < crate::sprite::SPRITE_COUNT {
                    let mut row_bytes = [0u8; 8];
                    row_bytes.copy_from_slice(&p[2..10]);
                    self.shapes.define_row(
                        self.sprites.regs[sprite].shape_index as usize,
                        p[1] as usize,
                        &row_bytes,
                    );
                }
            }
            CMD_SPRITE_CLEAR_SHAPE => {
                let sprite = p[0] as usize;
                if sprite < crate::sprite::SPRITE_COUNT {
                    self.shapes.clear_shape(self.sprites.regs[sprite].shape_index as usize);
                }
            }
            CMD_SPRITE_COPY_SHAPE => {
                self.shapes.copy_shape(p[0] as usize, p[1] as usize);
            }
            CMD_SPRITE_SET_POSITION => {
                let sprite = p[0] as usize;
                let x = self.core.param_u16(1);
                let y = p[3] as u16;
                self.sprites.set_position(sprite, x, y);
            }
            CMD_SPRITE_ENABLE => {
                self.sprites.set_enabled(p[0] as usize, true);
            }
            CMD_SPRITE_DISABLE => {
                self.sprites.set_enabled(p[0] as usize, false);
            }
            CMD_SPRITE_SET_FLIP => {
                self.sprites.set_flip(p[0] as usize, p[1]);
            }
            CMD_SPRITE_SET_PRIORITY => {
                self.sprites.set_priority(p[0] as usize, p[1]);
            }

            CMD_COPPER_SCHEDULE => {
                use crate::vgc::copper::{CopperEvent, CopperTarget};
                let target = match p[0] {
                    0 => Some(CopperTarget::Mode),
                    1 => Some(CopperTarget::BgColor),
                    2 => Some(CopperTarget::ScrollX),
                    3 => Some(CopperTarget::ScrollY),
                    4 => Some(CopperTarget::SpriteReg { sprite: p[1], offset: p[2] }),
                    _ => None,
                };
                if let Some(target) = target {
                    let y = self.core.param_u16(3);
                    let x = self.core.param_u16(5);
                    self.copper.push(CopperEvent { y, x, target, value: p[7] });
                }
            }
            CMD_COPPER_CLEAR => self.copper.clear(),
            _ => {
                trace!(target: "vgc::cmd", "dropped unknown opcode 0x{:02x}", opcode);
            }
        }
    }
}
