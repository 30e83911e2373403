// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Virtual Graphics Controller: screen/color RAM, graphics bitmap, sprite
//! state, command engine, copper list and the compositor driver that reads
//! it all.

pub mod command;
pub mod compositor;
pub mod copper;
mod charout;
pub mod registers;

use crate::graphics::GraphicsBitmap;
use crate::palette;
use crate::sprite::{ShapeStore, SpriteBank};
use registers::{AuxRegisters, CoreRegisters};

pub const COLUMNS: usize = 80;
pub const ROWS: usize = 25;
pub const SCREEN_CELLS: usize = COLUMNS * ROWS;

// Address map, relative to the bus.
pub const CORE_BASE: u16 = 0xa000;
pub const CORE_END: u16 = 0xa01e;
pub const AUX_BASE: u16 = 0xa020;
pub const AUX_END: u16 = 0xa03f;
pub const SPRITE_REG_BASE: u16 = 0xa040;
pub const SPRITE_REG_END: u16 = 0xa0bf;
pub const SCREEN_RAM_BASE: u16 = 0xaa00;
pub const SCREEN_RAM_END: u16 = 0xb1cf;
pub const COLOR_RAM_BASE: u16 = 0xb1d0;
pub const COLOR_RAM_END: u16 = 0xb99f;

const CMD_PORT_OFFSET: u16 = 16;
const CHAR_OUT_OFFSET: u16 = 14;
const CHAR_IN_OFFSET: u16 = 15;
const SPRITE_SPRITE_COLLISION_OFFSET: u16 = 11;
const SPRITE_BG_COLLISION_OFFSET: u16 = 12;
const FRAME_COUNTER_OFFSET: u16 = 8;
const ENABLED_COUNT_OFFSET: u16 = 9;
const PARAM_BASE_OFFSET: u16 = 17;

const AUX_HELP_OFFSET: u16 = 0;
const AUX_FONT_SELECT_OFFSET: u16 = 1;
const AUX_RASTER_IRQ_OFFSET: u16 = 2;

pub struct Vgc {
    pub core: CoreRegisters,
    pub aux: AuxRegisters,
    pub screen_ram: Vec<u8>,
    pub color_ram: Vec<u8>,
    pub graphics: GraphicsBitmap,
    pub shapes: ShapeStore,
    pub sprites: SpriteBank,
    pub copper: copper::CopperList,
    pub palette: [palette::Rgb; palette::PALETTE_SIZE],
    pub(crate) draw_color: u8,
}

impl Vgc {
    pub fn new() -> Self {
        let mut vgc = Self {
            core: CoreRegisters::new(),
            aux: AuxRegisters::new(),
            screen_ram: vec![b' '; SCREEN_CELLS],
            color_ram: vec![1u8; SCREEN_CELLS],
            graphics: GraphicsBitmap::new(),
            shapes: ShapeStore::new(),
            sprites: SpriteBank::new(),
            copper: copper::CopperList::new(),
            palette: palette::PALETTE,
            draw_color: 1,
        };
        vgc.core.fg_color = 1;
        vgc
    }

    pub fn reset(&mut self) {
        self.core.reset();
        self.aux.reset();
        self.screen_ram.iter_mut().for_each(|b| *b = b' ');
        self.color_ram.iter_mut().for_each(|c| *c = self.core.fg_color);
        self.graphics.clear();
        self.shapes.clear();
        self.sprites.reset();
        self.copper.clear();
        self.palette = palette::PALETTE;
        self.draw_color = 1;
    }

    /// Resolves a 4-bit color index against this VGC's own (possibly
    /// save/load-overwritten) palette rather than the compile-time default.
    pub fn palette_rgb(&self, index: u8) -> palette::Rgb {
        self.palette[palette::color_index(index) as usize]
    }

    pub fn owns(addr: u16) -> bool {
        (CORE_BASE..=CORE_END).contains(&addr)
            || (AUX_BASE..=AUX_END).contains(&addr)
            || (SPRITE_REG_BASE..=SPRITE_REG_END).contains(&addr)
            || (SCREEN_RAM_BASE..=SCREEN_RAM_END).contains(&addr)
            || (COLOR_RAM_BASE..=COLOR_RAM_END).contains(&addr)
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        if (CORE_BASE..=CORE_END).contains(&addr) {
            return self.read_core(addr - CORE_BASE);
        }
        if (AUX_BASE..=AUX_END).contains(&addr) {
            return self.read_aux(addr - AUX_BASE);
        }
        if (SPRITE_REG_BASE..=SPRITE_REG_END).contains(&addr) {
            return self.read_sprite_reg(addr - SPRITE_REG_BASE);
        }
        if (SCREEN_RAM_BASE..=SCREEN_RAM_END).contains(&addr) {
            return self.screen_ram[(addr - SCREEN_RAM_BASE) as usize];
        }
        if (COLOR_RAM_BASE..=COLOR_RAM_END).contains(&addr) {
            return self.color_ram[(addr - COLOR_RAM_BASE) as usize];
        }
        0
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        if (CORE_BASE..=CORE_END).contains(&addr) {
            self.write_core(addr - CORE_BASE, value);
            return;
        }
        if (AUX_BASE..=AUX_END).contains(&addr) {
            self.write_aux(addr - AUX_BASE, value);
            return;
        }
        if (SPRITE_REG_BASE..=SPRITE_REG_END).contains(&addr) {
            self.write_sprite_reg(addr - SPRITE_REG_BASE, value);
            return;
        }
        if (SCREEN_RAM_BASE..=SCREEN_RAM_END).contains(&addr) {
            self.screen_ram[(addr - SCREEN_RAM_BASE) as usize] = value;
            return;
        }
        if (COLOR_RAM_BASE..=COLOR_RAM_END).contains(&addr) {
            self.color_ram[(addr - COLOR_RAM_BASE) as usize] = value;
        }
    }

    fn read_core(&mut self, off: u16) -> u8 {
        match off {
            0 => self.core.mode,
            1 => self.core.bg_color,
            2 => self.core.fg_color,
            3 => self.core.cursor_x,
            4 => self.core.cursor_y,
            5 => self.core.scroll_x,
            6 => self.core.scroll_y,
            o if o == FRAME_COUNTER_OFFSET => self.core.frame_counter,
            o if o == ENABLED_COUNT_OFFSET => self.sprites.enabled_count(),
            o if o == SPRITE_SPRITE_COLLISION_OFFSET => self.core.sprite_sprite_collision.take(),
            o if o == SPRITE_BG_COLLISION_OFFSET => self.core.sprite_bg_collision.take(),
            13 => self.core.border_color,
            o if o == CHAR_IN_OFFSET => self.core.char_in.take(),
            o if o == CMD_PORT_OFFSET => self.core.command,
            o if o >= PARAM_BASE_OFFSET && (o - PARAM_BASE_OFFSET) < registers::CMD_PARAM_COUNT as u16 => {
                self.core.params[(o - PARAM_BASE_OFFSET) as usize]
            }
            _ => 0,
        }
    }

    fn write_core(&mut self, off: u16, value: u8) {
        match off {
            0 => self.core.mode = value,
            1 => self.core.bg_color = value,
            2 => self.core.fg_color = value,
            3 => self.core.cursor_x = value.min(COLUMNS as u8 - 1),
            4 => self.core.cursor_y = value.min(ROWS as u8 - 1),
            5 => self.core.scroll_x = value,
            6 => self.core.scroll_y = value,
            13 => self.core.border_color = value,
            o if o == CHAR_OUT_OFFSET => self.char_out(value),
            o if o == CMD_PORT_OFFSET => {
                self.core.command = value;
                self.execute_command(value);
            }
            o if o >= PARAM_BASE_OFFSET && (o - PARAM_BASE_OFFSET) < registers::CMD_PARAM_COUNT as u16 => {
                self.core.params[(o - PARAM_BASE_OFFSET) as usize] = value;
            }
            _ => {}
        }
    }

    fn read_aux(&mut self, off: u16) -> u8 {
        match off {
            o if o == AUX_HELP_OFFSET => self.aux.help,
            o if o == AUX_FONT_SELECT_OFFSET => self.aux.font_select,
            o if o == AUX_RASTER_IRQ_OFFSET => self.aux.raster_irq_enable as u8,
            _ => 0,
        }
    }

    fn write_aux(&mut self, off: u16, value: u8) {
        match off {
            o if o == AUX_HELP_OFFSET => self.aux.help = value,
            o if o == AUX_FONT_SELECT_OFFSET => self.aux.font_select = value & 0x07,
            o if o == AUX_RASTER_IRQ_OFFSET => self.aux.raster_irq_enable = value != 0,
            _ => {}
        }
    }

    fn read_sprite_reg(&self, off: u16) -> u8 {
        let sprite = (off / 8) as usize;
        let field = off % 8;
        let r = &self.sprites.regs[sprite.min(crate::sprite::SPRITE_COUNT - 1)];
        match field {
            0 => (r.x & 0xff) as u8,
            1 => (r.x >> 8) as u8,
            2 => (r.y & 0xff) as u8,
            3 => (r.y >> 8) as u8,
            4 => r.shape_index,
            5 => r.flags,
            6 => r.priority,
            _ => 0,
        }
    }

    fn write_sprite_reg(&mut self, off: u16, value: u8) {
        let sprite = (off / 8) as usize;
        if sprite >= crate::sprite::SPRITE_COUNT {
            return;
        }
        let field = off % 8;
        let r = &mut self.sprites.regs[sprite];
        match field {
            0 => r.x = (r.x & 0xff00) | value as u16,
            1 => r.x = (r.x & 0x00ff) | ((value as u16) << 8),
            2 => r.y = (r.y & 0xff00) | value as u16,
            3 => r.y = (r.y & 0x00ff) | ((value as u16) << 8),
            4 => r.shape_index = value,
            5 => r.flags = value,
            6 => r.priority = value.min(2),
            _ => {}
        }
    }

    /// Feed a byte into the character-in port as if the keyboard driver
    /// had typed it.
    pub fn key_in(&mut self, byte: u8) {
        self.core.char_in = crate::util::ReadClear(byte);
    }
}

impl Default for Vgc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_register_write_then_read() {
        let mut vgc = Vgc::new();
        vgc.write(CORE_BASE + 1, 7);
        assert_eq!(vgc.read(CORE_BASE + 1), 7);
    }

    #[test]
    fn sprite_register_write_through_matches_command_engine() {
        let mut vgc = Vgc::new();
        vgc.write(SPRITE_REG_BASE + 5, 0x81); // sprite 0, flags: enabled + flip_x
        assert!(vgc.sprites.regs[0].enabled());
        assert!(vgc.sprites.regs[0].flip_x());
        assert_eq!(vgc.read(SPRITE_REG_BASE + 5), 0x81);
    }

    #[test]
    fn collision_register_reads_then_clears() {
        let mut vgc = Vgc::new();
        vgc.core.sprite_sprite_collision.0 = 0x09;
        assert_eq!(vgc.read(CORE_BASE + SPRITE_SPRITE_COLLISION_OFFSET), 0x09);
        assert_eq!(vgc.read(CORE_BASE + SPRITE_SPRITE_COLLISION_OFFSET), 0);
    }

    #[test]
    fn cursor_register_write_clamps_in_range() {
        let mut vgc = Vgc::new();
        vgc.write(CORE_BASE + 3, 200);
        assert!((vgc.core.cursor_x as usize) < COLUMNS);
    }
}
