// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! VGC core + auxiliary register banks.

use crate::util::ReadClear;

pub const MODE_TEXT: u8 = 0;
pub const MODE_GRAPHICS: u8 = 1;
pub const MODE_MIXED: u8 = 2;

pub const CMD_PARAM_COUNT: usize = 14;

/// $A000-$A01E core register bank. Offsets below are relative to $A000.
pub struct CoreRegisters {
    pub mode: u8,
    pub bg_color: u8,
    pub fg_color: u8,
    pub cursor_x: u8,
    pub cursor_y: u8,
    pub scroll_x: u8,
    pub scroll_y: u8,
    pub frame_counter: u8,
    pub sprite_sprite_collision: ReadClear,
    pub sprite_bg_collision: ReadClear,
    pub border_color: u8,
    pub char_in: ReadClear,
    pub command: u8,
    pub params: [u8; CMD_PARAM_COUNT],
}

impl CoreRegisters {
    pub fn new() -> Self {
        Self {
            mode: MODE_TEXT,
            bg_color: 0,
            fg_color: 1,
            cursor_x: 0,
            cursor_y: 0,
            scroll_x: 0,
            scroll_y: 0,
            frame_counter: 0,
            sprite_sprite_collision: ReadClear::default(),
            sprite_bg_collision: ReadClear::default(),
            border_color: 0,
            char_in: ReadClear::default(),
            command: 0,
            params: [0u8; CMD_PARAM_COUNT],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read a 16-bit little-endian parameter pair starting at `idx`.
    pub fn param_u16(&self, idx: usize) -> u16 {
        let lo = *self.params.get(idx).unwrap_or(&0) as u16;
        let hi = *self.params.get(idx + 1).unwrap_or(&0) as u16;
        lo | (hi << 8)
    }
}

impl Default for CoreRegisters {
    fn default() -> Self {
        Self::new()
    }
}

/// $A020-$A03F auxiliary registers.
pub struct AuxRegisters {
    pub help: u8,
    pub font_select: u8,
    pub raster_irq_enable: bool,
}

impl AuxRegisters {
    pub fn new() -> Self {
        Self {
            help: 0,
            font_select: 0,
            raster_irq_enable: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for AuxRegisters {
    fn default() -> Self {
        Self::new()
    }
}
