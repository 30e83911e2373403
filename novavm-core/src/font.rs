// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Bitmap font subsystem: up to 8 slots of 256 glyphs, 8 rows x 1
//! byte/row, MSB = leftmost pixel. Empty slots fall back to slot 0.

pub const FONT_SLOTS: usize = 8;
pub const GLYPHS_PER_FONT: usize = 256;
pub const ROWS_PER_GLYPH: usize = 8;
pub const FONT_SLOT_BYTES: usize = GLYPHS_PER_FONT * ROWS_PER_GLYPH;

pub struct FontRom {
    slots: [Vec<u8>; FONT_SLOTS],
    active: usize,
}

impl FontRom {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            active: 0,
        }
    }

    /// Load a 2048-byte font image into `slot` (0..8). Data is truncated or
    /// zero-padded to the fixed slot size.
    pub fn load_slot(&mut self, slot: usize, data: &[u8]) {
        if slot >= FONT_SLOTS {
            return;
        }
        let mut buf = vec![0u8; FONT_SLOT_BYTES];
        let n = data.len().min(FONT_SLOT_BYTES);
        buf[..n].copy_from_slice(&data[..n]);
        self.slots[slot] = buf;
    }

    /// Select the active font slot; only the low 3 bits matter.
    pub fn select(&mut self, slot: u8) {
        self.active = (slot & 0x07) as usize;
    }

    pub fn active_slot(&self) -> usize {
        self.active
    }

    /// Row bitmap for `glyph`'s `row` (0..8) in the currently active slot,
    /// falling back to slot 0 if the active slot was never loaded.
    pub fn glyph_row(&self, glyph: u8, row: usize) -> u8 {
        self.glyph_row_in(self.active, glyph, row)
    }

    pub fn glyph_row_in(&self, slot: usize, glyph: u8, row: usize) -> u8 {
        let row = row.min(ROWS_PER_GLYPH - 1);
        let idx = glyph as usize * ROWS_PER_GLYPH + row;
        let data = if self.slots[slot.min(FONT_SLOTS - 1)].is_empty() {
            &self.slots[0]
        } else {
            &self.slots[slot.min(FONT_SLOTS - 1)]
        };
        data.get(idx).copied().unwrap_or(0)
    }
}

impl Default for FontRom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_falls_back_to_slot_zero() {
        let mut font = FontRom::new();
        let mut data = vec![0u8; FONT_SLOT_BYTES];
        data[0] = 0xaa;
        font.load_slot(0, &data);
        font.select(3);
        assert_eq!(font.glyph_row(0, 0), 0xaa);
    }

    #[test]
    fn select_masks_to_three_bits() {
        let mut font = FontRom::new();
        font.select(0xff);
        assert_eq!(font.active_slot(), 0x07);
    }

    #[test]
    fn out_of_range_row_is_clamped() {
        let mut font = FontRom::new();
        let mut data = vec![0u8; FONT_SLOT_BYTES];
        data[ROWS_PER_GLYPH - 1] = 0x55;
        font.load_slot(0, &data);
        assert_eq!(font.glyph_row(0, 99), 0x55);
    }
}
