// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! VGC character output port: a single write-only register that behaves
//! like a teletype, scrolling and wrapping the text screen.

use crate::vgc::{Vgc, COLUMNS, ROWS};

const BACKSPACE: u8 = 0x08;
const LINE_FEED: u8 = 0x0a;
const CARRIAGE_RETURN: u8 = 0x0d;
const FORM_FEED: u8 = 0x0c;
const HOME: u8 = 0x01;

impl Vgc {
    pub fn char_out(&mut self, byte: u8) {
        match byte {
            BACKSPACE => {
                if self.core.cursor_x > 0 {
                    self.core.cursor_x -= 1;
                }
            }
            LINE_FEED => self.advance_row(),
            CARRIAGE_RETURN => {
                self.advance_row();
                self.core.cursor_x = 0;
            }
            FORM_FEED => self.form_feed(),
            HOME => {
                self.core.cursor_x = 0;
                self.core.cursor_y = 0;
            }
            b if b >= 0x20 => {
                let cell = self.cell_index(self.core.cursor_x, self.core.cursor_y);
                self.screen_ram[cell] = b;
                self.color_ram[cell] = self.core.fg_color;
                self.advance_cursor();
            }
            _ => {}
        }
    }

    fn cell_index(&self, x: u8, y: u8) -> usize {
        y as usize * COLUMNS + x as usize
    }

    fn advance_cursor(&mut self) {
        self.core.cursor_x += 1;
        if self.core.cursor_x as usize >= COLUMNS {
            self.core.cursor_x = 0;
            self.advance_row();
        }
    }

    fn advance_row(&mut self) {
        self.core.cursor_y += 1;
        if self.core.cursor_y as usize >= ROWS {
            self.core.cursor_y = (ROWS - 1) as u8;
            self.scroll();
        }
    }

    fn scroll(&mut self) {
        self.screen_ram.copy_within(COLUMNS.., 0);
        self.color_ram.copy_within(COLUMNS.., 0);
        let last_row_start = (ROWS - 1) * COLUMNS;
        for i in last_row_start..last_row_start + COLUMNS {
            self.screen_ram[i] = b' ';
            self.color_ram[i] = self.core.bg_color;
        }
    }

    fn form_feed(&mut self) {
        for b in self.screen_ram.iter_mut() {
            *b = b' ';
        }
        for c in self.color_ram.iter_mut() {
            *c = self.core.fg_color;
        }
        self.core.cursor_x = 0;
        self.core.cursor_y = 0;
    }
}

#[cfg(test)]
mod tests {
    use crate::vgc::{Vgc, COLUMNS};

    #[test]
    fn hi_then_cr_then_o() {
        let mut vgc = Vgc::new();
        for b in b"HI" {
            vgc.char_out(*b);
        }
        vgc.char_out(0x0d);
        vgc.char_out(b'O');
        assert_eq!(&vgc.screen_ram[0..2], b"HI");
        for i in 2..COLUMNS {
            assert_eq!(vgc.screen_ram[i], b' ');
        }
        assert_eq!(vgc.screen_ram[COLUMNS], b'O');
        assert_eq!((vgc.core.cursor_x, vgc.core.cursor_y), (1, 1));
    }

    #[test]
    fn printable_byte_mirrors_foreground_into_color_ram() {
        let mut vgc = Vgc::new();
        vgc.core.fg_color = 7;
        vgc.char_out(b'X');
        assert_eq!(vgc.color_ram[0], 7);
    }

    #[test]
    fn form_feed_resets_regardless_of_prior_state() {
        let mut vgc = Vgc::new();
        vgc.char_out(b'X');
        vgc.core.cursor_x = 40;
        vgc.core.cursor_y = 12;
        vgc.char_out(0x0c);
        assert!(vgc.screen_ram.iter().all(|&b| b == b' '));
        assert_eq!((vgc.core.cursor_x, vgc.core.cursor_y), (0, 0));
    }

    #[test]
    fn backspace_clamps_to_column_zero() {
        let mut vgc = Vgc::new();
        vgc.char_out(0x08);
        assert_eq!(vgc.core.cursor_x, 0);
    }

    #[test]
    fn right_edge_wrap_scrolls_on_overflow() {
        let mut vgc = Vgc::new();
        vgc.core.cursor_y = (crate::vgc::ROWS - 1) as u8;
        vgc.core.cursor_x = (COLUMNS - 1) as u8;
        vgc.char_out(b'Z');
        assert_eq!(vgc.core.cursor_y as usize, crate::vgc::ROWS - 1);
        assert_eq!(vgc.core.cursor_x, 0);
    }
}
