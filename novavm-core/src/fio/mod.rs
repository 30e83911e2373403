// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! File I/O controller: command byte, ten parameter registers, a 64-byte
//! filename buffer, and the music sequencer. Host file access is a
//! collaborator (`FileBackend`), injected at construction rather than
//! reached through a back-pointer.

pub mod music;

use crate::dma::{SpaceId, SpaceRefs};
use crate::error::FioError;
use crate::palette::{Rgb, PALETTE_SIZE};
use crate::sid::Sid;

const SPACE_PALETTE: u8 = 4;

pub const PARAM_COUNT: usize = 10;
pub const FILENAME_BUF_LEN: usize = 64;

pub trait FileBackend {
    fn save(&mut self, name: &str, data: &[u8]) -> Result<(), FioError>;
    fn load(&mut self, name: &str) -> Result<Vec<u8>, FioError>;
}

const CMD_SAVE_PROGRAM: u8 = 0x01;
const CMD_LOAD_PROGRAM: u8 = 0x02;
const CMD_SAVE_SPACE: u8 = 0x03;
const CMD_LOAD_SPACE: u8 = 0x04;
const CMD_INSTRUMENT_DEFINE: u8 = 0x10;
const CMD_SFX_PLAY: u8 = 0x11;
const CMD_VOLUME_SET: u8 = 0x12;
const CMD_MUSIC_SEQUENCE_SET: u8 = 0x13;
const CMD_MUSIC_PLAY: u8 = 0x14;
const CMD_MUSIC_STOP: u8 = 0x15;
const CMD_MUSIC_TEMPO: u8 = 0x16;
const CMD_MUSIC_LOOP: u8 = 0x17;
const CMD_MUSIC_PRIORITY: u8 = 0x18;
const CMD_SID_PLAY: u8 = 0x19;
const CMD_SID_STOP: u8 = 0x1a;

const STATUS_IDLE: u8 = 0;
const STATUS_OK: u8 = 1;
const STATUS_ERROR: u8 = 2;

pub struct Fio {
    pub command: u8,
    pub status: u8,
    pub error: u8,
    pub params: [u8; PARAM_COUNT],
    pub filename_buf: [u8; FILENAME_BUF_LEN],
    pub music: music::Sequencer,
}

impl Fio {
    pub fn new() -> Self {
        Self {
            command: 0,
            status: STATUS_IDLE,
            error: 0,
            params: [0u8; PARAM_COUNT],
            filename_buf: [0u8; FILENAME_BUF_LEN],
            music: music::Sequencer::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn filename(&self) -> String {
        let len = (self.filename_buf[0] as usize).min(FILENAME_BUF_LEN - 1);
        String::from_utf8_lossy(&self.filename_buf[1..1 + len]).into_owned()
    }

    fn program_range() -> (SpaceId, usize, usize) {
        (SpaceId::CpuRam, 0, crate::dma::CPU_RAM_LEN)
    }

    /// Maps a save/load space code to its `SpaceId` and byte length. Code 4
    /// (color palette) isn't one of `SpaceId`'s DMA-addressable regions —
    /// it's handled separately by `save_palette`/`load_palette`.
    fn space_for_params(&self) -> Option<(SpaceId, usize)> {
        let code = self.params[0];
        let len = match code {
            0 => crate::vgc::SCREEN_CELLS,
            1 => crate::vgc::SCREEN_CELLS,
            2 => crate::graphics::GFX_WIDTH * crate::graphics::GFX_HEIGHT,
            3 => 0, // sprite shapes: length computed by caller
            _ => return None,
        };
        let space = match code {
            0 => SpaceId::CharRam,
            1 => SpaceId::ColorRam,
            2 => SpaceId::GraphicsBitmap,
            3 => SpaceId::SpriteShapes,
            _ => return None,
        };
        Some((space, len))
    }

    pub fn execute(&mut self, opcode: u8, backend: &mut dyn FileBackend, spaces: &mut SpaceRefs, sid: &mut Sid) {
        self.command = opcode;
        let result = match opcode {
            CMD_SAVE_PROGRAM => self.save_space(backend, spaces, Self::program_range().0, Self::program_range().2),
            CMD_LOAD_PROGRAM => self.load_space(backend, spaces, Self::program_range().0, Self::program_range().2),
            CMD_SAVE_SPACE => {
                if self.params[0] == SPACE_PALETTE {
                    self.save_palette(backend, spaces.vgc)
                } else if let Some((space, len)) = self.space_for_params() {
                    let len = if len == 0 { spaces.vgc.shapes.total_bytes() } else { len };
                    self.save_space(backend, spaces, space, len)
                } else {
                    Err(FioError::NotFound)
                }
            }
            CMD_LOAD_SPACE => {
                if self.params[0] == SPACE_PALETTE {
                    self.load_palette(backend, spaces.vgc)
                } else if let Some((space, len)) = self.space_for_params() {
                    let len = if len == 0 { spaces.vgc.shapes.total_bytes() } else { len };
                    self.load_space(backend, spaces, space, len)
                } else {
                    Err(FioError::NotFound)
                }
            }
            CMD_INSTRUMENT_DEFINE => {
                self.music.define_instrument(self.params[0], &self.params[1..]);
                Ok(())
            }
            CMD_SFX_PLAY => {
                self.music.play_sfx(sid, self.params[0]);
                Ok(())
            }
            CMD_VOLUME_SET => {
                self.music.set_volume(self.params[0]);
                Ok(())
            }
            CMD_MUSIC_SEQUENCE_SET => {
                let len = self.filename_buf[0] as usize;
                let mml = &self.filename_buf[1..1 + len.min(FILENAME_BUF_LEN - 1)];
                self.music.load_mml(mml);
                Ok(())
            }
            CMD_MUSIC_PLAY => {
                self.music.play();
                Ok(())
            }
            CMD_MUSIC_STOP => {
                self.music.stop(sid);
                Ok(())
            }
            CMD_MUSIC_TEMPO => {
                self.music.set_tempo(self.params[0]);
                Ok(())
            }
            CMD_MUSIC_LOOP => {
                self.music.set_loop(self.params[0] != 0);
                Ok(())
            }
            CMD_MUSIC_PRIORITY => {
                self.music.set_priority(self.params[0]);
                Ok(())
            }
            CMD_SID_PLAY => {
                self.music.sid_direct_play(sid, &self.params);
                Ok(())
            }
            CMD_SID_STOP => {
                self.music.sid_direct_stop(sid);
                Ok(())
            }
            _ => Err(FioError::NotFound),
        };
        match result {
            Ok(()) => {
                self.status = STATUS_OK;
                self.error = 0;
            }
            Err(e) => {
                self.status = STATUS_ERROR;
                self.error = e.code();
            }
        }
    }

    fn save_space(
        &self,
        backend: &mut dyn FileBackend,
        spaces: &SpaceRefs,
        space: SpaceId,
        len: usize,
    ) -> Result<(), FioError> {
        let mut data = Vec::with_capacity(len);
        for i in 0..len {
            data.push(read_space(spaces, space, i));
        }
        backend.save(&self.filename(), &data)
    }

    fn load_space(
        &self,
        backend: &mut dyn FileBackend,
        spaces: &mut SpaceRefs,
        space: SpaceId,
        len: usize,
    ) -> Result<(), FioError> {
        let data = backend.load(&self.filename())?;
        for i in 0..len.min(data.len()) {
            write_space(spaces, space, i, data[i]);
        }
        Ok(())
    }

    fn save_palette(&self, backend: &mut dyn FileBackend, vgc: &crate::vgc::Vgc) -> Result<(), FioError> {
        let mut data = Vec::with_capacity(PALETTE_SIZE * 3);
        for Rgb(r, g, b) in vgc.palette.iter() {
            data.push(*r);
            data.push(*g);
            data.push(*b);
        }
        backend.save(&self.filename(), &data)
    }

    fn load_palette(&self, backend: &mut dyn FileBackend, vgc: &mut crate::vgc::Vgc) -> Result<(), FioError> {
        let data = backend.load(&self.filename())?;
        for (i, entry) in vgc.palette.iter_mut().enumerate() {
            let base = i * 3;
            if base + 2 < data.len() {
                *entry = Rgb(data[base], data[base + 1], data[base + 2]);
            }
        }
        Ok(())
    }
}

impl Default for Fio {
    fn default() -> Self {
        Self::new()
    }
}

// SpaceRefs' read/write are private to dma.rs; FIO reaches the same
// storage directly since it holds an identical borrow shape.
fn read_space(spaces: &SpaceRefs, space: SpaceId, addr: usize) -> u8 {
    match space {
        SpaceId::CpuRam => *spaces.cpu_ram.get(addr).unwrap_or(&0),
        SpaceId::CharRam => *spaces.vgc.screen_ram.get(addr).unwrap_or(&0),
        SpaceId::ColorRam => *spaces.vgc.color_ram.get(addr).unwrap_or(&0),
        SpaceId::GraphicsBitmap => spaces.vgc.graphics.byte_at(addr),
        SpaceId::SpriteShapes => spaces.vgc.shapes.byte_at(addr),
        SpaceId::ExtendedRam => *spaces.extended_ram.get(addr).unwrap_or(&0),
        SpaceId::Rom => *spaces.rom.get(addr).unwrap_or(&0),
    }
}

fn write_space(spaces: &mut SpaceRefs, space: SpaceId, addr: usize, value: u8) {
    match space {
        SpaceId::CpuRam => {
            if let Some(b) = spaces.cpu_ram.get_mut(addr) {
                *b = value;
            }
        }
        SpaceId::CharRam => {
            if let Some(b) = spaces.vgc.screen_ram.get_mut(addr) {
                *b = value;
            }
        }
        SpaceId::ColorRam => {
            if let Some(b) = spaces.vgc.color_ram.get_mut(addr) {
                *b = value;
            }
        }
        SpaceId::GraphicsBitmap => spaces.vgc.graphics.set_byte_at(addr, value),
        SpaceId::SpriteShapes => spaces.vgc.shapes.set_byte_at(addr, value),
        SpaceId::ExtendedRam => {
            if let Some(b) = spaces.extended_ram.get_mut(addr) {
                *b = value;
            }
        }
        SpaceId::Rom => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sid::SidVariant;
    use crate::vgc::Vgc;
    use std::collections::HashMap;

    struct MemBackend(HashMap<String, Vec<u8>>);

    impl FileBackend for MemBackend {
        fn save(&mut self, name: &str, data: &[u8]) -> Result<(), FioError> {
            self.0.insert(name.to_string(), data.to_vec());
            Ok(())
        }
        fn load(&mut self, name: &str) -> Result<Vec<u8>, FioError> {
            self.0.get(name).cloned().ok_or(FioError::NotFound)
        }
    }

    fn set_filename(fio: &mut Fio, name: &str) {
        fio.filename_buf[0] = name.len() as u8;
        fio.filename_buf[1..1 + name.len()].copy_from_slice(name.as_bytes());
    }

    #[test]
    fn save_then_load_char_ram_round_trips() {
        let mut fio = Fio::new();
        let mut backend = MemBackend(HashMap::new());
        let mut ram = vec![0u8; crate::dma::CPU_RAM_LEN];
        let mut ext = vec![0u8; 16];
        let mut vgc = Vgc::new();
        vgc.screen_ram[0] = b'Q';
        let mut sid = Sid::new(SidVariant::Mos6581, 44_100);

        set_filename(&mut fio, "screen.bin");
        fio.params[0] = 0; // char ram
        {
            let mut spaces = SpaceRefs {
                cpu_ram: &mut ram,
                extended_ram: &mut ext,
                vgc: &mut vgc,
                rom: &[],
            };
            fio.execute(CMD_SAVE_SPACE, &mut backend, &mut spaces, &mut sid);
        }
        assert_eq!(fio.status, STATUS_OK);

        vgc.screen_ram[0] = b' ';
        {
            let mut spaces = SpaceRefs {
                cpu_ram: &mut ram,
                extended_ram: &mut ext,
                vgc: &mut vgc,
                rom: &[],
            };
            fio.execute(CMD_LOAD_SPACE, &mut backend, &mut spaces, &mut sid);
        }
        assert_eq!(fio.status, STATUS_OK);
        assert_eq!(vgc.screen_ram[0], b'Q');
    }

    #[test]
    fn load_of_missing_file_sets_not_found() {
        let mut fio = Fio::new();
        let mut backend = MemBackend(HashMap::new());
        let mut ram = vec![0u8; crate::dma::CPU_RAM_LEN];
        let mut ext = vec![0u8; 16];
        let mut vgc = Vgc::new();
        let mut sid = Sid::new(SidVariant::Mos6581, 44_100);
        set_filename(&mut fio, "missing.bin");
        let mut spaces = SpaceRefs {
            cpu_ram: &mut ram,
            extended_ram: &mut ext,
            vgc: &mut vgc,
            rom: &[],
        };
        fio.execute(CMD_LOAD_PROGRAM, &mut backend, &mut spaces, &mut sid);
        assert_eq!(fio.status, STATUS_ERROR);
        assert_eq!(fio.error, FioError::NotFound.code());
    }

    #[test]
    fn save_then_load_palette_round_trips() {
        let mut fio = Fio::new();
        let mut backend = MemBackend(HashMap::new());
        let mut ram = vec![0u8; crate::dma::CPU_RAM_LEN];
        let mut ext = vec![0u8; 16];
        let mut vgc = Vgc::new();
        vgc.palette[2] = crate::palette::Rgb(0x11, 0x22, 0x33);
        let mut sid = Sid::new(SidVariant::Mos6581, 44_100);

        set_filename(&mut fio, "palette.bin");
        fio.params[0] = 4; // palette
        {
            let mut spaces = SpaceRefs {
                cpu_ram: &mut ram,
                extended_ram: &mut ext,
                vgc: &mut vgc,
                rom: &[],
            };
            fio.execute(CMD_SAVE_SPACE, &mut backend, &mut spaces, &mut sid);
        }
        assert_eq!(fio.status, STATUS_OK);

        vgc.palette[2] = crate::palette::Rgb(0, 0, 0);
        {
            let mut spaces = SpaceRefs {
                cpu_ram: &mut ram,
                extended_ram: &mut ext,
                vgc: &mut vgc,
                rom: &[],
            };
            fio.execute(CMD_LOAD_SPACE, &mut backend, &mut spaces, &mut sid);
        }
        assert_eq!(fio.status, STATUS_OK);
        assert_eq!(vgc.palette[2], crate::palette::Rgb(0x11, 0x22, 0x33));
    }
}
