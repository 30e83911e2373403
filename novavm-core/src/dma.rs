// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! DMA and blitter. Implements the unified space-addressing model shared
//! with the file I/O controller: `SpaceId` names a region, `SpaceRefs`
//! borrows the bus's RAM array and VGC-owned stores for the duration of
//! one transfer.

use crate::error::DmaError;
use crate::util::Shared;
use crate::vgc::Vgc;

/// The "CPU RAM" DMA space is the bus's plain byte-array region below the
/// first memory-mapped controller ($0000-$9FFF): zero page, stack, vector
/// table and program/data RAM.
pub const CPU_RAM_BASE: u16 = 0x0000;
pub const CPU_RAM_LEN: usize = 0xa000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpaceId {
    CpuRam,
    CharRam,
    ColorRam,
    GraphicsBitmap,
    SpriteShapes,
    ExtendedRam,
    Rom,
}

impl SpaceId {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SpaceId::CpuRam),
            1 => Some(SpaceId::CharRam),
            2 => Some(SpaceId::ColorRam),
            3 => Some(SpaceId::GraphicsBitmap),
            4 => Some(SpaceId::SpriteShapes),
            5 => Some(SpaceId::ExtendedRam),
            6 => Some(SpaceId::Rom),
            _ => None,
        }
    }

    fn read_only(self) -> bool {
        matches!(self, SpaceId::Rom)
    }
}

/// Borrowed view over every DMA-addressable region for the duration of one
/// command.
pub struct SpaceRefs<'a> {
    pub cpu_ram: &'a mut [u8],
    pub extended_ram: &'a mut [u8],
    pub vgc: &'a mut Vgc,
    pub rom: &'a [u8],
}

impl<'a> SpaceRefs<'a> {
    fn len(&self, space: SpaceId) -> usize {
        match space {
            SpaceId::CpuRam => self.cpu_ram.len(),
            SpaceId::CharRam => self.vgc.screen_ram.len(),
            SpaceId::ColorRam => self.vgc.color_ram.len(),
            SpaceId::GraphicsBitmap => self.vgc.graphics.as_bytes().len(),
            SpaceId::SpriteShapes => self.vgc.shapes.total_bytes(),
            SpaceId::ExtendedRam => self.extended_ram.len(),
            SpaceId::Rom => self.rom.len(),
        }
    }

    fn read(&self, space: SpaceId, addr: usize) -> u8 {
        match space {
            SpaceId::CpuRam => *self.cpu_ram.get(addr).unwrap_or(&0),
            SpaceId::CharRam => *self.vgc.screen_ram.get(addr).unwrap_or(&0),
            SpaceId::ColorRam => *self.vgc.color_ram.get(addr).unwrap_or(&0),
            SpaceId::GraphicsBitmap => self.vgc.graphics.byte_at(addr),
            SpaceId::SpriteShapes => self.vgc.shapes.byte_at(addr),
            SpaceId::ExtendedRam => *self.extended_ram.get(addr).unwrap_or(&0),
            SpaceId::Rom => *self.rom.get(addr).unwrap_or(&0),
        }
    }

    fn write(&mut self, space: SpaceId, addr: usize, value: u8) {
        match space {
            SpaceId::CpuRam => {
                if let Some(b) = self.cpu_ram.get_mut(addr) {
                    *b = value;
                }
            }
            SpaceId::CharRam => {
                if let Some(b) = self.vgc.screen_ram.get_mut(addr) {
                    *b = value;
                }
            }
            SpaceId::ColorRam => {
                if let Some(b) = self.vgc.color_ram.get_mut(addr) {
                    *b = value;
                }
            }
            SpaceId::GraphicsBitmap => self.vgc.graphics.set_byte_at(addr, value),
            SpaceId::SpriteShapes => self.vgc.shapes.set_byte_at(addr, value),
            SpaceId::ExtendedRam => {
                if let Some(b) = self.extended_ram.get_mut(addr) {
                    *b = value;
                }
            }
            SpaceId::Rom => {}
        }
    }
}

const CMD_COPY: u8 = 0x01;
const CMD_FILL: u8 = 0x02;
const CMD_BLIT: u8 = 0x03;

const FLAG_COLOR_KEY: u8 = 1 << 0;

pub struct Dma {
    pub command: u8,
    pub status: u8,
    pub error: u8,
    pub count: u16,
    pub src_space: u8,
    pub src_addr: u16,
    pub dst_space: u8,
    pub dst_addr: u16,
    pub length: u16,
    pub src_stride: u16,
    pub dst_stride: u16,
    pub width: u8,
    pub height: u8,
    pub fill_value: u8,
    pub color_key: u8,
    pub flags: u8,
    pub music_status: Shared<u8>,
}

const STATUS_IDLE: u8 = 0;
const STATUS_OK: u8 = 1;
const STATUS_ERROR: u8 = 2;

impl Dma {
    pub fn new(music_status: Shared<u8>) -> Self {
        Self {
            command: 0,
            status: STATUS_IDLE,
            error: 0,
            count: 0,
            src_space: 0,
            src_addr: 0,
            dst_space: 0,
            dst_addr: 0,
            length: 0,
            src_stride: 0,
            dst_stride: 0,
            width: 0,
            height: 0,
            fill_value: 0,
            color_key: 0,
            flags: 0,
            music_status,
        }
    }

    /// Execute `opcode` against the currently latched parameters.
    pub fn execute(&mut self, opcode: u8, spaces: &mut SpaceRefs) {
        self.command = opcode;
        let result = match opcode {
            CMD_COPY => self.do_copy(spaces),
            CMD_FILL => self.do_fill(spaces),
            CMD_BLIT => self.do_blit(spaces),
            _ => Err(DmaError::BadCommand),
        };
        match result {
            Ok(count) => {
                self.count = count;
                self.status = STATUS_OK;
                self.error = 0;
            }
            Err(e) => {
                self.status = STATUS_ERROR;
                self.error = e.code();
            }
        }
    }

    fn spaces(&self) -> Result<(SpaceId, SpaceId), DmaError> {
        let src = SpaceId::from_code(self.src_space).ok_or(DmaError::BadSpace)?;
        let dst = SpaceId::from_code(self.dst_space).ok_or(DmaError::BadSpace)?;
        Ok((src, dst))
    }

    fn do_copy(&self, spaces: &mut SpaceRefs) -> Result<u16, DmaError> {
        let (src, dst) = self.spaces()?;
        if dst.read_only() {
            return Err(DmaError::WriteProt);
        }
        let len = self.length as usize;
        if self.src_addr as usize + len > spaces.len(src) || self.dst_addr as usize + len > spaces.len(dst) {
            return Err(DmaError::Range);
        }
        for i in 0..len {
            let byte = spaces.read(src, self.src_addr as usize + i);
            spaces.write(dst, self.dst_addr as usize + i, byte);
        }
        Ok(len as u16)
    }

    fn do_fill(&self, spaces: &mut SpaceRefs) -> Result<u16, DmaError> {
        let dst = SpaceId::from_code(self.dst_space).ok_or(DmaError::BadSpace)?;
        if dst.read_only() {
            return Err(DmaError::WriteProt);
        }
        let len = self.length as usize;
        if self.dst_addr as usize + len > spaces.len(dst) {
            return Err(DmaError::Range);
        }
        for i in 0..len {
            spaces.write(dst, self.dst_addr as usize + i, self.fill_value);
        }
        Ok(len as u16)
    }

    fn do_blit(&self, spaces: &mut SpaceRefs) -> Result<u16, DmaError> {
        let (src, dst) = self.spaces()?;
        if dst.read_only() {
            return Err(DmaError::WriteProt);
        }
        if self.width == 0 || self.height == 0 {
            return Err(DmaError::BadArgs);
        }
        let (w, h) = (self.width as usize, self.height as usize);
        let src_stride = if self.src_stride == 0 { w as u16 } else { self.src_stride } as usize;
        let dst_stride = if self.dst_stride == 0 { w as u16 } else { self.dst_stride } as usize;
        let src_end = self.src_addr as usize + (h.saturating_sub(1)) * src_stride + w;
        let dst_end = self.dst_addr as usize + (h.saturating_sub(1)) * dst_stride + w;
        if src_end > spaces.len(src) || dst_end > spaces.len(dst) {
            return Err(DmaError::Range);
        }
        let color_key_on = self.flags & FLAG_COLOR_KEY != 0;
        let mut copied = 0u16;
        for row in 0..h {
            for col in 0..w {
                let s = self.src_addr as usize + row * src_stride + col;
                let d = self.dst_addr as usize + row * dst_stride + col;
                let byte = spaces.read(src, s);
                if color_key_on && byte == self.color_key {
                    continue;
                }
                spaces.write(dst, d, byte);
                copied += 1;
            }
        }
        Ok(copied)
    }
}
