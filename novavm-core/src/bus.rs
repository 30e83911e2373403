// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Composite bus: a single `read`/`write` interface that dispatches by
//! address range to the controllers, backed by a flat 64 KiB byte array
//! for RAM and ROM.

use crate::dma::{Dma, SpaceId, SpaceRefs};
use crate::fio::{FileBackend, Fio};
use crate::font::FontRom;
use crate::nic::Nic;
use crate::sid::{Sid, SidVariant};
use crate::timer::Timer;
use crate::util::{new_shared, IrqLine, IRQ_SOURCE_NIC, IRQ_SOURCE_RASTER, IRQ_SOURCE_TIMER};
use crate::vgc::Vgc;

pub const RAM_SIZE: usize = 0x1_0000;
pub const EXTENDED_RAM_SIZE: usize = 0x1_0000;

const VECTOR_TABLE_BASE: u16 = 0x0200;
const JUMP_TABLE_BASE: u16 = 0x0220;
const ROM_BASE: u16 = 0xc000;

const SID_WINDOW_BASE: u16 = 0xd400;
const SID_WINDOW_END: u16 = 0xd41c;

const NIC_BASE: u16 = 0xa100;
const NIC_END: u16 = 0xa13f;
const FIO_BASE: u16 = 0xb9a0;
const FIO_END: u16 = 0xb9ef;
const TIMER_BASE: u16 = 0xba40;
const TIMER_END: u16 = 0xba4f;
const DMA_BASE: u16 = 0xba50;
const DMA_END: u16 = 0xba9f;

const FIO_STATUS_OFF: u16 = 1;
const FIO_ERROR_OFF: u16 = 2;
const FIO_PARAM_BASE_OFF: u16 = 3;
const FIO_FILENAME_BASE_OFF: u16 = 3 + crate::fio::PARAM_COUNT as u16;

const NIC_SLOT_SELECT_OFF: u16 = 0;
const NIC_COMMAND_OFF: u16 = 1;
const NIC_GLOBAL_STATUS_OFF: u16 = 2;
const NIC_IRQ_ENABLE_OFF: u16 = 3;
const NIC_IRQ_PENDING_OFF: u16 = 4;
const NIC_DMA_ADDR_LO_OFF: u16 = 5;
const NIC_DMA_ADDR_HI_OFF: u16 = 6;
const NIC_LENGTH_LO_OFF: u16 = 7;
const NIC_LENGTH_HI_OFF: u16 = 8;
const NIC_REMOTE_PORT_LO_OFF: u16 = 9;
const NIC_REMOTE_PORT_HI_OFF: u16 = 10;
const NIC_LOCAL_PORT_LO_OFF: u16 = 11;
const NIC_LOCAL_PORT_HI_OFF: u16 = 12;
const NIC_NAME_BASE_OFF: u16 = 13;
const NIC_SELECTED_STATUS_OFF: u16 = 45;

const DMA_COMMAND_OFF: u16 = 0;
const DMA_STATUS_OFF: u16 = 1;
const DMA_ERROR_OFF: u16 = 2;
const DMA_COUNT_LO_OFF: u16 = 3;
const DMA_COUNT_HI_OFF: u16 = 4;
const DMA_SRC_SPACE_OFF: u16 = 5;
const DMA_SRC_ADDR_LO_OFF: u16 = 6;
const DMA_SRC_ADDR_HI_OFF: u16 = 7;
const DMA_DST_SPACE_OFF: u16 = 8;
const DMA_DST_ADDR_LO_OFF: u16 = 9;
const DMA_DST_ADDR_HI_OFF: u16 = 10;
const DMA_LENGTH_LO_OFF: u16 = 11;
const DMA_LENGTH_HI_OFF: u16 = 12;
const DMA_SRC_STRIDE_LO_OFF: u16 = 13;
const DMA_SRC_STRIDE_HI_OFF: u16 = 14;
const DMA_DST_STRIDE_LO_OFF: u16 = 15;
const DMA_DST_STRIDE_HI_OFF: u16 = 16;
const DMA_WIDTH_OFF: u16 = 17;
const DMA_HEIGHT_OFF: u16 = 18;
const DMA_FILL_VALUE_OFF: u16 = 19;
const DMA_COLOR_KEY_OFF: u16 = 20;
const DMA_FLAGS_OFF: u16 = 21;
const DMA_MUSIC_STATUS_OFF: u16 = 22;

/// Boot-time setup failures. Distinct from the runtime controller error
/// taxonomy in `error.rs`: nothing past boot can raise this, since register
/// writes are infallible by design.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("ROM image is {0} bytes, which does not fit in the {1}-byte ROM region")]
    RomTooLarge(usize, usize),
}

/// Routes writes to `$A020` to an external help/documentation collaborator
/// in addition to the VGC's own aux register storage.
pub trait HelpBridge {
    fn notify(&mut self, value: u8);
}

pub struct NullHelpBridge;
impl HelpBridge for NullHelpBridge {
    fn notify(&mut self, _value: u8) {}
}

pub struct Bus {
    pub ram: Vec<u8>,
    pub extended_ram: Vec<u8>,
    rom: Vec<u8>,
    pub vgc: Vgc,
    pub sid: Sid,
    pub timer: Timer,
    pub fio: Fio,
    pub dma: Dma,
    pub nic: Nic,
    pub irq: IrqLine,
    pub font: FontRom,
    pub file_backend: Box<dyn FileBackend + Send>,
    pub help_bridge: Box<dyn HelpBridge + Send>,
}

impl Bus {
    /// `rom` boots into $C000-$FFFF; `charset` loads into font slot 0
    /// (empty slots fall back to slot 0). Panics if `rom` is too large for
    /// the ROM region; use `try_new` to handle that instead.
    pub fn new(rom: &[u8], charset: &[u8], file_backend: Box<dyn FileBackend + Send>) -> Self {
        Self::try_new(rom, charset, file_backend).expect("invalid ROM image")
    }

    pub fn try_new(rom: &[u8], charset: &[u8], file_backend: Box<dyn FileBackend + Send>) -> Result<Self, BusError> {
        let rom_capacity = 0x10000 - ROM_BASE as usize;
        if rom.len() > rom_capacity {
            return Err(BusError::RomTooLarge(rom.len(), rom_capacity));
        }
        let music_status = new_shared(0u8);
        let mut fio = Fio::new();
        fio.music.set_status_handle(music_status.clone());
        let mut font = FontRom::new();
        font.load_slot(0, charset);
        let mut bus = Self {
            ram: vec![0u8; RAM_SIZE],
            extended_ram: vec![0u8; EXTENDED_RAM_SIZE],
            rom: rom.to_vec(),
            vgc: Vgc::new(),
            sid: Sid::new(SidVariant::Mos6581, 44_100),
            timer: Timer::new(),
            fio,
            dma: Dma::new(music_status),
            nic: Nic::new(),
            irq: IrqLine::new(),
            font,
            file_backend,
            help_bridge: Box::new(NullHelpBridge),
        };
        bus.boot(rom);
        Ok(bus)
    }

    fn boot(&mut self, rom: &[u8]) {
        let n = rom.len();
        self.ram[ROM_BASE as usize..ROM_BASE as usize + n].copy_from_slice(rom);

        let controller_bases: [u16; 9] = [
            crate::vgc::CORE_BASE,
            crate::vgc::AUX_BASE,
            crate::vgc::SPRITE_REG_BASE,
            NIC_BASE,
            crate::vgc::SCREEN_RAM_BASE,
            crate::vgc::COLOR_RAM_BASE,
            FIO_BASE,
            TIMER_BASE,
            DMA_BASE,
        ];
        for (i, base) in controller_bases.iter().enumerate() {
            let addr = VECTOR_TABLE_BASE as usize + i * 2;
            self.ram[addr] = (base & 0xff) as u8;
            self.ram[addr + 1] = (base >> 8) as u8;
        }
        for (i, base) in controller_bases.iter().enumerate() {
            let addr = JUMP_TABLE_BASE as usize + i * 3;
            self.ram[addr] = 0x4c; // 6502 JMP absolute
            self.ram[addr + 1] = (base & 0xff) as u8;
            self.ram[addr + 2] = (base >> 8) as u8;
        }
        info!(target: "bus", "boot: {} ROM bytes, {} controllers wired", n, controller_bases.len());
    }

    /// Soft-reset: re-copies the boot ROM and re-writes the vector/jump
    /// tables, then resets every controller.
    pub fn reset(&mut self) {
        let rom = std::mem::take(&mut self.rom);
        self.boot(&rom);
        self.rom = rom;
        self.vgc.reset();
        self.sid.reset();
        self.timer.reset();
        self.fio.reset();
        self.irq.reset();
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        if (SID_WINDOW_BASE..=SID_WINDOW_END).contains(&addr) {
            return self.ram[addr as usize];
        }
        if (NIC_BASE..=NIC_END).contains(&addr) {
            return self.read_nic(addr - NIC_BASE);
        }
        if (FIO_BASE..=FIO_END).contains(&addr) {
            return self.read_fio(addr - FIO_BASE);
        }
        if (TIMER_BASE..=TIMER_END).contains(&addr) {
            return self.timer.read(addr - TIMER_BASE);
        }
        if (DMA_BASE..=DMA_END).contains(&addr) {
            return self.read_dma(addr - DMA_BASE);
        }
        if Vgc::owns(addr) {
            return self.vgc.read(addr);
        }
        self.ram[addr as usize]
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        if (SID_WINDOW_BASE..=SID_WINDOW_END).contains(&addr) {
            self.sid.write((addr - SID_WINDOW_BASE) as u8, value);
            return;
        }
        if addr == crate::vgc::AUX_BASE {
            self.help_bridge.notify(value);
        }
        if (NIC_BASE..=NIC_END).contains(&addr) {
            self.write_nic(addr - NIC_BASE, value);
            return;
        }
        if (FIO_BASE..=FIO_END).contains(&addr) {
            self.write_fio(addr - FIO_BASE, value);
            return;
        }
        if (TIMER_BASE..=TIMER_END).contains(&addr) {
            self.timer.write(addr - TIMER_BASE, value);
            return;
        }
        if (DMA_BASE..=DMA_END).contains(&addr) {
            self.write_dma(addr - DMA_BASE, value);
            return;
        }
        if Vgc::owns(addr) {
            self.vgc.write(addr, value);
            return;
        }
        if addr >= ROM_BASE {
            return;
        }
        self.ram[addr as usize] = value;
    }

    fn read_fio(&self, off: u16) -> u8 {
        match off {
            0 => self.fio.command,
            o if o == FIO_STATUS_OFF => self.fio.status,
            o if o == FIO_ERROR_OFF => self.fio.error,
            o if o >= FIO_PARAM_BASE_OFF && o < FIO_FILENAME_BASE_OFF => {
                self.fio.params[(o - FIO_PARAM_BASE_OFF) as usize]
            }
            o if o >= FIO_FILENAME_BASE_OFF && (o - FIO_FILENAME_BASE_OFF) < crate::fio::FILENAME_BUF_LEN as u16 => {
                self.fio.filename_buf[(o - FIO_FILENAME_BASE_OFF) as usize]
            }
            _ => 0,
        }
    }

    fn write_fio(&mut self, off: u16, value: u8) {
        match off {
            0 => {
                self.fio.command = value;
                let mut spaces = SpaceRefs {
                    cpu_ram: &mut self.ram[crate::dma::CPU_RAM_BASE as usize..crate::dma::CPU_RAM_LEN],
                    extended_ram: &mut self.extended_ram,
                    vgc: &mut self.vgc,
                    rom: &self.rom,
                };
                self.fio.execute(value, &mut *self.file_backend, &mut spaces, &mut self.sid);
            }
            o if o >= FIO_PARAM_BASE_OFF && o < FIO_FILENAME_BASE_OFF => {
                self.fio.params[(o - FIO_PARAM_BASE_OFF) as usize] = value;
            }
            o if o >= FIO_FILENAME_BASE_OFF && (o - FIO_FILENAME_BASE_OFF) < crate::fio::FILENAME_BUF_LEN as u16 => {
                self.fio.filename_buf[(o - FIO_FILENAME_BASE_OFF) as usize] = value;
            }
            _ => {}
        }
    }

    fn read_nic(&mut self, off: u16) -> u8 {
        match off {
            o if o == NIC_SLOT_SELECT_OFF => self.nic.slot_select,
            o if o == NIC_GLOBAL_STATUS_OFF => self.nic.global_status(),
            o if o == NIC_IRQ_ENABLE_OFF => self.nic.irq_enable,
            o if o == NIC_IRQ_PENDING_OFF => self.nic.irq_pending.take(),
            o if o == NIC_DMA_ADDR_LO_OFF => (self.nic.dma_addr & 0xff) as u8,
            o if o == NIC_DMA_ADDR_HI_OFF => (self.nic.dma_addr >> 8) as u8,
            o if o == NIC_LENGTH_LO_OFF => (self.nic.length & 0xff) as u8,
            o if o == NIC_LENGTH_HI_OFF => (self.nic.length >> 8) as u8,
            o if o == NIC_SELECTED_STATUS_OFF => self.nic.selected_status(),
            _ => 0,
        }
    }

    fn write_nic(&mut self, off: u16, value: u8) {
        match off {
            o if o == NIC_SLOT_SELECT_OFF => self.nic.slot_select = value & 0b11,
            o if o == NIC_COMMAND_OFF => self.nic.execute(value, &mut self.ram),
            o if o == NIC_IRQ_ENABLE_OFF => self.nic.irq_enable = value & 0x0f,
            o if o == NIC_DMA_ADDR_LO_OFF => self.nic.dma_addr = (self.nic.dma_addr & 0xff00) | value as u16,
            o if o == NIC_DMA_ADDR_HI_OFF => self.nic.dma_addr = (self.nic.dma_addr & 0x00ff) | ((value as u16) << 8),
            o if o == NIC_LENGTH_LO_OFF => self.nic.length = (self.nic.length & 0xff00) | value as u16,
            o if o == NIC_LENGTH_HI_OFF => self.nic.length = (self.nic.length & 0x00ff) | ((value as u16) << 8),
            o if o == NIC_REMOTE_PORT_LO_OFF => self.nic.remote_port = (self.nic.remote_port & 0xff00) | value as u16,
            o if o == NIC_REMOTE_PORT_HI_OFF => {
                self.nic.remote_port = (self.nic.remote_port & 0x00ff) | ((value as u16) << 8)
            }
            o if o == NIC_LOCAL_PORT_LO_OFF => self.nic.local_port = (self.nic.local_port & 0xff00) | value as u16,
            o if o == NIC_LOCAL_PORT_HI_OFF => {
                self.nic.local_port = (self.nic.local_port & 0x00ff) | ((value as u16) << 8)
            }
            o if o >= NIC_NAME_BASE_OFF && (o - NIC_NAME_BASE_OFF) < 32 => {
                self.nic.name_buf[(o - NIC_NAME_BASE_OFF) as usize] = value;
            }
            _ => {}
        }
    }

    fn read_dma(&self, off: u16) -> u8 {
        match off {
            o if o == DMA_COMMAND_OFF => self.dma.command,
            o if o == DMA_STATUS_OFF => self.dma.status,
            o if o == DMA_ERROR_OFF => self.dma.error,
            o if o == DMA_COUNT_LO_OFF => (self.dma.count & 0xff) as u8,
            o if o == DMA_COUNT_HI_OFF => (self.dma.count >> 8) as u8,
            o if o == DMA_MUSIC_STATUS_OFF => *self.dma.music_status.lock().unwrap(),
            _ => 0,
        }
    }

    fn write_dma(&mut self, off: u16, value: u8) {
        match off {
            o if o == DMA_COMMAND_OFF => {
                let mut spaces = SpaceRefs {
                    cpu_ram: &mut self.ram[crate::dma::CPU_RAM_BASE as usize..crate::dma::CPU_RAM_LEN],
                    extended_ram: &mut self.extended_ram,
                    vgc: &mut self.vgc,
                    rom: &self.rom,
                };
                self.dma.execute(value, &mut spaces);
            }
            o if o == DMA_SRC_SPACE_OFF => self.dma.src_space = value,
            o if o == DMA_SRC_ADDR_LO_OFF => self.dma.src_addr = (self.dma.src_addr & 0xff00) | value as u16,
            o if o == DMA_SRC_ADDR_HI_OFF => self.dma.src_addr = (self.dma.src_addr & 0x00ff) | ((value as u16) << 8),
            o if o == DMA_DST_SPACE_OFF => self.dma.dst_space = value,
            o if o == DMA_DST_ADDR_LO_OFF => self.dma.dst_addr = (self.dma.dst_addr & 0xff00) | value as u16,
            o if o == DMA_DST_ADDR_HI_OFF => self.dma.dst_addr = (self.dma.dst_addr & 0x00ff) | ((value as u16) << 8),
            o if o == DMA_LENGTH_LO_OFF => self.dma.length = (self.dma.length & 0xff00) | value as u16,
            o if o == DMA_LENGTH_HI_OFF => self.dma.length = (self.dma.length & 0x00ff) | ((value as u16) << 8),
            o if o == DMA_SRC_STRIDE_LO_OFF => self.dma.src_stride = (self.dma.src_stride & 0xff00) | value as u16,
            o if o == DMA_SRC_STRIDE_HI_OFF => {
                self.dma.src_stride = (self.dma.src_stride & 0x00ff) | ((value as u16) << 8)
            }
            o if o == DMA_DST_STRIDE_LO_OFF => self.dma.dst_stride = (self.dma.dst_stride & 0xff00) | value as u16,
            o if o == DMA_DST_STRIDE_HI_OFF => {
                self.dma.dst_stride = (self.dma.dst_stride & 0x00ff) | ((value as u16) << 8)
            }
            o if o == DMA_WIDTH_OFF => self.dma.width = value,
            o if o == DMA_HEIGHT_OFF => self.dma.height = value,
            o if o == DMA_FILL_VALUE_OFF => self.dma.fill_value = value,
            o if o == DMA_COLOR_KEY_OFF => self.dma.color_key = value,
            o if o == DMA_FLAGS_OFF => self.dma.flags = value,
            _ => {}
        }
    }

    /// Called from the CPU loop at ~1-in-100 cycles.
    pub fn tick_timer(&mut self) {
        if self.timer.tick() {
            self.irq.set(IRQ_SOURCE_TIMER, true);
        }
    }

    pub fn on_raster_irq(&mut self) {
        self.irq.set(IRQ_SOURCE_RASTER, true);
    }

    pub fn sync_nic_irq(&mut self) {
        self.irq.set(IRQ_SOURCE_NIC, self.nic.irq_pending.peek() != 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBackend;
    impl FileBackend for NullBackend {
        fn save(&mut self, _name: &str, _data: &[u8]) -> Result<(), crate::error::FioError> {
            Ok(())
        }
        fn load(&mut self, _name: &str) -> Result<Vec<u8>, crate::error::FioError> {
            Err(crate::error::FioError::NotFound)
        }
    }

    fn make_bus(rom: Vec<u8>) -> Bus {
        Bus::new(&rom, &[], Box::new(NullBackend))
    }

    #[test]
    fn rom_write_is_dropped_except_sid_window() {
        let mut bus = make_bus(vec![0xeau8; 0x4000]);
        let original = bus.read(0xc100);
        bus.write(0xc100, 0x00);
        assert_eq!(bus.read(0xc100), original);
    }

    #[test]
    fn sid_window_write_routes_to_sid_reads_return_rom() {
        let mut bus = make_bus(vec![0x11u8; 0x4000]);
        let rom_byte = bus.read(0xd400);
        bus.write(0xd400, 0x42);
        assert_eq!(bus.sid.read(0x00), 0x42);
        assert_eq!(bus.read(0xd400), rom_byte);
    }

    #[test]
    fn fallback_write_stores_into_ram() {
        let mut bus = make_bus(vec![0u8; 0x10]);
        bus.write(0x1000, 77);
        assert_eq!(bus.read(0x1000), 77);
    }

    #[test]
    fn boot_writes_vector_and_jump_tables() {
        let bus = make_bus(vec![0u8; 0x10]);
        assert_eq!(bus.ram[JUMP_TABLE_BASE as usize], 0x4c);
    }

    #[test]
    fn oversized_rom_is_rejected() {
        let rom = vec![0u8; 0x4001]; // one byte past the $C000-$FFFF region
        let err = Bus::try_new(&rom, &[], Box::new(NullBackend)).unwrap_err();
        assert_eq!(err, BusError::RomTooLarge(0x4001, 0x4000));
    }

    #[test]
    fn reset_recopies_rom_and_rewrites_tables() {
        let mut bus = make_bus(vec![0xeau8; 0x4000]);
        bus.vgc.core.fg_color = 9;
        bus.ram[JUMP_TABLE_BASE as usize] = 0;
        bus.reset();
        assert_eq!(bus.ram[JUMP_TABLE_BASE as usize], 0x4c);
        assert_eq!(bus.read(0xc100), 0xea);
        assert_eq!(bus.vgc.core.fg_color, 1);
    }

    #[test]
    fn vgc_register_write_reaches_vgc() {
        let mut bus = make_bus(vec![0u8; 0x10]);
        bus.write(crate::vgc::CORE_BASE + 2, 6);
        assert_eq!(bus.vgc.core.fg_color, 6);
    }

    #[test]
    fn dma_copy_through_bus_registers() {
        let mut bus = make_bus(vec![0u8; 0x10]);
        bus.ram[0x0300] = 0xab;
        bus.write(DMA_BASE + DMA_SRC_SPACE_OFF, 0); // CpuRam
        bus.write(DMA_BASE + DMA_SRC_ADDR_LO_OFF, 0x00);
        bus.write(DMA_BASE + DMA_SRC_ADDR_HI_OFF, 0x03);
        bus.write(DMA_BASE + DMA_DST_SPACE_OFF, 1); // CharRam
        bus.write(DMA_BASE + DMA_DST_ADDR_LO_OFF, 0);
        bus.write(DMA_BASE + DMA_DST_ADDR_HI_OFF, 0);
        bus.write(DMA_BASE + DMA_LENGTH_LO_OFF, 1);
        bus.write(DMA_BASE + DMA_LENGTH_HI_OFF, 0);
        bus.write(DMA_BASE + DMA_COMMAND_OFF, 1);
        assert_eq!(bus.read(DMA_BASE + DMA_STATUS_OFF), 1);
        assert_eq!(bus.vgc.screen_ram[0], 0xab);
    }
}
