// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Network controller: 4 TCP slots addressed through a slot-select
//! register, with length-prefixed framing and DMA-based send/receive
//! against CPU RAM.

pub mod slot;

use crate::util::ReadClear;
use slot::{NicSlot, SlotState};

pub const SLOT_COUNT: usize = 4;
const NAME_BUF_LEN: usize = 32;

const CMD_CONNECT: u8 = 1;
const CMD_DISCONNECT: u8 = 2;
const CMD_SEND: u8 = 3;
const CMD_RECEIVE: u8 = 4;
const CMD_LISTEN: u8 = 5;
const CMD_ACCEPT: u8 = 6;

const STATUS_CONNECTED: u8 = 1 << 0;
const STATUS_DATA_READY: u8 = 1 << 1;
const STATUS_SEND_READY: u8 = 1 << 2;
const STATUS_ERROR: u8 = 1 << 3;
const STATUS_REMOTE_CLOSED: u8 = 1 << 4;

pub struct Nic {
    pub slot_select: u8,
    pub irq_enable: u8,
    pub irq_pending: ReadClear,
    pub dma_addr: u16,
    pub length: u16,
    pub remote_port: u16,
    pub local_port: u16,
    pub name_buf: [u8; NAME_BUF_LEN],
    slots: [NicSlot; SLOT_COUNT],
}

impl Nic {
    pub fn new() -> Self {
        Self {
            slot_select: 0,
            irq_enable: 0,
            irq_pending: ReadClear::default(),
            dma_addr: 0,
            length: 0,
            remote_port: 0,
            local_port: 0,
            name_buf: [0u8; NAME_BUF_LEN],
            slots: [NicSlot::new(), NicSlot::new(), NicSlot::new(), NicSlot::new()],
        }
    }

    fn selected(&self) -> usize {
        (self.slot_select & 0b11) as usize
    }

    fn hostname(&self) -> String {
        let len = (self.name_buf[0] as usize).min(NAME_BUF_LEN - 1);
        String::from_utf8_lossy(&self.name_buf[1..1 + len]).into_owned()
    }

    /// Execute `opcode` against the currently selected slot. `ram` is the
    /// CPU-addressable byte array used for send/receive DMA.
    pub fn execute(&mut self, opcode: u8, ram: &mut [u8]) {
        let idx = self.selected();
        let slot = &mut self.slots[idx];
        slot.sync_state();
        match opcode {
            CMD_CONNECT => slot.connect(&self.hostname(), self.remote_port),
            CMD_DISCONNECT => slot.disconnect(),
            CMD_LISTEN => slot.listen(self.local_port),
            CMD_ACCEPT => slot.accept(),
            CMD_SEND => {
                let len = if self.length == 0 { 256 } else { self.length as usize };
                let start = self.dma_addr as usize;
                if let Some(payload) = ram.get(start..start + len.min(ram.len().saturating_sub(start))) {
                    let _ = slot.send(payload);
                }
            }
            CMD_RECEIVE => {
                if let Some(msg) = slot.receive() {
                    let start = self.dma_addr as usize;
                    let n = msg.len().min(ram.len().saturating_sub(start));
                    ram[start..start + n].copy_from_slice(&msg[..n]);
                    self.length = msg.len() as u16;
                } else {
                    self.length = 0;
                }
            }
            _ => {}
        }
        if slot.queue_overflowed() {
            slot.error = Some(crate::error::NicError::QueueOverflow);
            slot.state = SlotState::Error;
        }
        if self.irq_enable & (1 << idx) != 0 && slot.data_ready() {
            self.irq_pending.set_bit(idx);
        }
    }

    pub fn slot_status(&mut self, idx: usize) -> u8 {
        let slot = match self.slots.get_mut(idx) {
            Some(s) => s,
            None => return 0,
        };
        slot.sync_state();
        let mut status = 0u8;
        if slot.state == SlotState::Connected {
            status |= STATUS_CONNECTED | STATUS_SEND_READY;
        }
        if slot.data_ready() {
            status |= STATUS_DATA_READY;
        }
        if slot.state == SlotState::Error {
            status |= STATUS_ERROR;
        }
        if slot.state == SlotState::RemoteClosed {
            status |= STATUS_REMOTE_CLOSED;
        }
        status
    }

    pub fn selected_status(&mut self) -> u8 {
        self.slot_status(self.selected())
    }

    /// Reading this register does not clear it; repeated reads return the
    /// same bits until the underlying condition changes.
    pub fn global_status(&mut self) -> u8 {
        let mut any_data = false;
        let mut any_error = false;
        for i in 0..SLOT_COUNT {
            let s = self.slot_status(i);
            any_data |= s & STATUS_DATA_READY != 0;
            any_error |= s & STATUS_ERROR != 0;
        }
        (any_data as u8) | ((any_error as u8) << 1)
    }
}

impl Default for Nic {
    fn default() -> Self {
        Self::new()
    }
}
