// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use bit_field::BitField;

/// IRQ sources sharing the single 6502 IRQ line.
pub const IRQ_SOURCE_TIMER: usize = 0;
pub const IRQ_SOURCE_RASTER: usize = 1;
pub const IRQ_SOURCE_NIC: usize = 2;

/// A shared interrupt line: several sources set/clear their own bit,
/// the CPU loop observes whether any bit is set.
#[derive(Default)]
pub struct IrqLine {
    signal: u8,
}

impl IrqLine {
    pub fn new() -> Self {
        Self { signal: 0 }
    }

    pub fn is_asserted(&self) -> bool {
        self.signal != 0
    }

    pub fn set(&mut self, source: usize, value: bool) {
        self.signal.set_bit(source, value);
    }

    pub fn reset(&mut self) {
        self.signal = 0;
    }
}
