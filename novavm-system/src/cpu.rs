// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! The 6502 CPU boundary: an external collaborator, not implemented in
//! this crate. `Machine::step_cpu` drives one `Cpu::step` call per
//! iteration of the caller's fetch-decode-execute loop, the same
//! trait boundary a chipset crate draws between itself and its CPU core.

use novavm_core::bus::Bus;

pub trait Cpu {
    /// Execute one instruction against `bus`, returning the number of CPU
    /// cycles it consumed.
    fn step(&mut self, bus: &mut Bus) -> u8;

    /// Called when the shared IRQ line is asserted and the CPU's interrupt
    /// disable flag is clear; implementations push PC/status and jump
    /// through the IRQ vector.
    fn irq(&mut self, bus: &mut Bus);

    fn reset(&mut self, bus: &mut Bus);
}
