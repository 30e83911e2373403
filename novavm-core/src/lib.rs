// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Hardware plane for the novavm retro virtual computer: the composite bus
//! and the controllers it dispatches to (VGC, SID, timer, FIO, DMA/blitter,
//! NIC). Owns no threads of its own; `novavm-system` drives the CPU loop,
//! compositor and audio callback around a `Bus`.

#[macro_use]
extern crate log;

pub mod bus;
pub mod dma;
pub mod error;
pub mod fio;
pub mod font;
pub mod graphics;
pub mod nic;
pub mod palette;
pub mod sid;
pub mod sprite;
pub mod timer;
pub mod util;
pub mod vgc;

pub use bus::Bus;
