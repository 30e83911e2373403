// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Concurrency fabric and machine wiring for the novavm retro virtual
//! computer. Owns the compositor thread and the `Bus`; the 6502 CPU core,
//! audio backend and window toolkit are external collaborators plugged in
//! through the `Cpu`, `SampleSink` and `KeyInput` trait boundaries.

#[macro_use]
extern crate log;

pub mod config;
pub mod cpu;
pub mod machine;

pub use config::Config;
pub use cpu::Cpu;
pub use machine::{AudioSource, KeyInput, KeyRelay, Machine, SampleSink};
