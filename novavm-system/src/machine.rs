// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Concurrency fabric. `Machine` owns the bus and the compositor thread;
//! it hands out small relay objects (`AudioSource`, `KeyRelay`) that let
//! externally-owned threads (the audio backend's pull callback, the
//! window toolkit's key-event handler) reach into the hardware plane
//! without holding a reference to `Machine` itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use novavm_core::bus::Bus;
use novavm_core::vgc::compositor::{Compositor, FrameSink};

use crate::cpu::Cpu;

/// CPU cycles between timer ticks.
const CYCLES_PER_TIMER_TICK: u32 = 100;
const FRAME_INTERVAL: Duration = Duration::from_micros(1_000_000 / 60);

pub struct Machine {
    bus: Arc<Mutex<Bus>>,
    cycle_accum: u32,
    compositor_stop: Arc<AtomicBool>,
    compositor_thread: Option<JoinHandle<()>>,
}

impl Machine {
    pub fn new(bus: Bus) -> Self {
        info!(target: "machine", "Initializing machine");
        Self {
            bus: Arc::new(Mutex::new(bus)),
            cycle_accum: 0,
            compositor_stop: Arc::new(AtomicBool::new(false)),
            compositor_thread: None,
        }
    }

    pub fn bus_handle(&self) -> Arc<Mutex<Bus>> {
        self.bus.clone()
    }

    /// Starts the 60 Hz compositor thread. `sink` receives each completed
    /// frame; it must be `Send` since it now lives on the compositor
    /// thread.
    pub fn spawn_compositor(&mut self, mut sink: Box<dyn FrameSink + Send>) {
        let bus = self.bus.clone();
        let stop = self.compositor_stop.clone();
        self.compositor_thread = Some(thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                let started = std::time::Instant::now();
                {
                    let mut bus = bus.lock().unwrap();
                    let result = Compositor::render_frame(&mut bus.vgc, &bus.font, &mut *sink);
                    if result.raster_irq {
                        bus.on_raster_irq();
                    }
                }
                let elapsed = started.elapsed();
                if elapsed < FRAME_INTERVAL {
                    thread::sleep(FRAME_INTERVAL - elapsed);
                }
            }
        }));
    }

    /// Drives one `Cpu::step`, accounting cycles into the cooperative
    /// timer tick and refreshing the NIC IRQ bit. The caller is expected
    /// to call this in its own unbounded loop (the CPU thread).
    pub fn step_cpu(&mut self, cpu: &mut dyn Cpu) {
        let mut bus = self.bus.lock().unwrap();
        if bus.irq.is_asserted() {
            cpu.irq(&mut bus);
        }
        let cycles = cpu.step(&mut bus);
        self.cycle_accum += cycles as u32;
        while self.cycle_accum >= CYCLES_PER_TIMER_TICK {
            self.cycle_accum -= CYCLES_PER_TIMER_TICK;
            bus.tick_timer();
        }
        bus.sync_nic_irq();
    }

    pub fn reset(&mut self, cpu: &mut dyn Cpu) {
        let mut bus = self.bus.lock().unwrap();
        bus.reset();
        self.cycle_accum = 0;
        cpu.reset(&mut bus);
    }

    pub fn audio_source(&self) -> AudioSource {
        AudioSource { bus: self.bus.clone() }
    }

    pub fn key_relay(&self) -> KeyRelay {
        KeyRelay { bus: self.bus.clone() }
    }

    /// Stops the compositor thread and joins it: process shutdown cancels
    /// all reader tasks and joins the CPU thread; the compositor gets the
    /// same treatment here.
    pub fn shutdown(&mut self) {
        self.compositor_stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.compositor_thread.take() {
            let _ = handle.join();
        }
        info!(target: "machine", "Shut down");
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Host collaborator boundary for the pull-mode audio callback. Owned by
/// the audio backend's own thread.
pub trait SampleSink {
    fn pull(&mut self, out: &mut [i16]);
}

pub struct AudioSource {
    bus: Arc<Mutex<Bus>>,
}

impl SampleSink for AudioSource {
    fn pull(&mut self, out: &mut [i16]) {
        let mut bus = self.bus.lock().unwrap();
        bus.sid.generate(out);
    }
}

/// Host collaborator boundary for keyboard input from the window
/// toolkit.
pub trait KeyInput {
    fn key_down(&mut self, byte: u8);
}

pub struct KeyRelay {
    bus: Arc<Mutex<Bus>>,
}

impl KeyInput for KeyRelay {
    fn key_down(&mut self, byte: u8) {
        self.bus.lock().unwrap().vgc.key_in(byte);
    }
}
