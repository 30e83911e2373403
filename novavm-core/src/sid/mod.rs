// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! SID-class 3-voice audio chip. The core owns the whole signal path
//! directly rather than delegating to an external synthesis crate:
//! oscillators, envelopes, filter and the sample-pull loop.

mod filter;
mod voice;

use filter::Filter;
use voice::Voice;

pub const VOICE_COUNT: usize = 3;
pub const CLOCK_HZ: u32 = 985_248;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SidVariant {
    Mos6581,
    Mos8580,
}

pub struct Sid {
    variant: SidVariant,
    voices: [Voice; VOICE_COUNT],
    filter: Filter,
    master_volume: u8,
    cycles_per_sample: u32,
    cycle_accum: u32,
    last_write: [u8; 29],
}

impl Sid {
    pub fn new(variant: SidVariant, sample_rate: u32) -> Self {
        info!(target: "sid", "Initializing SID ({:?})", variant);
        Self {
            variant,
            voices: [Voice::new(), Voice::new(), Voice::new()],
            filter: Filter::new(),
            master_volume: 0x0f,
            cycles_per_sample: CLOCK_HZ / sample_rate.max(1),
            cycle_accum: 0,
            last_write: [0u8; 29],
        }
    }

    pub fn reset(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.reset();
        }
        self.filter = Filter::new();
        self.master_volume = 0x0f;
        self.cycle_accum = 0;
        self.last_write = [0u8; 29];
    }

    pub fn read(&self, reg: u8) -> u8 {
        match reg {
            0x1b | 0x1c => 0, // oscillator 3 / envelope 3 outputs, not modeled
            0x19 | 0x1a => 0, // paddle ports, not modeled
            r => *self.last_write.get(r as usize).unwrap_or(&0),
        }
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        trace!(target: "sid::reg", "write 0x{:02x} = 0x{:02x}", reg, value);
        if let Some(slot) = self.last_write.get_mut(reg as usize) {
            *slot = value;
        }
        match reg {
            0x00..=0x06 => self.voices[0].write(reg, value),
            0x07..=0x0d => self.voices[1].write(reg - 7, value),
            0x0e..=0x14 => self.voices[2].write(reg - 14, value),
            0x15 => self.filter.set_cutoff_lo(value),
            0x16 => self.filter.set_cutoff_hi(value),
            0x17 => self.filter.set_resonance_routing(value),
            0x18 => {
                self.filter.set_mode(value);
                self.master_volume = value & 0x0f;
            }
            _ => {}
        }
    }

    /// Generate `out.len()` PCM samples (pull-mode).
    pub fn generate(&mut self, out: &mut [i16]) {
        for sample in out.iter_mut() {
            self.cycle_accum += self.cycles_per_sample;
            while self.cycle_accum >= CLOCK_HZ / 44_100 {
                self.cycle_accum -= CLOCK_HZ / 44_100;
                for voice in self.voices.iter_mut() {
                    voice.clock();
                }
            }
            let mut mix: i32 = 0;
            for (i, voice) in self.voices.iter().enumerate() {
                let routed = self.filter.routes(i);
                let sample = voice.output();
                mix += if routed { self.filter.apply(sample) } else { sample as i32 };
            }
            let scaled = (mix / VOICE_COUNT as i32) * self.master_volume as i32 / 15;
            *sample = scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        }
    }

    pub fn variant(&self) -> SidVariant {
        self.variant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_register_reads_zero() {
        let sid = Sid::new(SidVariant::Mos6581, 44_100);
        assert_eq!(sid.read(0x00), 0);
    }

    #[test]
    fn readonly_ports_always_read_zero() {
        let mut sid = Sid::new(SidVariant::Mos6581, 44_100);
        sid.write(0x1b, 0xff);
        assert_eq!(sid.read(0x1b), 0);
    }

    #[test]
    fn write_then_read_mirrors_last_value() {
        let mut sid = Sid::new(SidVariant::Mos6581, 44_100);
        sid.write(0x18, 0x0f);
        assert_eq!(sid.read(0x18), 0x0f);
    }

    #[test]
    fn generate_does_not_panic_with_silent_voices() {
        let mut sid = Sid::new(SidVariant::Mos6581, 44_100);
        let mut buf = [0i16; 64];
        sid.generate(&mut buf);
        assert!(buf.iter().all(|&s| s == 0));
    }

    #[test]
    fn gated_voice_produces_non_silent_output() {
        let mut sid = Sid::new(SidVariant::Mos6581, 44_100);
        sid.write(0x00, 0x00); // freq lo
        sid.write(0x01, 0x10); // freq hi
        sid.write(0x05, 0x09); // attack/decay
        sid.write(0x06, 0xf0); // sustain/release
        sid.write(0x04, 0x21); // control: sawtooth + gate
        let mut buf = [0i16; 4096];
        sid.generate(&mut buf);
        assert!(buf.iter().any(|&s| s != 0));
    }
}
