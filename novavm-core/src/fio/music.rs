// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! MML-driven music sequencer. Parses a tiny event stream from the
//! filename buffer's reused payload and drives SID registers at 60 Hz,
//! reserving the highest voice index for SFX.

use crate::sid::Sid;
use crate::util::Shared;

const SFX_VOICE: usize = crate::sid::VOICE_COUNT - 1;
const MUSIC_VOICES: usize = crate::sid::VOICE_COUNT - 1;
const MUSIC_STATUS_PLAYING: u8 = 1 << 0;

#[derive(Clone, Copy)]
pub enum MmlEvent {
    NoteOn { voice: u8, freq: u16, duration_ticks: u16 },
    Rest { duration_ticks: u16 },
    Tempo(u8),
    Arpeggio { voice: u8, notes: [u16; 3] },
    Loop,
}

pub struct Sequencer {
    events: Vec<MmlEvent>,
    cursor: usize,
    playing: bool,
    looping: bool,
    tempo: u8,
    volume: u8,
    priority: u8,
    ticks_until_next: u16,
    instruments: [[u8; 3]; 8], // per-instrument (attack_decay, sustain_release, control waveform bits)
    status: Option<Shared<u8>>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            cursor: 0,
            playing: false,
            looping: false,
            tempo: 120,
            volume: 0x0f,
            priority: 0,
            ticks_until_next: 0,
            instruments: [[0u8; 3]; 8],
            status: None,
        }
    }

    /// Shares the DMA controller's music-status byte: DMA, blitter and
    /// music status occupy one register range.
    pub fn set_status_handle(&mut self, status: Shared<u8>) {
        self.status = Some(status);
    }

    fn publish_status(&self) {
        if let Some(status) = &self.status {
            *status.lock().unwrap() = if self.playing { MUSIC_STATUS_PLAYING } else { 0 };
        }
    }

    pub fn define_instrument(&mut self, slot: u8, bytes: &[u8]) {
        if let Some(inst) = self.instruments.get_mut(slot as usize % 8) {
            for (i, b) in bytes.iter().take(3).enumerate() {
                inst[i] = *b;
            }
        }
    }

    pub fn set_volume(&mut self, v: u8) {
        self.volume = v & 0x0f;
    }

    pub fn set_tempo(&mut self, t: u8) {
        self.tempo = t.max(1);
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn set_priority(&mut self, priority: u8) {
        self.priority = priority.min(MUSIC_VOICES as u8 - 1);
    }

    pub fn play(&mut self) {
        self.playing = true;
        self.publish_status();
    }

    pub fn stop(&mut self, sid: &mut Sid) {
        self.playing = false;
        self.cursor = 0;
        for voice in 0..MUSIC_VOICES {
            gate_off(sid, voice);
        }
        self.publish_status();
    }

    pub fn play_sfx(&mut self, sid: &mut Sid, instrument: u8) {
        let inst = self.instruments[instrument as usize % 8];
        apply_instrument(sid, SFX_VOICE, inst);
        gate_on(sid, SFX_VOICE, 440);
    }

    pub fn sid_direct_play(&mut self, sid: &mut Sid, params: &[u8]) {
        let voice = params.first().copied().unwrap_or(0) as usize % crate::sid::VOICE_COUNT;
        let freq = params.get(1).copied().unwrap_or(0) as u16 | ((params.get(2).copied().unwrap_or(0) as u16) << 8);
        gate_on(sid, voice, freq);
    }

    pub fn sid_direct_stop(&mut self, sid: &mut Sid) {
        for voice in 0..crate::sid::VOICE_COUNT {
            gate_off(sid, voice);
        }
    }

    /// Parse a tiny textual MML dialect: `nFFFFDDDD` note, `r DDDD` rest,
    /// `tBBB` tempo, `l` loop marker. Space-separated tokens.
    pub fn load_mml(&mut self, payload: &[u8]) {
        self.events.clear();
        self.cursor = 0;
        let text = String::from_utf8_lossy(payload);
        for token in text.split_whitespace() {
            let mut chars = token.chars();
            match chars.next() {
                Some('n') => {
                    let rest: String = chars.collect();
                    if let Some((freq_str, dur_str)) = rest.split_once(':') {
                        if let (Ok(freq), Ok(dur)) = (freq_str.parse(), dur_str.parse()) {
                            self.events.push(MmlEvent::NoteOn {
                                voice: 0,
                                freq,
                                duration_ticks: dur,
                            });
                        }
                    }
                }
                Some('r') => {
                    let rest: String = chars.collect();
                    if let Ok(dur) = rest.parse() {
                        self.events.push(MmlEvent::Rest { duration_ticks: dur });
                    }
                }
                Some('t') => {
                    let rest: String = chars.collect();
                    if let Ok(bpm) = rest.parse() {
                        self.events.push(MmlEvent::Tempo(bpm));
                    }
                }
                Some('l') => self.events.push(MmlEvent::Loop),
                _ => {}
            }
        }
    }

    /// Advance the sequencer by one 60 Hz tick.
    pub fn tick(&mut self, sid: &mut Sid) {
        if !self.playing || self.events.is_empty() {
            return;
        }
        if self.ticks_until_next > 0 {
            self.ticks_until_next -= 1;
            return;
        }
        if self.cursor >= self.events.len() {
            if self.looping {
                self.cursor = 0;
            } else {
                self.playing = false;
                self.publish_status();
                return;
            }
        }
        match self.events[self.cursor] {
            MmlEvent::NoteOn { freq, duration_ticks, .. } => {
                // Single-channel MML tokens target the configured priority
                // voice; a richer event stream could name a voice per note.
                let voice = self.priority as usize % MUSIC_VOICES;
                gate_on(sid, voice, freq);
                self.ticks_until_next = duration_ticks;
            }
            MmlEvent::Rest { duration_ticks } => {
                self.ticks_until_next = duration_ticks;
            }
            MmlEvent::Tempo(bpm) => self.tempo = bpm.max(1),
            MmlEvent::Arpeggio { voice, notes } => {
                let voice = (voice as usize).min(MUSIC_VOICES - 1);
                gate_on(sid, voice, notes[0]);
            }
            MmlEvent::Loop => {
                if self.looping {
                    self.cursor = 0;
                    return;
                }
            }
        }
        self.cursor += 1;
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

fn sid_voice_base(voice: usize) -> u8 {
    (voice as u8) * 7
}

fn gate_on(sid: &mut Sid, voice: usize, freq: u16) {
    let base = sid_voice_base(voice);
    sid.write(base, (freq & 0xff) as u8);
    sid.write(base + 1, (freq >> 8) as u8);
    sid.write(base + 4, 0x21); // sawtooth + gate
}

fn gate_off(sid: &mut Sid, voice: usize) {
    let base = sid_voice_base(voice);
    sid.write(base + 4, 0x20); // gate cleared, waveform retained
}

fn apply_instrument(sid: &mut Sid, voice: usize, inst: [u8; 3]) {
    let base = sid_voice_base(voice);
    sid.write(base + 5, inst[0]); // attack/decay
    sid.write(base + 6, inst[1]); // sustain/release
}
