// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Copper list: an ordered sequence of timed register writes applied while
//! compositing. Sprite-register targets fire at scanline granularity and
//! only affect scanlines after the one they were scheduled on; everything
//! else fires at pixel granularity and affects output from that X onward,
//! for the rest of that scanline. Scheduled through the command engine's
//! `CMD_COPPER_SCHEDULE` opcode.

use crate::vgc::compositor::SCANLINES;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopperTarget {
    Mode,
    BgColor,
    ScrollX,
    ScrollY,
    SpriteReg { sprite: u8, offset: u8 },
}

impl CopperTarget {
    pub fn is_sprite(&self) -> bool {
        matches!(self, CopperTarget::SpriteReg { .. })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CopperEvent {
    pub y: u16,
    pub x: u16,
    pub target: CopperTarget,
    pub value: u8,
}

/// Program-order list of events, as BASIC/the command engine appends them.
#[derive(Default)]
pub struct CopperList {
    events: Vec<CopperEvent>,
}

impl CopperList {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn push(&mut self, event: CopperEvent) {
        self.events.push(event);
    }

    /// Bucket events per scanline for O(events-on-this-scanline) iteration,
    /// stable-sorting each bucket by X so pixel-granularity application can
    /// walk forward with a single pointer. Sequence number is carried so
    /// ties at the same X still apply in original list order.
    pub fn compile(&self) -> CompiledCopper {
        let mut buckets: Vec<Vec<(usize, CopperEvent)>> = (0..SCANLINES).map(|_| Vec::new()).collect();
        for (seq, ev) in self.events.iter().enumerate() {
            let y = (ev.y as usize).min(SCANLINES - 1);
            buckets[y].push((seq, *ev));
        }
        for bucket in buckets.iter_mut() {
            bucket.sort_by_key(|(seq, ev)| (ev.x, *seq));
        }
        CompiledCopper {
            buckets: buckets
                .into_iter()
                .map(|b| b.into_iter().map(|(_, ev)| ev).collect())
                .collect(),
        }
    }
}

pub struct CompiledCopper {
    buckets: Vec<Vec<CopperEvent>>,
}

impl CompiledCopper {
    /// Sprite-register events scheduled on the scanline immediately before
    /// `y` (empty for y == 0, since there is no prior scanline this frame).
    pub fn sprite_events_before(&self, y: usize) -> impl Iterator<Item = &CopperEvent> {
        let slice: &[CopperEvent] = if y == 0 { &[] } else { &self.buckets[y - 1] };
        slice.iter().filter(|e| e.target.is_sprite())
    }

    /// Non-sprite, pixel-granularity events scheduled on scanline `y`, in
    /// ascending-X (then list) order.
    pub fn pixel_events_on(&self, y: usize) -> impl Iterator<Item = &CopperEvent> {
        self.buckets[y.min(SCANLINES - 1)]
            .iter()
            .filter(|e| !e.target.is_sprite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_events_only_affect_later_scanlines() {
        let mut list = CopperList::new();
        list.push(CopperEvent {
            y: 5,
            x: 0,
            target: CopperTarget::SpriteReg { sprite: 0, offset: 0 },
            value: 42,
        });
        let compiled = list.compile();
        assert_eq!(compiled.sprite_events_before(5).count(), 0);
        assert_eq!(compiled.sprite_events_before(6).count(), 1);
    }

    #[test]
    fn pixel_events_sorted_by_x() {
        let mut list = CopperList::new();
        list.push(CopperEvent { y: 1, x: 100, target: CopperTarget::BgColor, value: 1 });
        list.push(CopperEvent { y: 1, x: 10, target: CopperTarget::BgColor, value: 2 });
        let compiled = list.compile();
        let xs: Vec<u16> = compiled.pixel_events_on(1).map(|e| e.x).collect();
        assert_eq!(xs, vec![10, 100]);
    }
}
