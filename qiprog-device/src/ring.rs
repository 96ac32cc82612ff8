// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The four-slot bulk-IN transfer ring (spec §3 "Transfer task", §4.8).
//!
//! Bulk IN packets are produced ahead of the USB stack asking for them:
//! on every tick, a ready slot is offered to the stack, and (independently)
//! a free slot is refilled from the chip driver if the address cursor
//! still has range left. This keeps at most [`DEVICE_RING_DEPTH`] packets
//! buffered ahead of the host and guarantees cursor-ordered delivery,
//! since slots are both filled and drained in ring order.

use qiprog_proto::constants::DEVICE_RING_DEPTH;
use qiprog_proto::{AddressWindow, QiProgError};

use crate::cursor::{has_remaining, remaining_len};
use crate::driver::Driver;

/// Largest packet this ring will ever buffer. Real endpoint max-packet
/// sizes discovered from the device descriptor must not exceed this.
pub const MAX_PACKET_CAP: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SlotStatus {
    Idle,
    ReadySend,
}

#[derive(Copy, Clone)]
struct TransferTask {
    buf: [u8; MAX_PACKET_CAP],
    len: usize,
    status: SlotStatus,
}

impl TransferTask {
    const fn idle() -> Self {
        TransferTask {
            buf: [0; MAX_PACKET_CAP],
            len: 0,
            status: SlotStatus::Idle,
        }
    }
}

/// The ring itself: a fixed array of [`DEVICE_RING_DEPTH`] tasks, a head
/// pointer (the next slot due to be sent), and a count of currently
/// filled slots.
pub struct TransferRing {
    slots: [TransferTask; DEVICE_RING_DEPTH],
    head: usize,
    filled: usize,
}

impl TransferRing {
    pub const fn new() -> Self {
        TransferRing {
            slots: [TransferTask::idle(); DEVICE_RING_DEPTH],
            head: 0,
            filled: 0,
        }
    }

    /// Runs one iteration of the device-side event loop (spec §4.8):
    ///
    /// 1. If the head slot is ready, offer it to the USB stack via
    ///    `try_send`; if fully accepted, idle the slot and advance the
    ///    ring.
    /// 2. If a slot is free and the window has range left, fill it from
    ///    the driver and mark it ready.
    ///
    /// `max_tx_packet` is the endpoint's real max-packet size (spec §6:
    /// "must read the descriptor ... must not assume 64"), capped at
    /// [`MAX_PACKET_CAP`].
    pub fn tick<D: Driver>(
        &mut self,
        window: &mut AddressWindow,
        driver: &mut D,
        max_tx_packet: usize,
        mut try_send: impl FnMut(&[u8]) -> bool,
    ) -> Result<(), QiProgError> {
        if self.filled > 0 {
            let slot = &self.slots[self.head];
            if slot.status == SlotStatus::ReadySend && try_send(&slot.buf[..slot.len]) {
                self.slots[self.head].status = SlotStatus::Idle;
                self.head = (self.head + 1) % DEVICE_RING_DEPTH;
                self.filled -= 1;
            }
        }

        if self.filled < DEVICE_RING_DEPTH && has_remaining(window) {
            let slot_idx = (self.head + self.filled) % DEVICE_RING_DEPTH;
            let want = max_tx_packet.min(remaining_len(window)).min(MAX_PACKET_CAP);
            let addr = window.pread() as u32;
            let n = driver.chip_read(addr, &mut self.slots[slot_idx].buf[..want])?;
            self.slots[slot_idx].len = n;
            self.slots[slot_idx].status = SlotStatus::ReadySend;
            self.filled += 1;
            window.advance_pread(n as u64);
        }

        Ok(())
    }

    /// Number of packets currently buffered ahead of the host.
    pub fn depth(&self) -> usize {
        self.filled
    }

    /// Discards any buffered packets. Called when `SET_ADDRESS`
    /// invalidates in-flight state (spec §4.6 "obsolete-buffer discard").
    pub fn reset(&mut self) {
        self.slots = [TransferTask::idle(); DEVICE_RING_DEPTH];
        self.head = 0;
        self.filled = 0;
    }
}

impl Default for TransferRing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qiprog_proto::capabilities::{BusKind, Capabilities};
    use qiprog_proto::chip_id::heapless_ids::ChipIdList;
    use qiprog_proto::wire::{CommandSequence, EraseSizeList};
    use qiprog_proto::Result;

    struct CountingChip {
        next: u8,
    }

    impl Driver for CountingChip {
        fn capabilities(&self) -> Capabilities {
            unimplemented!()
        }
        fn set_bus(&mut self, _: BusKind) -> Result<()> {
            unimplemented!()
        }
        fn set_clock(&mut self, _: u32) -> Result<u32> {
            unimplemented!()
        }
        fn read_chip_id(&mut self) -> ChipIdList {
            unimplemented!()
        }
        fn set_address(&mut self, _: u32, _: u32) -> Result<()> {
            Ok(())
        }
        fn set_erase_size(&mut self, _: u16, _: EraseSizeList) -> Result<()> {
            unimplemented!()
        }
        fn set_erase_command(&mut self, _: u16, _: CommandSequence) -> Result<()> {
            unimplemented!()
        }
        fn set_write_command(&mut self, _: u16, _: CommandSequence) -> Result<()> {
            unimplemented!()
        }
        fn set_chip_size(&mut self, _: u16, _: u32) -> Result<()> {
            unimplemented!()
        }
        fn set_spi_timing(&mut self, _: u16, _: u16) -> Result<()> {
            unimplemented!()
        }
        fn set_vdd(&mut self, _: u16, _: u16) -> Result<()> {
            unimplemented!()
        }
        fn read8(&mut self, _: u32) -> Result<u8> {
            unimplemented!()
        }
        fn read16(&mut self, _: u32) -> Result<u16> {
            unimplemented!()
        }
        fn read32(&mut self, _: u32) -> Result<u32> {
            unimplemented!()
        }
        fn write8(&mut self, _: u32, _: u8) -> Result<()> {
            unimplemented!()
        }
        fn write16(&mut self, _: u32, _: u16) -> Result<()> {
            unimplemented!()
        }
        fn write32(&mut self, _: u32, _: u32) -> Result<()> {
            unimplemented!()
        }
        fn chip_read(&mut self, _addr: u32, buf: &mut [u8]) -> Result<usize> {
            for b in buf.iter_mut() {
                *b = self.next;
                self.next = self.next.wrapping_add(1);
            }
            Ok(buf.len())
        }
        fn chip_write(&mut self, _: u32, _: &[u8]) -> Result<()> {
            unimplemented!()
        }
    }

    #[test]
    fn fills_up_to_four_slots_ahead() {
        let mut ring = TransferRing::new();
        let mut window = AddressWindow::unset();
        window.set(0, 1023).unwrap();
        let mut chip = CountingChip { next: 0 };

        // Never accept a send, so slots stay buffered.
        for _ in 0..8 {
            ring.tick(&mut window, &mut chip, 64, |_| false).unwrap();
        }
        assert_eq!(ring.depth(), 4);
    }

    #[test]
    fn drains_in_order_once_accepted() {
        let mut ring = TransferRing::new();
        let mut window = AddressWindow::unset();
        window.set(0, 1023).unwrap();
        let mut chip = CountingChip { next: 0 };

        let mut delivered: [u8; 1024] = [0; 1024];
        let mut pos = 0usize;
        for _ in 0..40 {
            if pos >= delivered.len() {
                break;
            }
            ring.tick(&mut window, &mut chip, 64, |pkt| {
                delivered[pos..pos + pkt.len()].copy_from_slice(pkt);
                pos += pkt.len();
                true
            })
            .unwrap();
        }
        assert_eq!(pos, 1024);
        for (i, b) in delivered.iter().enumerate() {
            assert_eq!(*b, i as u8);
        }
    }
}
