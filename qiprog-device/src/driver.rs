// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The in-firmware driver vtable (spec §4.2, §4.5, §9).
//!
//! Rather than an open-coded table of function pointers, this is a plain
//! Rust trait: one method per QiProg operation, each taking already-typed
//! arguments and returning [`qiprog_proto::Result`]. A [`Translator`]
//! dispatches decoded wire requests onto a `&mut dyn Driver` (or any
//! generic `D: Driver`), the same shape as the teacher's
//! `impl idl::InOrderHostFlashImpl for ServerImpl` pattern, generalized
//! from one server's six operations to the full QiProg opcode set.

use qiprog_proto::capabilities::{BusKind, Capabilities};
use qiprog_proto::chip_id::heapless_ids::ChipIdList;
use qiprog_proto::wire::{CommandSequence, EraseSizeList};
use qiprog_proto::Result;

/// Implemented once per hardware backend (an LPC/FWH/SPI/ISA bus driver
/// attached to a real flash chip, or a test double).
pub trait Driver {
    /// Returns this programmer's fixed capability record.
    fn capabilities(&self) -> Capabilities;

    /// Selects which bus kind subsequent chip operations address.
    fn set_bus(&mut self, bus: BusKind) -> Result<()>;

    /// Requests a bus clock of `khz` kilohertz; returns the clock the
    /// hardware actually settled on.
    fn set_clock(&mut self, khz: u32) -> Result<u32>;

    /// Reads up to [`qiprog_proto::chip_id::MAX_CHIP_IDS`] chip-ID
    /// records off the attached chip(s).
    fn read_chip_id(&mut self) -> ChipIdList;

    /// Updates the driver's notion of the active chip-address window.
    /// Called by the demarshaller immediately after it updates its own
    /// address cursor, so the driver can e.g. reset internal chip-side
    /// state before the next bulk stream (spec §4.5).
    fn set_address(&mut self, start: u32, end: u32) -> Result<()>;

    fn set_erase_size(&mut self, chip_idx: u16, entries: EraseSizeList) -> Result<()>;
    fn set_erase_command(&mut self, chip_idx: u16, cmd: CommandSequence) -> Result<()>;
    fn set_write_command(&mut self, chip_idx: u16, cmd: CommandSequence) -> Result<()>;
    fn set_chip_size(&mut self, chip_idx: u16, size: u32) -> Result<()>;

    /// Configures the SPI bus's timing, in microseconds of deselect time
    /// (`tpu_us`) and nanoseconds of chip-select setup time (`tces_ns`).
    fn set_spi_timing(&mut self, tpu_us: u16, tces_ns: u16) -> Result<()>;

    fn set_vdd(&mut self, millivolts: u16, chip_idx: u16) -> Result<()>;

    fn read8(&mut self, addr: u32) -> Result<u8>;
    fn read16(&mut self, addr: u32) -> Result<u16>;
    fn read32(&mut self, addr: u32) -> Result<u32>;
    fn write8(&mut self, addr: u32, val: u8) -> Result<()>;
    fn write16(&mut self, addr: u32, val: u16) -> Result<()>;
    fn write32(&mut self, addr: u32, val: u32) -> Result<()>;

    /// Streams up to `buf.len()` bytes starting at `addr` into `buf`,
    /// returning the number of bytes actually produced. Used by the
    /// transfer ring (spec §4.8) to fill outgoing bulk-IN packets.
    fn chip_read(&mut self, addr: u32, buf: &mut [u8]) -> Result<usize>;

    /// Streams `data` to the chip starting at `addr`, used by bulk-OUT
    /// transfers.
    fn chip_write(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    /// Restores hardware to its power-on defaults. Called when a device
    /// transitions from OPEN back to CLOSED (spec §4.3).
    fn close(&mut self) {}
}
