// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The address window and its read/write cursors (spec §3, §4.6).
//!
//! `start` and `end` are the declared, inclusive chip-address range; `end`
//! may legitimately be `0xFFFFFFFF` (the top of a 32-bit address space).
//! The cursors (`pread`/`pwrite`) must then be able to represent "one past
//! `end`" (`0x1_0000_0000`), which does not fit in a `u32`. Per spec §9
//! open question (c), this implementation keeps the declared bounds as
//! `u32` (they are wire quantities) but the cursors as `u64`, so advancing
//! a cursor to the position just beyond the top of the address space never
//! wraps.

use crate::error::{QiProgError, Result};

/// A chip-address window plus the host's or device's read/write cursors
/// into it (spec §3).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AddressWindow {
    start: u32,
    end: u32,
    pread: u64,
    pwrite: u64,
}

impl AddressWindow {
    /// A window over the whole 32-bit address space with both cursors
    /// parked at zero. Used as the "nothing declared yet" initial state;
    /// reading or writing before a real `set_address` will simply start
    /// the first bulk stream at address zero, matching the invariant that
    /// a fresh device's cursors start at `start`.
    pub fn unset() -> Self {
        AddressWindow {
            start: 0,
            end: u32::MAX,
            pread: 0,
            pwrite: 0,
        }
    }

    /// Declares a new window, resetting both cursors to `start` (spec
    /// §3: "`set_address(start, end)` resets `pread = pwrite = start`").
    ///
    /// Rejects `end < start` (spec §9 open question (b)).
    pub fn set(&mut self, start: u32, end: u32) -> Result<()> {
        if end < start {
            return Err(QiProgError::Argument);
        }
        self.start = start;
        self.end = end;
        self.pread = start as u64;
        self.pwrite = start as u64;
        Ok(())
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn pread(&self) -> u64 {
        self.pread
    }

    pub fn pwrite(&self) -> u64 {
        self.pwrite
    }

    /// `end + 1` in `u64`, i.e. one past the last valid address. Always
    /// representable even when `end == u32::MAX`.
    pub fn end_exclusive(&self) -> u64 {
        self.end as u64 + 1
    }

    /// Number of addresses from `pread` to the end of the window,
    /// inclusive of `end`.
    pub fn remaining_read(&self) -> u64 {
        self.end_exclusive().saturating_sub(self.pread)
    }

    /// Number of addresses from `pwrite` to the end of the window,
    /// inclusive of `end`.
    pub fn remaining_write(&self) -> u64 {
        self.end_exclusive().saturating_sub(self.pwrite)
    }

    /// Whether `[where_, where_ + n)` lies entirely within the declared
    /// window (spec §4.6 "range safety"). `where_` takes `u64` so a
    /// cursor value (which may itself reach `0x1_0000_0000`) can be
    /// checked directly, without first truncating it to `u32`.
    pub fn contains_range(&self, where_: u64, n: u64) -> bool {
        where_ >= self.start as u64 && (where_ + n) <= self.end_exclusive()
    }

    /// Advances the read cursor by `n` addresses. Callers must have
    /// already validated the range with [`contains_range`].
    pub fn advance_pread(&mut self, n: u64) {
        self.pread += n;
    }

    /// Advances the write cursor by `n` addresses.
    pub fn advance_pwrite(&mut self, n: u64) {
        self.pwrite += n;
    }

    /// Sets the read cursor directly, e.g. after a partial bulk transfer
    /// failure leaves it at the last successfully delivered address (spec
    /// §4.9).
    pub fn set_pread(&mut self, pread: u64) {
        self.pread = pread;
    }

    pub fn set_pwrite(&mut self, pwrite: u64) {
        self.pwrite = pwrite;
    }
}

impl Default for AddressWindow {
    fn default() -> Self {
        Self::unset()
    }
}
