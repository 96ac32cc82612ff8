// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-side address-cursor bookkeeping and the bulk read/write algorithm
//! (spec §4.6).
//!
//! The window itself ([`AddressWindow`]) lives in `qiprog-proto` and is
//! shared with the device side; this module adds the one piece that is
//! host-only: the endpoint-sized leftover buffer that lets a caller ask
//! for fewer bytes than a packet, or a non-multiple of packet size,
//! without losing the remainder.

use std::time::Duration;

use qiprog_proto::constants::CHIP_DATA_ENDPOINT;
use qiprog_proto::opcode::Direction;
use qiprog_proto::{QiProgError, Result};

use crate::device::Device;
use crate::pipeline;

/// Endpoint-packet-sized bytes read ahead of caller demand (spec §3
/// "Leftover read buffer"). `buf.len()` is fixed at construction to the
/// IN endpoint's max-packet size; `valid` is the count of bytes at the
/// front that are still unconsumed.
pub(crate) struct LeftoverBuffer {
    buf: Vec<u8>,
    valid: usize,
}

impl LeftoverBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        LeftoverBuffer {
            buf: vec![0; capacity],
            valid: 0,
        }
    }

    fn len(&self) -> usize {
        self.valid
    }

    /// Copies up to `dest.len()` bytes from the front of the buffer into
    /// `dest`, shifting any remainder forward. Returns the number of
    /// bytes copied.
    fn take(&mut self, dest: &mut [u8]) -> usize {
        let n = self.valid.min(dest.len());
        dest[..n].copy_from_slice(&self.buf[..n]);
        self.buf.copy_within(n..self.valid, 0);
        self.valid -= n;
        n
    }

    /// Replaces the buffer's contents wholesale, e.g. after a fresh
    /// endpoint-sized packet arrives.
    fn fill(&mut self, data: &[u8]) {
        self.buf[..data.len()].copy_from_slice(data);
        self.valid = data.len();
    }

    /// Discards any buffered bytes (spec §4.6 "obsolete-buffer discard").
    pub(crate) fn discard(&mut self) {
        self.valid = 0;
    }
}

impl Device {
    /// Streams `dest.len()` bytes starting at chip address `where_` into
    /// `dest` (spec §4.6 algorithm, steps 1-4).
    pub fn read(&mut self, where_: u32, dest: &mut [u8]) -> Result<()> {
        if !self.is_open() {
            return Err(QiProgError::Argument);
        }
        if dest.is_empty() {
            return Ok(());
        }
        let n = dest.len() as u64;
        let requested_end = (where_ as u64)
            .checked_add(n)
            .and_then(|v| v.checked_sub(1))
            .ok_or(QiProgError::Argument)?;
        if requested_end > u32::MAX as u64 {
            return Err(QiProgError::Argument);
        }

        // Step 1: (re)declare the window only if the cursor isn't
        // already positioned where the caller wants, or doesn't cover
        // the requested range.
        if self.window.pread() != where_ as u64 || !self.window.contains_range(where_ as u64, n) {
            self.set_address(where_, requested_end as u32)?;
        }

        let mut filled = 0usize;

        // Step 2: drain the leftover buffer first.
        if filled < dest.len() {
            let taken = self.leftover.take(&mut dest[filled..]);
            filled += taken;
        }
        if filled == dest.len() {
            return Ok(());
        }

        let ep_size = self.endpoint_sizes.max_packet_in;
        if ep_size == 0 {
            return Err(QiProgError::Argument);
        }

        // Step 3: whole endpoint-sized packets go straight into `dest`.
        let remaining = dest.len() - filled;
        let whole_packets_len = (remaining / ep_size) * ep_size;
        if whole_packets_len > 0 {
            let packet_start = self.window.pread();
            match pipeline::bulk_transfer(
                &mut *self.transport,
                Direction::In,
                CHIP_DATA_ENDPOINT,
                &mut dest[filled..filled + whole_packets_len],
                ep_size,
                Duration::from_millis(qiprog_proto::constants::DEFAULT_TIMEOUT_MS as u64),
            ) {
                Ok(transferred) => {
                    self.window.advance_pread(transferred as u64);
                    filled += whole_packets_len;
                }
                Err((err, transferred)) => {
                    // Leave `pread` at the last address actually
                    // delivered, not rolled back to `packet_start` (spec
                    // §4.9, §7: no automatic retry, no cursor rollback).
                    self.window.set_pread(packet_start + transferred as u64);
                    return Err(err);
                }
            }
        }

        // Step 4: a sub-endpoint remainder is satisfied by reading one
        // more full packet into the leftover buffer and handing over
        // only what was asked for.
        let leftover_need = dest.len() - filled;
        if leftover_need > 0 {
            let mut packet = vec![0u8; ep_size];
            let mut got = 0usize;
            let mut completed = false;
            self.transport
                .bulk_submit(Direction::In, CHIP_DATA_ENDPOINT, &mut packet, &mut |c| {
                    got = c.actual_length;
                    completed = c.status == crate::transport::BulkStatus::Completed;
                })
                .map_err(QiProgError::from)?;
            self.transport
                .drive_events(Duration::from_millis(
                    qiprog_proto::constants::DEFAULT_TIMEOUT_MS as u64,
                ))
                .map_err(QiProgError::from)?;
            if !completed {
                return Err(QiProgError::Generic);
            }
            packet.truncate(got);
            let n = leftover_need.min(packet.len());
            dest[filled..filled + n].copy_from_slice(&packet[..n]);
            self.leftover.fill(&packet[n..]);
            // `pread` tracks what has been delivered to the caller, not
            // what the device produced: the leftover buffer holds the
            // bytes immediately following it, so a contiguous follow-up
            // read finds `pread == where` and skips re-declaring the
            // window.
            self.window.advance_pread(n as u64);
            filled += n;
        }

        Ok(())
    }

    /// Streams `data` to the chip starting at `where_` (spec §4.6,
    /// applied symmetrically to writes — no leftover buffer, a trailing
    /// sub-endpoint remainder goes out as a short packet).
    pub fn write(&mut self, where_: u32, data: &[u8]) -> Result<()> {
        if !self.is_open() {
            return Err(QiProgError::Argument);
        }
        if data.is_empty() {
            return Ok(());
        }
        let n = data.len() as u64;
        let requested_end = (where_ as u64)
            .checked_add(n)
            .and_then(|v| v.checked_sub(1))
            .ok_or(QiProgError::Argument)?;
        if requested_end > u32::MAX as u64 {
            return Err(QiProgError::Argument);
        }

        if self.window.pwrite() != where_ as u64 || !self.window.contains_range(where_ as u64, n) {
            self.set_address(where_, requested_end as u32)?;
        }

        let ep_size = self.endpoint_sizes.max_packet_out;
        if ep_size == 0 {
            return Err(QiProgError::Argument);
        }

        let whole_packets_len = (data.len() / ep_size) * ep_size;
        let mut sent = 0usize;
        if whole_packets_len > 0 {
            let packet_start = self.window.pwrite();
            let mut scratch = data[..whole_packets_len].to_vec();
            match pipeline::bulk_transfer(
                &mut *self.transport,
                Direction::Out,
                CHIP_DATA_ENDPOINT,
                &mut scratch,
                ep_size,
                Duration::from_millis(qiprog_proto::constants::DEFAULT_TIMEOUT_MS as u64),
            ) {
                Ok(transferred) => {
                    self.window.advance_pwrite(transferred as u64);
                    sent += whole_packets_len;
                }
                Err((err, transferred)) => {
                    self.window.set_pwrite(packet_start + transferred as u64);
                    return Err(err);
                }
            }
        }

        let remainder = &data[sent..];
        if !remainder.is_empty() {
            let mut packet = remainder.to_vec();
            let mut completed = false;
            self.transport
                .bulk_submit(Direction::Out, CHIP_DATA_ENDPOINT, &mut packet, &mut |c| {
                    completed = c.status == crate::transport::BulkStatus::Completed
                        && c.actual_length == remainder.len();
                })
                .map_err(QiProgError::from)?;
            self.transport
                .drive_events(Duration::from_millis(
                    qiprog_proto::constants::DEFAULT_TIMEOUT_MS as u64,
                ))
                .map_err(QiProgError::from)?;
            if !completed {
                return Err(QiProgError::Generic);
            }
            self.window.advance_pwrite(remainder.len() as u64);
        }

        // A fresh write invalidates any previously buffered read-ahead
        // for the overlapping region.
        self.leftover.discard();

        Ok(())
    }
}
