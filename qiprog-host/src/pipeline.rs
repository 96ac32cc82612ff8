// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The depth-bounded bulk-transfer pipeline (spec §4.7).
//!
//! Submits whole endpoint-sized packets in index order, up to
//! `min(total_packets, 32)` at a time, and self-resubmits each "slot"
//! once its current packet completes: if `transfer_number + queue_depth
//! < total_packets`, the slot's next transfer is `transfer_number +
//! queue_depth`; otherwise the slot retires.
//!
//! `transferred_bytes` and `active_transfers` are plain locals here, not
//! atomics — per spec §9's design note, that's sound only because no
//! [`Transport`] in this workspace runs completions on another thread.
//! A backend that does would need to promote these to atomics and add a
//! real wait primitive at the `drive_events` boundary; this function is
//! exactly the place such a change would land.

use std::time::Duration;

use qiprog_proto::constants::BULK_QUEUE_DEPTH;
use qiprog_proto::opcode::Direction;
use qiprog_proto::QiProgError;

use crate::transport::{BulkStatus, Transport};

/// Transfers `buf` (which must be a whole multiple of `packet_size`) over
/// `endpoint_id`, `direction`-wise. On success, returns the number of
/// bytes transferred (always `buf.len()`). On failure, returns the
/// error alongside the number of bytes actually transferred before the
/// first failure, so the caller can advance its cursor by exactly that
/// amount instead of leaving it stale (spec §4.9).
pub fn bulk_transfer<T: Transport + ?Sized>(
    transport: &mut T,
    direction: Direction,
    endpoint_id: u8,
    buf: &mut [u8],
    packet_size: usize,
    timeout: Duration,
) -> std::result::Result<usize, (QiProgError, usize)> {
    if packet_size == 0 || buf.len() % packet_size != 0 {
        return Err((QiProgError::Argument, 0));
    }
    let total_packets = buf.len() / packet_size;
    if total_packets == 0 {
        return Ok(0);
    }
    let queue_depth = total_packets.min(BULK_QUEUE_DEPTH);

    let mut transferred_bytes = 0usize;
    let mut active_transfers = queue_depth;
    let mut failed = false;
    // One lineage per queue slot: `Some(transfer_number)` while it still
    // has work, `None` once it has retired.
    let mut slots: Vec<Option<usize>> = (0..queue_depth).map(Some).collect();

    while active_transfers > 0 {
        for slot in slots.iter_mut() {
            let transfer_number = match *slot {
                Some(n) => n,
                None => continue,
            };

            if !failed {
                let off = transfer_number * packet_size;
                let chunk = &mut buf[off..off + packet_size];
                let mut outcome_ok = false;
                let submit = transport.bulk_submit(direction, endpoint_id, chunk, &mut |c| {
                    outcome_ok = c.status == BulkStatus::Completed && c.actual_length == packet_size;
                    if outcome_ok {
                        transferred_bytes += c.actual_length;
                    }
                });
                if submit.is_err() || !outcome_ok {
                    failed = true;
                }
            }

            let next = transfer_number + queue_depth;
            if !failed && next < total_packets {
                *slot = Some(next);
            } else {
                *slot = None;
                active_transfers -= 1;
            }
        }
    }

    if let Err(e) = transport.drive_events(timeout) {
        return Err((QiProgError::from(e), transferred_bytes));
    }

    if failed {
        Err((QiProgError::Generic, transferred_bytes))
    } else {
        Ok(transferred_bytes)
    }
}
