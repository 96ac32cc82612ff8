// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device-side address-window bookkeeping.
//!
//! The window itself ([`AddressWindow`]) is shared with the host crate;
//! this module only adds the one device-specific question: how many
//! bytes are left to stream out of the current window before the ring
//! (spec §4.8) should stop filling slots.

use qiprog_proto::AddressWindow;

/// Whether the read cursor still has chip-address range left to stream
/// (spec §4.8: "If a free slot exists and `pread <= end`").
pub fn has_remaining(window: &AddressWindow) -> bool {
    window.remaining_read() > 0
}

/// How many bytes may still be streamed before the window is exhausted,
/// saturating at `usize::MAX` on a 64-bit host (the value is only ever
/// compared against small packet sizes).
pub fn remaining_len(window: &AddressWindow) -> usize {
    window.remaining_read().min(usize::MAX as u64) as usize
}
