// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protocol-wide constants (spec §5, §6, §7).

/// Default USB vendor ID the registry scans for (spec §6). Callers may
/// override this with their own VID/PID pair.
pub const DEFAULT_VID: u16 = 0x1d50;
/// Default USB product ID the registry scans for (spec §6).
pub const DEFAULT_PID: u16 = 0x6076;

/// Default per-wire-operation timeout (spec §5).
pub const DEFAULT_TIMEOUT_MS: u32 = 3000;

/// Maximum number of bulk transfers kept in flight by the pipeline (spec
/// §4.7).
pub const BULK_QUEUE_DEPTH: usize = 32;

/// Number of slots in the device-side transfer-task ring (spec §3, §4.8).
pub const DEVICE_RING_DEPTH: usize = 4;

/// Maximum size of a control-transfer body, including IN staging buffers
/// (spec §4.4, §4.5).
pub const MAX_CONTROL_BODY: usize = 64;

/// Maximum number of `{kind, size}` entries in a single `SET_ERASE_SIZE`
/// call (spec §4.4).
pub const MAX_ERASE_SIZE_ENTRIES: usize = 12;

/// Bulk OUT/IN endpoint used for chip-write/chip-read streams (spec §6).
pub const CHIP_DATA_ENDPOINT: u8 = 1;

/// Endpoint reserved for a future instruction-set mechanism. Never
/// dispatched by this implementation (spec §6).
pub const RESERVED_INSTRUCTION_ENDPOINT: u8 = 2;
