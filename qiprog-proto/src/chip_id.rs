// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chip-ID records (spec §3). `read_chip_id` returns up to
//! [`MAX_CHIP_IDS`] of these, terminated by the first record whose
//! `id_method` is [`IdMethod::Absent`].

use crate::codec::{read_u16_le, read_u32_le, write_u16_le, write_u32_le};

/// Size, in bytes, of a single chip-ID record on the wire.
pub const CHIP_ID_RECORD_LEN: usize = 7;
/// Maximum number of chip-ID records `read_chip_id` can return.
pub const MAX_CHIP_IDS: usize = 9;
/// Size, in bytes, of the full `read_chip_id` response body.
pub const CHIP_ID_ARRAY_LEN: usize = CHIP_ID_RECORD_LEN * MAX_CHIP_IDS;

/// How a chip's vendor/device ID was obtained.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IdMethod {
    /// Record is unused; terminates the array.
    Absent,
    /// Parallel JEDEC ID read over an ISA-style bus.
    JedecIsa,
    /// SPI RES (Read Electronic Signature).
    SpiRes,
    /// SPI REMS (Read Electronic Manufacturer & Device Signature).
    SpiRems,
    /// A method value the host doesn't recognize; preserved verbatim so
    /// callers can still inspect `vendor_id`/`device_id` if they know
    /// what it means.
    Reserved(u8),
}

impl IdMethod {
    fn from_wire(b: u8) -> Self {
        match b {
            0x00 => IdMethod::Absent,
            0x01 => IdMethod::JedecIsa,
            0x20 => IdMethod::SpiRes,
            0x21 => IdMethod::SpiRems,
            other => IdMethod::Reserved(other),
        }
    }

    fn to_wire(self) -> u8 {
        match self {
            IdMethod::Absent => 0x00,
            IdMethod::JedecIsa => 0x01,
            IdMethod::SpiRes => 0x20,
            IdMethod::SpiRems => 0x21,
            IdMethod::Reserved(b) => b,
        }
    }

    /// Whether this record terminates the chip-ID array.
    pub fn is_terminator(self) -> bool {
        matches!(self, IdMethod::Absent)
    }
}

/// One chip-ID record (spec §3): 7 bytes, `{id_method: u8, vendor_id: u16,
/// device_id: u32}`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChipId {
    pub id_method: IdMethod,
    pub vendor_id: u16,
    pub device_id: u32,
}

impl ChipId {
    pub const ABSENT: ChipId = ChipId {
        id_method: IdMethod::Absent,
        vendor_id: 0,
        device_id: 0,
    };

    fn decode_at(buf: &[u8], off: usize) -> Self {
        ChipId {
            id_method: IdMethod::from_wire(buf[off]),
            vendor_id: read_u16_le(buf, off + 1),
            device_id: read_u32_le(buf, off + 3),
        }
    }

    fn encode_at(&self, buf: &mut [u8], off: usize) {
        buf[off] = self.id_method.to_wire();
        write_u16_le(self.vendor_id, buf, off + 1);
        write_u32_le(self.device_id, buf, off + 3);
    }
}

/// Decodes the `READ_DEVICE_ID` response body into up to
/// [`MAX_CHIP_IDS`] records, stopping (and not including) the first
/// terminator. `buf` must be at least [`CHIP_ID_ARRAY_LEN`] bytes.
pub fn decode_chip_ids(buf: &[u8]) -> heapless_ids::ChipIdList {
    let mut list = heapless_ids::ChipIdList::new();
    for i in 0..MAX_CHIP_IDS {
        let rec = ChipId::decode_at(buf, i * CHIP_ID_RECORD_LEN);
        if rec.id_method.is_terminator() {
            break;
        }
        list.push(rec);
    }
    list
}

/// Encodes up to [`MAX_CHIP_IDS`] records into a [`CHIP_ID_ARRAY_LEN`]
/// buffer, zero-filling (terminating) any unused trailing slots.
pub fn encode_chip_ids(ids: &[ChipId], buf: &mut [u8]) {
    for b in buf.iter_mut() {
        *b = 0;
    }
    for (i, rec) in ids.iter().take(MAX_CHIP_IDS).enumerate() {
        rec.encode_at(buf, i * CHIP_ID_RECORD_LEN);
    }
}

/// A small fixed-capacity chip-ID list, since this crate is `no_std`
/// without an allocator.
pub mod heapless_ids {
    use super::{ChipId, MAX_CHIP_IDS};

    #[derive(Copy, Clone, Debug)]
    pub struct ChipIdList {
        buf: [ChipId; MAX_CHIP_IDS],
        len: usize,
    }

    impl ChipIdList {
        pub fn new() -> Self {
            ChipIdList {
                buf: [ChipId::ABSENT; MAX_CHIP_IDS],
                len: 0,
            }
        }

        pub fn push(&mut self, id: ChipId) {
            self.buf[self.len] = id;
            self.len += 1;
        }

        pub fn as_slice(&self) -> &[ChipId] {
            &self.buf[..self.len]
        }

        pub fn len(&self) -> usize {
            self.len
        }

        pub fn is_empty(&self) -> bool {
            self.len == 0
        }
    }

    impl Default for ChipIdList {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminates_at_first_absent_record() {
        let mut buf = [0u8; CHIP_ID_ARRAY_LEN];
        buf[0] = 0x20; // SPI RES
        buf[1] = 0xEF;
        buf[2] = 0x00;
        buf[3] = 0x40;
        buf[4] = 0x18;
        buf[5] = 0x00;
        buf[6] = 0x00;
        // records 1..8 stay zeroed (method = Absent)

        let ids = decode_chip_ids(&buf);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.as_slice()[0].id_method, IdMethod::SpiRes);
        assert_eq!(ids.as_slice()[0].vendor_id, 0x00EF);
        assert_eq!(ids.as_slice()[0].device_id, 0x0000_1840);
    }

    #[test]
    fn no_ids_when_first_record_absent() {
        let buf = [0u8; CHIP_ID_ARRAY_LEN];
        let ids = decode_chip_ids(&buf);
        assert!(ids.is_empty());
    }

    #[test]
    fn encode_decode_round_trip() {
        let ids = [ChipId {
            id_method: IdMethod::JedecIsa,
            vendor_id: 0x1234,
            device_id: 0xAABBCCDD,
        }];
        let mut buf = [0u8; CHIP_ID_ARRAY_LEN];
        encode_chip_ids(&ids, &mut buf);
        let decoded = decode_chip_ids(&buf);
        assert_eq!(decoded.as_slice(), &ids);
    }
}
