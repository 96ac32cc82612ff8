// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The programmer capability record (spec §3), reported once by firmware
//! at power-on and read-only to hosts thereafter.

use crate::codec::{read_u16_le, read_u32_le, write_u16_le, write_u32_le};

bitflags::bitflags! {
    /// Bitmask over the bus kinds a programmer can drive (spec §3, §6).
    ///
    /// Bit values are part of the wire contract: `bus_master` is carried
    /// as a raw `u32` over the wire, so the numeric values below cannot
    /// be renumbered without breaking interoperability with existing
    /// firmware.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct BusKind: u32 {
        const LPC    = 0x0000_0001;
        const ISA    = 0x0000_0002;
        const FWH    = 0x0000_0004;
        const SPI    = 0x0000_0008;
        const BDM17  = 0x0000_0010;
        const BDM35  = 0x0000_0020;
        const AUD    = 0x0000_0040;
    }
}

bitflags::bitflags! {
    /// Bitmask over the instruction sets a programmer implements.
    ///
    /// The reference implementation defines this as "a bitmask over a
    /// small set" without naming every bit; the values here are the ones
    /// exercised by the reference exerciser's capability-query scenario
    /// (spec §8, scenario 1: `iset = 1`).
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct InstructionSet: u16 {
        const QIPROG_NATIVE = 0x0001;
        const SPI_BITBANG    = 0x0002;
        const JTAG           = 0x0004;
    }
}

/// Up to ten supply voltages a programmer can drive to the chip, in
/// millivolts. The list terminates at the first zero entry or after ten
/// entries, whichever comes first.
pub type Voltages = [u16; 10];

/// The 30-byte logical capability record (spec §3). It is carried inside
/// a 32-byte control-IN buffer on the wire (spec §6); the two trailing
/// bytes of that buffer are unused padding, not part of this record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub instruction_set: InstructionSet,
    pub bus_master: BusKind,
    pub max_direct_data: u32,
    pub voltages: Voltages,
}

/// Size, in bytes, of the logical capability record.
pub const CAPABILITIES_RECORD_LEN: usize = 30;
/// Size, in bytes, of the control-IN buffer that carries it (spec §6:
/// `wLength = 0x20`).
pub const CAPABILITIES_WIRE_LEN: usize = 32;

impl Capabilities {
    /// Returns the meaningful voltage entries: everything up to (but not
    /// including) the first zero, or all ten if none is zero.
    pub fn voltages(&self) -> impl Iterator<Item = u16> + '_ {
        self.voltages.iter().copied().take_while(|&v| v != 0)
    }

    /// Decodes a capability record from a wire buffer of at least
    /// [`CAPABILITIES_RECORD_LEN`] bytes.
    pub fn decode(buf: &[u8]) -> Self {
        let instruction_set = InstructionSet::from_bits_truncate(read_u16_le(buf, 0));
        let bus_master = BusKind::from_bits_truncate(read_u32_le(buf, 2));
        let max_direct_data = read_u32_le(buf, 6);
        let mut voltages = [0u16; 10];
        for (i, v) in voltages.iter_mut().enumerate() {
            *v = read_u16_le(buf, 10 + i * 2);
        }
        Capabilities {
            instruction_set,
            bus_master,
            max_direct_data,
            voltages,
        }
    }

    /// Encodes into a wire buffer of at least [`CAPABILITIES_RECORD_LEN`]
    /// bytes. Callers serializing onto the wire should zero-fill a
    /// [`CAPABILITIES_WIRE_LEN`]-byte buffer first; this only touches the
    /// logical record's 30 bytes.
    pub fn encode(&self, buf: &mut [u8]) {
        write_u16_le(self.instruction_set.bits(), buf, 0);
        write_u32_le(self.bus_master.bits(), buf, 2);
        write_u32_le(self.max_direct_data, buf, 6);
        for (i, v) in self.voltages.iter().enumerate() {
            write_u16_le(*v, buf, 10 + i * 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trip() {
        let mut wire = [0u8; CAPABILITIES_WIRE_LEN];
        wire[0] = 0x01;
        wire[1] = 0x00;
        wire[2] = 0x0A;
        wire[10] = 0xE4;
        wire[11] = 0x0C;
        wire[12] = 0x08;
        wire[13] = 0x07;

        let caps = Capabilities::decode(&wire);
        assert_eq!(caps.instruction_set.bits(), 0x0001);
        assert_eq!(caps.bus_master, BusKind::ISA | BusKind::SPI);
        assert_eq!(caps.max_direct_data, 0);
        let mut voltages = caps.voltages();
        assert_eq!(voltages.next(), Some(3300));
        assert_eq!(voltages.next(), Some(1800));
        assert_eq!(voltages.next(), None);

        let mut reencoded = [0u8; CAPABILITIES_WIRE_LEN];
        caps.encode(&mut reencoded);
        assert_eq!(&reencoded[..CAPABILITIES_RECORD_LEN], &wire[..CAPABILITIES_RECORD_LEN]);
    }

    #[test]
    fn empty_voltage_list() {
        let wire = [0u8; CAPABILITIES_WIRE_LEN];
        let caps = Capabilities::decode(&wire);
        assert_eq!(caps.voltages().count(), 0);
    }
}
