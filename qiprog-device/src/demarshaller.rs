// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dispatches inbound wire requests onto a [`Translator`]'s driver vtable
//! (spec §4.5).

use num_traits::FromPrimitive;

use qiprog_proto::capabilities::{BusKind, CAPABILITIES_WIRE_LEN};
use qiprog_proto::chip_id::{encode_chip_ids, CHIP_ID_ARRAY_LEN};
use qiprog_proto::codec::{read_u16_le, read_u32_le, write_u16_le, write_u32_le};
use qiprog_proto::wire::{join_fields, CommandSequence, EraseSizeList, SetAddressBody};
use qiprog_proto::{Opcode, QiProgError, Result};

use crate::diag::DiagEvent;
use crate::driver::Driver;
use crate::translator::Translator;

/// Dispatches one control request. `opcode` is the raw wire byte (so an
/// unrecognized opcode can itself be reported rather than panicking);
/// `out` must be at least [`qiprog_proto::constants::MAX_CONTROL_BODY`]
/// bytes and is only written to for IN requests. Returns the number of
/// bytes written into `out`.
///
/// Any `Err` here means the control endpoint should STALL (spec §4.5(d),
/// §4.9, §7).
pub fn dispatch<D: Driver>(
    t: &mut Translator<D>,
    opcode: u8,
    field_a: u16,
    field_b: u16,
    body: &[u8],
    out: &mut [u8],
) -> Result<usize> {
    let op = match Opcode::from_u8(opcode) {
        Some(op) => op,
        None => {
            t.diag.record(DiagEvent::Stall { opcode });
            return Err(QiProgError::Generic);
        }
    };

    let result = dispatch_known(t, op, field_a, field_b, body, out);
    if result.is_err() {
        t.diag.record(DiagEvent::Stall { opcode });
    } else {
        t.diag.record(DiagEvent::Dispatch { opcode });
    }
    result
}

fn dispatch_known<D: Driver>(
    t: &mut Translator<D>,
    op: Opcode,
    field_a: u16,
    field_b: u16,
    body: &[u8],
    out: &mut [u8],
) -> Result<usize> {
    match op {
        Opcode::GetCapabilities => {
            let caps = t.driver.capabilities();
            for b in out.iter_mut().take(CAPABILITIES_WIRE_LEN) {
                *b = 0;
            }
            caps.encode(out);
            Ok(CAPABILITIES_WIRE_LEN)
        }
        Opcode::SetBus => {
            let bus = BusKind::from_bits_truncate(join_fields(field_a, field_b));
            if bus.is_empty() {
                return Err(QiProgError::Argument);
            }
            t.driver.set_bus(bus)?;
            Ok(0)
        }
        Opcode::SetClock => {
            let khz = join_fields(field_a, field_b);
            let actual = t.driver.set_clock(khz)?;
            write_u32_le(actual, out, 0);
            Ok(4)
        }
        Opcode::ReadDeviceId => {
            let ids = t.driver.read_chip_id();
            encode_chip_ids(ids.as_slice(), &mut out[..CHIP_ID_ARRAY_LEN]);
            Ok(CHIP_ID_ARRAY_LEN)
        }
        Opcode::SetAddress => {
            if body.len() < 8 {
                return Err(QiProgError::Argument);
            }
            let addr = SetAddressBody::decode(body);
            t.window.set(addr.start, addr.end)?;
            t.ring.reset();
            t.driver.set_address(addr.start, addr.end)?;
            t.diag.record(DiagEvent::AddressSet {
                start: addr.start,
                end: addr.end,
            });
            Ok(0)
        }
        Opcode::SetEraseSize => {
            let list = EraseSizeList::decode(body);
            t.driver.set_erase_size(field_b, list)?;
            Ok(0)
        }
        Opcode::SetEraseCommand => {
            if body.len() < 4 {
                return Err(QiProgError::Argument);
            }
            t.driver
                .set_erase_command(field_b, CommandSequence::decode(body))?;
            Ok(0)
        }
        Opcode::SetWriteCommand => {
            if body.len() < 4 {
                return Err(QiProgError::Argument);
            }
            t.driver
                .set_write_command(field_b, CommandSequence::decode(body))?;
            Ok(0)
        }
        Opcode::SetChipSize => {
            if body.len() < 4 {
                return Err(QiProgError::Argument);
            }
            t.driver.set_chip_size(field_b, read_u32_le(body, 0))?;
            Ok(0)
        }
        Opcode::SetSpiTiming => {
            t.driver.set_spi_timing(field_a, field_b)?;
            Ok(0)
        }
        Opcode::Read8 => {
            let addr = join_fields(field_a, field_b);
            out[0] = t.driver.read8(addr)?;
            Ok(1)
        }
        Opcode::Read16 => {
            let addr = join_fields(field_a, field_b);
            write_u16_le(t.driver.read16(addr)?, out, 0);
            Ok(2)
        }
        Opcode::Read32 => {
            let addr = join_fields(field_a, field_b);
            write_u32_le(t.driver.read32(addr)?, out, 0);
            Ok(4)
        }
        Opcode::Write8 => {
            if body.is_empty() {
                return Err(QiProgError::Argument);
            }
            let addr = join_fields(field_a, field_b);
            t.driver.write8(addr, body[0])?;
            Ok(0)
        }
        Opcode::Write16 => {
            if body.len() < 2 {
                return Err(QiProgError::Argument);
            }
            let addr = join_fields(field_a, field_b);
            t.driver.write16(addr, read_u16_le(body, 0))?;
            Ok(0)
        }
        Opcode::Write32 => {
            if body.len() < 4 {
                return Err(QiProgError::Argument);
            }
            let addr = join_fields(field_a, field_b);
            t.driver.write32(addr, read_u32_le(body, 0))?;
            Ok(0)
        }
        Opcode::SetVdd => {
            t.driver.set_vdd(field_a, field_b)?;
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qiprog_proto::capabilities::{Capabilities, InstructionSet};
    use qiprog_proto::chip_id::heapless_ids::ChipIdList;

    struct FakeChip {
        bytes: [u8; 4096],
        bus: Option<BusKind>,
    }

    impl FakeChip {
        fn new() -> Self {
            let mut bytes = [0u8; 4096];
            for (i, b) in bytes.iter_mut().enumerate() {
                *b = i as u8;
            }
            FakeChip { bytes, bus: None }
        }
    }

    impl Driver for FakeChip {
        fn capabilities(&self) -> Capabilities {
            Capabilities {
                instruction_set: InstructionSet::QIPROG_NATIVE,
                bus_master: BusKind::ISA | BusKind::SPI,
                max_direct_data: 0,
                voltages: [3300, 1800, 0, 0, 0, 0, 0, 0, 0, 0],
            }
        }
        fn set_bus(&mut self, bus: BusKind) -> Result<()> {
            self.bus = Some(bus);
            Ok(())
        }
        fn set_clock(&mut self, khz: u32) -> Result<u32> {
            Ok(khz)
        }
        fn read_chip_id(&mut self) -> ChipIdList {
            ChipIdList::new()
        }
        fn set_address(&mut self, _: u32, _: u32) -> Result<()> {
            Ok(())
        }
        fn set_erase_size(&mut self, _: u16, _: EraseSizeList) -> Result<()> {
            Ok(())
        }
        fn set_erase_command(&mut self, _: u16, _: CommandSequence) -> Result<()> {
            Ok(())
        }
        fn set_write_command(&mut self, _: u16, _: CommandSequence) -> Result<()> {
            Ok(())
        }
        fn set_chip_size(&mut self, _: u16, _: u32) -> Result<()> {
            Ok(())
        }
        fn set_spi_timing(&mut self, _: u16, _: u16) -> Result<()> {
            Ok(())
        }
        fn set_vdd(&mut self, _: u16, _: u16) -> Result<()> {
            Ok(())
        }
        fn read8(&mut self, addr: u32) -> Result<u8> {
            Ok(self.bytes[addr as usize])
        }
        fn read16(&mut self, addr: u32) -> Result<u16> {
            Ok(read_u16_le(&self.bytes, addr as usize))
        }
        fn read32(&mut self, addr: u32) -> Result<u32> {
            Ok(read_u32_le(&self.bytes, addr as usize))
        }
        fn write8(&mut self, addr: u32, val: u8) -> Result<()> {
            self.bytes[addr as usize] = val;
            Ok(())
        }
        fn write16(&mut self, addr: u32, val: u16) -> Result<()> {
            write_u16_le(val, &mut self.bytes, addr as usize);
            Ok(())
        }
        fn write32(&mut self, addr: u32, val: u32) -> Result<()> {
            write_u32_le(val, &mut self.bytes, addr as usize);
            Ok(())
        }
        fn chip_read(&mut self, addr: u32, buf: &mut [u8]) -> Result<usize> {
            let addr = addr as usize;
            buf.copy_from_slice(&self.bytes[addr..addr + buf.len()]);
            Ok(buf.len())
        }
        fn chip_write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
            let addr = addr as usize;
            self.bytes[addr..addr + data.len()].copy_from_slice(data);
            Ok(())
        }
    }

    fn translator() -> Translator<FakeChip> {
        Translator::new(FakeChip::new(), 64, 64)
    }

    #[test]
    fn unknown_opcode_stalls() {
        let mut t = translator();
        let mut out = [0u8; 64];
        assert_eq!(dispatch(&mut t, 0x7F, 0, 0, &[], &mut out), Err(QiProgError::Generic));
    }

    #[test]
    fn capability_query_scenario() {
        let mut t = translator();
        let mut out = [0u8; 64];
        let n = dispatch(&mut t, Opcode::GetCapabilities.as_u8(), 0, 0, &[], &mut out).unwrap();
        assert_eq!(n, 32);
        assert_eq!(&out[..4], &[0x01, 0x00, 0x0A, 0x00]);
    }

    #[test]
    fn set_bus_rejects_zero_mask() {
        let mut t = translator();
        let mut out = [0u8; 64];
        assert_eq!(
            dispatch(&mut t, Opcode::SetBus.as_u8(), 0, 0, &[], &mut out),
            Err(QiProgError::Argument)
        );
    }

    #[test]
    fn read8_scenario() {
        let mut t = translator();
        let mut out = [0u8; 64];
        let (a, b) = qiprog_proto::wire::split_fields(0x0000_0042);
        let n = dispatch(&mut t, Opcode::Read8.as_u8(), a, b, &[], &mut out).unwrap();
        assert_eq!(n, 1);
        assert_eq!(out[0], 0x42);
    }

    #[test]
    fn write32_scenario() {
        let mut t = translator();
        let mut out = [0u8; 64];
        let (a, b) = qiprog_proto::wire::split_fields(0x0000_0010);
        let body = 0x00C0_FFEEu32.to_le_bytes();
        dispatch(&mut t, Opcode::Write32.as_u8(), a, b, &body, &mut out).unwrap();
        assert_eq!(t.driver.read32(0x10).unwrap(), 0x00C0_FFEE);
    }

    #[test]
    fn set_address_resets_ring() {
        let mut t = translator();
        let mut out = [0u8; 64];
        let body = {
            let mut b = [0u8; 8];
            let addr = SetAddressBody { start: 0, end: 127 };
            addr.encode(&mut b);
            b
        };
        dispatch(&mut t, Opcode::SetAddress.as_u8(), 0, 0, &body, &mut out).unwrap();
        assert_eq!(t.window.start(), 0);
        assert_eq!(t.window.end(), 127);
        assert_eq!(t.ring.depth(), 0);
    }
}
