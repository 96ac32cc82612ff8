// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The host-side command marshaller (spec §4.4): one typed method per
//! QiProg operation, each packing its arguments into a control request,
//! issuing it through the device's [`Transport`](crate::transport::Transport),
//! and unpacking the response. Modeled on the teacher's
//! `drv-gimlet-hf-api::HostFlash` methods — pack, `send`, unpack — one
//! opcode at a time instead of hand-rolling the pattern per call site.

use std::time::Duration;

use qiprog_proto::capabilities::{Capabilities, CAPABILITIES_WIRE_LEN};
use qiprog_proto::chip_id::heapless_ids::ChipIdList;
use qiprog_proto::chip_id::{decode_chip_ids, CHIP_ID_ARRAY_LEN};
use qiprog_proto::codec::{read_u16_le, read_u32_le};
use qiprog_proto::constants::{DEFAULT_TIMEOUT_MS, MAX_ERASE_SIZE_ENTRIES};
use qiprog_proto::opcode::Direction;
use qiprog_proto::wire::{split_fields, CommandSequence, EraseSizeList, SetAddressBody};
use qiprog_proto::{BusKind, Opcode, QiProgError, Result};

use crate::device::Device;

fn default_timeout() -> Duration {
    Duration::from_millis(DEFAULT_TIMEOUT_MS as u64)
}

impl Device {
    fn require_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(QiProgError::Argument)
        }
    }

    /// Queries the programmer's fixed capability record. Valid even when
    /// the device is not yet open (spec §4.3).
    pub fn get_capabilities(&mut self) -> Result<Capabilities> {
        let mut buf = [0u8; CAPABILITIES_WIRE_LEN];
        self.transport
            .request(Direction::In, Opcode::GetCapabilities.as_u8(), 0, 0, &mut buf, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(Capabilities::decode(&buf))
    }

    pub fn set_bus(&mut self, bus: BusKind) -> Result<()> {
        self.require_open()?;
        if bus.is_empty() {
            return Err(QiProgError::Argument);
        }
        let (a, b) = split_fields(bus.bits());
        self.transport
            .request(Direction::Out, Opcode::SetBus.as_u8(), a, b, &mut [], default_timeout())
            .map_err(QiProgError::from)?;
        Ok(())
    }

    /// Requests a bus clock of `khz` kilohertz; returns the clock the
    /// firmware actually settled on.
    pub fn set_clock(&mut self, khz: u32) -> Result<u32> {
        self.require_open()?;
        let (a, b) = split_fields(khz);
        let mut buf = [0u8; 4];
        self.transport
            .request(Direction::In, Opcode::SetClock.as_u8(), a, b, &mut buf, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(read_u32_le(&buf, 0))
    }

    pub fn read_chip_id(&mut self) -> Result<ChipIdList> {
        self.require_open()?;
        let mut buf = [0u8; CHIP_ID_ARRAY_LEN];
        self.transport
            .request(Direction::In, Opcode::ReadDeviceId.as_u8(), 0, 0, &mut buf, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(decode_chip_ids(&buf))
    }

    /// Declares a new chip-address window, resetting both cursors and
    /// discarding any leftover read-ahead bytes (spec §3, §4.6).
    pub fn set_address(&mut self, start: u32, end: u32) -> Result<()> {
        self.require_open()?;
        let mut body = [0u8; 8];
        SetAddressBody { start, end }.encode(&mut body);
        self.transport
            .request(Direction::Out, Opcode::SetAddress.as_u8(), 0, 0, &mut body, default_timeout())
            .map_err(QiProgError::from)?;
        self.window.set(start, end)?;
        self.leftover.discard();
        Ok(())
    }

    pub fn set_erase_size(&mut self, chip_idx: u16, entries: EraseSizeList) -> Result<()> {
        self.require_open()?;
        if entries.as_slice().len() > MAX_ERASE_SIZE_ENTRIES {
            return Err(QiProgError::Argument);
        }
        let mut body = [0u8; 60];
        let len = entries.wire_len();
        entries.encode(&mut body[..len]);
        self.transport
            .request(Direction::Out, Opcode::SetEraseSize.as_u8(), 0, chip_idx, &mut body[..len], default_timeout())
            .map_err(QiProgError::from)?;
        Ok(())
    }

    pub fn set_erase_command(&mut self, chip_idx: u16, cmd: CommandSequence) -> Result<()> {
        self.require_open()?;
        let mut body = [0u8; 4];
        cmd.encode(&mut body);
        self.transport
            .request(Direction::Out, Opcode::SetEraseCommand.as_u8(), 0, chip_idx, &mut body, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(())
    }

    pub fn set_write_command(&mut self, chip_idx: u16, cmd: CommandSequence) -> Result<()> {
        self.require_open()?;
        let mut body = [0u8; 4];
        cmd.encode(&mut body);
        self.transport
            .request(Direction::Out, Opcode::SetWriteCommand.as_u8(), 0, chip_idx, &mut body, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(())
    }

    pub fn set_chip_size(&mut self, chip_idx: u16, size: u32) -> Result<()> {
        self.require_open()?;
        let mut body = size.to_le_bytes();
        self.transport
            .request(Direction::Out, Opcode::SetChipSize.as_u8(), 0, chip_idx, &mut body, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(())
    }

    pub fn set_spi_timing(&mut self, tpu_us: u16, tces_ns: u16) -> Result<()> {
        self.require_open()?;
        self.transport
            .request(Direction::Out, Opcode::SetSpiTiming.as_u8(), tpu_us, tces_ns, &mut [], default_timeout())
            .map_err(QiProgError::from)?;
        Ok(())
    }

    pub fn set_vdd(&mut self, millivolts: u16, chip_idx: u16) -> Result<()> {
        self.require_open()?;
        self.transport
            .request(Direction::Out, Opcode::SetVdd.as_u8(), millivolts, chip_idx, &mut [], default_timeout())
            .map_err(QiProgError::from)?;
        Ok(())
    }

    pub fn read8(&mut self, addr: u32) -> Result<u8> {
        self.require_open()?;
        let (a, b) = split_fields(addr);
        let mut buf = [0u8; 1];
        self.transport
            .request(Direction::In, Opcode::Read8.as_u8(), a, b, &mut buf, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(buf[0])
    }

    pub fn read16(&mut self, addr: u32) -> Result<u16> {
        self.require_open()?;
        let (a, b) = split_fields(addr);
        let mut buf = [0u8; 2];
        self.transport
            .request(Direction::In, Opcode::Read16.as_u8(), a, b, &mut buf, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(read_u16_le(&buf, 0))
    }

    pub fn read32(&mut self, addr: u32) -> Result<u32> {
        self.require_open()?;
        let (a, b) = split_fields(addr);
        let mut buf = [0u8; 4];
        self.transport
            .request(Direction::In, Opcode::Read32.as_u8(), a, b, &mut buf, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(read_u32_le(&buf, 0))
    }

    pub fn write8(&mut self, addr: u32, val: u8) -> Result<()> {
        self.require_open()?;
        let (a, b) = split_fields(addr);
        let mut body = [val];
        self.transport
            .request(Direction::Out, Opcode::Write8.as_u8(), a, b, &mut body, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(())
    }

    pub fn write16(&mut self, addr: u32, val: u16) -> Result<()> {
        self.require_open()?;
        let (a, b) = split_fields(addr);
        let mut body = val.to_le_bytes();
        self.transport
            .request(Direction::Out, Opcode::Write16.as_u8(), a, b, &mut body, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(())
    }

    pub fn write32(&mut self, addr: u32, val: u32) -> Result<()> {
        self.require_open()?;
        let (a, b) = split_fields(addr);
        let mut body = val.to_le_bytes();
        self.transport
            .request(Direction::Out, Opcode::Write32.as_u8(), a, b, &mut body, default_timeout())
            .map_err(QiProgError::from)?;
        Ok(())
    }
}
