// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A RAM-backed stand-in for a real flash-chip bus driver. Real bus
//! drivers (LPC/FWH/SPI/ISA register poking) are out of scope for this
//! workspace; this lets the CLI exercise the full host/device protocol
//! stack without hardware.

use std::collections::HashMap;

use qiprog_device::Driver;
use qiprog_proto::capabilities::{BusKind, Capabilities, InstructionSet};
use qiprog_proto::chip_id::heapless_ids::ChipIdList;
use qiprog_proto::chip_id::{ChipId, IdMethod};
use qiprog_proto::wire::{CommandSequence, EraseSizeList};
use qiprog_proto::Result;

/// Chip contents, addressed sparsely: unwritten bytes read back as
/// `0xFF`, matching erased NOR flash.
pub struct SimChip {
    overlay: HashMap<u32, u8>,
}

impl SimChip {
    pub fn new() -> Self {
        SimChip {
            overlay: HashMap::new(),
        }
    }

    fn byte_at(&self, addr: u32) -> u8 {
        self.overlay.get(&addr).copied().unwrap_or(0xFF)
    }
}

impl Default for SimChip {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for SimChip {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            instruction_set: InstructionSet::QIPROG_NATIVE,
            bus_master: BusKind::SPI | BusKind::LPC | BusKind::FWH,
            max_direct_data: 0,
            voltages: [3300, 1800, 0, 0, 0, 0, 0, 0, 0, 0],
        }
    }

    fn set_bus(&mut self, _bus: BusKind) -> Result<()> {
        Ok(())
    }

    fn set_clock(&mut self, khz: u32) -> Result<u32> {
        Ok(khz)
    }

    fn read_chip_id(&mut self) -> ChipIdList {
        let mut ids = ChipIdList::new();
        ids.push(ChipId {
            id_method: IdMethod::SpiRes,
            vendor_id: 0x00EF,
            device_id: 0x4018,
        });
        ids
    }

    fn set_address(&mut self, _start: u32, _end: u32) -> Result<()> {
        Ok(())
    }

    fn set_erase_size(&mut self, _chip_idx: u16, _entries: EraseSizeList) -> Result<()> {
        Ok(())
    }

    fn set_erase_command(&mut self, _chip_idx: u16, _cmd: CommandSequence) -> Result<()> {
        Ok(())
    }

    fn set_write_command(&mut self, _chip_idx: u16, _cmd: CommandSequence) -> Result<()> {
        Ok(())
    }

    fn set_chip_size(&mut self, _chip_idx: u16, _size: u32) -> Result<()> {
        Ok(())
    }

    fn set_spi_timing(&mut self, _tpu_us: u16, _tces_ns: u16) -> Result<()> {
        Ok(())
    }

    fn set_vdd(&mut self, _millivolts: u16, _chip_idx: u16) -> Result<()> {
        Ok(())
    }

    fn read8(&mut self, addr: u32) -> Result<u8> {
        Ok(self.byte_at(addr))
    }

    fn read16(&mut self, addr: u32) -> Result<u16> {
        let lo = self.byte_at(addr);
        let hi = self.byte_at(addr.wrapping_add(1));
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn read32(&mut self, addr: u32) -> Result<u32> {
        let mut bytes = [0u8; 4];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = self.byte_at(addr.wrapping_add(i as u32));
        }
        Ok(u32::from_le_bytes(bytes))
    }

    fn write8(&mut self, addr: u32, val: u8) -> Result<()> {
        self.overlay.insert(addr, val);
        Ok(())
    }

    fn write16(&mut self, addr: u32, val: u16) -> Result<()> {
        for (i, b) in val.to_le_bytes().iter().enumerate() {
            self.overlay.insert(addr.wrapping_add(i as u32), *b);
        }
        Ok(())
    }

    fn write32(&mut self, addr: u32, val: u32) -> Result<()> {
        for (i, b) in val.to_le_bytes().iter().enumerate() {
            self.overlay.insert(addr.wrapping_add(i as u32), *b);
        }
        Ok(())
    }

    fn chip_read(&mut self, addr: u32, buf: &mut [u8]) -> Result<usize> {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.byte_at(addr.wrapping_add(i as u32));
        }
        Ok(buf.len())
    }

    fn chip_write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        for (i, b) in data.iter().enumerate() {
            self.overlay.insert(addr.wrapping_add(i as u32), *b);
        }
        Ok(())
    }
}
