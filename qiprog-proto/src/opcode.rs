// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The QiProg control-request opcode table (spec §6).

use num_derive::FromPrimitive;

/// Direction of a control request, matching USB `bmRequestType`'s
/// direction bit (`0xC0` for IN, `0x40` for OUT).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Device-to-host.
    In,
    /// Host-to-device.
    Out,
}

/// One opcode per control-request command in spec §6's wire table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    GetCapabilities = 0x00,
    SetBus = 0x01,
    SetClock = 0x02,
    ReadDeviceId = 0x03,
    SetAddress = 0x04,
    SetEraseSize = 0x05,
    SetEraseCommand = 0x06,
    SetWriteCommand = 0x07,
    SetChipSize = 0x08,
    SetSpiTiming = 0x20,
    Read8 = 0x30,
    Read16 = 0x31,
    Read32 = 0x32,
    Write8 = 0x33,
    Write16 = 0x34,
    Write32 = 0x35,
    SetVdd = 0xF0,
}

impl Opcode {
    /// The direction this opcode travels, matching `bmRequestType`.
    pub const fn direction(self) -> Direction {
        match self {
            Opcode::GetCapabilities
            | Opcode::SetClock
            | Opcode::ReadDeviceId
            | Opcode::Read8
            | Opcode::Read16
            | Opcode::Read32 => Direction::In,
            Opcode::SetBus
            | Opcode::SetAddress
            | Opcode::SetEraseSize
            | Opcode::SetEraseCommand
            | Opcode::SetWriteCommand
            | Opcode::SetChipSize
            | Opcode::SetSpiTiming
            | Opcode::Write8
            | Opcode::Write16
            | Opcode::Write32
            | Opcode::SetVdd => Direction::Out,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}
