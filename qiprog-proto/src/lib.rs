// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire format and shared data model for the QiProg flash-programmer
//! protocol.
//!
//! This crate has no knowledge of USB, transports, or threads: it only
//! knows how to turn typed values into QiProg's little-endian byte streams
//! and back. Both the host-side marshaller and the device-side
//! demarshaller depend on it.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

pub mod address;
pub mod capabilities;
pub mod chip_id;
pub mod codec;
pub mod constants;
pub mod error;
pub mod opcode;
pub mod wire;

pub use address::AddressWindow;
pub use capabilities::{BusKind, Capabilities, InstructionSet};
pub use chip_id::{ChipId, IdMethod};
pub use error::{QiProgError, Result};
pub use opcode::{Direction, Opcode};
