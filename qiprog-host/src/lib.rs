// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The QiProg host-side library: a polymorphic transport, a device
//! registry, a typed command marshaller, and the bulk-transfer pipeline
//! that streams chip reads and writes over it.

pub mod context;
pub mod cursor;
pub mod device;
pub mod loopback;
pub mod marshaller;
pub mod pipeline;
pub mod transport;

pub use context::{Context, DeviceId, ScanConfig};
pub use device::{Device, DeviceIdentity, DeviceState};
pub use loopback::LoopbackTransport;
pub use transport::{BulkCompletion, BulkStatus, EndpointSizes, Transport, TransportError};
