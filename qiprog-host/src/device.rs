// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The host-side view of one programmer device (spec §3 "Programmer
//! device").

use qiprog_proto::AddressWindow;

use crate::cursor::LeftoverBuffer;
use crate::transport::{EndpointSizes, Transport};

/// A device's lifecycle state (spec §4.3): operations other than
/// `open`/`get_capabilities`/`scan` require `Open`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceState {
    Closed,
    Open,
}

/// Identification strings reported by the transport, when available
/// (spec §3: "manufacturer/product/serial when available").
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial: Option<String>,
}

/// One attached programmer: a transport backend, its lifecycle state,
/// and the address window / leftover buffer that persist across calls
/// while the device is open.
pub struct Device {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) state: DeviceState,
    pub(crate) identity: DeviceIdentity,
    pub(crate) window: AddressWindow,
    pub(crate) leftover: LeftoverBuffer,
    pub(crate) endpoint_sizes: EndpointSizes,
}

impl Device {
    pub(crate) fn new(transport: Box<dyn Transport>, identity: DeviceIdentity) -> Self {
        Device {
            transport,
            state: DeviceState::Closed,
            identity,
            window: AddressWindow::unset(),
            leftover: LeftoverBuffer::new(0),
            endpoint_sizes: EndpointSizes {
                max_packet_in: 0,
                max_packet_out: 0,
            },
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == DeviceState::Open
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn endpoint_sizes(&self) -> EndpointSizes {
        self.endpoint_sizes
    }

    pub fn window(&self) -> &AddressWindow {
        &self.window
    }
}
