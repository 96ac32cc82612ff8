// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry & lifecycle (spec §4.3).
//!
//! A real USB backend's `scan` would enumerate devices matching a
//! VID/PID pair and hand each one, still `Closed`, to a `Context`; that
//! enumeration step is out of scope here (spec §1: "the concrete libusb
//! binding"). Callers instead [`Context::attach`] an already-constructed
//! [`Transport`] — typically a [`crate::loopback::LoopbackTransport`] —
//! which is exactly what a real backend's `scan` would have done on the
//! caller's behalf.

use std::time::Duration;

use log::{debug, trace};
use qiprog_proto::constants::{DEFAULT_PID, DEFAULT_TIMEOUT_MS, DEFAULT_VID};
use qiprog_proto::QiProgError;

use crate::device::{Device, DeviceIdentity, DeviceState};
use crate::transport::Transport;

/// VID/PID and per-operation timeout a [`Context`] scans and operates
/// with (spec §4.3 "extensible to caller-supplied VID/PID", §5 "3000 ms
/// per wire operation").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    pub vid: u16,
    pub pid: u16,
    pub timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            vid: DEFAULT_VID,
            pid: DEFAULT_PID,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS as u64),
        }
    }
}

/// A stable handle into a [`Context`]'s device list (spec §9: "context-
/// owned entities accessed by stable handle ... rather than mutual raw
/// pointers").
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceId(usize);

/// Owns the device registry for one scanning session (spec §3
/// "Context"). No device handle outlives its `Context`.
pub struct Context {
    config: ScanConfig,
    devices: Vec<Device>,
}

impl Context {
    pub fn init(config: ScanConfig) -> Self {
        trace!("qiprog context init: vid={:#06x} pid={:#06x}", config.vid, config.pid);
        Context {
            config,
            devices: Vec::new(),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Registers a device discovered out-of-band (the real-USB
    /// enumeration step this workspace does not implement) in the
    /// `Closed` state. Returns its handle.
    pub fn attach(&mut self, transport: Box<dyn Transport>, identity: DeviceIdentity) -> DeviceId {
        self.devices.push(Device::new(transport, identity));
        let id = DeviceId(self.devices.len() - 1);
        debug!("attached device {:?}", id);
        id
    }

    /// Lists every device this context currently knows about, `Closed`
    /// or `Open`.
    pub fn scan(&self) -> Vec<DeviceId> {
        (0..self.devices.len()).map(DeviceId).collect()
    }

    fn device_mut(&mut self, id: DeviceId) -> Result<&mut Device, QiProgError> {
        self.devices.get_mut(id.0).ok_or(QiProgError::Argument)
    }

    pub fn device(&self, id: DeviceId) -> Result<&Device, QiProgError> {
        self.devices.get(id.0).ok_or(QiProgError::Argument)
    }

    /// Transitions a device `Closed` → `Open`, reading its endpoint
    /// max-packet sizes from the transport (spec §4.3, §6).
    pub fn open(&mut self, id: DeviceId) -> Result<&mut Device, QiProgError> {
        let device = self.device_mut(id)?;
        if !device.is_open() {
            device.endpoint_sizes = device.transport.endpoint_sizes();
            device.leftover = crate::cursor::LeftoverBuffer::new(device.endpoint_sizes.max_packet_in);
            device.state = DeviceState::Open;
            trace!("opened device {:?}", id);
        }
        Ok(device)
    }

    pub fn device_mut_handle(&mut self, id: DeviceId) -> Result<&mut Device, QiProgError> {
        self.device_mut(id)
    }

    /// Transitions a device `Open` → `Closed`, restoring hardware
    /// defaults via the driver's `close` vtable entry. Idempotent (spec
    /// §4.3: `dev_close` "future" feature, now implemented — see
    /// `SPEC_FULL.md`).
    pub fn close(&mut self, id: DeviceId) -> Result<(), QiProgError> {
        let device = self.device_mut(id)?;
        if device.is_open() {
            device.transport.close();
            device.state = DeviceState::Closed;
            trace!("closed device {:?}", id);
        }
        Ok(())
    }

    /// Tears down every device, then the context itself.
    pub fn exit(mut self) {
        let ids: Vec<DeviceId> = self.scan();
        for id in ids {
            let _ = self.close(id);
        }
        debug!("context exit");
    }
}
