// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The polymorphic programmer transport (spec §4.2).
//!
//! `Transport` hides the wire mechanism behind two operation families: a
//! synchronous control-style `request`, and an asynchronous depth-bounded
//! `bulk_submit`/`drive_events` pair. This workspace ships one
//! implementation, [`crate::loopback::LoopbackTransport`]; a real
//! USB-master backend (libusb/rusb) would implement the same trait but is
//! out of scope (spec §1, §6).

use std::time::Duration;

use qiprog_proto::opcode::Direction;
use qiprog_proto::QiProgError;

/// Per-direction USB endpoint max-packet sizes, discovered from the
/// device descriptor at `open()` time (spec §6: "must read the
/// descriptor ... must not assume 64").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EndpointSizes {
    pub max_packet_in: usize,
    pub max_packet_out: usize,
}

/// A transport-specific failure, folded into [`QiProgError::Generic`] by
/// the marshaller (spec §4.9: "any transport failure → generic error").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    Stall,
    ShortTransfer,
    TimedOut,
    NoSuchDevice,
}

impl From<TransportError> for QiProgError {
    fn from(_: TransportError) -> Self {
        QiProgError::Generic
    }
}

/// Result of a finished bulk transfer, passed to its completion closure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BulkCompletion {
    pub actual_length: usize,
    pub status: BulkStatus,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BulkStatus {
    Completed,
    Failed,
}

/// One backend capable of servicing a single opened programmer device.
///
/// Implementors own whatever private handle (a USB device handle, or as
/// with [`crate::loopback::LoopbackTransport`], a direct reference to a
/// firmware translator) is needed to actually move bytes.
pub trait Transport {
    /// Issues a synchronous control-style request (spec §4.2). On `IN`,
    /// `buf` is filled by the transport; on `OUT`, `buf` is sent as-is.
    /// Returns the number of bytes transferred.
    fn request(
        &mut self,
        direction: Direction,
        code: u8,
        field_a: u16,
        field_b: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, TransportError>;

    /// Queues one bulk transfer on `endpoint_id` and invokes `completion`
    /// with its result. This workspace's only backend,
    /// [`crate::loopback::LoopbackTransport`], runs both sides on the
    /// same call stack with no concurrency (spec §9), so it completes
    /// every transfer synchronously inside `bulk_submit` itself and
    /// [`Transport::drive_events`] is a no-op. `crate::pipeline::bulk_transfer`
    /// relies on this: it reads each completion's result immediately
    /// after `bulk_submit` returns rather than polling `drive_events`. A
    /// real asynchronous USB backend implementing this trait would
    /// instead queue the transfer here and invoke `completion` later
    /// from within `drive_events` — wiring that up would also require
    /// changing `bulk_transfer` to poll `drive_events` in a loop instead
    /// of assuming completion by the time `bulk_submit` returns.
    fn bulk_submit(
        &mut self,
        direction: Direction,
        endpoint_id: u8,
        buf: &mut [u8],
        completion: &mut dyn FnMut(BulkCompletion),
    ) -> Result<(), TransportError>;

    /// Services at least one outstanding bulk completion, or returns once
    /// `timeout` elapses with none ready.
    fn drive_events(&mut self, timeout: Duration) -> Result<(), TransportError>;

    /// Reads the endpoint max-packet sizes for the opened device.
    fn endpoint_sizes(&self) -> EndpointSizes;

    /// Restores the backend to its pre-open state (spec §4.3 `dev_close`).
    fn close(&mut self) {}
}
