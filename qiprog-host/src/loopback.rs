// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An in-process [`Transport`] that calls straight into a
//! [`qiprog_device::Translator`] — the "USB device translator" backend
//! named in spec §4.2, with no USB stack, interrupt servicing, or wire
//! bytes in between. This is both a usable embedding (host library next
//! to firmware without real hardware) and this workspace's test harness,
//! since a real libusb/rusb binding is out of scope (spec §1, §6).
//!
//! Because both sides run on the same call stack with no concurrency,
//! every bulk transfer submitted via [`LoopbackTransport::bulk_submit`]
//! runs to completion — and invokes its completion callback — before
//! `bulk_submit` returns. [`LoopbackTransport::drive_events`] therefore
//! has nothing left to do; it is a no-op kept only so this backend can
//! satisfy the same [`Transport`] trait a real asynchronous USB backend
//! would need to block inside.

use std::time::Duration;

use qiprog_device::{Driver, Translator};
use qiprog_proto::opcode::Direction;
use qiprog_proto::{constants::CHIP_DATA_ENDPOINT, constants::MAX_CONTROL_BODY};

use crate::transport::{BulkCompletion, BulkStatus, EndpointSizes, Transport, TransportError};

pub struct LoopbackTransport<D: Driver> {
    translator: Translator<D>,
    endpoint_sizes: EndpointSizes,
}

impl<D: Driver> LoopbackTransport<D> {
    /// Wraps `driver` in a translator and exposes it as a [`Transport`].
    /// `max_packet_in`/`max_packet_out` stand in for the endpoint sizes a
    /// real backend would read from the device descriptor.
    pub fn new(driver: D, max_packet_in: usize, max_packet_out: usize) -> Self {
        LoopbackTransport {
            translator: Translator::new(driver, max_packet_in, max_packet_out),
            endpoint_sizes: EndpointSizes {
                max_packet_in,
                max_packet_out,
            },
        }
    }

    pub fn driver(&self) -> &D {
        self.translator.driver()
    }

    pub fn driver_mut(&mut self) -> &mut D {
        self.translator.driver_mut()
    }
}

impl<D: Driver> Transport for LoopbackTransport<D> {
    fn request(
        &mut self,
        direction: Direction,
        code: u8,
        field_a: u16,
        field_b: u16,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> Result<usize, TransportError> {
        let mut scratch = [0u8; MAX_CONTROL_BODY];
        match direction {
            Direction::In => {
                let n = qiprog_device::dispatch(&mut self.translator, code, field_a, field_b, &[], &mut scratch)
                    .map_err(|_| TransportError::Stall)?;
                let n = n.min(buf.len());
                buf[..n].copy_from_slice(&scratch[..n]);
                Ok(n)
            }
            Direction::Out => {
                let n = qiprog_device::dispatch(&mut self.translator, code, field_a, field_b, buf, &mut scratch)
                    .map_err(|_| TransportError::Stall)?;
                Ok(n)
            }
        }
    }

    fn bulk_submit(
        &mut self,
        direction: Direction,
        endpoint_id: u8,
        buf: &mut [u8],
        completion: &mut dyn FnMut(BulkCompletion),
    ) -> Result<(), TransportError> {
        if endpoint_id != CHIP_DATA_ENDPOINT {
            return Err(TransportError::NoSuchDevice);
        }

        match direction {
            Direction::In => {
                let mut filled = 0usize;
                loop {
                    if filled >= buf.len() {
                        break;
                    }
                    let before = filled;
                    self.translator
                        .tick(|pkt| {
                            let n = pkt.len().min(buf.len() - filled);
                            buf[filled..filled + n].copy_from_slice(&pkt[..n]);
                            filled += n;
                            true
                        })
                        .map_err(|_| TransportError::Stall)?;
                    if filled == before {
                        // The window ran dry before the request was satisfied.
                        break;
                    }
                }
                let status = if filled == buf.len() {
                    BulkStatus::Completed
                } else {
                    BulkStatus::Failed
                };
                completion(BulkCompletion {
                    actual_length: filled,
                    status,
                });
                Ok(())
            }
            Direction::Out => match self.translator.bulk_write(buf) {
                Ok(()) => {
                    completion(BulkCompletion {
                        actual_length: buf.len(),
                        status: BulkStatus::Completed,
                    });
                    Ok(())
                }
                Err(_) => {
                    completion(BulkCompletion {
                        actual_length: 0,
                        status: BulkStatus::Failed,
                    });
                    Err(TransportError::Stall)
                }
            },
        }
    }

    fn drive_events(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        Ok(())
    }

    fn endpoint_sizes(&self) -> EndpointSizes {
        self.endpoint_sizes
    }

    fn close(&mut self) {
        self.translator.driver_mut().close();
    }
}
