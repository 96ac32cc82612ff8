// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device-side translator: the piece of firmware that owns one
//! [`Driver`], its [`AddressWindow`], its [`TransferRing`], and a small
//! diagnostic log. [`crate::demarshaller::dispatch`] is the only way
//! control requests reach it.

use qiprog_proto::AddressWindow;

use crate::diag::DiagRing;
use crate::driver::Driver;
use crate::ring::TransferRing;

/// Depth of the translator's own diagnostic ring. Unrelated to the
/// bulk-transfer ring's depth.
const DIAG_DEPTH: usize = 32;

pub struct Translator<D: Driver> {
    pub(crate) driver: D,
    pub(crate) window: AddressWindow,
    pub(crate) ring: TransferRing,
    pub(crate) diag: DiagRing<DIAG_DEPTH>,
    max_packet_in: usize,
    max_packet_out: usize,
}

impl<D: Driver> Translator<D> {
    /// Builds a translator around `driver`, using the real endpoint
    /// max-packet sizes read from the device descriptor (spec §6 open
    /// question (a): each direction uses its own size).
    pub fn new(driver: D, max_packet_in: usize, max_packet_out: usize) -> Self {
        Translator {
            driver,
            window: AddressWindow::unset(),
            ring: TransferRing::new(),
            diag: DiagRing::new(),
            max_packet_in,
            max_packet_out,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn window(&self) -> &AddressWindow {
        &self.window
    }

    pub fn diag(&self) -> &DiagRing<DIAG_DEPTH> {
        &self.diag
    }

    /// Runs one device-side event-loop tick, offering the head of the
    /// bulk-IN ring to `try_send` and refilling a free slot from the
    /// driver if the window still has range left (spec §4.8).
    pub fn tick(&mut self, try_send: impl FnMut(&[u8]) -> bool) -> qiprog_proto::Result<()> {
        self.ring
            .tick(&mut self.window, &mut self.driver, self.max_packet_in, try_send)
    }

    /// Streams `data` to the chip at the current write cursor (bulk OUT),
    /// advancing `pwrite`. Rejects writes that would run past the
    /// declared window (spec §4.6 "range safety", applied symmetrically
    /// to writes).
    pub fn bulk_write(&mut self, data: &[u8]) -> qiprog_proto::Result<()> {
        let addr = self.window.pwrite();
        if !self.window.contains_range(addr, data.len() as u64) {
            return Err(qiprog_proto::QiProgError::Argument);
        }
        self.driver.chip_write(addr as u32, data)?;
        self.window.advance_pwrite(data.len() as u64);
        Ok(())
    }

    pub fn max_packet_out(&self) -> usize {
        self.max_packet_out
    }

    pub fn max_packet_in(&self) -> usize {
        self.max_packet_in
    }
}
