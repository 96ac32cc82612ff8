// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! QiProg's error taxonomy (spec §7). Six opaque kinds shared by the host
//! and device crates; no variant carries transport- or backend-specific
//! detail, which is deliberately folded into [`QiProgError::Generic`] at
//! the boundary where it's discovered.

use core::fmt;

/// Shared result alias used throughout the workspace.
pub type Result<T> = core::result::Result<T, QiProgError>;

/// The six error kinds a QiProg operation may fail with.
///
/// Propagation policy: errors surface immediately to the caller, there is
/// no automatic retry, and the address cursor is never rolled back on
/// error (spec §7, §4.9).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QiProgError {
    /// Null device, missing vtable, impossible size, over-length control
    /// body, or any other argument the caller could have checked itself.
    Argument,
    /// Out of memory growing the device registry or allocating a device.
    Allocation,
    /// A wire operation exceeded its deadline.
    Timeout,
    /// The attached flash chip did not respond within the driver's own
    /// timeout.
    ChipTimeout,
    /// The chip produced no identifiable data (e.g. an all-`0xFF` or
    /// all-`0x00` ID read).
    NoResponse,
    /// Transport failure, protocol STALL, short transfer, or any other
    /// unrecovered condition.
    Generic,
}

impl fmt::Display for QiProgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            QiProgError::Argument => "invalid argument",
            QiProgError::Allocation => "allocation failed",
            QiProgError::Timeout => "wire operation timed out",
            QiProgError::ChipTimeout => "chip did not respond in time",
            QiProgError::NoResponse => "chip produced no identifiable data",
            QiProgError::Generic => "generic transport or protocol error",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for QiProgError {}
