// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The QiProg device side: the translator firmware sits between a USB
//! control/bulk endpoint pair and a [`Driver`] implementation for one
//! chip bus. Nothing in this crate assumes an allocator or an OS thread.

#![no_std]

pub mod cursor;
pub mod demarshaller;
pub mod diag;
pub mod driver;
pub mod ring;
pub mod translator;

pub use demarshaller::dispatch;
pub use diag::{DiagEvent, DiagRing};
pub use driver::Driver;
pub use ring::TransferRing;
pub use translator::Translator;
