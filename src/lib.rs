//! Driver crate for the MFRC522 13.56 MHz RFID reader
//!
//! The recommended way to use this driver is the [high-level interface], and
//! for the common "which card is in the field" loop, the [card session]. If
//! you require a higher degree of flexibility, you can use the
//! [register-level interface] instead.
//!
//! This driver is built on top of [`embedded-hal`], which means it is portable
//! and can be used on any platform that implements the `embedded-hal` API.
//! The MFRC522 must be wired for SPI.
//!
//! [high-level interface]: hl/index.html
//! [card session]: session/index.html
//! [register-level interface]: ll/index.html
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod command;
pub mod configs;
pub mod frame;
pub mod hl;
pub mod ll;
pub mod poll;
pub mod session;
pub mod time;

#[cfg(test)]
mod sim;

pub use crate::{
    command::{Command, RequestMode},
    configs::Config,
    frame::{Atqa, Frame, Uid},
    hl::{Error, Mfrc522, ProtocolError, Ready, Uninitialized},
    session::{CardSession, SessionState},
    time::{Clock, Instant},
};
