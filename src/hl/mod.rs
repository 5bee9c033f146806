//! High-level interface to the MFRC522
//!
//! The entry point to this API is the [Mfrc522] struct. Please refer to the
//! documentation there for more details.
//!
//! This module implements a high-level interface to the MFRC522: the command
//! engine that runs one exchange with a card, the CRC coprocessor, and the
//! request, anti-collision and halt operations built on top of them. For the
//! usual "is there a card, and which one" loop, see the [card session].
//!
//! If you need more flexibility, the [register-level interface] is reachable
//! through [`Mfrc522::ll`].
//!
//! [register-level interface]: ../ll/index.html
//! [card session]: ../session/index.html

use core::fmt;

pub use error::*;
pub use state_impls::*;

use crate::{ll, Config};

mod crc;
mod engine;
mod error;
mod ready;
mod state_impls;
mod uninitialized;

/// Entry point to the MFRC522 driver API
///
/// The driver owns the SPI device, so every operation takes `&mut self`.
/// There is no locking: one driver instance is one transceiver, used from one
/// place at a time.
pub struct Mfrc522<SPI, State> {
    ll: ll::Mfrc522<SPI>,
    config: Config,
    state: State,
}

// Can't be derived without putting requirements on `SPI`.
impl<SPI, State> fmt::Debug for Mfrc522<SPI, State>
where
    State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Mfrc522 {{ state: ")?;
        self.state.fmt(f)?;
        write!(f, ", .. }}")?;

        Ok(())
    }
}

impl<SPI, State> Mfrc522<SPI, State> {
    /// Provides direct access to the register-level API
    ///
    /// Be aware that by using the register-level API, you can invalidate
    /// various assumptions that the high-level API makes about the operation of
    /// the MFRC522. Don't use the register-level and high-level APIs in tandem,
    /// unless you know what you're doing.
    pub fn ll(&mut self) -> &mut ll::Mfrc522<SPI> {
        &mut self.ll
    }

    /// The configuration the driver runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gives back the SPI device
    pub fn release(self) -> SPI {
        self.ll.release()
    }
}
