use core::fmt;
use core::fmt::{Display, Formatter};

use embedded_hal::spi;

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::ll;

/// An error that can occur when talking to a card
///
/// `Timeout` and `Protocol` mean the card didn't answer, or answered badly.
/// They are expected while no card is in the field. `Spi` and `CrcPending`
/// point at the link or the transceiver itself, see [`Error::is_fatal`].
pub enum Error<SPI>
where
    SPI: spi::ErrorType,
{
    /// Error occured while using SPI bus
    Spi(ll::Error<SPI>),

    /// The poll budget ran out before the transceiver raised a completion
    /// flag
    Timeout,

    /// The transceiver or the card reported a protocol problem
    Protocol(ProtocolError),

    /// The CRC coprocessor didn't finish within its poll budget
    ///
    /// The CRC result registers were not read.
    CrcPending,

    /// The version register doesn't hold a value an MFRC522 reports
    InitializationFailed {
        /// Value read from the version register
        version: u8,
    },
}

impl<SPI> Error<SPI>
where
    SPI: spi::ErrorType,
{
    /// Whether this error points at a broken link or transceiver rather than
    /// an absent or uncooperative card
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Spi(_) | Error::CrcPending | Error::InitializationFailed { .. }
        )
    }
}

impl<SPI> From<ll::Error<SPI>> for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn from(error: ll::Error<SPI>) -> Self {
        Error::Spi(error)
    }
}

impl<SPI> From<ProtocolError> for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn from(error: ProtocolError) -> Self {
        Error::Protocol(error)
    }
}

impl<SPI> Display for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl<SPI> std::error::Error for Error<SPI> where SPI: spi::ErrorType {}

// We can't derive this implementation, as the compiler will complain that the
// associated `SPI::Error` type doesn't implement `Debug`.
impl<SPI> fmt::Debug for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Spi(error) => write!(f, "Spi({:?})", error),
            Error::Timeout => write!(f, "Timeout"),
            Error::Protocol(error) => write!(f, "Protocol({:?})", error),
            Error::CrcPending => write!(f, "CrcPending"),
            Error::InitializationFailed { version } => {
                write!(f, "InitializationFailed {{ version: {:#04x} }}", version)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl<SPI> Format for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Spi(error) => defmt::write!(f, "Spi({:?})", error),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::Protocol(error) => defmt::write!(f, "Protocol({:?})", error),
            Error::CrcPending => defmt::write!(f, "CrcPending"),
            Error::InitializationFailed { version } => {
                defmt::write!(f, "InitializationFailed {{ version: {=u8:#x} }}", version)
            }
        }
    }
}

/// What went wrong in an exchange the transceiver did complete
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum ProtocolError {
    /// SOF was incorrect or the frame had the wrong length
    Protocol,

    /// Parity check failed
    Parity,

    /// The transceiver's CRC check failed
    Crc,

    /// A bit collision was detected, more than one card answered
    Collision,

    /// The FIFO was already full when more data arrived
    BufferOverflow,

    /// The transceiver's timer expired before a card answered
    TimerExpired,

    /// The answer didn't have the length the command calls for
    UnexpectedBitCount {
        /// Bit length the command calls for
        expected: usize,
        /// Bit length that was received
        actual: usize,
    },

    /// The answer was too short to decode
    IncompleteFrame,

    /// The UID check byte doesn't match the UID bytes
    Bcc,
}

impl ProtocolError {
    /// Maps the Error register to the most specific protocol error
    ///
    /// Only the bits that describe a failed exchange are looked at. Returns
    /// `None` if none of them is set.
    pub fn from_error_register(value: u8) -> Option<Self> {
        use crate::ll::error::*;

        if value & COLL != 0 {
            Some(ProtocolError::Collision)
        } else if value & BUFFER_OVFL != 0 {
            Some(ProtocolError::BufferOverflow)
        } else if value & PARITY != 0 {
            Some(ProtocolError::Parity)
        } else if value & CRC != 0 {
            Some(ProtocolError::Crc)
        } else if value & PROTOCOL != 0 {
            Some(ProtocolError::Protocol)
        } else {
            None
        }
    }
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}
