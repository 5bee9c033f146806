#[cfg(feature = "defmt")]
use defmt::Format;

/// Indicates that the `Mfrc522` instance is not initialized yet
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct Uninitialized;

/// Indicates that the `Mfrc522` instance is ready to talk to cards
///
/// The antenna is on and the timer, modulation and CRC preset are set up.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct Ready;
