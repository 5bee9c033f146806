//! Enumerations for transceiver commands and card commands

#[cfg(feature = "defmt")]
use defmt::Format;

/// Commands executed by the MFRC522 itself, written to the Command register
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[repr(u8)]
pub enum Command {
	/// No action, cancels current command execution
	Idle       = 0x00,
	/// Activates the CRC coprocessor
	CalcCrc    = 0x03,
	/// Transmits data from the FIFO and activates the receiver afterwards
	Transceive = 0x0c,
	/// Resets the MFRC522
	SoftReset  = 0x0f,
}

impl Command {
	/// The value written to the Command register
	#[inline(always)]
	pub fn value(self) -> u8 {
		self as u8
	}
}

/// Request commands that bring a card in the field into the ready state
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RequestMode {
	/// REQA, only wakes cards that have not been halted
	ReqIdl = 0x26,
	/// WUPA, also wakes cards that have been halted
	ReqAll = 0x52,
}

/// Command bytes sent to the card
pub mod picc {
	/// Anti-collision, cascade level 1
	pub const ANTICOLL_CL1: u8 = 0x93;
	/// Number of valid bits argument of an anti-collision frame without UID bits
	pub const NVB_NO_UID: u8 = 0x20;
	/// Halt, type A
	pub const HALT: u8 = 0x50;
}
