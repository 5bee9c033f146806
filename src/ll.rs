//! Low-level interface to the MFRC522
//!
//! This module implements a register-level interface to the MFRC522. Users of
//! this library should typically not need to use this. Please consider using
//! the [high-level interface] or the [card session] instead.
//!
//! Every register access is exactly one SPI transaction: chip select is
//! asserted, one address byte is sent, one data byte is written or read back,
//! and chip select is released again. The address byte carries the register
//! address in bits 6..1, bit 7 selects a read and bit 0 is always zero.
//!
//! Nothing in here retries. Errors from the SPI device are handed back
//! unchanged, wrapped in [`Error`].
//!
//! [high-level interface]: ../hl/index.html
//! [card session]: ../session/index.html

use core::fmt;

use embedded_hal::spi;
use log::trace;

#[cfg(feature = "defmt")]
use defmt::Format;

/// Entry point to the MFRC522 driver's low-level API
///
/// Please consider using [hl::Mfrc522] instead.
///
/// [hl::Mfrc522]: ../hl/struct.Mfrc522.html
#[derive(Copy, Clone)]
pub struct Mfrc522<SPI> {
    spi: SPI,
}

impl<SPI> Mfrc522<SPI> {
    /// Create a new instance of `Mfrc522`
    ///
    /// Requires the SPI device the MFRC522 is connected to. The device is
    /// expected to drive chip select around every transaction.
    pub fn new(spi: SPI) -> Self {
        Mfrc522 { spi }
    }

    /// Allow access to the SPI device
    pub fn bus(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Give back the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Mfrc522<SPI>
where
    SPI: spi::SpiDevice<u8>,
{
    /// Read one register
    #[inline]
    pub fn read(&mut self, reg: Register) -> Result<u8, Error<SPI>> {
        let mut buffer = [reg.read_address(), 0];

        self.spi
            .transfer_in_place(&mut buffer)
            .map_err(Error::Transfer)?;

        trace!("read {:?} = {:#04x}", reg, buffer[1]);
        Ok(buffer[1])
    }

    /// Write one register
    #[inline]
    pub fn write(&mut self, reg: Register, value: u8) -> Result<(), Error<SPI>> {
        trace!("write {:?} = {:#04x}", reg, value);

        self.spi
            .write(&[reg.write_address(), value])
            .map_err(Error::Write)
    }

    /// Modify a register
    ///
    /// Reads the register, passes its value to `f` and writes back whatever
    /// `f` returns. That's two transactions; nothing keeps the register from
    /// changing in between.
    #[inline]
    pub fn modify<F>(&mut self, reg: Register, f: F) -> Result<(), Error<SPI>>
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read(reg)?;
        self.write(reg, f(value))
    }

    /// Set the bits of `mask` in a register, leaving the others alone
    pub fn set_bits(&mut self, reg: Register, mask: u8) -> Result<(), Error<SPI>> {
        self.modify(reg, |value| value | mask)
    }

    /// Clear the bits of `mask` in a register, leaving the others alone
    pub fn clear_bits(&mut self, reg: Register, mask: u8) -> Result<(), Error<SPI>> {
        self.modify(reg, |value| value & !mask)
    }
}

/// An SPI error that can occur when communicating with the MFRC522
pub enum Error<SPI>
where
    SPI: spi::ErrorType,
{
    /// SPI error occured during a register read
    Transfer(SPI::Error),

    /// SPI error occured during a register write
    Write(SPI::Error),
}

// We can't derive this implementation, as the compiler will complain that the
// associated error type doesn't implement `Debug`.
impl<SPI> fmt::Debug for Error<SPI>
where
    SPI: spi::ErrorType,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Transfer(error) => write!(f, "Transfer({:?})", error),
            Error::Write(error) => write!(f, "Write({:?})", error),
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
            Error::Transfer(error) => {
                defmt::write!(f, "Transfer({:?})", defmt::Debug2Format(error))
            }
            Error::Write(error) => defmt::write!(f, "Write({:?})", defmt::Debug2Format(error)),
        }
    }
}

/// The MFRC522 registers this driver touches
///
/// The discriminant is the register address from the data sheet, section 9.2.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[repr(u8)]
pub enum Register {
    /// Starts and stops command execution
    Command = 0x01,
    /// Enable and disable interrupt request control bits
    ComIEn = 0x02,
    /// Interrupt request bits
    ComIrq = 0x04,
    /// Interrupt request bits, CRC coprocessor
    DivIrq = 0x05,
    /// Error bits showing the error status of the last command executed
    Error = 0x06,
    /// Input and output of the 64 byte FIFO buffer
    FifoData = 0x09,
    /// Number of bytes stored in the FIFO buffer
    FifoLevel = 0x0a,
    /// Miscellaneous control registers
    Control = 0x0c,
    /// Adjustments for bit-oriented frames
    BitFraming = 0x0d,
    /// General modes for transmitting and receiving
    Mode = 0x11,
    /// Controls the logical behavior of the antenna driver pins TX1 and TX2
    TxControl = 0x14,
    /// Controls the setting of the transmission modulation
    TxAuto = 0x15,
    /// Configures the receiver gain
    RfCfg = 0x26,
    /// MSB of the CRC calculation result
    CrcResultH = 0x21,
    /// LSB of the CRC calculation result
    CrcResultL = 0x22,
    /// Defines settings for the internal timer
    TMode = 0x2a,
    /// Lower 8 bits of the timer prescaler
    TPrescaler = 0x2b,
    /// Higher 8 bits of the 16-bit timer reload value
    TReloadH = 0x2c,
    /// Lower 8 bits of the 16-bit timer reload value
    TReloadL = 0x2d,
    /// Software version
    Version = 0x37,
}

impl Register {
    /// All registers, in address order
    pub const ALL: [Register; 20] = [
        Register::Command,
        Register::ComIEn,
        Register::ComIrq,
        Register::DivIrq,
        Register::Error,
        Register::FifoData,
        Register::FifoLevel,
        Register::Control,
        Register::BitFraming,
        Register::Mode,
        Register::TxControl,
        Register::TxAuto,
        Register::CrcResultH,
        Register::CrcResultL,
        Register::RfCfg,
        Register::TMode,
        Register::TPrescaler,
        Register::TReloadH,
        Register::TReloadL,
        Register::Version,
    ];

    /// The 6-bit register address
    #[inline(always)]
    pub fn address(self) -> u8 {
        self as u8
    }

    /// The address byte that starts a read transaction
    #[inline(always)]
    pub fn read_address(self) -> u8 {
        ((self.address() << 1) & 0x7e) | 0x80
    }

    /// The address byte that starts a write transaction
    #[inline(always)]
    pub fn write_address(self) -> u8 {
        (self.address() << 1) & 0x7e
    }

    /// Looks up a register by its 6-bit address
    pub fn from_address(address: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|reg| reg.address() == address)
    }
}

/// ComIEn bits
pub mod com_ien {
    /// Signal on the IRQ pin is inverted
    pub const IRQ_INV: u8 = 1 << 7;
    /// Transmitter interrupt request
    pub const TX: u8 = 1 << 6;
    /// Receiver interrupt request
    pub const RX: u8 = 1 << 5;
    /// Idle interrupt request
    pub const IDLE: u8 = 1 << 4;
    /// Low alert interrupt request
    pub const LO_ALERT: u8 = 1 << 2;
    /// Error interrupt request
    pub const ERR: u8 = 1 << 1;
    /// Timer interrupt request
    pub const TIMER: u8 = 1 << 0;
}

/// ComIrq bits
///
/// Writing the register with `SET1` cleared clears every flag that is set in
/// the written value; writing it with `SET1` set sets them.
pub mod com_irq {
    /// Selects whether a write sets or clears the marked bits
    pub const SET1: u8 = 1 << 7;
    /// The last bit of the transmitted data was sent out
    pub const TX: u8 = 1 << 6;
    /// The receiver has detected the end of a valid data stream
    pub const RX: u8 = 1 << 5;
    /// A command terminated by itself
    pub const IDLE: u8 = 1 << 4;
    /// Any error bit in the Error register is set
    pub const ERR: u8 = 1 << 1;
    /// The timer decremented from 1 to 0
    pub const TIMER: u8 = 1 << 0;
}

/// DivIrq bits
pub mod div_irq {
    /// Selects whether a write sets or clears the marked bits
    pub const SET2: u8 = 1 << 7;
    /// The CalcCRC command is active and all data is processed
    pub const CRC: u8 = 1 << 2;
}

/// Error register bits
pub mod error {
    /// Write access error
    pub const WR: u8 = 1 << 7;
    /// Internal temperature sensor detects overheating
    pub const TEMP: u8 = 1 << 6;
    /// FIFO buffer is already full
    pub const BUFFER_OVFL: u8 = 1 << 4;
    /// A bit-collision is detected
    pub const COLL: u8 = 1 << 3;
    /// The CRC calculation fails
    pub const CRC: u8 = 1 << 2;
    /// Parity check failed
    pub const PARITY: u8 = 1 << 1;
    /// SOF is incorrect, or the received frame has the wrong length
    pub const PROTOCOL: u8 = 1 << 0;
}

/// FifoLevel bits
pub mod fifo_level {
    /// Immediately clears the FIFO buffer's read and write pointers
    pub const FLUSH_BUFFER: u8 = 1 << 7;
    /// Number of bytes stored in the FIFO buffer
    pub const LEVEL: u8 = 0x7f;
}

/// Control bits
pub mod control {
    /// Number of valid bits in the last received byte
    pub const RX_LAST_BITS: u8 = 0x07;
}

/// BitFraming bits
pub mod bit_framing {
    /// Starts the transmission of data, only valid with Transceive
    pub const START_SEND: u8 = 1 << 7;
    /// Number of bits of the last byte that will be transmitted
    pub const TX_LAST_BITS: u8 = 0x07;
}

/// TxControl bits
pub mod tx_control {
    /// Output signal on TX2 and TX1 delivers the modulated energy carrier
    pub const TX_RF_EN: u8 = 0x03;
}

#[cfg(test)]
mod test {
    use super::*;

    use core::convert::Infallible;

    use embedded_hal::spi::{ErrorType, Operation, SpiDevice};
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    /// A bare register file behind an SPI device, without side effects
    struct RegisterFile {
        registers: [u8; 64],
    }

    impl ErrorType for RegisterFile {
        type Error = Infallible;
    }

    impl SpiDevice<u8> for RegisterFile {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        assert_eq!(bytes.len(), 2);
                        assert_eq!(bytes[0] & 0x81, 0);
                        self.registers[(bytes[0] >> 1) as usize] = bytes[1];
                    }
                    Operation::TransferInPlace(bytes) => {
                        assert_eq!(bytes.len(), 2);
                        assert_eq!(bytes[0] & 0x81, 0x80);
                        bytes[1] = self.registers[((bytes[0] >> 1) & 0x3f) as usize];
                    }
                    _ => panic!("unexpected SPI operation"),
                }
            }

            Ok(())
        }
    }

    #[test]
    fn test_address_bytes() {
        assert_eq!(Register::Command.write_address(), 0x02);
        assert_eq!(Register::Command.read_address(), 0x82);
        assert_eq!(Register::Version.read_address(), 0xee);
        assert_eq!(Register::TReloadL.write_address(), 0x5a);

        for reg in Register::ALL {
            assert_eq!(reg.write_address() & 0x81, 0);
            assert_eq!(reg.read_address() & 0x81, 0x80);
            assert_eq!(Register::from_address(reg.address()), Some(reg));
        }
        assert_eq!(Register::from_address(0x3f), None);
    }

    #[test]
    fn test_read_is_one_transaction() {
        let spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![0xee, 0x00], vec![0x00, 0x92]),
            SpiTransaction::transaction_end(),
        ]);

        let mut mfrc522 = Mfrc522::new(spi);

        assert_eq!(mfrc522.read(Register::Version).unwrap(), 0x92);

        mfrc522.bus().done();
    }

    #[test]
    fn test_write_is_one_transaction() {
        let spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x56, 0xa9]),
            SpiTransaction::transaction_end(),
        ]);

        let mut mfrc522 = Mfrc522::new(spi);

        mfrc522.write(Register::TPrescaler, 0xa9).unwrap();

        mfrc522.bus().done();
    }

    #[test]
    fn test_set_and_clear_bits_read_then_write() {
        let spi = SpiMock::new(&[
            // set_bits(TxControl, 0x03)
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![0xa8, 0x00], vec![0x00, 0x80]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x28, 0x83]),
            SpiTransaction::transaction_end(),
            // clear_bits(BitFraming, 0x80)
            SpiTransaction::transaction_start(),
            SpiTransaction::transfer_in_place(vec![0x9a, 0x00], vec![0x00, 0x87]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x1a, 0x07]),
            SpiTransaction::transaction_end(),
        ]);

        let mut mfrc522 = Mfrc522::new(spi);

        mfrc522.set_bits(Register::TxControl, 0x03).unwrap();
        mfrc522.clear_bits(Register::BitFraming, 0x80).unwrap();

        mfrc522.bus().done();
    }

    #[test]
    fn test_register_round_trip() {
        let mut mfrc522 = Mfrc522::new(RegisterFile { registers: [0; 64] });

        for reg in Register::ALL {
            for value in [0x00, 0x01, 0x5a, 0xa5, 0x80, 0xff] {
                mfrc522.write(reg, value).unwrap();
                assert_eq!(mfrc522.read(reg).unwrap(), value, "{:?}", reg);
            }
        }
    }

    #[test]
    fn test_set_then_clear_bits() {
        let mut mfrc522 = Mfrc522::new(RegisterFile { registers: [0; 64] });

        for initial in 0..=u8::MAX {
            for mask in 0..=u8::MAX {
                mfrc522.write(Register::Mode, initial).unwrap();
                mfrc522.set_bits(Register::Mode, mask).unwrap();
                assert_eq!(mfrc522.read(Register::Mode).unwrap(), initial | mask);

                mfrc522.clear_bits(Register::Mode, mask).unwrap();
                let value = mfrc522.read(Register::Mode).unwrap();
                assert_eq!(value, initial & !mask);
                if initial & mask == 0 {
                    assert_eq!(value, initial);
                }
            }
        }
    }
}
